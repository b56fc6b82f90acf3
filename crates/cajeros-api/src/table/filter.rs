// PostgREST query builder
//
// Filters are query parameters of the form `column=op.value`. Only the
// operators this client needs are modelled.

use std::fmt::Display;

use url::Url;

/// Row filter and projection for a table request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    params: Vec<(String, String)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `column=eq.value`
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_owned(), format!("eq.{value}")));
        self
    }

    /// `column=in.(a,b,c)`
    pub fn in_list<T: Display>(mut self, column: &str, values: &[T]) -> Self {
        let joined = values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.params.push((column.to_owned(), format!("in.({joined})")));
        self
    }

    /// `select=a,b`
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".into(), columns.to_owned()));
        self
    }

    /// `order=column.asc`
    pub fn order_asc(mut self, column: &str) -> Self {
        self.params.push(("order".into(), format!("{column}.asc")));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Append the filter to `url`'s query string.
    pub(crate) fn apply(&self, url: &mut Url) {
        if self.params.is_empty() {
            return;
        }
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &self.params {
            pairs.append_pair(key, value);
        }
    }
}
