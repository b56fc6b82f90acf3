// Table backend macro operations
//
// The macro table holds a single row. Every call targets `id = 1`.

use serde_json::{Map, Value};
use tracing::debug;

use crate::envelope::decode_list;
use crate::error::Error;
use crate::models::MacroRecord;
use crate::table::client::TableClient;
use crate::table::filter::Filter;
use crate::table::MACROS;

/// Id of the singleton macro row.
pub const MACRO_ID: i64 = 1;

impl TableClient {
    /// `GET macros?id=eq.1`. `None` when the row does not exist.
    pub async fn get_macro(&self) -> Result<Option<MacroRecord>, Error> {
        let rows: Vec<MacroRecord> = decode_list(
            self.select(MACROS, &Filter::new().eq("id", MACRO_ID))
                .await?,
        )?;
        Ok(rows.into_iter().next())
    }

    /// `PATCH macros?id=eq.1` with only the identifiers that were given.
    pub async fn update_macro(&self, cbu90: Option<&str>, cbu100: Option<&str>) -> Result<(), Error> {
        debug!(?cbu90, ?cbu100, "updating macro");
        let mut body = Map::new();
        if let Some(v) = cbu90 {
            body.insert("cbu90%".into(), Value::from(v));
        }
        if let Some(v) = cbu100 {
            body.insert("cbu100%".into(), Value::from(v));
        }
        if body.is_empty() {
            return Ok(());
        }
        let _ = self
            .update(MACROS, &Filter::new().eq("id", MACRO_ID), &Value::Object(body))
            .await?;
        Ok(())
    }
}
