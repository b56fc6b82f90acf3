// Table backend HTTP client
//
// Wraps `reqwest::Client` with the service's `apikey`/`Authorization`
// headers, `/rest/v1/<table>` URL construction and PostgREST filters.
// Table-specific operations live in sibling files as inherent methods.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::envelope::read_json;
use crate::error::Error;
use crate::table::filter::Filter;
use crate::transport::TransportConfig;

const REST_PREFIX: &str = "rest/v1";
const REALTIME_PATH: &str = "realtime/v1/websocket";
const REALTIME_VSN: &str = "1.0.0";

/// Raw HTTP client for the hosted table API.
#[derive(Debug, Clone)]
pub struct TableClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
}

impl TableClient {
    /// Create a table client. `base_url` is the project root
    /// (`https://<project>.example.co`); the key is sent both as `apikey`
    /// and as a bearer token on every request.
    pub fn new(base_url: Url, api_key: SecretString, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client_with_headers(auth_headers(&api_key)?)?;
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    /// Create a table client around a pre-built `reqwest::Client` that
    /// already carries the auth headers.
    pub fn with_client(http: reqwest::Client, base_url: Url, api_key: SecretString) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// The project base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/rest/v1/{table}?{filter}`
    pub(crate) fn table_url(&self, table: &str, filter: &Filter) -> Result<Url, Error> {
        let full = format!(
            "{}/{REST_PREFIX}/{table}",
            self.base_url.as_str().trim_end_matches('/')
        );
        let mut url = Url::parse(&full)?;
        filter.apply(&mut url);
        Ok(url)
    }

    /// WebSocket endpoint of the realtime feed:
    /// `ws(s)://{host}/realtime/v1/websocket?apikey=KEY&vsn=1.0.0`.
    pub fn realtime_url(&self) -> Result<Url, Error> {
        let full = format!(
            "{}/{REALTIME_PATH}",
            self.base_url.as_str().trim_end_matches('/')
        );
        let mut url = Url::parse(&full)?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        // Only fails for cannot-be-a-base URLs, which `Url::parse` above rules out.
        let _ = url.set_scheme(scheme);
        url.query_pairs_mut()
            .append_pair("apikey", self.api_key.expose_secret())
            .append_pair("vsn", REALTIME_VSN);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// `GET /rest/v1/{table}` with the given filter.
    pub(crate) async fn select(&self, table: &str, filter: &Filter) -> Result<Value, Error> {
        let url = self.table_url(table, filter)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(Error::Transport)?;

        read_json(resp).await
    }

    /// `POST /rest/v1/{table}`, returning the inserted rows.
    pub(crate) async fn insert(&self, table: &str, body: &impl Serialize) -> Result<Value, Error> {
        let url = self.table_url(table, &Filter::new())?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        read_json(resp).await
    }

    /// `PATCH /rest/v1/{table}?{filter}`, returning the updated rows.
    pub(crate) async fn update(
        &self,
        table: &str,
        filter: &Filter,
        body: &impl Serialize,
    ) -> Result<Value, Error> {
        let url = self.table_url(table, filter)?;
        debug!("PATCH {}", url);

        let resp = self
            .http
            .patch(url)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        read_json(resp).await
    }

    /// `DELETE /rest/v1/{table}?{filter}`
    pub(crate) async fn delete(&self, table: &str, filter: &Filter) -> Result<(), Error> {
        let url = self.table_url(table, filter)?;
        debug!("DELETE {}", url);

        let resp = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(Error::Transport)?;

        read_json(resp).await.map(|_| ())
    }
}

fn auth_headers(api_key: &SecretString) -> Result<HeaderMap, Error> {
    let key = api_key.expose_secret();
    let mut apikey = HeaderValue::from_str(key)?;
    apikey.set_sensitive(true);
    let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))?;
    bearer.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("apikey"), apikey);
    headers.insert(AUTHORIZATION, bearer);
    Ok(headers)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> TableClient {
        TableClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            SecretString::from("anon-key"),
        )
    }

    #[test]
    fn table_url_appends_rest_prefix_and_filter() {
        let c = client("https://proj.example.co/");
        let url = c
            .table_url("cajeros", &Filter::new().eq("id", 4))
            .unwrap();
        assert_eq!(url.as_str(), "https://proj.example.co/rest/v1/cajeros?id=eq.4");
    }

    #[test]
    fn realtime_url_switches_to_wss() {
        let c = client("https://proj.example.co");
        assert_eq!(
            c.realtime_url().unwrap().as_str(),
            "wss://proj.example.co/realtime/v1/websocket?apikey=anon-key&vsn=1.0.0"
        );
    }

    #[test]
    fn realtime_url_plain_http_uses_ws() {
        let c = client("http://127.0.0.1:54321");
        assert!(c.realtime_url().unwrap().as_str().starts_with("ws://127.0.0.1:54321/"));
    }

    #[test]
    fn auth_headers_mark_key_sensitive() {
        let headers = auth_headers(&SecretString::from("k")).unwrap();
        assert!(headers["apikey"].is_sensitive());
        assert_eq!(headers[AUTHORIZATION], "Bearer k");
    }
}
