// REST backend HTTP client
//
// Wraps `reqwest::Client` with base-URL joining and envelope unwrapping.
// Endpoint groups (devices, administrators, macro) are implemented as
// inherent methods in sibling files so this module only deals with
// transport mechanics.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::envelope::{read_json, unwrap_payload};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Raw HTTP client for the REST envelope backend.
///
/// All request helpers return the unwrapped payload: a `success: false`
/// envelope or a non-2xx status is turned into an [`Error`] before the
/// caller sees it.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    /// Create a REST client from a `TransportConfig`.
    ///
    /// `base_url` is the service root, e.g. `http://localhost:5000` or
    /// `https://host/api`. Endpoint paths are appended to it verbatim.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a REST client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/{endpoint}`, keeping any path prefix on the base URL.
    pub(crate) fn endpoint_url(&self, endpoint: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and unwrap the envelope.
    pub(crate) async fn get(&self, endpoint: &str, field: Option<&str>) -> Result<Value, Error> {
        let url = self.endpoint_url(endpoint)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(Error::Transport)?;

        unwrap_payload(read_json(resp).await?, field)
    }

    /// Send a POST request with JSON body and unwrap the envelope.
    pub(crate) async fn post(
        &self,
        endpoint: &str,
        body: &impl Serialize,
        field: Option<&str>,
    ) -> Result<Value, Error> {
        let url = self.endpoint_url(endpoint)?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        unwrap_payload(read_json(resp).await?, field)
    }

    /// Send a PUT request with JSON body and unwrap the envelope.
    pub(crate) async fn put(
        &self,
        endpoint: &str,
        body: &impl Serialize,
        field: Option<&str>,
    ) -> Result<Value, Error> {
        let url = self.endpoint_url(endpoint)?;
        debug!("PUT {}", url);

        let resp = self
            .http
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        unwrap_payload(read_json(resp).await?, field)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> RestClient {
        RestClient::with_client(reqwest::Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn endpoint_url_keeps_base_path_prefix() {
        let c = client("https://host/api/");
        assert_eq!(
            c.endpoint_url("obtener_cbus_macro").unwrap().as_str(),
            "https://host/api/obtener_cbus_macro"
        );
    }

    #[test]
    fn endpoint_url_on_bare_host() {
        let c = client("http://localhost:5000");
        assert_eq!(
            c.endpoint_url("/obtener_todos_administradores").unwrap().as_str(),
            "http://localhost:5000/obtener_todos_administradores"
        );
    }
}
