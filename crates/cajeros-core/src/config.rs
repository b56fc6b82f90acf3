// ── Runtime connection configuration ──
//
// These types describe *how* to reach the data service. They carry the API
// key and connection tuning, but never touch disk. The CLI builds a
// `ConnectionConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default period of the polling fallback.
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(30_000);

/// Which of the two backend shapes the service exposes.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    /// REST service answering with `{success, data, message}` envelopes.
    #[default]
    Rest,
    /// Hosted table API plus realtime feed; requires an API key.
    Table,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed development servers).
    DangerAcceptInvalid,
}

/// Configuration for one data service.
///
/// Built by the CLI, passed to `Backend`/`Dashboard`; core never reads
/// config files.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Service URL: REST root or table project root.
    pub url: Url,
    pub backend: BackendKind,
    /// API key for the table backend.
    pub api_key: Option<SecretString>,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Use the realtime feed for live device views (table backend only).
    pub realtime_enabled: bool,
    /// Polling period when realtime is unavailable.
    pub polling_interval: Duration,
}

impl ConnectionConfig {
    pub fn new(url: Url, backend: BackendKind) -> Self {
        Self {
            url,
            backend,
            api_key: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            realtime_enabled: true,
            polling_interval: DEFAULT_POLLING_INTERVAL,
        }
    }

    pub(crate) fn transport(&self) -> cajeros_api::TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => cajeros_api::TlsMode::System,
            TlsVerification::CustomCa(path) => cajeros_api::TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => cajeros_api::TlsMode::DangerAcceptInvalid,
        };
        cajeros_api::TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_parses_lowercase() {
        assert_eq!("table".parse::<BackendKind>().unwrap(), BackendKind::Table);
        assert_eq!(BackendKind::Rest.to_string(), "rest");
    }

    #[test]
    fn defaults_poll_every_thirty_seconds() {
        let cfg = ConnectionConfig::new(Url::parse("http://localhost:5000").unwrap(), BackendKind::Rest);
        assert_eq!(cfg.polling_interval, Duration::from_secs(30));
        assert!(cfg.realtime_enabled);
        assert_eq!(cfg.tls, TlsVerification::SystemDefaults);
    }
}
