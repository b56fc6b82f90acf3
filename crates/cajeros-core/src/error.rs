// ── Core error types ──
//
// User-facing errors from cajeros-core. Consumers never match on HTTP
// plumbing directly; the `From<cajeros_api::Error>` impl translates
// transport-layer errors into domain variants. Wherever the backend sent
// its own message, `Display` yields that message verbatim.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("{reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("{message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation not supported by the {backend} backend: {operation}")]
    Unsupported { operation: String, backend: String },

    /// The backend refused the operation; `message` is its own text.
    #[error("{message}")]
    Rejected { message: String },

    /// The first half of a two-step write succeeded and the second failed.
    #[error("{message} (partial update: {completed})")]
    PartialFailure { completed: String, message: String },

    #[error("Administrator privilege required to {action}")]
    PermissionDenied { action: String },

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("{message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn unsupported(operation: &str, backend: impl std::fmt::Display) -> Self {
        Self::Unsupported {
            operation: operation.to_owned(),
            backend: backend.to_string(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<cajeros_api::Error> for CoreError {
    fn from(err: cajeros_api::Error) -> Self {
        match err {
            cajeros_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            cajeros_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            cajeros_api::Error::InvalidHeader(e) => CoreError::Config {
                message: format!("API key is not a valid header value: {e}"),
            },
            cajeros_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            cajeros_api::Error::Http { status, message } => match status {
                401 | 403 => CoreError::AuthenticationFailed { message },
                _ => CoreError::Api {
                    message,
                    status: Some(status),
                },
            },
            cajeros_api::Error::Backend { message } => CoreError::Rejected { message },
            cajeros_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            cajeros_api::Error::RealtimeConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("Realtime connection failed: {reason}"),
            },
            cajeros_api::Error::RealtimeClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("Realtime channel closed (code {code}): {reason}"),
            },
            cajeros_api::Error::SubscriptionRejected { message } => CoreError::Rejected { message },
            cajeros_api::Error::UnsupportedOperation(op) => CoreError::Unsupported {
                operation: op.to_owned(),
                backend: "configured".into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_is_displayed_verbatim() {
        let err = CoreError::from(cajeros_api::Error::Backend {
            message: "Credenciales incorrectas".into(),
        });
        assert_eq!(err.to_string(), "Credenciales incorrectas");
    }

    #[test]
    fn http_status_line_passes_through() {
        let err = CoreError::from(cajeros_api::Error::Http {
            status: 500,
            message: "HTTP error! status: 500".into(),
        });
        assert!(matches!(err, CoreError::Api { status: Some(500), .. }));
        assert_eq!(err.to_string(), "HTTP error! status: 500");
    }

    #[test]
    fn unauthorized_maps_to_authentication_failure() {
        let err = CoreError::from(cajeros_api::Error::Http {
            status: 401,
            message: "Invalid API key".into(),
        });
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }

    #[test]
    fn partial_failure_keeps_cause_first() {
        let err = CoreError::PartialFailure {
            completed: "previous assignments removed".into(),
            message: "insert failed".into(),
        };
        assert!(err.to_string().starts_with("insert failed"));
    }
}
