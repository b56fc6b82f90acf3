use thiserror::Error;

/// Top-level error type for the `cajeros-api` crate.
///
/// Covers every failure mode across both backends and the realtime feed:
/// transport, HTTP status, backend-reported failures, decoding, and the
/// WebSocket channel. `cajeros-core` maps these into user-facing errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// API key or other header value that HTTP cannot carry.
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Backend responses ───────────────────────────────────────────
    /// Non-2xx response. `message` is the backend's own message when the
    /// body carried one, otherwise a generic status line.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The backend answered 2xx but reported a logical failure
    /// (`{"success": false, "message": "..."}`).
    #[error("{message}")]
    Backend { message: String },

    /// The response body could not be decoded, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Realtime ────────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("Realtime connection failed: {0}")]
    RealtimeConnect(String),

    /// WebSocket closed by the server.
    #[error("Realtime channel closed (code {code}): {reason}")]
    RealtimeClosed { code: u16, reason: String },

    /// The server refused the channel join or reported a channel error.
    #[error("Realtime subscription rejected: {message}")]
    SubscriptionRejected { message: String },

    // ── Backend capability ──────────────────────────────────────────
    /// Operation not offered by this backend.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::RealtimeConnect(_) | Self::RealtimeClosed { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Http { status: 404, .. } => true,
            _ => false,
        }
    }

    /// HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
