// ── Core error types ──
//
// Domain errors from tankwatch-core. Consumers see "the order API rejected
// the order" or "the level service is unreachable", never reqwest or
// tungstenite types. `From<tankwatch_api::Error>` does the translation.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Remote errors ────────────────────────────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Not found: {identifier}")]
    NotFound { identifier: String },

    #[error("Invalid data from server: {message}")]
    InvalidData { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    /// Local session identity lacks a field needed to attribute an order.
    #[error("Station session is missing its {field}")]
    MissingIdentity { field: &'static str },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if a later attempt may succeed without operator action.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => true,
            Self::Api { status, .. } => status.is_none_or(|s| s >= 500),
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tankwatch_api::Error> for CoreError {
    fn from(err: tankwatch_api::Error) -> Self {
        use tankwatch_api::Error as ApiError;

        match err {
            ApiError::Transport(ref e) => {
                let url = e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string);
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url,
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Api { status: 404, message } => CoreError::NotFound {
                identifier: message,
            },
            ApiError::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            ApiError::Deserialization { message, body: _ } => CoreError::InvalidData { message },
            ApiError::InvalidLevel { raw } => CoreError::InvalidData {
                message: format!("level '{raw}' is not a percentage"),
            },
            ApiError::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("push channel: {reason}"),
            },
            ApiError::Protocol(reason) => CoreError::InvalidData {
                message: format!("push channel: {reason}"),
            },
            ApiError::HeartbeatTimeout { timeout_ms } => CoreError::Timeout {
                timeout_secs: timeout_ms / 1000,
            },
        }
    }
}
