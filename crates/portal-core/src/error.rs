// ── Core error types ──
//
// Errors surfaced by portal-core. Consumers do not branch on HTTP details;
// the `From<portal_api::Error>` impl folds transport failures into
// domain-level variants while keeping the user-error distinction intact.

use portal_api::NotLoaded;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Bootstrap ────────────────────────────────────────────────────
    /// The environment payload could not be loaded; nothing else can run.
    #[error("Unable to load the portal environment")]
    Bootstrap(#[source] portal_api::Error),

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to portal at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Portal request timed out")]
    Timeout,

    #[error("Portal returned HTTP {status} for {url}")]
    Api { status: u16, url: String },

    #[error("Invalid response from portal: {message}")]
    InvalidResponse { message: String },

    // ── Session errors ───────────────────────────────────────────────
    /// The server refused the request (`success: false`).
    #[error("Request rejected by the portal: {message}")]
    Rejected { message: String },

    /// An identified-only operation was attempted while anonymous.
    #[error("Not signed in")]
    NotIdentified,

    #[error(transparent)]
    NotLoaded(#[from] NotLoaded),

    // ── Local errors ─────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl CoreError {
    /// Whether the failure is attributable to the user's credentials or
    /// state rather than to the device or the server.
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::Rejected { .. } | Self::NotIdentified => true,
            Self::Bootstrap(e) => e.is_user_error(),
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<portal_api::Error> for CoreError {
    fn from(err: portal_api::Error) -> Self {
        match err {
            portal_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| format!("{}{}", u.origin().ascii_serialization(), u.path()))
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                }
            }
            portal_api::Error::HttpStatus { status, url } => CoreError::Api { status, url },
            portal_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            portal_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            err @ (portal_api::Error::NotJson { .. }
            | portal_api::Error::Validation(_)
            | portal_api::Error::Deserialization { .. }) => CoreError::InvalidResponse {
                message: err.to_string(),
            },
            portal_api::Error::Rejected { message } => CoreError::Rejected {
                message: message.unwrap_or_else(|| "no reason given".into()),
            },
        }
    }
}
