use thiserror::Error;

use crate::validate::ValidationError;

/// Top-level error type for the `portal-api` crate.
///
/// Covers every way a request against the portal API can fail. The variants
/// collapse into four [`FailureKind`]s, and only [`Error::Rejected`] counts
/// as a user error: the server understood the request and refused it.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    ///
    /// Built through `From<reqwest::Error>`, which drops the query string
    /// from the attached URL.
    #[error("HTTP transport error: {0}")]
    Transport(reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Payload ─────────────────────────────────────────────────────
    /// The body could not be parsed as JSON.
    #[error("Response is not valid JSON: {message}")]
    NotJson { message: String },

    /// The JSON does not match the expected shape.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The JSON matched its shape but could not be converted into the
    /// typed payload (e.g. a number out of range).
    #[error("Deserialization error: {message}")]
    Deserialization { message: String },

    // ── Application ─────────────────────────────────────────────────
    /// The server replied `success: false`.
    #[error("Request rejected by the server{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Rejected { message: Option<String> },
}

/// Coarse failure categories a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Request error or non-2xx status.
    Transport,
    /// Body was not JSON.
    Format,
    /// JSON did not match the expected shape.
    Validation,
    /// Explicit `success: false` from the server.
    Rejected,
}

impl FailureKind {
    /// `true` for failures attributable to the requester's credentials or
    /// state. Everything else is a device/server failure.
    pub fn is_user_error(self) -> bool {
        matches!(self, Self::Rejected)
    }
}

impl Error {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) | Self::HttpStatus { .. } | Self::InvalidUrl(_) | Self::Tls(_) => {
                FailureKind::Transport
            }
            Self::NotJson { .. } => FailureKind::Format,
            Self::Validation(_) | Self::Deserialization { .. } => FailureKind::Validation,
            Self::Rejected { .. } => FailureKind::Rejected,
        }
    }

    /// Returns `true` if the server refused the request for a reason the
    /// user can act on (expired session, wrong access code).
    pub fn is_user_error(&self) -> bool {
        self.kind().is_user_error()
    }

    /// Returns `true` if this is a transient error worth retrying later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    /// Auth tokens travel as query parameters; keep them out of messages.
    fn from(mut err: reqwest::Error) -> Self {
        if let Some(url) = err.url_mut() {
            url.set_query(None);
            url.set_fragment(None);
        }
        Self::Transport(err)
    }
}

/// A loader accessor was used before any successful load.
///
/// This is a programming error: callers must check the result of
/// `initialize()` / `load()` before reading the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{type_name} accessed before a successful load")]
pub struct NotLoaded {
    pub type_name: &'static str,
}
