//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code per category.

use miette::Diagnostic;
use thiserror::Error;

use portal_config::ConfigError;
use portal_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const PROTOCOL: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Bootstrap ────────────────────────────────────────────────────
    #[error("Unable to load the portal environment")]
    #[diagnostic(
        code(portal::bootstrap),
        help(
            "The portal could not be started. Check that base_url points at a\n\
             running portal: portal config show"
        )
    )]
    Bootstrap {
        #[source]
        source: portal_api::Error,
    },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the portal at {url}")]
    #[diagnostic(
        code(portal::connection_failed),
        help("Check your network connection and the configured portal URL.")
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(portal::timeout),
        help("Increase the timeout with --timeout or try again later.")
    )]
    Timeout,

    #[error("The portal answered HTTP {status} for {url}")]
    #[diagnostic(code(portal::http_status))]
    HttpStatus { status: u16, url: String },

    #[error("The portal sent an unexpected response")]
    #[diagnostic(
        code(portal::invalid_response),
        help("{message}\nThe portal may be mid-deployment; try again in a moment.")
    )]
    InvalidResponse { message: String },

    // ── Session ──────────────────────────────────────────────────────
    #[error("The portal rejected the request: {message}")]
    #[diagnostic(
        code(portal::rejected),
        help("Your session may have expired. Sign in again with: portal login --email <EMAIL>")
    )]
    Rejected { message: String },

    #[error("Not signed in")]
    #[diagnostic(
        code(portal::not_signed_in),
        help("Sign in with: portal login --email <EMAIL>")
    )]
    NotSignedIn,

    // ── Data ─────────────────────────────────────────────────────────
    #[error("{what} is not available")]
    #[diagnostic(
        code(portal::not_loaded),
        help("The data could not be loaded. Run with -v for details.")
    )]
    NotLoaded { what: String },

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(portal::not_found),
        help("Run: portal {list_command} to see what is available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(portal::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No portal configured")]
    #[diagnostic(
        code(portal::no_config),
        help(
            "Create a config with: portal config init --base-url <URL>\n\
             Or pass --url / set PORTAL_BASE_URL.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(portal::config))]
    Config(Box<ConfigError>),

    #[error("Cannot store local state: {message}")]
    #[diagnostic(
        code(portal::storage),
        help("Check that the data directory is writable, or pass --data-dir.")
    )]
    Storage { message: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(Box::new(err))
    }
}

impl From<portal_api::NotLoaded> for CliError {
    fn from(err: portal_api::NotLoaded) -> Self {
        Self::NotLoaded {
            what: err.type_name.into(),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Bootstrap { source } => match source.kind() {
                portal_api::FailureKind::Transport => exit_code::CONNECTION,
                portal_api::FailureKind::Rejected => exit_code::AUTH,
                portal_api::FailureKind::Format | portal_api::FailureKind::Validation => {
                    exit_code::PROTOCOL
                }
            },
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::HttpStatus { status: 404, .. } | Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::HttpStatus { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::InvalidResponse { .. } => exit_code::PROTOCOL,
            Self::Rejected { .. } | Self::NotSignedIn => exit_code::AUTH,
            Self::Validation { .. } | Self::NoConfig { .. } | Self::Config(_) => exit_code::USAGE,
            Self::NotLoaded { .. } | Self::Storage { .. } | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Bootstrap(source) => CliError::Bootstrap { source },
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::Timeout => CliError::Timeout,
            CoreError::Api { status, url } => CliError::HttpStatus { status, url },
            CoreError::InvalidResponse { message } => CliError::InvalidResponse { message },
            CoreError::Rejected { message } => CliError::Rejected { message },
            CoreError::NotIdentified => CliError::NotSignedIn,
            CoreError::NotLoaded(e) => e.into(),
            CoreError::Config { message } => CliError::Validation {
                field: "configuration".into(),
                reason: message,
            },
            CoreError::Storage { message } => CliError::Storage { message },
        }
    }
}
