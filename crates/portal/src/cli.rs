//! Clap derive structures for the `portal` CLI.
//!
//! Defines the command tree, global flags, and shared types. Also compiled
//! by `build.rs` for man page generation, so it depends on clap only.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// portal -- your volunteer schedule from the command line
#[derive(Debug, Parser)]
#[command(
    name = "portal",
    version,
    about = "Volunteer portal from the command line",
    long_about = "Sign in to a volunteer portal, read its pages, check your shifts\n\
        and get told when the schedule changes.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Portal API base URL (overrides config)
    #[arg(long, short = 'u', env = "PORTAL_URL", global = true)]
    pub url: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, env = "PORTAL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the session and clock state
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "PORTAL_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, env = "PORTAL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    pub fn output(&self) -> OutputFormat {
        self.output.clone().unwrap_or(OutputFormat::Table)
    }

    pub fn color(&self) -> ColorMode {
        self.color.clone().unwrap_or(ColorMode::Auto)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show event-wide settings (event name, year, time zone)
    #[command(alias = "env")]
    Environment,

    /// List content pages, or show one
    Content {
        /// Page slug
        slug: Option<String>,
    },

    /// Sign in with your e-mail address and access code
    Login(LoginArgs),

    /// Sign out and forget the stored session
    Logout,

    /// Show who you are signed in as
    Whoami,

    /// Show your shifts
    #[command(alias = "shifts")]
    Schedule,

    /// Upload a new avatar photo
    Upload {
        /// Image file to upload
        file: PathBuf,
    },

    /// Watch for schedule updates
    Watch(WatchArgs),

    /// Inspect or shift the portal clock
    Clock(ClockArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// E-mail address registered with the portal
    #[arg(long, short = 'e')]
    pub email: String,

    /// Access code (prompted for when omitted)
    #[arg(long, env = "PORTAL_ACCESS_CODE", hide_env_values = true)]
    pub access_code: Option<String>,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Time between checks, e.g. "10m" or "90s" [default: from config]
    #[arg(long, short = 'i')]
    pub interval: Option<String>,

    /// Check once and exit
    #[arg(long)]
    pub once: bool,
}

// ── Clock ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ClockArgs {
    #[command(subcommand)]
    pub command: ClockCommand,
}

#[derive(Debug, Subcommand)]
pub enum ClockCommand {
    /// Show the portal time and any offset
    Show,

    /// Pretend it is a given moment (RFC 3339, e.g. 2019-06-08T10:00:00+01:00)
    Set {
        /// Target time
        time: String,
    },

    /// Shift the clock by a duration, e.g. "2h" or "-30m"
    Offset {
        /// Offset from system time
        #[arg(allow_hyphen_values = true)]
        offset: String,
    },

    /// Return to system time
    Reset,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the effective configuration
    Show,

    /// Create a config file pointing at a portal
    Init {
        /// Portal API base URL
        #[arg(long)]
        base_url: String,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Point one endpoint somewhere else
    SetEndpoint {
        /// Endpoint name (environment, content, event, login, upload)
        name: String,

        /// Endpoint URL
        url: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
