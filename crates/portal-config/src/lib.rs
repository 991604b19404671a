//! Configuration for the portal tools.
//!
//! A TOML file in the platform config directory, overridden by `PORTAL_`
//! environment variables, translated into `portal_core::Configuration`.
//! Nested keys use a double underscore: `PORTAL_ENDPOINTS__EVENT`,
//! `PORTAL_DEFAULTS__TIMEOUT`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use portal_core::{Configuration, Endpoint};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "PORTAL_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no portal URL configured")]
    MissingBaseUrl,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Portal API root; every endpoint defaults to `<base_url>/<name>`.
    pub base_url: Option<String>,

    /// Per-endpoint URL overrides, keyed by endpoint name.
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,

    /// Where client-side state (session, time offset) is kept.
    pub data_dir: Option<PathBuf>,

    /// Extra PEM root certificate.
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Update check interval, e.g. "10m" or "90s".
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> String {
    "10m".into()
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "volunteer-portal", "portal")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("portal");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Platform data directory, used when `data_dir` is not configured.
pub fn default_data_dir() -> PathBuf {
    project_dirs().map_or_else(dirs_fallback, |dirs| dirs.data_dir().to_path_buf())
}

// ── Loading and saving ──────────────────────────────────────────────

/// Load the config from `path` plus environment overrides.
///
/// A missing file is not an error; defaults and environment still apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    Ok(config)
}

/// Load the config from the canonical path plus environment overrides.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    /// File backing the client-side key/value storage.
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir().join("storage.json")
    }

    pub fn poll_interval(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(&self.defaults.poll_interval).map_err(|e| {
            ConfigError::Validation {
                field: "defaults.poll_interval".into(),
                reason: e.to_string(),
            }
        })
    }

    /// Record an endpoint override.
    pub fn set_endpoint(&mut self, endpoint: Endpoint, url: &Url) {
        self.endpoints.insert(endpoint.to_string(), url.to_string());
    }

    /// Build the runtime configuration.
    pub fn to_configuration(&self) -> Result<Configuration, ConfigError> {
        let raw = self.base_url.as_deref().ok_or(ConfigError::MissingBaseUrl)?;
        let base = parse_url("base_url", raw)?;

        let mut configuration = Configuration::new(&base)
            .map_err(|e| ConfigError::Validation {
                field: "base_url".into(),
                reason: e.to_string(),
            })?
            .with_timeout(Duration::from_secs(self.defaults.timeout))
            .with_poll_interval(self.poll_interval()?);
        configuration.ca_cert.clone_from(&self.ca_cert);

        for (name, raw) in &self.endpoints {
            let field = format!("endpoints.{name}");
            let endpoint: Endpoint = name.parse().map_err(|_| ConfigError::Validation {
                field: field.clone(),
                reason: "unknown endpoint (expected environment, content, event, login or upload)"
                    .into(),
            })?;
            configuration.set_endpoint(endpoint, parse_url(&field, raw)?);
        }
        Ok(configuration)
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|e: url::ParseError| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}
