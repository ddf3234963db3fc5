//! Configuration file loading
//!
//! The bot reads a TOML file naming the GitLab instance, the projects to
//! evaluate and the poll cadence. A few settings can be overridden from the
//! environment.

use crate::error::{Error, Result};
use crate::types::MergeMethod;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the configured log level.
pub const LOGGING_LEVEL_ENV: &str = "LOGGING_LEVEL";

/// Filename looked up in the working directory and the user config dir.
const CONFIG_FILE: &str = "config.toml";

/// Directory name for the config file under the user config dir.
const APP_DIR: &str = "mr-autopilot";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_MAX_CONCURRENT_PROJECTS: usize = 4;

/// A project listed explicitly in the config file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectConfig {
    /// Numeric project ID
    pub id: u64,
    /// Expected path with namespace (informational)
    pub path: Option<String>,
}

/// GitLab connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitLabConfig {
    /// Instance base URL (e.g., `https://gitlab.example.com`)
    pub url: String,
    /// Access token; `GITLAB_ACCESS_TOKEN` takes precedence
    pub access_token: Option<String>,
    /// Projects to evaluate; empty means every maintained project
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
}

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// GitLab connection settings
    pub gitlab: GitLabConfig,
    /// Seconds between cycle starts
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Maximum projects evaluated at once
    #[serde(default = "default_max_concurrent_projects")]
    pub max_concurrent_projects: usize,
    /// Merge strategy
    #[serde(default)]
    pub merge_method: MergeMethod,
    /// Log level when neither `RUST_LOG` nor `LOGGING_LEVEL` is set
    pub log_level: Option<String>,
}

const fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

const fn default_max_concurrent_projects() -> usize {
    DEFAULT_MAX_CONCURRENT_PROJECTS
}

impl Config {
    /// Poll interval as a duration
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Effective log level: `LOGGING_LEVEL`, then the config file, then `info`
    pub fn effective_log_level(&self) -> Result<&'static str> {
        match std::env::var(LOGGING_LEVEL_ENV) {
            Ok(level) if !level.trim().is_empty() => normalize_log_level(&level),
            _ => self
                .log_level
                .as_deref()
                .map_or(Ok("info"), normalize_log_level),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(Error::Config("poll_interval_secs must be positive".to_string()));
        }
        if self.max_concurrent_projects == 0 {
            return Err(Error::Config(
                "max_concurrent_projects must be positive".to_string(),
            ));
        }
        url::Url::parse(&self.gitlab.url)
            .map_err(|e| Error::Config(format!("invalid gitlab.url '{}': {e}", self.gitlab.url)))?;
        if let Some(level) = self.log_level.as_deref() {
            normalize_log_level(level)?;
        }
        Ok(())
    }
}

/// Map a level name onto a tracing filter directive
///
/// `panic` and `fatal` have no tracing counterpart and map to `error`.
pub fn normalize_log_level(level: &str) -> Result<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "panic" | "fatal" | "error" => Ok("error"),
        "warn" | "warning" => Ok("warn"),
        "info" => Ok("info"),
        "debug" => Ok("debug"),
        "trace" => Ok("trace"),
        other => Err(Error::Config(format!("unknown logging level: {other}"))),
    }
}

/// Locate the config file when no path was given.
///
/// Prefers `./config.toml`, then `<config dir>/mr-autopilot/config.toml`.
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
        .unwrap_or(local)
}

/// Load and validate configuration from disk.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;

    config.validate()?;
    Ok(config)
}
