//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/quotebook/config.toml)
//! 3. Environment variables (QUOTEBOOK_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix
const ENV_PREFIX: &str = "QUOTEBOOK";

/// Default remote collection (echoes posted records back)
pub const DEFAULT_REMOTE_URL: &str = "https://jsonplaceholder.typicode.com/posts";

/// Default auto-sync period in seconds
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 30;

/// Default HTTP request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (quote store, session file)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Remote quote collection URL
    #[serde(default = "default_remote_url")]
    pub remote_url: String,

    /// Whether the shell starts with the recurring sync timer enabled
    #[serde(default)]
    pub auto_sync: bool,

    /// Period of the recurring sync timer
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,

    /// Run one sync cycle when the shell starts
    #[serde(default)]
    pub sync_on_start: bool,

    /// Timeout for remote requests
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Log file path (defaults to {data_dir}/debug.log when QUOTEBOOK_LOG is set)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            remote_url: default_remote_url(),
            auto_sync: false,
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            sync_on_start: false,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (QUOTEBOOK_DATA_DIR, QUOTEBOOK_REMOTE_URL, ...)
    /// 2. Config file (~/.config/quotebook/config.toml or QUOTEBOOK_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // Empty string restores the default collection
        if let Ok(val) = std::env::var(format!("{}_REMOTE_URL", ENV_PREFIX)) {
            self.remote_url = if val.is_empty() {
                default_remote_url()
            } else {
                val
            };
        }

        if let Ok(val) = std::env::var(format!("{}_AUTO_SYNC", ENV_PREFIX)) {
            self.auto_sync = val.eq_ignore_ascii_case("true") || val == "1";
        }

        if let Ok(val) = std::env::var(format!("{}_SYNC_INTERVAL", ENV_PREFIX)) {
            if let Ok(secs) = val.parse::<u64>() {
                if secs > 0 {
                    self.sync_interval_secs = secs;
                }
            }
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with QUOTEBOOK_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quotebook")
            .join("config.toml")
    }

    /// Path of the persistent key-value file (quotes, sync metadata, filter)
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }

    /// Path of the session key-value file (last viewed quote)
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    /// Recurring sync period
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs.max(1))
    }

    /// Remote request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quotebook")
}

fn default_remote_url() -> String {
    DEFAULT_REMOTE_URL.to_string()
}

fn default_sync_interval() -> u64 {
    DEFAULT_SYNC_INTERVAL_SECS
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
