//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/dayglance/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/dayglance/` (~/.config/dayglance/)
//! - Data: `$XDG_DATA_HOME/dayglance/` (~/.local/share/dayglance/)
//! - State/Logs: `$XDG_STATE_HOME/dayglance/` (~/.local/state/dayglance/)

use crate::analytics::MAX_SERIES_LENGTH;
use crate::error::{Error, Result};
use crate::types::Period;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Analytics configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Analytics configuration
#[derive(Debug, Deserialize)]
pub struct AnalyticsConfig {
    /// Period used when a command does not name one
    #[serde(default = "default_period")]
    pub default_period: Period,

    /// Number of sub-periods in a trend series
    #[serde(default = "default_series_length")]
    pub series_length: usize,

    /// Seconds a cached summary stays valid (0 disables caching)
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_period: default_period(),
            series_length: default_series_length(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

impl AnalyticsConfig {
    /// Cache TTL, or `None` when caching is disabled.
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_SERIES_LENGTH).contains(&self.series_length) {
            return Err(Error::Config(format!(
                "analytics.series_length must be between 1 and {}",
                MAX_SERIES_LENGTH
            )));
        }
        Ok(())
    }
}

fn default_period() -> Period {
    Period::Weekly
}

fn default_series_length() -> usize {
    8
}

fn default_cache_ttl() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.analytics.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/dayglance/config.toml` (~/.config/dayglance/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("dayglance").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("dayglance")
    }

    /// Returns the state directory path (for logs)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("dayglance")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/dayglance/data.db` (~/.local/share/dayglance/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }
}
