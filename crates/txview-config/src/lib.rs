//! Configuration management for txview
//!
//! This module handles loading, validation, and management of
//! txview configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::{ConfigError, ConfigResult};

// ==================== Configuration Types ====================

/// Data source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// JSON file with employees and transactions
    #[serde(default = "default_fixture_path")]
    pub fixture_path: PathBuf,
    /// Transactions per page for the paginated feed
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Simulated latency applied to every provider fetch
    #[serde(default)]
    pub latency_ms: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            fixture_path: default_fixture_path(),
            page_size: default_page_size(),
            latency_ms: 0,
        }
    }
}

fn default_fixture_path() -> PathBuf {
    PathBuf::from("./fixtures/data.json")
}

fn default_page_size() -> usize {
    5
}

/// Orchestration behaviour toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Prefetch every employee's transactions after a page load
    #[serde(default = "default_true")]
    pub warm_employee_cache: bool,
    /// Re-apply approval toggles after the merged list is recomputed
    #[serde(default = "default_true")]
    pub preserve_toggles: bool,
    /// Join identical in-flight loads
    #[serde(default = "default_true")]
    pub single_flight: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            warm_employee_cache: true,
            preserve_toggles: true,
            single_flight: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Data source settings
    #[serde(default)]
    pub data: DataConfig,
    /// Orchestration settings
    #[serde(default)]
    pub view: ViewConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            },
            _ => ConfigError::IoError,
        })?;

        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|_| ConfigError::InvalidYaml)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.data.page_size == 0 || self.data.page_size > 1000 {
            return Err(ConfigError::InvalidValue {
                field: "data.page_size".to_string(),
                reason: "Page size must be between 1 and 1000".to_string(),
            });
        }

        if self.data.latency_ms > 60_000 {
            return Err(ConfigError::InvalidValue {
                field: "data.latency_ms".to_string(),
                reason: "Latency must not exceed 60000 ms".to_string(),
            });
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Log level must be one of: {}", LOG_LEVELS.join(", ")),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }
}

// ==================== Tests ====================
