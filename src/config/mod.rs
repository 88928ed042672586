//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::RatingKind;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Dashboard widget defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Initial Top-N for the comparison view
    #[serde(default = "default_top_n")]
    pub default_top_n: u32,

    /// Lower bound of the Top-N control
    #[serde(default = "default_min_top_n")]
    pub min_top_n: u32,

    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,

    #[serde(default)]
    pub default_rating: RatingKind,
}

fn default_top_n() -> u32 {
    50
}

fn default_min_top_n() -> u32 {
    5
}

fn default_histogram_bins() -> usize {
    20
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_top_n: default_top_n(),
            min_top_n: default_min_top_n(),
            histogram_bins: default_histogram_bins(),
            default_rating: RatingKind::default(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,
}

fn default_data_file() -> PathBuf {
    PathBuf::from("./data/Ranking.csv")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given (it must exist), otherwise from
    /// `default_path` if present, otherwise defaults.
    pub fn load(path: Option<&Path>, default_path: &Path) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None if default_path.exists() => Self::from_file(default_path),
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.dashboard.histogram_bins == 0 {
            return Err(ConfigError::ValidationError(
                "Histogram bins must be greater than 0".to_string(),
            ));
        }

        if self.dashboard.min_top_n == 0 {
            return Err(ConfigError::ValidationError(
                "Minimum Top-N must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
