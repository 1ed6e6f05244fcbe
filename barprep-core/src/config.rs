//! Run configuration.
//!
//! A TOML file describing a preparation run: which symbols, what lookback and
//! bar width, where the artifacts go. Period and interval stay strings here
//! and are parsed at the call site, so a config error points at the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for a preparation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepConfig {
    /// Symbols to prepare, in order.
    pub symbols: Vec<String>,

    /// Lookback period (provider range vocabulary, e.g. "2y").
    #[serde(default = "default_period")]
    pub period: String,

    /// Bar interval (e.g. "1h").
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Directory for the cleaned CSV files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory for the diagnostic charts.
    #[serde(default = "default_figures_dir")]
    pub figures_dir: PathBuf,
}

fn default_period() -> String {
    "2y".to_string()
}

fn default_interval() -> String {
    "1h".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/raw")
}

fn default_figures_dir() -> PathBuf {
    PathBuf::from("reports/figures")
}

impl PrepConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
