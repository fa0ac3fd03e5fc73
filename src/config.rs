//! Service configuration

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::classifier::{DEFAULT_SMOOTHING, is_valid_smoothing};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Main service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server binds to
    pub listen_addr: String,
    /// CSV corpus used to fit the classifier at startup
    pub data_path: PathBuf,
    /// Additive smoothing constant
    pub smoothing: f64,
    /// Directory of static frontend files, served as the fallback route
    pub static_dir: Option<PathBuf>,
    /// External prediction service
    pub remote_scorer_url: Option<String>,
    /// Timeout for remote scorer calls, in seconds
    pub remote_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8090".to_string(),
            data_path: PathBuf::from("data/standardSpamData.csv"),
            smoothing: DEFAULT_SMOOTHING,
            static_dir: Some(PathBuf::from("www")),
            remote_scorer_url: Some("http://localhost:8091/predict".to_string()),
            remote_timeout_seconds: 10,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Ok(toml::from_str(&content)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_smoothing(self.smoothing) {
            return Err(ConfigError::Invalid(format!(
                "smoothing must be a normal positive number, got {}",
                self.smoothing
            )));
        }

        self.socket_addr()?;

        if self.remote_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "remote_timeout_seconds must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr.parse().map_err(|e| {
            ConfigError::Invalid(format!("invalid listen_addr '{}': {}", self.listen_addr, e))
        })
    }
}
