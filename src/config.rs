//! Configuration file support
//!
//! Settings come from three layers, highest precedence first: command-line
//! flags, a TOML file, built-in defaults.
//!
//! ```toml
//! port = 8080
//! bind = "0.0.0.0"
//! log_level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::web::{ServerConfig, DEFAULT_BIND, DEFAULT_PORT};

/// Config file name inside the per-user config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name inside the per-user config directory
pub const APP_DIR_NAME: &str = "tvdrop";

/// Default log filter
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Config error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// File-backed settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// First port tried by the startup scan
    pub port: u16,
    /// Address to bind to
    pub bind: String,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub bind: Option<String>,
}

impl Config {
    /// Default config file location (`<config_dir>/tvdrop/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the config from the default location
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load the config from `path`
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Merge with command-line values into a server config (CLI wins)
    pub fn merge_with_cli(&self, overrides: &CliOverrides, video_dir: impl Into<PathBuf>) -> ServerConfig {
        ServerConfig::new(video_dir)
            .with_port(overrides.port.unwrap_or(self.port))
            .with_bind(overrides.bind.clone().unwrap_or_else(|| self.bind.clone()))
    }
}
