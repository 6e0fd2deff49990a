//! Configuration file handling
//!
//! Settings live in a TOML file in the platform config directory
//! (`~/.config/weatherdash/config.toml` on Linux). Every key is optional.
//!
//! ```toml
//! backend_url = "http://localhost:5000"
//! default_city = "Bangalore"
//! request_timeout_secs = 15
//! effects = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::backend::DEFAULT_BACKEND_URL;

/// City loaded on startup when none is given
pub const DEFAULT_CITY: &str = "Bangalore";

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid backend URL '{0}': expected an http:// or https:// address")]
    InvalidBackendUrl(String),
}

/// Settings read from the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the weather backend
    pub backend_url: String,
    /// City fetched on startup
    pub default_city: String,
    /// Give up on backend requests after this many seconds; no limit when unset
    pub request_timeout_secs: Option<u64>,
    /// Whether to animate weather effects
    pub effects: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            default_city: DEFAULT_CITY.to_string(),
            request_timeout_secs: None,
            effects: true,
        }
    }
}

impl Config {
    /// Location of the config file in the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("", "", "weatherdash")?;
        Some(dirs.config_dir().join("config.toml"))
    }

    /// Loads configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// tried and a missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::parse(&contents, &path)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parses and validates TOML config text. `path` is only used in errors.
    pub fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_backend_url(&self.backend_url)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Checks that `url` is an absolute http(s) URL.
pub fn validate_backend_url(url: &str) -> Result<(), ConfigError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::InvalidBackendUrl(url.to_string())),
    }
}

/// Default log file location in the platform cache directory
pub fn default_log_path() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "weatherdash")?;
    Some(dirs.cache_dir().join("weatherdash.log"))
}
