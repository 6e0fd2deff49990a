//! Command-line interface parsing for weatherdash
//!
//! This module handles parsing of CLI arguments using clap and merging them
//! with the config file into the settings the application starts with.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::config::{validate_backend_url, Config, ConfigError};

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The city argument was blank
    #[error("City name cannot be empty")]
    EmptyCity,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// weatherdash - current conditions, hourly and daily forecasts in your terminal
#[derive(Parser, Debug)]
#[command(name = "weatherdash")]
#[command(about = "Terminal weather dashboard with hourly and daily forecasts")]
#[command(version)]
pub struct Cli {
    /// City to show on startup
    ///
    /// Examples:
    ///   weatherdash              # Show the configured default city
    ///   weatherdash Oslo         # Show Oslo
    ///   weatherdash "New York"   # Quote names with spaces
    #[arg(value_name = "CITY")]
    pub city: Option<String>,

    /// City to show on startup, as a flag
    #[arg(long = "city", value_name = "CITY", conflicts_with = "city")]
    pub city_flag: Option<String>,

    /// Base URL of the weather backend (overrides the config file)
    #[arg(long, value_name = "URL")]
    pub backend_url: Option<String>,

    /// Read settings from this TOML file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable animated weather effects
    #[arg(long)]
    pub no_effects: bool,

    /// Write logs to this file instead of the cache directory
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Settings the application starts with, after CLI overrides
#[derive(Debug, Clone, PartialEq)]
pub struct StartupConfig {
    /// City fetched on startup
    pub city: String,
    /// Base URL of the weather backend
    pub backend_url: String,
    /// Per-request timeout, if any
    pub request_timeout: Option<Duration>,
    /// Whether to animate weather effects
    pub effects: bool,
    /// Explicit log file location
    pub log_file: Option<PathBuf>,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self::from_config(Config::default())
    }
}

impl StartupConfig {
    /// Startup settings straight from a config file, with no CLI overrides
    pub fn from_config(config: Config) -> Self {
        Self {
            city: config.default_city.clone(),
            request_timeout: config.request_timeout(),
            backend_url: config.backend_url,
            effects: config.effects,
            log_file: None,
        }
    }

    /// Applies CLI arguments on top of the config file.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with the merged settings
    /// * `Err(CliError)` if the city is blank or the backend URL is invalid
    pub fn from_cli(cli: &Cli, config: Config) -> Result<Self, CliError> {
        let mut startup = Self::from_config(config);

        if let Some(city) = cli.city.as_ref().or(cli.city_flag.as_ref()) {
            let city = city.trim();
            if city.is_empty() {
                return Err(CliError::EmptyCity);
            }
            startup.city = city.to_string();
        }

        if let Some(url) = &cli.backend_url {
            validate_backend_url(url)?;
            startup.backend_url = url.clone();
        }

        if cli.no_effects {
            startup.effects = false;
        }
        startup.log_file = cli.log_file.clone();

        Ok(startup)
    }
}
