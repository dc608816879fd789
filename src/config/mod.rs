//! Configuration management for quotelist
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use quotelist::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `QUOTELIST__<section>__<key>`
//!
//! Examples:
//! - `QUOTELIST__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `QUOTELIST__LISTING__FAILURE_POLICY=fail_fast`
//! - `QUOTELIST__PROVIDER__CLOUD_NAME=demo`
//!
//! Account secrets are only read from `CLOUDINARY_API_KEY` and
//! `CLOUDINARY_API_SECRET`. `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_FOLDER`,
//! `QUOTE_PREFIX` and `SITE_BASE_URL` are honoured as well.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/quotelist.toml`.
//! This can be overridden using the `QUOTELIST_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{Config, ListingConfig, ProviderConfig, ServerConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or
    /// validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
