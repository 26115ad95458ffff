//! Configuration management for imagebox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use imagebox::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `IMAGEBOX__<section>__<key>`
//!
//! Examples:
//! - `IMAGEBOX__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `IMAGEBOX__SERVER__API_PREFIX=/v1`
//! - `IMAGEBOX__LIMITS__MAX_UPLOAD_BYTES=16MB`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/imagebox.toml`.
//! This can be overridden using the `IMAGEBOX_CONFIG` environment variable
//! or the `--config` CLI flag.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{Config, CorsConfig, ServerConfig, UploadLimits};
pub use validation::ValidationError;

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or a value
    /// fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(&sources::default_path())
    }

    /// Load configuration from a specific file, still honoring `.env` and
    /// environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let config = sources::load(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
