// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Avalanche Analysis Configuration
//!
//! Type-safe configuration for the analysis drivers with support for:
//! - TOML file parsing (`avalanche_configuration.toml`)
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! ## Usage
//!
//! ```rust,no_run
//! use avalanche_config::load_config_or_default;
//!
//! let config = load_config_or_default(None, None).expect("Failed to load config");
//! println!("Threshold: {} std", config.analysis.threshold);
//! println!("Binsizes: {:?}", config.analysis.binsizes);
//! ```
//!
//! Precedence, lowest to highest: built-in defaults, file, environment, CLI.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config,
    load_config_or_default, parse_binsizes, CONFIG_FILE_NAME,
};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
