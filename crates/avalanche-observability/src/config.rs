//! Logging configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level (trace, debug, info, warn, error)
    pub level: String,

    /// Console log format
    pub format: LogFormat,

    /// Base directory for run folders when file logging is enabled
    pub log_dir: Option<PathBuf>,

    /// Keep run folders for N days
    pub retention_days: u64,

    /// Keep at most N run folders
    pub retention_runs: usize,
}

/// Log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    Text,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Text,
            log_dir: None,
            retention_days: 30,
            retention_runs: 10,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: &str) -> Self {
        LoggingConfig {
            level: level.to_string(),
            ..Default::default()
        }
    }
}
