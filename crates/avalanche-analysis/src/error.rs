/*!
Error types for the analysis drivers.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use std::path::PathBuf;

use avalanche_config::ConfigError;
use avalanche_core::StatsError;
use thiserror::Error;

use crate::key::KeyError;

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Error types for analysis operations
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing input file: {path}")]
    MissingInput { path: PathBuf },

    #[error("No input files for '{mode}' under {dir}")]
    NoInputFiles { mode: String, dir: PathBuf },

    #[error("Malformed dataset {path}: {reason}")]
    MalformedDataset { path: PathBuf, reason: String },

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("Batch worker pool: {0}")]
    Pool(String),
}

impl AnalysisError {
    /// Wrap an I/O error, turning `NotFound` into [`AnalysisError::MissingInput`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            AnalysisError::MissingInput { path }
        } else {
            AnalysisError::Io { path, source }
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        AnalysisError::Json {
            path: path.into(),
            source,
        }
    }

    /// True for failures confined to one experiment's files. A mode logs
    /// these and moves on to the next experiment.
    pub fn is_per_experiment(&self) -> bool {
        matches!(
            self,
            AnalysisError::MissingInput { .. }
                | AnalysisError::Io { .. }
                | AnalysisError::Json { .. }
                | AnalysisError::MalformedDataset { .. }
                | AnalysisError::Stats(_)
                | AnalysisError::Key(_)
        )
    }
}
