// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the statistics core
//!
//! Only malformed *configuration* is an error here. Degenerate data (flat
//! traces, empty repetitions, fit windows without usable points) is not:
//! those cases produce all-zero traces, empty lists or NaN fits.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    #[error("binsize must be >= 1")]
    InvalidBinsize,

    #[error("threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),

    #[error("invalid band-pass filter: {0}")]
    InvalidFilter(String),

    #[error("invalid fit window: s_min={s_min}, s_max={s_max}")]
    InvalidFitWindow { s_min: u64, s_max: u64 },

    #[error("unknown data type '{0}' (expected 'coarse' or 'sub')")]
    UnknownDataType(String),

    #[error("unknown event mode '{0}' (expected 'excess' or 'peak')")]
    UnknownEventMode(String),
}

pub type Result<T> = core::result::Result<T, StatsError>;
