// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `avalanche_configuration.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AvalancheConfig {
    pub system: SystemConfig,
    pub analysis: AnalysisConfig,
    pub filter: FilterConfig,
    pub fitting: FittingConfig,
    /// Named dynamical states, (m, h) per name
    pub states: Vec<StateConfig>,
}

impl Default for AvalancheConfig {
    fn default() -> Self {
        Self {
            system: SystemConfig::default(),
            analysis: AnalysisConfig::default(),
            filter: FilterConfig::default(),
            fitting: FittingConfig::default(),
            states: default_states(),
        }
    }
}

/// Paths, logging and worker pool
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    pub data_dir: PathBuf,
    pub log_level: String,
    /// Batch worker threads (0 = one per available core)
    pub max_workers: usize,
    /// Append-only results log, relative to `data_dir` unless absolute
    pub results_log: PathBuf,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("dat/"),
            log_level: "info".to_string(),
            max_workers: 0,
            results_log: PathBuf::from("fit_results.tsv"),
        }
    }
}

/// Thresholding, binning and repetition settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Threshold in standard deviations above the trace mean
    pub threshold: f64,
    pub binsizes: Vec<usize>,
    /// Repetitions per experiment; discovered from the data directory when unset
    pub reps: Option<usize>,
    /// Signals to analyse ("coarse", "sub")
    pub datatypes: Vec<String>,
    /// "excess" or "peak"
    pub event_mode: String,
    /// Only datasets whose file name contains this substring
    pub mask: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: 3.0,
            binsizes: vec![1, 2, 4],
            reps: None,
            datatypes: vec!["coarse".to_string(), "sub".to_string()],
            event_mode: "excess".to_string(),
            mask: None,
        }
    }
}

/// Band-pass pre-filter
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    pub enabled: bool,
    pub sample_rate_hz: f64,
    pub low_cut_hz: f64,
    pub high_cut_hz: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sample_rate_hz: 500.0,
            low_cut_hz: 0.1,
            high_cut_hz: 200.0,
        }
    }
}

/// Fit windows and time units
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FittingConfig {
    pub ps_s_min: u64,
    pub ps_s_max: u64,
    /// Duration of one simulation timestep in ms
    pub timestep_ms: f64,
    pub tau_max_lag: usize,
}

impl Default for FittingConfig {
    fn default() -> Self {
        Self {
            ps_s_min: 5,
            ps_s_max: 64,
            timestep_ms: 2.0,
            tau_max_lag: 40,
        }
    }
}

/// One named dynamical state
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StateConfig {
    pub name: String,
    /// Branching parameter of the simulated network
    pub m: f64,
    /// External input rate
    pub h: f64,
}

impl StateConfig {
    pub fn new(name: &str, m: f64, h: f64) -> Self {
        Self {
            name: name.to_string(),
            m,
            h,
        }
    }
}

/// The states of the reference study.
pub fn default_states() -> Vec<StateConfig> {
    vec![
        StateConfig::new("poisson", 0.000, 2e-3),
        StateConfig::new("subcritical", 0.900, 2e-4),
        StateConfig::new("reverberant", 0.980, 4e-5),
        StateConfig::new("critical", 0.999, 2e-6),
        StateConfig::new("critical500", 0.996, 8e-6),
    ]
}
