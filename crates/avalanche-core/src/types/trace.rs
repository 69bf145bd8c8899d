// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Trace aliases and per-trace configuration.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{Result, StatsError};
use crate::filter::BandPass;

/// Instantaneous population activity, one value per simulation timestep.
pub type ActivityTrace = Vec<f64>;

/// Supra-threshold activity, same length as the source [`ActivityTrace`].
pub type ThresholdedTrace = Vec<u32>;

/// Sum of `binsize` consecutive thresholded entries per bin.
pub type BinnedTrace = Vec<u64>;

/// Avalanche sizes in temporal order. Every entry is >= 1.
pub type AvalancheSizeList = Vec<u64>;

/// Which signal of a recording is analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Coarse-sampled signal (electrode-like, sums many neurons)
    Coarse,
    /// Sub-sampled signal (spikes of a few sampled neurons)
    Sub,
}

impl DataType {
    pub const ALL: [DataType; 2] = [DataType::Coarse, DataType::Sub];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Coarse => "coarse",
            DataType::Sub => "sub",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coarse" => Ok(DataType::Coarse),
            "sub" => Ok(DataType::Sub),
            other => Err(StatsError::UnknownDataType(other.to_string())),
        }
    }
}

/// How a supra-threshold sample is turned into events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventMode {
    /// Each supra-threshold sample contributes its excess over the threshold line.
    #[default]
    Excess,
    /// Each supra-threshold excursion contributes a single event at its maximum.
    Peak,
}

impl FromStr for EventMode {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "excess" => Ok(EventMode::Excess),
            "peak" => Ok(EventMode::Peak),
            other => Err(StatsError::UnknownEventMode(other.to_string())),
        }
    }
}

/// Per-trace thresholding configuration.
///
/// `threshold` is expressed in standard deviations above the trace's own
/// mean. When `filter` is set the trace is band-passed before the
/// statistics are taken.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdConfig {
    pub threshold: f64,
    pub event_mode: EventMode,
    pub filter: Option<BandPass>,
}

impl ThresholdConfig {
    pub fn new(threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(StatsError::InvalidThreshold(threshold));
        }
        Ok(Self {
            threshold,
            event_mode: EventMode::Excess,
            filter: None,
        })
    }

    pub fn with_event_mode(mut self, event_mode: EventMode) -> Self {
        self.event_mode = event_mode;
        self
    }

    pub fn with_filter(mut self, filter: BandPass) -> Self {
        self.filter = Some(filter);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_parse() {
        assert_eq!("coarse".parse::<DataType>().unwrap(), DataType::Coarse);
        assert_eq!(" SUB ".parse::<DataType>().unwrap(), DataType::Sub);
        assert!("lfp".parse::<DataType>().is_err());
    }

    #[test]
    fn test_threshold_config_rejects_negative() {
        assert_eq!(
            ThresholdConfig::new(-1.0),
            Err(StatsError::InvalidThreshold(-1.0))
        );
        assert!(ThresholdConfig::new(f64::NAN).is_err());
        assert!(ThresholdConfig::new(0.0).is_ok());
    }
}
