// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Experiment identifiers and the named-state table
//!
//! An experiment is addressed by its branching parameter `m`, input rate
//! `h` and inter-electrode distance `d`. On disk the triple is spelled
//! `m0.90000_h2.000e-04_d08`; raw recordings append `_rNN` and thresholded
//! datasets append `_thX.Y`. Parsing accepts only the canonical spelling,
//! so `parse(format(k)) == k` and `format(parse(s)) == s`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

use avalanche_config::{default_states, StateConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("malformed experiment name '{name}': {reason}")]
    Malformed { name: String, reason: String },
}

fn malformed(name: &str, reason: &str) -> KeyError {
    KeyError::Malformed {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

/// Scientific notation with three decimals and a signed two-digit exponent
/// (`2.000e-04`, `1.500e+01`).
pub fn format_scientific(value: f64) -> String {
    let raw = format!("{:.3e}", value);
    match raw.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exp.abs())
            }
            Err(_) => raw,
        },
        None => raw,
    }
}

/// Threshold as it appears in file names (`3.0`, `2.5`)
pub fn format_threshold(threshold: f64) -> String {
    format!("{:.1}", threshold)
}

/// Mass / input-rate / distance triple of one simulated experiment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperimentKey {
    pub m: f64,
    pub h: f64,
    pub d: u32,
}

impl ExperimentKey {
    pub fn new(m: f64, h: f64, d: u32) -> Self {
        Self { m, h, d }
    }

    /// `m0.90000_h2.000e-04_` : everything before the distance field
    pub fn group_prefix(&self) -> String {
        group_prefix(self.m, self.h)
    }

    /// `m0.90000_h2.000e-04_d08`
    pub fn stem(&self) -> String {
        format!("{}d{:02}", self.group_prefix(), self.d)
    }

    /// Stem of repetition `rep` of the raw recording
    pub fn raw_stem(&self, rep: usize) -> String {
        format!("{}_r{:02}", self.stem(), rep)
    }

    /// Stem of the thresholded dataset at `threshold`
    pub fn thresholded_stem(&self, threshold: f64) -> String {
        format!("{}_th{}", self.stem(), format_threshold(threshold))
    }

    /// Parse a canonical `m.._h.._dNN` stem.
    pub fn parse(stem: &str) -> Result<Self, KeyError> {
        let rest = stem
            .strip_prefix('m')
            .ok_or_else(|| malformed(stem, "expected leading 'm'"))?;
        let (m_str, rest) = rest
            .split_once("_h")
            .ok_or_else(|| malformed(stem, "missing '_h' field"))?;
        let (h_str, d_str) = rest
            .split_once("_d")
            .ok_or_else(|| malformed(stem, "missing '_d' field"))?;

        let m = m_str
            .parse::<f64>()
            .map_err(|_| malformed(stem, "m is not a number"))?;
        let h = h_str
            .parse::<f64>()
            .map_err(|_| malformed(stem, "h is not a number"))?;
        if d_str.len() < 2 || !d_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed(stem, "d must be a zero-padded integer"));
        }
        let d = d_str
            .parse::<u32>()
            .map_err(|_| malformed(stem, "d out of range"))?;

        let key = Self { m, h, d };
        if key.stem() != stem {
            return Err(malformed(stem, "not in canonical form"));
        }
        Ok(key)
    }

    /// Parse a raw recording stem, returning the key and repetition index.
    pub fn parse_raw(stem: &str) -> Result<(Self, usize), KeyError> {
        let (base, rep) = stem
            .rsplit_once("_r")
            .ok_or_else(|| malformed(stem, "missing '_r' repetition field"))?;
        if rep.len() < 2 || !rep.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed(stem, "repetition must be a zero-padded integer"));
        }
        let rep = rep
            .parse::<usize>()
            .map_err(|_| malformed(stem, "repetition out of range"))?;
        Ok((Self::parse(base)?, rep))
    }

    /// Parse a thresholded dataset stem, returning the key and threshold.
    pub fn parse_thresholded(stem: &str) -> Result<(Self, f64), KeyError> {
        let (base, th) = stem
            .rsplit_once("_th")
            .ok_or_else(|| malformed(stem, "missing '_th' threshold field"))?;
        let threshold = th
            .parse::<f64>()
            .map_err(|_| malformed(stem, "threshold is not a number"))?;
        if format_threshold(threshold) != th {
            return Err(malformed(stem, "threshold not in canonical form"));
        }
        Ok((Self::parse(base)?, threshold))
    }

    /// Total order on (m, h, d) for stable listings
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.m
            .total_cmp(&other.m)
            .then(self.h.total_cmp(&other.h))
            .then(self.d.cmp(&other.d))
    }
}

impl fmt::Display for ExperimentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stem())
    }
}

fn group_prefix(m: f64, h: f64) -> String {
    format!("m{:.5}_h{}_", m, format_scientific(h))
}

/// All distances recorded for one (m, h) pair
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentGroup {
    pub m: f64,
    pub h: f64,
    pub d_list: Vec<u32>,
}

impl ExperimentGroup {
    pub fn prefix(&self) -> String {
        group_prefix(self.m, self.h)
    }

    pub fn key(&self, d: u32) -> ExperimentKey {
        ExperimentKey::new(self.m, self.h, d)
    }
}

/// Named dynamical states, name -> (m, h)
///
/// Built once from configuration and passed to whoever needs it.
#[derive(Debug, Clone)]
pub struct StateTable {
    states: Vec<StateConfig>,
}

impl Default for StateTable {
    fn default() -> Self {
        Self::new(default_states())
    }
}

impl StateTable {
    pub fn new(states: Vec<StateConfig>) -> Self {
        Self { states }
    }

    pub fn get(&self, name: &str) -> Option<(f64, f64)> {
        self.states
            .iter()
            .find(|s| s.name == name)
            .map(|s| (s.m, s.h))
    }

    /// Experiment key of state `name` at distance `d`
    pub fn key(&self, name: &str, d: u32) -> Option<ExperimentKey> {
        self.get(name).map(|(m, h)| ExperimentKey::new(m, h, d))
    }

    /// Name of the state whose (m, h) spells the same file prefix as `key`
    pub fn name_of(&self, key: &ExperimentKey) -> Option<&str> {
        let prefix = key.group_prefix();
        self.states
            .iter()
            .find(|s| group_prefix(s.m, s.h) == prefix)
            .map(|s| s.name.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scientific_format() {
        assert_eq!(format_scientific(2e-4), "2.000e-04");
        assert_eq!(format_scientific(2e-6), "2.000e-06");
        assert_eq!(format_scientific(15.0), "1.500e+01");
        assert_eq!(format_scientific(1.0), "1.000e+00");
    }

    #[test]
    fn test_stem_spelling() {
        let key = ExperimentKey::new(0.9, 2e-4, 8);
        assert_eq!(key.stem(), "m0.90000_h2.000e-04_d08");
        assert_eq!(key.raw_stem(3), "m0.90000_h2.000e-04_d08_r03");
        assert_eq!(key.thresholded_stem(3.0), "m0.90000_h2.000e-04_d08_th3.0");
        assert_eq!(key.group_prefix(), "m0.90000_h2.000e-04_");
    }

    #[test]
    fn test_parse_inverts_format() {
        for key in [
            ExperimentKey::new(0.999, 2e-6, 2),
            ExperimentKey::new(0.0, 2e-3, 10),
            ExperimentKey::new(0.98, 4e-5, 6),
        ] {
            assert_eq!(ExperimentKey::parse(&key.stem()).unwrap(), key);
            let (parsed, rep) = ExperimentKey::parse_raw(&key.raw_stem(12)).unwrap();
            assert_eq!((parsed, rep), (key, 12));
            let (parsed, th) = ExperimentKey::parse_thresholded(&key.thresholded_stem(2.5)).unwrap();
            assert_eq!((parsed, th), (key, 2.5));
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ExperimentKey::parse("m0.9_h2.000e-04_d08").is_err());
        assert!(ExperimentKey::parse("m0.90000_h2e-4_d08").is_err());
        assert!(ExperimentKey::parse("m0.90000_h2.000e-04_d8").is_err());
        assert!(ExperimentKey::parse("x0.90000_h2.000e-04_d08").is_err());
        assert!(ExperimentKey::parse_raw("m0.90000_h2.000e-04_d08").is_err());
        assert!(ExperimentKey::parse_thresholded("m0.90000_h2.000e-04_d08_th3").is_err());
    }

    #[test]
    fn test_state_table() {
        let table = StateTable::default();
        assert_eq!(table.len(), 5);
        assert_eq!(table.get("critical"), Some((0.999, 2e-6)));
        assert!(table.get("chaotic").is_none());

        let key = table.key("subcritical", 4).unwrap();
        assert_eq!(key.stem(), "m0.90000_h2.000e-04_d04");
        assert_eq!(table.name_of(&key), Some("subcritical"));
        assert_eq!(table.name_of(&ExperimentKey::new(0.5, 1e-3, 4)), None);
    }
}
