//! Configuration validation
//!
//! Checks ranges and cross-field consistency of a loaded configuration.
//! All violations are collected into a single error.

use std::collections::HashSet;

use avalanche_core::{DataType, EventMode};

use crate::{AvalancheConfig, ConfigError, ConfigResult};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
    DuplicateState { name: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
            Self::DuplicateState { name } => {
                write!(f, "State '{}' is defined more than once", name)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation
pub fn validate_config(config: &AvalancheConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_analysis(config, &mut errors);
    validate_filter(config, &mut errors);
    validate_fitting(config, &mut errors);
    validate_states(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn invalid(errors: &mut Vec<ConfigValidationError>, field: &str, reason: &str) {
    errors.push(ConfigValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    });
}

fn validate_analysis(config: &AvalancheConfig, errors: &mut Vec<ConfigValidationError>) {
    let analysis = &config.analysis;

    if !analysis.threshold.is_finite() || analysis.threshold < 0.0 {
        invalid(errors, "analysis.threshold", "must be finite and non-negative");
    }

    if analysis.binsizes.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "analysis.binsizes".to_string(),
        });
    } else if analysis.binsizes.contains(&0) {
        invalid(errors, "analysis.binsizes", "every binsize must be >= 1");
    }

    if analysis.reps == Some(0) {
        invalid(errors, "analysis.reps", "must be >= 1 when set");
    }

    if analysis.datatypes.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "analysis.datatypes".to_string(),
        });
    }
    for datatype in &analysis.datatypes {
        if datatype.parse::<DataType>().is_err() {
            invalid(
                errors,
                "analysis.datatypes",
                &format!("unknown data type '{}' (expected 'coarse' or 'sub')", datatype),
            );
        }
    }

    if analysis.event_mode.parse::<EventMode>().is_err() {
        invalid(errors, "analysis.event_mode", "must be 'excess' or 'peak'");
    }
}

fn validate_filter(config: &AvalancheConfig, errors: &mut Vec<ConfigValidationError>) {
    let filter = &config.filter;
    if !filter.enabled {
        return;
    }

    if !(filter.sample_rate_hz.is_finite() && filter.sample_rate_hz > 0.0) {
        invalid(errors, "filter.sample_rate_hz", "must be positive");
        return;
    }
    if !(filter.low_cut_hz > 0.0 && filter.low_cut_hz < filter.high_cut_hz) {
        invalid(errors, "filter.low_cut_hz", "must satisfy 0 < low_cut_hz < high_cut_hz");
    }
    if filter.high_cut_hz >= filter.sample_rate_hz / 2.0 {
        invalid(errors, "filter.high_cut_hz", "must be below the Nyquist frequency");
    }
}

fn validate_fitting(config: &AvalancheConfig, errors: &mut Vec<ConfigValidationError>) {
    let fitting = &config.fitting;

    if fitting.ps_s_min == 0 || fitting.ps_s_min >= fitting.ps_s_max {
        invalid(errors, "fitting.ps_s_min", "must satisfy 1 <= ps_s_min < ps_s_max");
    }
    if !(fitting.timestep_ms.is_finite() && fitting.timestep_ms > 0.0) {
        invalid(errors, "fitting.timestep_ms", "must be positive");
    }
    if fitting.tau_max_lag < 2 {
        invalid(errors, "fitting.tau_max_lag", "must be >= 2");
    }
}

fn validate_states(config: &AvalancheConfig, errors: &mut Vec<ConfigValidationError>) {
    let mut seen = HashSet::new();
    for state in &config.states {
        if state.name.is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: "states.name".to_string(),
            });
            continue;
        }
        if !seen.insert(state.name.as_str()) {
            errors.push(ConfigValidationError::DuplicateState {
                name: state.name.clone(),
            });
        }
        if !state.m.is_finite() || state.m < 0.0 {
            invalid(errors, &format!("states.{}.m", state.name), "must be finite and non-negative");
        }
        if !state.h.is_finite() || state.h <= 0.0 {
            invalid(errors, &format!("states.{}.h", state.name), "must be positive");
        }
    }
}
