// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{AvalancheConfig, ConfigError, ConfigResult};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "avalanche_configuration.toml";

/// Find the configuration file
///
/// Search order:
/// 1. `AVALANCHE_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("AVALANCHE_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by AVALANCHE_CONFIG_PATH not found: {}",
                path.display()
            )));
        }
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet AVALANCHE_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found, contains invalid TOML, or an
/// override value cannot be parsed
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<AvalancheConfig> {
    let config_file = if let Some(path) = config_path {
        path.to_path_buf()
    } else {
        find_config_file()?
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: AvalancheConfig = toml::from_str(&content)?;

    apply_overrides(&mut config, cli_args)?;
    Ok(config)
}

/// Like [`load_config`], but falls back to built-in defaults when no file
/// is given and none is found by the search.
pub fn load_config_or_default(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<AvalancheConfig> {
    if config_path.is_some() {
        return load_config(config_path, cli_args);
    }
    match find_config_file() {
        Ok(path) => load_config(Some(&path), cli_args),
        Err(ConfigError::FileNotFound(_)) => {
            let mut config = AvalancheConfig::default();
            apply_overrides(&mut config, cli_args)?;
            Ok(config)
        }
        Err(e) => Err(e),
    }
}

fn apply_overrides(
    config: &mut AvalancheConfig,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<()> {
    apply_environment_overrides(config)?;
    if let Some(cli) = cli_args {
        apply_cli_overrides(config, cli)?;
    }
    Ok(())
}

/// Parse a comma-separated binsize list such as `"1,2,4"`.
pub fn parse_binsizes(value: &str) -> ConfigResult<Vec<usize>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| ConfigError::InvalidValue(format!("binsize '{}' is not an integer", s)))
        })
        .collect()
}

fn parse_bool(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(format!("{} = '{}'", key, value)))
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `AVALANCHE_DATA_DIR` -> `system.data_dir`
/// - `AVALANCHE_LOG_LEVEL` -> `system.log_level`
/// - `AVALANCHE_MAX_WORKERS` -> `system.max_workers`
/// - `AVALANCHE_THRESHOLD` -> `analysis.threshold`
/// - `AVALANCHE_BINSIZES` -> `analysis.binsizes` (comma-separated)
/// - `AVALANCHE_BW_FILTER` -> `filter.enabled`
pub fn apply_environment_overrides(config: &mut AvalancheConfig) -> ConfigResult<()> {
    if let Ok(value) = env::var("AVALANCHE_DATA_DIR") {
        config.system.data_dir = PathBuf::from(value);
    }
    if let Ok(value) = env::var("AVALANCHE_LOG_LEVEL") {
        config.system.log_level = value;
    }
    if let Ok(value) = env::var("AVALANCHE_MAX_WORKERS") {
        config.system.max_workers = parse_number("AVALANCHE_MAX_WORKERS", &value)?;
    }
    if let Ok(value) = env::var("AVALANCHE_THRESHOLD") {
        config.analysis.threshold = parse_number("AVALANCHE_THRESHOLD", &value)?;
    }
    if let Ok(value) = env::var("AVALANCHE_BINSIZES") {
        config.analysis.binsizes = parse_binsizes(&value)?;
    }
    if let Ok(value) = env::var("AVALANCHE_BW_FILTER") {
        config.filter.enabled = parse_bool(&value);
    }
    Ok(())
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"threshold": "2.5", "binsize": "1,2,4"}`)
pub fn apply_cli_overrides(
    config: &mut AvalancheConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    if let Some(value) = cli_args.get("data_dir") {
        config.system.data_dir = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("log_level") {
        config.system.log_level = value.clone();
    }
    if let Some(value) = cli_args.get("max_workers") {
        config.system.max_workers = parse_number("max_workers", value)?;
    }
    if let Some(value) = cli_args.get("threshold") {
        config.analysis.threshold = parse_number("threshold", value)?;
    }
    if let Some(value) = cli_args.get("binsize") {
        config.analysis.binsizes = parse_binsizes(value)?;
    }
    if let Some(value) = cli_args.get("reps") {
        config.analysis.reps = Some(parse_number("reps", value)?);
    }
    if let Some(value) = cli_args.get("mask") {
        config.analysis.mask = Some(value.clone());
    }
    if let Some(value) = cli_args.get("bw_filter") {
        config.filter.enabled = parse_bool(value);
    }
    Ok(())
}
