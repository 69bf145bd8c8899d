// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for the analysis binaries
//!
//! Console logging is always available. With the `file-logging` feature,
//! each run additionally writes per-crate and combined JSON logs into a
//! timestamped folder, with configurable retention.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingConfig};

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn env_filter(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<EnvFilter> {
    let filter = debug_flags.to_filter_string(&config.level);
    EnvFilter::try_new(&filter).with_context(|| format!("Invalid log filter: {}", filter))
}

fn console_layer(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<BoxedLayer> {
    let filter = env_filter(debug_flags, config)?;
    let layer = match config.format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_filter(filter)
            .boxed(),
    };
    Ok(layer)
}

/// Initialize console logging only
///
/// # Errors
///
/// Fails when the level string is not a valid filter or a global
/// subscriber is already installed.
pub fn init_console_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<()> {
    let layer = console_layer(debug_flags, config)?;
    Registry::default()
        .with(layer)
        .try_init()
        .context("Failed to install tracing subscriber")
}

/// Logging initialization result
#[cfg(feature = "file-logging")]
pub struct LoggingGuard {
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: PathBuf,
}

#[cfg(feature = "file-logging")]
impl LoggingGuard {
    /// Get the log directory path
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

/// Initialize logging with file output and console output
///
/// Creates a timestamped folder structure:
/// ```text
/// ./logs/
///   └── run_20250101_120000/
///       ├── avalanche-core.log
///       ├── avalanche-analysis.log
///       └── avalanche.log (combined)
/// ```
///
/// Keep the returned guard alive for the lifetime of the program; dropping
/// it flushes the file writers.
#[cfg(feature = "file-logging")]
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<LoggingGuard> {
    use tracing_appender::rolling;

    let base_log_dir = config
        .log_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("./logs"));

    let run_folder = base_log_dir.join(run_folder_name(Utc::now()));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

    cleanup_old_logs(&base_log_dir, config.retention_days, config.retention_runs)?;

    let mut layers = vec![console_layer(debug_flags, config)?];
    let mut file_guards = Vec::new();

    // One file per crate
    for crate_name in crate::KNOWN_CRATES {
        let file_appender = rolling::daily(&run_folder, format!("{}.log", crate_name));
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        file_guards.push(guard);

        let target = crate_name.replace('-', "_");
        let crate_filter = EnvFilter::try_new(format!("{}=debug,off", target))
            .with_context(|| format!("Invalid log filter for {}", crate_name))?;

        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(crate_filter)
                .boxed(),
        );
    }

    // Combined log file (all crates)
    let combined_appender = rolling::daily(&run_folder, "avalanche.log");
    let (combined_non_blocking, combined_guard) = tracing_appender::non_blocking(combined_appender);
    file_guards.push(combined_guard);

    layers.push(
        tracing_subscriber::fmt::layer()
            .with_writer(combined_non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(env_filter(debug_flags, config)?)
            .boxed(),
    );

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LoggingGuard {
        _file_guards: file_guards,
        log_dir: run_folder,
    })
}

/// Folder name for a run started at `started`, e.g. `run_20250101_120000`
pub fn run_folder_name(started: DateTime<Utc>) -> String {
    format!("{}{}", RUN_PREFIX, started.format(RUN_TIMESTAMP_FORMAT))
}

fn parse_run_folder_name(dir_name: &str) -> Option<DateTime<Utc>> {
    let timestamp_str = dir_name.strip_prefix(RUN_PREFIX)?;
    NaiveDateTime::parse_from_str(timestamp_str, RUN_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Clean up old run folders under `base_log_dir`
///
/// Folders older than `retention_days` are removed first; afterwards only
/// the newest `retention_runs` folders are kept. Entries that do not look
/// like run folders are left alone. Returns the number of folders removed.
pub fn cleanup_old_logs(
    base_log_dir: &Path,
    retention_days: u64,
    retention_runs: usize,
) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    let cutoff_date = Utc::now() - chrono::Duration::days(retention_days as i64);

    let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let started = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_run_folder_name);
        if let Some(dt) = started {
            runs.push((path, dt));
        }
    }

    // Oldest first
    runs.sort_by_key(|(_, dt)| *dt);

    let (expired, kept): (Vec<_>, Vec<_>) = runs.into_iter().partition(|(_, dt)| *dt < cutoff_date);
    let excess = kept.len().saturating_sub(retention_runs);

    let mut removed_count = 0;
    for (path, _) in expired.iter().chain(kept.iter().take(excess)) {
        if let Err(e) = std::fs::remove_dir_all(path) {
            eprintln!("Warning: Failed to remove old log directory {}: {}", path.display(), e);
        } else {
            removed_count += 1;
        }
    }

    Ok(removed_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_run_folder_name_round_trip() {
        let now = Utc::now();
        let name = run_folder_name(now);
        let parsed = parse_run_folder_name(&name).unwrap();
        assert_eq!(parsed.timestamp(), now.timestamp());
        assert!(parse_run_folder_name("notes").is_none());
    }

    #[test]
    fn test_cleanup_keeps_newest_runs() {
        let dir = tempdir().unwrap();
        let now = Utc::now();
        for hours in 1..=5 {
            let started = now - chrono::Duration::hours(hours);
            std::fs::create_dir(dir.path().join(run_folder_name(started))).unwrap();
        }
        std::fs::create_dir(dir.path().join("keep_me")).unwrap();

        let removed = cleanup_old_logs(dir.path(), 30, 2).unwrap();
        assert_eq!(removed, 3);

        let remaining: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(remaining.len(), 3);
        assert!(dir.path().join("keep_me").exists());
        assert!(dir.path().join(run_folder_name(now - chrono::Duration::hours(1))).exists());
    }

    #[test]
    fn test_cleanup_removes_expired_runs() {
        let dir = tempdir().unwrap();
        let old = Utc::now() - chrono::Duration::days(40);
        std::fs::create_dir(dir.path().join(run_folder_name(old))).unwrap();

        assert_eq!(cleanup_old_logs(dir.path(), 30, 10).unwrap(), 1);
    }

    #[test]
    fn test_cleanup_missing_dir() {
        let dir = tempdir().unwrap();
        assert_eq!(cleanup_old_logs(&dir.path().join("absent"), 30, 10).unwrap(), 0);
    }

    #[test]
    fn test_invalid_level_is_reported() {
        let config = LoggingConfig::with_level("avalanche=loud");
        assert!(env_filter(&CrateDebugFlags::default(), &config).is_err());
    }
}
