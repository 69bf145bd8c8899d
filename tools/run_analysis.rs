// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Command-line driver for the analysis modes.
//!
//! ```text
//! run_analysis threshold --datafolder dat/ --threshold 3 --bw-filter
//! run_analysis save-ps --binsize 1,2,4,8,16,32
//! run_analysis batch --m 0.9 --h 2e-4 --d 2,4,6,8,10 --reps 50
//! ```
//!
//! Debug flags (`--debug-<crate>`, `--debug-all`) may appear anywhere.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use avalanche::analysis::{run_batch, AnalysisContext, BatchPlan, DEFAULT_D_LIST};
use avalanche::config::load_config_or_default;
use avalanche::observability::{debug_flags_help, split_debug_args, CrateDebugFlags, LoggingConfig};

#[derive(Parser, Debug)]
#[command(name = "run_analysis", version, author, about = "Neuronal avalanche analysis", after_help = debug_flags_help())]
struct Cli {
    #[command(subcommand)]
    command: Mode,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Configuration file (default: search for avalanche_configuration.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the raw recordings
    #[arg(long, global = true)]
    datafolder: Option<PathBuf>,

    /// Only datasets whose name contains this substring
    #[arg(long, global = true)]
    datamask: Option<String>,

    /// Threshold in standard deviations above the mean
    #[arg(short, long, global = true)]
    threshold: Option<f64>,

    /// Comma-separated binsizes, e.g. 1,2,4
    #[arg(short, long, global = true)]
    binsize: Option<String>,

    /// Repetitions per experiment
    #[arg(long, global = true)]
    reps: Option<usize>,

    /// Band-pass filter traces before thresholding
    #[arg(long = "bw-filter", global = true)]
    bw_filter: bool,

    /// Batch worker threads (0 = one per core)
    #[arg(long, global = true)]
    workers: Option<usize>,

    #[arg(long, global = true)]
    log_level: Option<String>,
}

impl CommonArgs {
    /// CLI overrides in the key space of `apply_cli_overrides`
    fn overrides(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        if let Some(dir) = &self.datafolder {
            map.insert("data_dir".to_string(), dir.display().to_string());
        }
        if let Some(mask) = &self.datamask {
            map.insert("mask".to_string(), mask.clone());
        }
        if let Some(threshold) = self.threshold {
            map.insert("threshold".to_string(), threshold.to_string());
        }
        if let Some(binsize) = &self.binsize {
            map.insert("binsize".to_string(), binsize.clone());
        }
        if let Some(reps) = self.reps {
            map.insert("reps".to_string(), reps.to_string());
        }
        if self.bw_filter {
            map.insert("bw_filter".to_string(), "true".to_string());
        }
        if let Some(workers) = self.workers {
            map.insert("max_workers".to_string(), workers.to_string());
        }
        if let Some(level) = &self.log_level {
            map.insert("log_level".to_string(), level.clone());
        }
        map
    }
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Threshold raw recordings and store the event datasets
    Threshold,
    /// Write p(S) tables for every thresholded dataset
    SavePs,
    /// Write m_av against distance tables per (m, h)
    SaveMav {
        /// Distances to include (default: those found on disk)
        #[arg(long, value_delimiter = ',')]
        d: Option<Vec<u32>>,
    },
    /// Fit the autocorrelation time of the stored activity
    Tau,
    /// Fit power-law exponents per binsize and their scaling
    Alpha,
    /// Threshold and save p(S) for many experiments in parallel
    Batch {
        /// Branching parameters, paired by index with --h (default: configured states)
        #[arg(long, value_delimiter = ',')]
        m: Vec<f64>,
        /// Input rates, paired by index with --m
        #[arg(long, value_delimiter = ',')]
        h: Vec<f64>,
        /// Distances crossed with every (m, h) pair
        #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_D_LIST)]
        d: Vec<u32>,
    },
}

fn main() -> ExitCode {
    let (debug_flags, args) = split_debug_args(std::env::args());
    let cli = Cli::parse_from(args);

    match run(cli, &debug_flags) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, debug_flags: &CrateDebugFlags) -> Result<ExitCode> {
    let overrides = cli.common.overrides();
    let config = load_config_or_default(cli.common.config.as_deref(), Some(&overrides))
        .context("Failed to load configuration")?;

    let logging = LoggingConfig::with_level(&config.system.log_level);
    #[cfg(feature = "file-logging")]
    let _log_guard = avalanche::observability::init_logging(debug_flags, &logging)?;
    #[cfg(not(feature = "file-logging"))]
    avalanche::observability::init_console_logging(debug_flags, &logging)?;

    let ctx = AnalysisContext::from_config(config).context("Invalid configuration")?;
    info!("Data directory: {}", ctx.layout().data_dir().display());

    match cli.command {
        Mode::Threshold => {
            let written = ctx.run_threshold()?;
            info!("Thresholded {} experiments", written.len());
        }
        Mode::SavePs => {
            let written = ctx.run_save_ps()?;
            info!("Wrote {} p(S) tables", written.len());
        }
        Mode::SaveMav { d } => {
            let written = ctx.run_save_mav(d.as_deref())?;
            info!("Wrote {} m_av tables", written.len());
        }
        Mode::Tau => {
            let fits = ctx.run_tau()?;
            info!("Fitted tau for {} experiments -> {}", fits.len(), ctx.results_log().path().display());
        }
        Mode::Alpha => {
            let fits = ctx.run_alpha()?;
            info!("Fitted alpha for {} experiments -> {}", fits.len(), ctx.results_log().path().display());
        }
        Mode::Batch { m, h, d } => {
            let (m, h) = if m.is_empty() && h.is_empty() {
                let states = &ctx.config().states;
                (states.iter().map(|s| s.m).collect(), states.iter().map(|s| s.h).collect())
            } else {
                (m, h)
            };
            let report = run_batch(&ctx, &BatchPlan::new(m, h, d))?;
            for outcome in report.failed() {
                if let Err(reason) = &outcome.result {
                    eprintln!("FAILED {}: {}", outcome.key, reason);
                }
            }
            if !report.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
