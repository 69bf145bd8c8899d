// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Avalanche Analysis
//!
//! File-level drivers on top of `avalanche-core`:
//! - **key**: typed experiment identifiers and the named-state table
//! - **store**: JSON datasets, directory layout and discovery
//! - **pipeline**: the analysis modes (threshold, save_ps, save_mav, tau, alpha)
//! - **results**: append-only log of fitted quantities
//! - **batch**: parallel fan-out of threshold + save_ps jobs

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod batch;
pub mod error;
pub mod key;
pub mod pipeline;
pub mod results;
pub mod store;

pub use batch::{run_batch, BatchPlan, BatchReport, JobOutcome, JobSummary, DEFAULT_D_LIST};
pub use error::{AnalysisError, AnalysisResult};
pub use key::{format_scientific, ExperimentGroup, ExperimentKey, KeyError, StateTable};
pub use pipeline::{AlphaSummary, AnalysisContext};
pub use results::{ResultEntry, ResultsLog};
pub use store::{DatasetLayout, RawRecording, ThresholdedDataset};
