// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Avalanche Statistics Core
//!
//! Pure computation over already-simulated activity traces:
//! - **Filter**: zero-phase Butterworth band-pass pre-filter
//! - **Threshold**: activity trace -> integer event trace
//! - **Binning**: event trace -> fixed-width time bins
//! - **Avalanche**: binned trace -> avalanche sizes (and durations)
//! - **Distribution**: sizes per repetition -> p(S) mean/std
//! - **Fitting**: power-law exponent, branching ratio m_av, timescale tau
//!
//! Nothing here touches the filesystem. Degenerate inputs (flat traces,
//! empty windows) resolve to defined sentinel outputs instead of errors so
//! that batch callers can keep going.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod types;

pub mod avalanche;
pub mod binning;
pub mod distribution;
pub mod filter;
pub mod fitting;
pub mod threshold;

pub use types::{
    ActivityTrace, AvalancheSizeList, BinnedTrace, BranchingEstimate, DataType, EventMode,
    FitResult, LinearFit, Result, StatsError, ThresholdConfig, ThresholdedTrace,
};

pub use avalanche::{get_durations, get_s};
pub use binning::bin_data;
pub use distribution::SizeDistribution;
pub use filter::BandPass;
pub use fitting::{
    branching_estimate, fit_alpha_scaling, fit_power_law, linear_regression, m_avalanche,
    tau_from_branching, tau_linear, FitWindow,
};
pub use threshold::{threshold_trace, trace_statistics, TraceStatistics};
