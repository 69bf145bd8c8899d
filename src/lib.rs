// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Avalanche - neuronal avalanche statistics
//!
//! Turns simulated activity traces into avalanche statistics: thresholded
//! event trains, avalanche size distributions p(S), the branching ratio
//! m_av, the autocorrelation time tau, and power-law exponent fits.
//!
//! ## Crates
//!
//! - [`stats`] (`avalanche-core`): pure computation, no I/O
//! - [`config`] (`avalanche-config`): TOML configuration with overrides
//! - [`analysis`] (`avalanche-analysis`): datasets on disk, analysis modes, batches
//! - [`observability`] (`avalanche-observability`): logging setup
//!
//! ## Example
//!
//! ```rust
//! use avalanche::prelude::*;
//!
//! let config = ThresholdConfig::new(0.5)?;
//! let events = threshold_trace(&[0.0, 0.0, 5.0, 6.0, 0.0, 0.0, 4.0, 0.0], &config);
//! let sizes = get_s(&bin_data(&events, 1)?);
//! assert_eq!(sizes.len(), 2);
//! # Ok::<(), avalanche::stats::StatsError>(())
//! ```

pub use avalanche_analysis as analysis;
pub use avalanche_config as config;
pub use avalanche_core as stats;
pub use avalanche_observability as observability;

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use avalanche_core::{
        bin_data, fit_power_law, get_durations, get_s, linear_regression, m_avalanche,
        tau_linear, threshold_trace, BandPass, DataType, EventMode, FitResult, FitWindow,
        SizeDistribution, ThresholdConfig,
    };

    pub use avalanche_analysis::{
        run_batch, AnalysisContext, BatchPlan, ExperimentKey, StateTable,
    };

    pub use avalanche_config::{load_config_or_default, AvalancheConfig};
}
