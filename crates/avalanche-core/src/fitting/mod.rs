// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Estimators
//!
//! Every estimator reduces to an ordinary least squares line:
//! - power-law exponent: log p(S) against log S over a size window
//! - branching ratio m_av: b[t+1] against b[t]
//! - timescale tau: ln r_k against lag k
//! - alpha scaling: log alpha against log binsize
//!
//! Fewer than two usable points yields [`FitResult::insufficient`](crate::FitResult::insufficient),
//! never a panic.

pub mod branching;
pub mod power_law;
pub mod regression;

pub use branching::{branching_estimate, m_avalanche, tau_from_branching, tau_linear};
pub use power_law::{fit_alpha_scaling, fit_power_law, FitWindow};
pub use regression::linear_regression;
