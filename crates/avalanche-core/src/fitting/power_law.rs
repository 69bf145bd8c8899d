// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Power-law fits on log-log axes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::regression::linear_regression;
use crate::distribution::SizeDistribution;
use crate::types::{FitResult, Result, StatsError};

/// Inclusive size range used for the p(S) power-law fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitWindow {
    pub s_min: u64,
    pub s_max: u64,
}

impl Default for FitWindow {
    fn default() -> Self {
        Self { s_min: 5, s_max: 64 }
    }
}

impl FitWindow {
    pub fn new(s_min: u64, s_max: u64) -> Result<Self> {
        if s_min == 0 || s_min >= s_max {
            return Err(StatsError::InvalidFitWindow { s_min, s_max });
        }
        Ok(Self { s_min, s_max })
    }

    pub fn contains(&self, s: u64) -> bool {
        (self.s_min..=self.s_max).contains(&s)
    }
}

/// Fit `log p = slope * log S + c` over the sizes inside `window`.
///
/// Sizes with zero or non-finite probability are skipped. The estimate is
/// the slope (about -1.5 at criticality), with its standard error.
pub fn fit_power_law(sizes: &[u64], probabilities: &[f64], window: FitWindow) -> FitResult {
    let (log_s, log_p): (Vec<f64>, Vec<f64>) = sizes
        .iter()
        .zip(probabilities)
        .filter(|&(&s, &p)| window.contains(s) && p > 0.0 && p.is_finite())
        .map(|(&s, &p)| ((s as f64).ln(), p.ln()))
        .unzip();

    match linear_regression(&log_s, &log_p) {
        Some(fit) => fit.slope_result(),
        None => {
            debug!(
                "power-law fit skipped: {} usable points in [{}, {}]",
                log_s.len(),
                window.s_min,
                window.s_max
            );
            FitResult::insufficient(log_s.len())
        }
    }
}

impl SizeDistribution {
    /// Power-law fit of the mean p(S).
    pub fn fit_power_law(&self, window: FitWindow) -> FitResult {
        let mean = self.mean().to_vec();
        fit_power_law(self.sizes(), &mean, window)
    }
}

/// Scaling of the size exponent with temporal resolution.
///
/// `points` holds `(binsize, alpha)` pairs with `alpha = -slope` of each
/// binsize's p(S) fit. Returns the slope of log alpha against log binsize.
/// Non-positive or NaN alphas (failed fits) are skipped.
pub fn fit_alpha_scaling(points: &[(usize, f64)]) -> FitResult {
    let (log_b, log_alpha): (Vec<f64>, Vec<f64>) = points
        .iter()
        .filter(|&&(b, alpha)| b > 0 && alpha > 0.0 && alpha.is_finite())
        .map(|&(b, alpha)| ((b as f64).ln(), alpha.ln()))
        .unzip();

    match linear_regression(&log_b, &log_alpha) {
        Some(fit) => fit.slope_result(),
        None => FitResult::insufficient(log_b.len()),
    }
}
