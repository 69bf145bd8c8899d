// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fit summaries.

use serde::{Deserialize, Serialize};

/// Scalar estimate with its standard error.
///
/// An estimator that had fewer than two usable points returns
/// [`FitResult::insufficient`]: both fields NaN, `n_points` still reporting
/// how many points were usable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub estimate: f64,
    pub std_error: f64,
    pub n_points: usize,
}

impl FitResult {
    pub fn new(estimate: f64, std_error: f64, n_points: usize) -> Self {
        Self {
            estimate,
            std_error,
            n_points,
        }
    }

    pub fn insufficient(n_points: usize) -> Self {
        Self {
            estimate: f64::NAN,
            std_error: f64::NAN,
            n_points,
        }
    }

    /// False for the insufficient-data sentinel.
    pub fn is_valid(&self) -> bool {
        !self.estimate.is_nan()
    }
}

/// Ordinary least squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Standard error of the slope; 0 for an exact two-point fit
    pub slope_std_error: f64,
    pub n_points: usize,
}

impl LinearFit {
    pub fn slope_result(&self) -> FitResult {
        FitResult::new(self.slope, self.slope_std_error, self.n_points)
    }
}

/// Branching ratio of one repetition with its characteristic time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BranchingEstimate {
    pub m_av: f64,
    /// -dt / ln(m_av), in the units of `dt`
    pub tau: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_is_nan() {
        let fit = FitResult::insufficient(1);
        assert!(!fit.is_valid());
        assert!(fit.std_error.is_nan());
        assert_eq!(fit.n_points, 1);
    }
}
