// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Branching ratio and autocorrelation timescale
//!
//! ```text
//! m_av:  slope of b[t+1] against b[t]
//! r_k:   slope of a[t+k] against a[t],  k = 1..=max_lag
//!        r_k ≈ b · m^k  =>  ln r_k = ln b + k · ln m
//! tau:   -dt / ln m
//! ```

use tracing::debug;

use super::regression::linear_regression;
use crate::types::{BranchingEstimate, FitResult};

/// Branching ratio of a binned trace from the lag-one regression.
pub fn m_avalanche(binned: &[u64]) -> FitResult {
    if binned.len() < 3 {
        return FitResult::insufficient(binned.len().saturating_sub(1));
    }
    let x: Vec<f64> = binned[..binned.len() - 1].iter().map(|&v| v as f64).collect();
    let y: Vec<f64> = binned[1..].iter().map(|&v| v as f64).collect();

    match linear_regression(&x, &y) {
        Some(fit) => fit.slope_result(),
        None => FitResult::insufficient(x.len()),
    }
}

/// Characteristic time implied by a branching ratio.
///
/// NaN for `m <= 0` (no decay curve), infinite for `m >= 1`.
pub fn tau_from_branching(m: f64, dt: f64) -> f64 {
    if m.is_nan() || m <= 0.0 {
        f64::NAN
    } else if m >= 1.0 {
        f64::INFINITY
    } else {
        -dt / m.ln()
    }
}

/// m_av of a binned trace together with its timescale in units of `bin_width`.
pub fn branching_estimate(binned: &[u64], bin_width: f64) -> BranchingEstimate {
    let m_av = m_avalanche(binned).estimate;
    BranchingEstimate {
        m_av,
        tau: tau_from_branching(m_av, bin_width),
    }
}

/// Autocorrelation timescale of an activity trace.
///
/// Fits the exponential decay of the lag-k regression slopes on log-linear
/// axes. The estimate is in the units of `dt`; its error is propagated from
/// the slope error. A non-decaying curve gives an infinite estimate.
pub fn tau_linear(activity: &[f64], dt: f64, max_lag: usize) -> FitResult {
    let mut lags = Vec::with_capacity(max_lag);
    let mut log_r = Vec::with_capacity(max_lag);

    for k in 1..=max_lag {
        if k + 2 > activity.len() {
            break;
        }
        let x = &activity[..activity.len() - k];
        let y = &activity[k..];
        if let Some(fit) = linear_regression(x, y) {
            if fit.slope > 0.0 && fit.slope.is_finite() {
                lags.push(k as f64);
                log_r.push(fit.slope.ln());
            }
        }
    }

    let Some(fit) = linear_regression(&lags, &log_r) else {
        debug!("tau fit skipped: {} usable lags", lags.len());
        return FitResult::insufficient(lags.len());
    };

    if fit.slope >= 0.0 {
        return FitResult::new(f64::INFINITY, f64::NAN, fit.n_points);
    }
    let tau = -dt / fit.slope;
    let tau_error = dt * fit.slope_std_error / (fit.slope * fit.slope);
    FitResult::new(tau, tau_error, fit.n_points)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic AR(1)-like sequence a[t+1] = m·a[t] + h with
    /// pseudo-random kicks, so lag regressions are well conditioned.
    fn ar1(m: f64, len: usize) -> Vec<f64> {
        let mut state = 12345u64;
        let mut a = 0.0;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let kick = ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5;
                a = m * a + kick;
                a
            })
            .collect()
    }

    #[test]
    fn test_m_av_of_geometric_cascade() {
        // b[t+1] = 0.5 · b[t]
        let binned = [64, 32, 16, 8, 4, 2, 1];
        let fit = m_avalanche(&binned);
        assert!(fit.is_valid());
        assert!((fit.estimate - 0.5).abs() < 1e-12, "m = {}", fit.estimate);
        assert_eq!(fit.n_points, 6);
    }

    #[test]
    fn test_m_av_insufficient() {
        assert!(!m_avalanche(&[1, 2]).is_valid());
        assert!(!m_avalanche(&[0, 0, 0, 0]).is_valid());
    }

    #[test]
    fn test_tau_from_branching() {
        let tau = tau_from_branching((-1.0f64).exp(), 2.0);
        assert!((tau - 2.0).abs() < 1e-12);
        assert!(tau_from_branching(0.0, 2.0).is_nan());
        assert_eq!(tau_from_branching(1.0, 2.0), f64::INFINITY);
    }

    #[test]
    fn test_tau_linear_recovers_ar1_timescale() {
        let m = 0.9;
        let activity = ar1(m, 20_000);
        let fit = tau_linear(&activity, 2.0, 10);
        let expected = tau_from_branching(m, 2.0);
        assert!(fit.is_valid());
        assert!(
            (fit.estimate - expected).abs() / expected < 0.2,
            "tau = {}, expected {}",
            fit.estimate,
            expected
        );
    }

    #[test]
    fn test_tau_linear_flat_trace() {
        assert!(!tau_linear(&[1.0; 100], 2.0, 10).is_valid());
        assert!(!tau_linear(&[], 2.0, 10).is_valid());
    }

    #[test]
    fn test_branching_estimate() {
        let est = branching_estimate(&[0, 0, 0], 4.0);
        assert!(est.m_av.is_nan());
        assert!(est.tau.is_nan());
    }
}
