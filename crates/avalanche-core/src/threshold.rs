// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Activity trace -> thresholded event trace
//!
//! ```text
//! line = mean + threshold × std          (population std, ddof = 0)
//!
//! Excess:  out[t] = ceil(x[t] - line)    if x[t] > line
//!                   0                    otherwise
//! Peak:    out[t] = 1 at the maximum of every maximal run with x > line
//! ```
//!
//! Flat, empty or non-finite traces produce an all-zero output of the same
//! length.

use tracing::trace;

use crate::types::{EventMode, ThresholdConfig, ThresholdedTrace};

/// Relative tolerance under which a trace counts as having zero variance.
const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;

/// Mean and population standard deviation of a trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceStatistics {
    pub mean: f64,
    pub std: f64,
}

impl TraceStatistics {
    /// True when the trace carries no usable fluctuation.
    pub fn is_degenerate(&self) -> bool {
        !self.mean.is_finite()
            || !self.std.is_finite()
            || self.std <= ZERO_VARIANCE_TOLERANCE * self.mean.abs().max(1.0)
    }
}

/// Mean and population standard deviation; `None` for an empty trace.
pub fn trace_statistics(trace: &[f64]) -> Option<TraceStatistics> {
    if trace.is_empty() {
        return None;
    }
    let n = trace.len() as f64;
    let mean = trace.iter().sum::<f64>() / n;
    let variance = trace.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(TraceStatistics {
        mean,
        std: variance.sqrt(),
    })
}

/// Threshold a trace according to `config`.
pub fn threshold_trace(trace: &[f64], config: &ThresholdConfig) -> ThresholdedTrace {
    let mut out = vec![0u32; trace.len()];

    let raw_is_flat = trace_statistics(trace).map_or(true, |s| s.is_degenerate());
    if raw_is_flat {
        trace!("thresholding skipped: degenerate trace of length {}", trace.len());
        return out;
    }

    let filtered;
    let signal: &[f64] = match &config.filter {
        Some(filter) => {
            filtered = filter.apply(trace);
            &filtered
        }
        None => trace,
    };

    let stats = match trace_statistics(signal) {
        Some(stats) if !stats.is_degenerate() => stats,
        _ => return out,
    };
    let line = stats.mean + config.threshold * stats.std;

    match config.event_mode {
        EventMode::Excess => {
            for (slot, &value) in out.iter_mut().zip(signal) {
                if value > line {
                    *slot = excess_events(value - line);
                }
            }
        }
        EventMode::Peak => {
            let mut run_peak: Option<usize> = None;
            for (t, &value) in signal.iter().enumerate() {
                if value > line {
                    run_peak = match run_peak {
                        Some(p) if signal[p] >= value => Some(p),
                        _ => Some(t),
                    };
                } else if let Some(p) = run_peak.take() {
                    out[p] = 1;
                }
            }
            if let Some(p) = run_peak {
                out[p] = 1;
            }
        }
    }

    out
}

#[inline]
fn excess_events(excess: f64) -> u32 {
    // excess > 0 here, so ceil is >= 1
    excess.ceil().min(u32::MAX as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::BandPass;

    fn config(threshold: f64) -> ThresholdConfig {
        ThresholdConfig::new(threshold).unwrap()
    }

    #[test]
    fn test_constant_trace_is_all_zero() {
        let out = threshold_trace(&[4.0; 50], &config(2.0));
        assert_eq!(out, vec![0; 50]);
    }

    #[test]
    fn test_constant_trace_with_filter_is_all_zero() {
        let cfg = config(2.0).with_filter(BandPass::default());
        let out = threshold_trace(&[0.1; 64], &cfg);
        assert_eq!(out, vec![0; 64]);
    }

    #[test]
    fn test_filter_removes_drifting_baseline() {
        // 0.5 Hz drift of amplitude 50 at 500 Hz, 3-sample bursts of 100
        // every 100 samples. Bursts at t = 750 and 1750 ride the trough.
        let centers: Vec<usize> = (0..20).map(|i| 50 + 100 * i).collect();
        let trace: Vec<f64> = (0..2000)
            .map(|t| {
                let drift = 50.0 * (2.0 * std::f64::consts::PI * t as f64 / 1000.0).sin();
                let burst = if centers.iter().any(|&c| t + 1 >= c && t <= c + 1) { 100.0 } else { 0.0 };
                drift + burst
            })
            .collect();

        let unfiltered = threshold_trace(&trace, &config(2.0));
        assert_eq!(unfiltered[750], 0);
        assert_eq!(unfiltered[1750], 0);

        let band = BandPass::new(500.0, 5.0, 200.0).unwrap();
        let filtered = threshold_trace(&trace, &config(2.0).with_filter(band));
        for &c in &centers {
            assert!(filtered[c] > 0, "burst at {} missed after filtering", c);
        }
        assert_eq!(filtered.len(), trace.len());
    }

    #[test]
    fn test_empty_trace() {
        assert!(threshold_trace(&[], &config(3.0)).is_empty());
    }

    #[test]
    fn test_excess_over_line() {
        // mean = 1, std = 3 -> line at threshold 1 is 4
        let trace = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0, 0.0];
        let stats = trace_statistics(&trace).unwrap();
        assert!((stats.mean - 1.0).abs() < 1e-12);
        assert!((stats.std - 3.0).abs() < 1e-12);

        let out = threshold_trace(&trace, &config(1.0));
        assert_eq!(out, vec![0, 0, 0, 0, 0, 0, 0, 0, 6, 0]);
    }

    #[test]
    fn test_small_excess_still_counts() {
        let trace = [0.0, 0.0, 0.0, 1.0];
        // mean 0.25, std ~0.433, threshold 0 -> line 0.25
        let out = threshold_trace(&trace, &config(0.0));
        assert_eq!(out, vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_peak_mode_one_event_per_excursion() {
        let trace = [0.0, 5.0, 9.0, 6.0, 0.0, 0.0, 8.0, 0.0, 0.0, 0.0, 7.0];
        let cfg = config(0.5).with_event_mode(EventMode::Peak);
        let out = threshold_trace(&trace, &cfg);
        assert_eq!(out, vec![0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1]);
    }

    #[test]
    fn test_non_finite_trace_is_all_zero() {
        let out = threshold_trace(&[1.0, f64::NAN, 2.0], &config(1.0));
        assert_eq!(out, vec![0, 0, 0]);
    }
}
