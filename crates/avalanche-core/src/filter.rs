// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Zero-phase Butterworth band-pass pre-filter
//!
//! ```text
//! band-pass = high-pass(low_cut) -> low-pass(high_cut)
//!     each stage: 2nd-order Butterworth biquad (Q = 1/sqrt(2)),
//!                 bilinear-transform coefficients
//! zero phase: run the cascade forward, then over the reversed output
//! ```
//!
//! The trace is de-meaned first, so slow offsets never produce a start-up
//! transient and a constant trace filters to exactly zero.

use core::f64::consts::{FRAC_1_SQRT_2, PI};

use serde::{Deserialize, Serialize};

use crate::types::{Result, StatsError};

/// Band-pass filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandPass {
    pub sample_rate_hz: f64,
    pub low_cut_hz: f64,
    pub high_cut_hz: f64,
}

impl Default for BandPass {
    fn default() -> Self {
        // 2 ms simulation timestep
        Self {
            sample_rate_hz: 500.0,
            low_cut_hz: 0.1,
            high_cut_hz: 200.0,
        }
    }
}

impl BandPass {
    pub fn new(sample_rate_hz: f64, low_cut_hz: f64, high_cut_hz: f64) -> Result<Self> {
        let filter = Self {
            sample_rate_hz,
            low_cut_hz,
            high_cut_hz,
        };
        filter.validate()?;
        Ok(filter)
    }

    pub fn validate(&self) -> Result<()> {
        let nyquist = self.sample_rate_hz / 2.0;
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(StatsError::InvalidFilter(format!(
                "sample rate must be positive, got {}",
                self.sample_rate_hz
            )));
        }
        if !(self.low_cut_hz > 0.0 && self.low_cut_hz < self.high_cut_hz) {
            return Err(StatsError::InvalidFilter(format!(
                "need 0 < low_cut ({}) < high_cut ({})",
                self.low_cut_hz, self.high_cut_hz
            )));
        }
        if self.high_cut_hz >= nyquist {
            return Err(StatsError::InvalidFilter(format!(
                "high_cut ({}) must be below Nyquist ({})",
                self.high_cut_hz, nyquist
            )));
        }
        Ok(())
    }

    /// Filter a trace. Output has the same length as the input.
    pub fn apply(&self, trace: &[f64]) -> Vec<f64> {
        if trace.is_empty() {
            return Vec::new();
        }

        let mean = trace.iter().sum::<f64>() / trace.len() as f64;
        let mut signal: Vec<f64> = trace.iter().map(|v| v - mean).collect();

        let stages = [
            Biquad::highpass(self.sample_rate_hz, self.low_cut_hz),
            Biquad::lowpass(self.sample_rate_hz, self.high_cut_hz),
        ];

        for stage in &stages {
            stage.run(&mut signal);
        }
        signal.reverse();
        for stage in &stages {
            stage.run(&mut signal);
        }
        signal.reverse();

        signal
    }
}

/// Normalized biquad coefficients (a0 = 1).
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    fn lowpass(sample_rate: f64, cutoff: f64) -> Self {
        let (cos_w0, alpha) = Self::prewarp(sample_rate, cutoff);
        let a0 = 1.0 + alpha;
        Self {
            b0: (1.0 - cos_w0) / 2.0 / a0,
            b1: (1.0 - cos_w0) / a0,
            b2: (1.0 - cos_w0) / 2.0 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    fn highpass(sample_rate: f64, cutoff: f64) -> Self {
        let (cos_w0, alpha) = Self::prewarp(sample_rate, cutoff);
        let a0 = 1.0 + alpha;
        Self {
            b0: (1.0 + cos_w0) / 2.0 / a0,
            b1: -(1.0 + cos_w0) / a0,
            b2: (1.0 + cos_w0) / 2.0 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    fn prewarp(sample_rate: f64, cutoff: f64) -> (f64, f64) {
        let w0 = 2.0 * PI * cutoff / sample_rate;
        (w0.cos(), w0.sin() / (2.0 * FRAC_1_SQRT_2))
    }

    /// Direct form II transposed, in place, zero initial state.
    fn run(&self, signal: &mut [f64]) {
        let (mut z1, mut z2) = (0.0, 0.0);
        for x in signal.iter_mut() {
            let input = *x;
            let output = self.b0 * input + z1;
            z1 = self.b1 * input - self.a1 * output + z2;
            z2 = self.b2 * input - self.a2 * output;
            *x = output;
        }
    }
}
