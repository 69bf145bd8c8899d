// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Temporal binning of thresholded traces.

use crate::types::{BinnedTrace, Result, StatsError};

/// Sum consecutive, non-overlapping windows of `binsize` samples.
///
/// The incomplete trailing window is discarded, so the output has
/// `trace.len() / binsize` bins. `binsize == 1` is the identity.
///
/// # Example
/// ```
/// use avalanche_core::bin_data;
///
/// assert_eq!(bin_data(&[1, 0, 2, 3, 4], 2).unwrap(), vec![1, 5]);
/// ```
pub fn bin_data(trace: &[u32], binsize: usize) -> Result<BinnedTrace> {
    if binsize == 0 {
        return Err(StatsError::InvalidBinsize);
    }
    Ok(trace
        .chunks_exact(binsize)
        .map(|window| window.iter().map(|&v| u64::from(v)).sum())
        .collect())
}
