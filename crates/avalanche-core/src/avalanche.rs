// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Avalanche segmentation
//!
//! An avalanche is a maximal run of non-zero bins. Its size is the summed
//! activity of the run, its duration the number of bins. A run still open
//! when the trace ends is flushed as a final avalanche.

use crate::types::AvalancheSizeList;

/// Avalanche sizes of a binned trace, in temporal order.
///
/// # Example
/// ```
/// use avalanche_core::get_s;
///
/// assert_eq!(get_s(&[0, 2, 3, 0, 0, 5, 0]), vec![5, 5]);
/// assert_eq!(get_s(&[1, 1, 1]), vec![3]);
/// ```
pub fn get_s(binned: &[u64]) -> AvalancheSizeList {
    let mut sizes = Vec::new();
    let mut size = 0u64;

    for &bin in binned {
        if bin != 0 {
            size += bin;
        } else if size != 0 {
            sizes.push(size);
            size = 0;
        }
    }
    if size != 0 {
        sizes.push(size);
    }

    sizes
}

/// Avalanche durations (number of active bins), aligned with [`get_s`].
pub fn get_durations(binned: &[u64]) -> Vec<u64> {
    let mut durations = Vec::new();
    let mut duration = 0u64;

    for &bin in binned {
        if bin != 0 {
            duration += 1;
        } else if duration != 0 {
            durations.push(duration);
            duration = 0;
        }
    }
    if duration != 0 {
        durations.push(duration);
    }

    durations
}
