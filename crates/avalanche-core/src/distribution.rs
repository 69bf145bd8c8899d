// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Empirical avalanche-size distribution p(S) across repetitions
//!
//! ```text
//! sizes axis:  S = 1 ..= S_max           (S_max over ALL repetitions)
//! row r:       p_r(S) = #{s in rep r : s == S} / #rep r
//! mean(S):     mean_r p_r(S)
//! std(S):      population std_r p_r(S)   (ddof = 0)
//! ```
//!
//! Repetitions without any avalanche have no defined p(S); they are left
//! out of the matrix and counted in `empty_repetitions`.

use core::fmt::Write as _;

use ndarray::{Array1, Array2, Axis};

/// p(S) per repetition plus its cross-repetition mean and std.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeDistribution {
    sizes: Vec<u64>,
    per_repetition: Array2<f64>,
    mean: Array1<f64>,
    std: Array1<f64>,
    empty_repetitions: usize,
}

impl SizeDistribution {
    /// Build from one avalanche-size list per repetition.
    pub fn from_repetitions<S: AsRef<[u64]>>(size_lists: &[S]) -> Self {
        let s_max = size_lists
            .iter()
            .flat_map(|list| list.as_ref().iter().copied())
            .max()
            .unwrap_or(0) as usize;

        let non_empty: Vec<&[u64]> = size_lists
            .iter()
            .map(|list| list.as_ref())
            .filter(|list| !list.is_empty())
            .collect();
        let empty_repetitions = size_lists.len() - non_empty.len();

        let mut per_repetition = Array2::<f64>::zeros((non_empty.len(), s_max));
        for (mut row, list) in per_repetition.axis_iter_mut(Axis(0)).zip(&non_empty) {
            for &s in list.iter() {
                // sizes are >= 1 by construction of get_s
                if s >= 1 {
                    row[(s - 1) as usize] += 1.0;
                }
            }
            let total = row.sum();
            if total > 0.0 {
                row /= total;
            }
        }

        let (mean, std) = if non_empty.is_empty() {
            (Array1::zeros(s_max), Array1::zeros(s_max))
        } else {
            let mean = per_repetition
                .mean_axis(Axis(0))
                .unwrap_or_else(|| Array1::zeros(s_max));
            let std = per_repetition.std_axis(Axis(0), 0.0);
            (mean, std)
        };

        Self {
            sizes: (1..=s_max as u64).collect(),
            per_repetition,
            mean,
            std,
            empty_repetitions,
        }
    }

    /// Size axis `1..=S_max`, contiguous.
    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn std(&self) -> &Array1<f64> {
        &self.std
    }

    /// Rows = non-empty repetitions, columns = sizes.
    pub fn per_repetition(&self) -> &Array2<f64> {
        &self.per_repetition
    }

    /// Number of repetitions contributing to the mean.
    pub fn repetitions(&self) -> usize {
        self.per_repetition.nrows()
    }

    pub fn empty_repetitions(&self) -> usize {
        self.empty_repetitions
    }

    pub fn max_size(&self) -> u64 {
        self.sizes.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Mean probability of size `s`; 0 outside the observed support.
    pub fn probability(&self, s: u64) -> f64 {
        if s == 0 || s > self.max_size() {
            return 0.0;
        }
        self.mean[(s - 1) as usize]
    }

    /// Three tab-separated columns `S`, `pS_mean`, `pS_std` with a
    /// `#`-prefixed header row.
    pub fn to_tsv(&self) -> String {
        let mut out = String::from("# S\tpS_mean\tpS_std\n");
        for ((s, mean), std) in self.sizes.iter().zip(&self.mean).zip(&self.std) {
            let _ = writeln!(out, "{}\t{:e}\t{:e}", s, mean, std);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_repetition() {
        let dist = SizeDistribution::from_repetitions(&[vec![1u64, 1, 2, 4]]);
        assert_eq!(dist.sizes(), &[1, 2, 3, 4]);
        assert_eq!(dist.mean().to_vec(), vec![0.5, 0.25, 0.0, 0.25]);
        assert!(dist.std().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_shorter_repetitions_padded_not_truncated() {
        let dist = SizeDistribution::from_repetitions(&[vec![1u64, 1], vec![6u64]]);
        assert_eq!(dist.max_size(), 6);
        assert_eq!(dist.per_repetition().shape(), &[2, 6]);
        assert_eq!(dist.per_repetition()[[0, 5]], 0.0);
        assert_eq!(dist.probability(1), 0.5);
        assert_eq!(dist.probability(6), 0.5);
        assert_eq!(dist.std()[0], 0.5);
    }

    #[test]
    fn test_rows_sum_to_one() {
        let dist = SizeDistribution::from_repetitions(&[
            vec![1u64, 2, 3, 3, 7],
            vec![2u64, 2, 9],
            vec![1u64],
        ]);
        for row in dist.per_repetition().rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
        assert!((dist.mean().sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_repetitions_are_excluded() {
        let dist = SizeDistribution::from_repetitions(&[vec![], vec![2u64]]);
        assert_eq!(dist.repetitions(), 1);
        assert_eq!(dist.empty_repetitions(), 1);
        assert_eq!(dist.probability(2), 1.0);
    }

    #[test]
    fn test_all_empty() {
        let lists: Vec<Vec<u64>> = vec![vec![], vec![]];
        let dist = SizeDistribution::from_repetitions(&lists);
        assert!(dist.is_empty());
        assert_eq!(dist.empty_repetitions(), 2);
        assert_eq!(dist.probability(1), 0.0);
    }

    #[test]
    fn test_tsv_layout() {
        let dist = SizeDistribution::from_repetitions(&[vec![1u64, 2]]);
        let tsv = dist.to_tsv();
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines[0], "# S\tpS_mean\tpS_std");
        assert_eq!(lines.len(), 3);
        let cols: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(cols[0], "1");
        assert_eq!(cols[1].parse::<f64>().unwrap(), 0.5);
        assert_eq!(cols[2].parse::<f64>().unwrap(), 0.0);
    }
}
