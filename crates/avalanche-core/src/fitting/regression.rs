// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Ordinary least squares.

use crate::types::LinearFit;

/// Fit `y = slope * x + intercept`.
///
/// Pairs where either coordinate is non-finite are dropped. Returns `None`
/// with fewer than two remaining points or when all `x` coincide.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let points: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect();

    let n = points.len();
    if n < 2 {
        return None;
    }

    let nf = n as f64;
    let x_mean = points.iter().map(|p| p.0).sum::<f64>() / nf;
    let y_mean = points.iter().map(|p| p.1).sum::<f64>() / nf;

    let (sxx, sxy) = points.iter().fold((0.0, 0.0), |(sxx, sxy), &(a, b)| {
        let dx = a - x_mean;
        (sxx + dx * dx, sxy + dx * (b - y_mean))
    });
    if sxx <= 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let slope_std_error = if n > 2 {
        let ssr: f64 = points
            .iter()
            .map(|&(a, b)| (b - (slope * a + intercept)).powi(2))
            .sum();
        (ssr / (nf - 2.0) / sxx).sqrt()
    } else {
        0.0
    };

    Some(LinearFit {
        slope,
        intercept,
        slope_std_error,
        n_points: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let fit = linear_regression(&x, &y).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!(fit.slope_std_error.abs() < 1e-12);
        assert_eq!(fit.n_points, 4);
    }

    #[test]
    fn test_two_points_have_zero_error() {
        let fit = linear_regression(&[1.0, 2.0], &[0.0, -1.0]).unwrap();
        assert_eq!(fit.slope, -1.0);
        assert_eq!(fit.slope_std_error, 0.0);
    }

    #[test]
    fn test_noisy_line_has_error() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [0.1, 0.9, 2.2, 2.8, 4.1];
        let fit = linear_regression(&x, &y).unwrap();
        assert!((fit.slope - 1.0).abs() < 0.1);
        assert!(fit.slope_std_error > 0.0);
    }

    #[test]
    fn test_insufficient_points() {
        assert!(linear_regression(&[1.0], &[1.0]).is_none());
        assert!(linear_regression(&[], &[]).is_none());
        assert!(linear_regression(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(linear_regression(&[1.0, f64::NAN], &[1.0, 2.0]).is_none());
    }
}
