//! Power-series smoothing: causal exponential and local regression.

use crate::domain::{CanonicalSeries, SmoothedSeries, SmoothingMethod};
use crate::error::Result;

/// Apply the selected smoothing method to a canonical power series.
///
/// Output keeps the input's timestamps and length. The exponential
/// family is strictly causal and preserves gap markers; the regression
/// family fits through gaps, excluding missing inputs from each local
/// fit rather than imputing them.
///
/// Parameters are validated up front; out-of-domain values are rejected
/// before any computation starts.
pub fn smooth(series: &CanonicalSeries, method: &SmoothingMethod) -> Result<SmoothedSeries> {
    method.validate()?;
    let values = match *method {
        SmoothingMethod::Exponential { span } => exponential(series, span),
        SmoothingMethod::Loess { fraction } => loess(series, fraction),
    };
    Ok(SmoothedSeries::new(series.with_values(values)))
}

/// Exponentially weighted smoothing with decay alpha = 2 / (span + 1).
///
/// Single left-to-right pass: y[t] depends only on x[0..=t]. A missing
/// input emits a missing output and carries the state forward with no
/// decay applied, so the next present sample continues from the last
/// smoothed level.
fn exponential(series: &CanonicalSeries, span: usize) -> Vec<Option<f64>> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut state: Option<f64> = None;
    series
        .points()
        .iter()
        .map(|point| match point.value {
            Some(x) => {
                let next = match state {
                    None => x,
                    Some(prev) => alpha * x + (1.0 - alpha) * prev,
                };
                state = Some(next);
                state
            }
            None => None,
        })
        .collect()
}

/// Locally weighted regression over a tri-cube kernel.
///
/// Each output index fits a low-degree polynomial over its `k` nearest
/// neighbors in time (k = round(fraction * n), minimum 2), weighting by
/// normalized time distance. Non-causal: neighborhoods are symmetric and
/// include future points, so the whole series is materialized.
fn loess(series: &CanonicalSeries, fraction: f64) -> Vec<Option<f64>> {
    let n = series.len();
    if n == 0 {
        return Vec::new();
    }

    let base = series.points()[0].timestamp;
    let xs: Vec<f64> = series
        .points()
        .iter()
        .map(|p| (p.timestamp - base).num_seconds() as f64)
        .collect();

    let k = ((fraction * n as f64).round() as usize).clamp(2.min(n), n);

    (0..n)
        .map(|i| {
            let (lo, hi) = neighborhood(&xs, i, k);
            let d_max = (xs[i] - xs[lo]).abs().max((xs[hi - 1] - xs[i]).abs());

            // Abscissae are normalized by the neighborhood radius so the
            // normal equations stay well conditioned; the fitted value at
            // the origin is invariant under the scaling.
            let scale = if d_max == 0.0 { 1.0 } else { d_max };
            let mut samples = Vec::with_capacity(hi - lo);
            for j in lo..hi {
                let Some(y) = series.points()[j].value else {
                    continue;
                };
                let weight = if d_max == 0.0 {
                    1.0
                } else {
                    tricube((xs[j] - xs[i]).abs() / d_max)
                };
                if weight > 0.0 {
                    samples.push(((xs[j] - xs[i]) / scale, y, weight));
                }
            }

            fit_at_origin(&samples, 2)
        })
        .collect()
}

/// Window `[lo, hi)` of `k` indices minimizing the maximum time distance
/// to index `i`. Timestamps are sorted, so the best window is contiguous.
fn neighborhood(xs: &[f64], i: usize, k: usize) -> (usize, usize) {
    let n = xs.len();
    let mut lo = i.saturating_sub(k - 1).min(n - k);
    let mut best = lo;
    let mut best_spread = f64::INFINITY;
    while lo <= i && lo + k <= n {
        let spread = (xs[i] - xs[lo]).abs().max((xs[lo + k - 1] - xs[i]).abs());
        if spread < best_spread {
            best_spread = spread;
            best = lo;
        }
        lo += 1;
    }
    (best, best + k)
}

fn tricube(u: f64) -> f64 {
    if u >= 1.0 {
        0.0
    } else {
        let t = 1.0 - u * u * u;
        t * t * t
    }
}

/// Weighted least-squares polynomial fit evaluated at dx = 0.
///
/// Tries the requested degree first and falls back to lower degrees when
/// the normal equations are singular (too few distinct abscissae). An
/// empty sample set has no fit.
fn fit_at_origin(samples: &[(f64, f64, f64)], degree: usize) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let degree = degree.min(samples.len() - 1);
    for deg in (0..=degree).rev() {
        if let Some(value) = solve_normal_equations(samples, deg) {
            return Some(value);
        }
    }
    None
}

fn solve_normal_equations(samples: &[(f64, f64, f64)], degree: usize) -> Option<f64> {
    let size = degree + 1;

    // Moment sums: s[p] = sum w * dx^p, t[r] = sum w * y * dx^r.
    let mut s = vec![0.0f64; 2 * degree + 1];
    let mut t = vec![0.0f64; size];
    for &(dx, y, w) in samples {
        let mut pow = 1.0;
        for p in 0..=2 * degree {
            s[p] += w * pow;
            if p < size {
                t[p] += w * y * pow;
            }
            pow *= dx;
        }
    }

    let mut matrix = vec![vec![0.0f64; size + 1]; size];
    for (r, row) in matrix.iter_mut().enumerate() {
        for c in 0..size {
            row[c] = s[r + c];
        }
        row[size] = t[r];
    }

    gaussian_solve(&mut matrix).map(|beta| beta[0])
}

/// Gaussian elimination with partial pivoting over an augmented matrix.
fn gaussian_solve(matrix: &mut [Vec<f64>]) -> Option<Vec<f64>> {
    let size = matrix.len();
    for col in 0..size {
        let pivot_row = (col..size)
            .max_by(|&a, &b| {
                matrix[a][col]
                    .abs()
                    .partial_cmp(&matrix[b][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        if matrix[pivot_row][col].abs() < 1e-12 {
            return None;
        }
        matrix.swap(col, pivot_row);

        for row in col + 1..size {
            let factor = matrix[row][col] / matrix[col][col];
            for c in col..=size {
                matrix[row][c] -= factor * matrix[col][c];
            }
        }
    }

    let mut solution = vec![0.0f64; size];
    for row in (0..size).rev() {
        let mut acc = matrix[row][size];
        for c in row + 1..size {
            acc -= matrix[row][c] * solution[c];
        }
        solution[row] = acc / matrix[row][row];
    }
    Some(solution)
}
