//! Statistics kernel
//!
//! Numeric primitives shared by every analysis: mean, Pearson correlation,
//! least-squares projection and the crate-wide rounding rule. None of these
//! fail; undersized or degenerate input collapses to 0 or `None`.

use serde::{Deserialize, Serialize};

/// Minimum paired samples for a correlation coefficient
pub const MIN_CORRELATION_SAMPLES: usize = 3;

/// A point of an ordered series (x is usually a day index)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub x: i64,
    pub y: f64,
}

/// Arithmetic mean, 0 for an empty slice
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Pearson correlation coefficient in [-1, 1]
///
/// Returns 0 when the series differ in length, have fewer than
/// [`MIN_CORRELATION_SAMPLES`] points, or either has zero variance.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < MIN_CORRELATION_SAMPLES {
        return 0.0;
    }

    let mean_x = average(x);
    let mean_y = average(y);

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }

    (covariance / denominator).clamp(-1.0, 1.0)
}

/// Ordinary least-squares fit, returning `(slope, intercept)`
///
/// `None` for fewer than two points or when every x is identical.
pub fn linear_regression(points: &[TrendPoint]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.x as f64).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.y).sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for p in points {
        let dx = p.x as f64 - mean_x;
        numerator += dx * (p.y - mean_y);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        return None;
    }

    let slope = numerator / denominator;
    Some((slope, mean_y - slope * mean_x))
}

/// Solve the fitted trend for the x at which it reaches `target`
///
/// Returns `None` when there is no trend (slope 0) or the solution does not
/// lie after the last observed point, i.e. the target was already passed or
/// the trend is moving away from it.
pub fn linear_projection(points: &[TrendPoint], target: f64) -> Option<f64> {
    let (slope, intercept) = linear_regression(points)?;
    if slope == 0.0 {
        return None;
    }

    let last_x = points.iter().map(|p| p.x).max()? as f64;
    let solved = (target - intercept) / slope;

    if !solved.is_finite() || solved <= last_x {
        return None;
    }
    Some(solved)
}

/// Round half toward positive infinity, so -2.5 becomes -2
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Round to a fixed number of decimals using [`round_half_up`]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    round_half_up(value * factor) / factor
}

/// Relative change from `previous` to `current` in percent, 0 when `previous` is 0
pub fn percentage_change(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}
