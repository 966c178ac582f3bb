//! Trend classification for a measurement series.
//!
//! The slope comes from an ordinary least-squares fit of value against
//! elapsed hours since the earliest reading:
//!
//!   slope = (n·Σxy − Σx·Σy) / (n·Σx² − (Σx)²)
//!
//! The slope is read relative to the series mean, so "stable" means "moves
//! by less than 0.1 % of its level per hour" whatever the pollutant's scale.
//! Independently, the mean absolute residual around the fitted line is
//! compared with the mean; more than 20 % scatter marks the series as
//! fluctuating, and that label wins over the slope.
//!
//! When the mean is exactly zero neither ratio exists. The slope is then
//! read as-is and the series is never called fluctuating.

use chrono::{DateTime, Utc};

use crate::model::{Measurement, Trend};

/// Relative slope (fraction of the mean, per hour) below which a series is
/// stable.
pub const STABLE_SLOPE_THRESHOLD: f64 = 0.001;

/// Relative scatter above which a series is fluctuating.
pub const FLUCTUATION_THRESHOLD: f64 = 0.20;

/// Classifies the valid readings of `measurements`. Invalid readings are
/// ignored; fewer than two valid readings give `Trend::Unknown`.
///
/// Input order does not matter; readings are sorted by date first.
pub fn classify_trend(measurements: &[Measurement]) -> Trend {
    let mut points: Vec<(DateTime<Utc>, f64)> = measurements
        .iter()
        .filter_map(|m| m.reading().map(|v| (m.date(), v)))
        .collect();

    if points.len() < 2 {
        return Trend::Unknown;
    }

    points.sort_by_key(|(date, _)| *date);
    let origin = points[0].0;
    let xy: Vec<(f64, f64)> = points
        .iter()
        .map(|(date, value)| (hours_since(origin, *date), *value))
        .collect();

    let n = xy.len() as f64;
    let mean = xy.iter().map(|(_, y)| y).sum::<f64>() / n;

    // All readings share one timestamp: no slope to speak of.
    let Some(fit) = least_squares(&xy) else {
        return Trend::Stable;
    };

    let by_slope = {
        let relative = if mean == 0.0 { fit.slope } else { fit.slope / mean.abs() };
        if relative.abs() < STABLE_SLOPE_THRESHOLD {
            Trend::Stable
        } else if relative > 0.0 {
            Trend::Increasing
        } else {
            Trend::Decreasing
        }
    };

    match relative_scatter(&xy, &fit, mean) {
        Some(scatter) if scatter > FLUCTUATION_THRESHOLD => Trend::Fluctuating,
        _ => by_slope,
    }
}

/// A fitted line `y = intercept + slope·x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

/// Closed-form ordinary least squares. `None` when every x is the same.
pub fn least_squares(xy: &[(f64, f64)]) -> Option<LinearFit> {
    if xy.is_empty() {
        return None;
    }

    let n = xy.len() as f64;
    let (sum_x, sum_y, sum_xy, sum_x2) = xy.iter().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sx2), (x, y)| (sx + x, sy + y, sxy + x * y, sx2 + x * x),
    );

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;
    Some(LinearFit { slope, intercept })
}

/// Mean absolute residual around `fit`, as a fraction of `|mean|`.
/// `None` when the mean is zero.
fn relative_scatter(xy: &[(f64, f64)], fit: &LinearFit, mean: f64) -> Option<f64> {
    if mean == 0.0 {
        return None;
    }
    let residual_sum: f64 = xy
        .iter()
        .map(|(x, y)| (y - (fit.intercept + fit.slope * x)).abs())
        .sum();
    Some(residual_sum / xy.len() as f64 / mean.abs())
}

fn hours_since(origin: DateTime<Utc>, date: DateTime<Utc>) -> f64 {
    (date - origin).num_milliseconds() as f64 / 3_600_000.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
