//! Progress report math
//!
//! Period-over-period deltas and body-weight trend projection for the
//! weekly/monthly progress reports.

use crate::stats::{
    average, linear_projection, linear_regression, percentage_change, round_to, TrendPoint,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// A body-composition measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub date: NaiveDate,
    pub weight_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_fat_pct: Option<f64>,
}

/// Average of a metric this period vs the previous one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub current_avg: f64,
    pub previous_avg: f64,
    /// Relative change in percent, one decimal
    pub change_pct: f64,
}

/// Body-weight progress over a set of measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub start_weight_kg: f64,
    pub current_weight_kg: f64,
    pub change_kg: f64,
    pub change_pct: f64,
    /// Fitted trend, kilograms per week
    pub trend_kg_per_week: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_goal_date: Option<NaiveDate>,
    pub sample_size: usize,
}

/// Compare two periods of the same metric
pub fn compare_periods(current: &[f64], previous: &[f64]) -> PeriodComparison {
    let current_avg = average(current);
    let previous_avg = average(previous);
    PeriodComparison {
        current_avg,
        previous_avg,
        change_pct: round_to(percentage_change(previous_avg, current_avg), 1),
    }
}

fn weight_series(measurements: &[MeasurementRecord]) -> Option<(NaiveDate, Vec<TrendPoint>)> {
    let first = measurements.iter().map(|m| m.date).min()?;
    let mut points: Vec<TrendPoint> = measurements
        .iter()
        .map(|m| TrendPoint {
            x: (m.date - first).num_days(),
            y: m.weight_kg,
        })
        .collect();
    points.sort_by_key(|p| p.x);
    Some((first, points))
}

/// Date on which the weight trend reaches `target_weight_kg`
///
/// `None` when the trend is flat, moving away from the target, or the
/// target has already been reached.
pub fn project_goal_date(
    measurements: &[MeasurementRecord],
    target_weight_kg: f64,
) -> Option<NaiveDate> {
    let (first, points) = weight_series(measurements)?;
    let x = linear_projection(&points, target_weight_kg)?;
    // Absorb float noise so an exact day does not round up to the next one
    let days = (x - 1e-6).ceil() as i64;
    first.checked_add_signed(Duration::days(days))
}

/// Summarize weight progress, measurements in any order
pub fn progress_report(
    measurements: &[MeasurementRecord],
    target_weight_kg: Option<f64>,
) -> Option<ProgressReport> {
    let (_, points) = weight_series(measurements)?;
    let start = points.first()?.y;
    let current = points.last()?.y;

    let trend_kg_per_week = linear_regression(&points)
        .map(|(slope, _)| round_to(slope * 7.0, 2))
        .unwrap_or(0.0);

    Some(ProgressReport {
        start_weight_kg: start,
        current_weight_kg: current,
        change_kg: round_to(current - start, 1),
        change_pct: round_to(percentage_change(start, current), 1),
        trend_kg_per_week,
        projected_goal_date: target_weight_kg
            .and_then(|target| project_goal_date(measurements, target)),
        sample_size: points.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn measurement(day: i64, weight_kg: f64) -> MeasurementRecord {
        MeasurementRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(day),
            weight_kg,
            body_fat_pct: None,
        }
    }

    #[test]
    fn test_compare_periods() {
        let comparison = compare_periods(&[7.5, 8.5], &[6.0, 7.0, 8.0]);
        assert_eq!(
            comparison,
            PeriodComparison {
                current_avg: 8.0,
                previous_avg: 7.0,
                change_pct: 14.3,
            }
        );

        assert_eq!(compare_periods(&[5.0], &[]).change_pct, 0.0);
    }

    #[test]
    fn test_project_goal_date() {
        // Losing 0.5 kg every 7 days, from 80 kg
        let measurements: Vec<_> = (0..4)
            .map(|w| measurement(w * 7, 80.0 - 0.5 * w as f64))
            .collect();

        // 78 kg is reached 4 weeks in
        assert_eq!(
            project_goal_date(&measurements, 78.0),
            NaiveDate::from_ymd_opt(2024, 1, 29)
        );
        // Already below 79.5 at the last measurement
        assert_eq!(project_goal_date(&measurements, 79.5), None);
        // Gaining weight would need an upward trend
        assert_eq!(project_goal_date(&measurements, 85.0), None);
    }

    #[test]
    fn test_progress_report() {
        let measurements = vec![
            measurement(14, 99.0),
            measurement(0, 100.0),
            measurement(7, 99.5),
        ];
        let report = progress_report(&measurements, Some(98.0)).unwrap();

        assert_eq!(report.start_weight_kg, 100.0);
        assert_eq!(report.current_weight_kg, 99.0);
        assert_eq!(report.change_kg, -1.0);
        assert_eq!(report.change_pct, -1.0);
        assert_eq!(report.trend_kg_per_week, -0.5);
        assert_eq!(report.projected_goal_date, NaiveDate::from_ymd_opt(2024, 1, 29));
        assert_eq!(report.sample_size, 3);

        assert_eq!(progress_report(&[], None), None);
    }
}
