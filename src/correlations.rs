//! Sleep correlation bundle
//!
//! Combines factor impacts, schedule recommendations and the link between
//! sleep and next-day training into a single [`SleepCorrelations`] value.

use crate::factors::FactorImpactAnalyzer;
use crate::schedule::ScheduleOptimizer;
use crate::stats::{pearson_correlation, round_half_up};
use crate::types::{
    FactorImpact, SleepCorrelations, SleepFactor, SleepRecord, TimeField, WorkoutRecord,
};
use std::collections::HashMap;

/// Nights rated at or above this count as good sleep for the PR estimate
pub const GOOD_SLEEP_QUALITY: u8 = 4;

/// Build the full correlation bundle for a window of records
pub fn compute_correlations(
    records: &[SleepRecord],
    workouts: &[WorkoutRecord],
) -> SleepCorrelations {
    let factor_impacts = FactorImpactAnalyzer::analyze_all(records);
    let pairs = pair_sleep_with_workouts(records, workouts);

    SleepCorrelations {
        late_eating_impact: impact_of(&factor_impacts, SleepFactor::LateMeal),
        caffeine_impact: impact_of(&factor_impacts, SleepFactor::LateCoffee),
        factor_impacts,
        workout_performance_correlation: workout_performance_correlation(&pairs),
        pr_chance_increase: pr_chance_increase(&pairs),
        best_bedtime: ScheduleOptimizer::best_hour_for(records, TimeField::Bedtime),
        best_wake_time: ScheduleOptimizer::best_hour_for(records, TimeField::WakeTime),
        sample_size: records.len(),
    }
}

fn impact_of(impacts: &[FactorImpact], factor: SleepFactor) -> Option<i32> {
    impacts.iter().find(|i| i.factor == factor).map(|i| i.impact)
}

/// Match each workout with the sleep logged for the same date
fn pair_sleep_with_workouts<'a>(
    records: &'a [SleepRecord],
    workouts: &'a [WorkoutRecord],
) -> Vec<(&'a SleepRecord, &'a WorkoutRecord)> {
    let by_date: HashMap<_, _> = records.iter().map(|r| (r.date, r)).collect();
    workouts
        .iter()
        .filter_map(|w| by_date.get(&w.date).map(|r| (*r, w)))
        .collect()
}

/// Pearson coefficient of quality vs performance, scaled to -100..100
fn workout_performance_correlation(pairs: &[(&SleepRecord, &WorkoutRecord)]) -> i32 {
    let quality: Vec<f64> = pairs.iter().map(|(r, _)| f64::from(r.quality)).collect();
    let performance: Vec<f64> = pairs.iter().map(|(_, w)| w.performance).collect();
    round_half_up(pearson_correlation(&quality, &performance) * 100.0) as i32
}

/// Difference in PR rate after good vs poor nights, in percentage points
///
/// 0 unless both groups have at least one workout.
fn pr_chance_increase(pairs: &[(&SleepRecord, &WorkoutRecord)]) -> i32 {
    let (good, poor): (Vec<_>, Vec<_>) = pairs
        .iter()
        .partition(|(r, _)| r.quality >= GOOD_SLEEP_QUALITY);

    if good.is_empty() || poor.is_empty() {
        return 0;
    }

    round_half_up((pr_rate(&good) - pr_rate(&poor)) * 100.0) as i32
}

fn pr_rate(group: &[&(&SleepRecord, &WorkoutRecord)]) -> f64 {
    let prs = group.iter().filter(|(_, w)| w.personal_record).count();
    prs as f64 / group.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveTime};

    fn date(day: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap() + Duration::days(day)
    }

    fn night(day: i64, quality: u8) -> SleepRecord {
        SleepRecord::new(
            date(day),
            NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            quality,
        )
    }

    fn workout(day: i64, performance: f64, personal_record: bool) -> WorkoutRecord {
        WorkoutRecord {
            date: date(day),
            performance,
            personal_record,
        }
    }

    #[test]
    fn test_workout_correlation_positive() {
        let records: Vec<_> = (0..5).map(|d| night(d, (d + 1) as u8)).collect();
        let workouts: Vec<_> = (0..5)
            .map(|d| workout(d, 100.0 + 10.0 * d as f64, false))
            .collect();

        let correlations = compute_correlations(&records, &workouts);
        assert_eq!(correlations.workout_performance_correlation, 100);
        assert_eq!(correlations.sample_size, 5);
    }

    #[test]
    fn test_unpaired_workouts_are_ignored() {
        let records = vec![night(0, 5), night(1, 3)];
        let workouts = vec![workout(0, 120.0, true), workout(9, 80.0, false)];

        let correlations = compute_correlations(&records, &workouts);
        // One pair is below the correlation floor
        assert_eq!(correlations.workout_performance_correlation, 0);
        // No poor-sleep workout to compare against
        assert_eq!(correlations.pr_chance_increase, 0);
    }

    #[test]
    fn test_pr_chance_increase() {
        let records = vec![night(0, 5), night(1, 4), night(2, 2), night(3, 3)];
        let workouts = vec![
            workout(0, 100.0, true),
            workout(1, 100.0, false),
            workout(2, 100.0, false),
            workout(3, 100.0, false),
        ];

        let correlations = compute_correlations(&records, &workouts);
        // 50% after good nights vs 0% after poor nights
        assert_eq!(correlations.pr_chance_increase, 50);
    }

    #[test]
    fn test_shortcuts_and_fallback_schedule() {
        let mut records = Vec::new();
        for d in 0..3 {
            records.push(night(d, 2).with_factor(SleepFactor::LateCoffee));
        }
        for d in 3..6 {
            records.push(night(d, 4));
        }

        let correlations = compute_correlations(&records, &[]);
        assert_eq!(correlations.caffeine_impact, Some(-50));
        assert_eq!(correlations.late_eating_impact, None);
        // Six nights is below the schedule floor
        assert_eq!(correlations.best_bedtime, "22:00");
        assert_eq!(correlations.best_wake_time, "05:00");
    }
}
