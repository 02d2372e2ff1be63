//! Tip generation
//!
//! Turns the factor and schedule analysis into a short, prioritized list of
//! human-readable recommendations.

use crate::factors::FactorImpactAnalyzer;
use crate::schedule::{ScheduleOptimizer, MIN_SCHEDULE_RECORDS};
use crate::stats::{average, round_to};
use crate::types::{FactorImpact, SleepFactor, SleepRecord, TimeField};

/// Maximum number of tips returned
pub const MAX_TIPS: usize = 5;

/// Nights needed before anything beyond the "keep logging" tip
pub const MIN_TIP_RECORDS: usize = MIN_SCHEDULE_RECORDS;

/// Shortfall against the goal that triggers a duration tip
pub const DURATION_GAP_MINUTES: f64 = 30.0;

/// Average quality below which habits are questioned
pub const LOW_QUALITY_THRESHOLD: f64 = 3.5;

/// Absolute impact a factor needs before it is mentioned
pub const FACTOR_TIP_THRESHOLD: i32 = 10;

/// Factors mentioned per polarity
pub const FACTOR_TIPS_PER_KIND: usize = 2;

/// Generator for personalized sleep tips
pub struct TipGenerator;

impl TipGenerator {
    /// Build up to [`MAX_TIPS`] tips, highest priority first
    pub fn generate_tips(records: &[SleepRecord], goal_hours: f64) -> Vec<String> {
        if records.len() < MIN_TIP_RECORDS {
            return vec![format!(
                "Keep logging your sleep: personalized tips unlock after {} nights ({} so far).",
                MIN_TIP_RECORDS,
                records.len()
            )];
        }

        let mut tips = Vec::new();

        let durations: Vec<f64> = records.iter().map(|r| f64::from(r.duration_minutes)).collect();
        let avg_duration = average(&durations);
        let goal_minutes = goal_hours * 60.0;
        if avg_duration < goal_minutes - DURATION_GAP_MINUTES {
            let shortfall = round_to((goal_minutes - avg_duration) / 60.0, 1);
            tips.push(format!(
                "You're sleeping {:.1} hours less than your {} hour goal. Try going to bed earlier.",
                shortfall, goal_hours
            ));
        }

        let qualities: Vec<f64> = records.iter().map(|r| f64::from(r.quality)).collect();
        let avg_quality = average(&qualities);
        if avg_quality < LOW_QUALITY_THRESHOLD {
            tips.push(format!(
                "Your average sleep quality is {:.1}/5. Review your pre-sleep habits: screens, caffeine and late meals.",
                avg_quality
            ));
        }

        let positive = FactorImpactAnalyzer::analyze(records, &SleepFactor::POSITIVE);
        tips.extend(
            strongest(&positive, |i| i.impact > FACTOR_TIP_THRESHOLD).map(|i| {
                format!(
                    "{} improves your sleep by {}%.",
                    i.factor.label(),
                    i.impact
                )
            }),
        );

        let negative = FactorImpactAnalyzer::analyze(records, &SleepFactor::NEGATIVE);
        tips.extend(
            strongest(&negative, |i| i.impact < -FACTOR_TIP_THRESHOLD).map(|i| {
                format!(
                    "Avoid {}: it worsens your sleep by {}%.",
                    i.factor.label(),
                    i.impact.abs()
                )
            }),
        );

        tips.truncate(MAX_TIPS);
        if tips.len() < MAX_TIPS {
            let best_bedtime = ScheduleOptimizer::best_hour_for(records, TimeField::Bedtime);
            tips.push(format!(
                "You sleep best when you go to bed around {}.",
                best_bedtime
            ));
        }

        tips
    }
}

fn strongest<'a>(
    impacts: &'a [FactorImpact],
    keep: impl Fn(&FactorImpact) -> bool + 'a,
) -> impl Iterator<Item = &'a FactorImpact> + 'a {
    impacts
        .iter()
        .filter(move |&i| keep(i))
        .take(FACTOR_TIPS_PER_KIND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveTime};

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn night(day: i64, bed: NaiveTime, wake: NaiveTime, quality: u8) -> SleepRecord {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap() + Duration::days(day);
        SleepRecord::new(date, bed, wake, quality)
    }

    #[test]
    fn test_keep_logging_below_floor() {
        let records: Vec<_> = (0..6).map(|d| night(d, time(2, 0), time(4, 0), 1)).collect();
        let tips = TipGenerator::generate_tips(&records, 8.0);

        assert_eq!(tips.len(), 1);
        assert!(tips[0].starts_with("Keep logging"));
        assert!(tips[0].contains("6 so far"));

        assert_eq!(TipGenerator::generate_tips(&[], 8.0).len(), 1);
    }

    #[test]
    fn test_healthy_sleeper_only_gets_bedtime_tip() {
        let records: Vec<_> = (0..7)
            .map(|d| night(d, time(22, 30), time(6, 30), 4))
            .collect();
        let tips = TipGenerator::generate_tips(&records, 8.0);

        assert_eq!(tips, vec!["You sleep best when you go to bed around 22:00.".to_string()]);
    }

    #[test]
    fn test_duration_and_quality_tips() {
        // 6 hours per night, quality 3
        let records: Vec<_> = (0..7)
            .map(|d| night(d, time(0, 0), time(6, 0), 3))
            .collect();
        let tips = TipGenerator::generate_tips(&records, 8.0);

        assert_eq!(tips.len(), 3);
        assert!(tips[0].contains("2.0 hours less"));
        assert!(tips[1].contains("3.0/5"));
        assert!(tips[2].contains("00:00"));
    }

    #[test]
    fn test_factor_tips_and_cap() {
        let mut records = Vec::new();
        // Good nights with positive habits
        for d in 0..3 {
            records.push(
                night(d, time(1, 0), time(6, 0), 5)
                    .with_factor(SleepFactor::Exercise)
                    .with_factor(SleepFactor::Reading)
                    .with_factor(SleepFactor::Meditation),
            );
        }
        // Bad nights with negative habits
        for d in 3..6 {
            records.push(
                night(d, time(1, 0), time(6, 0), 1)
                    .with_factor(SleepFactor::LateCoffee)
                    .with_factor(SleepFactor::Alcohol)
                    .with_factor(SleepFactor::Screens),
            );
        }
        for d in 6..9 {
            records.push(night(d, time(1, 0), time(6, 0), 2));
        }

        let tips = TipGenerator::generate_tips(&records, 8.0);
        assert_eq!(tips.len(), MAX_TIPS);
        assert!(tips[0].contains("hours less"));
        assert!(tips[1].contains("/5"));
        assert!(tips[2].contains("improves your sleep"));
        assert!(tips[3].contains("improves your sleep"));
        assert!(tips[4].starts_with("Avoid"));
        // No room left for the bedtime tip
        assert!(!tips.iter().any(|t| t.contains("go to bed around")));
    }

    #[test]
    fn test_factor_impact_of_exactly_ten_is_not_mentioned() {
        let bed = time(23, 0);
        let wake = time(7, 0);

        // 4.4 with exercise vs 4.0 without: +10%
        let mut records: Vec<_> = (0..5)
            .map(|d| {
                let quality = if d < 2 { 5 } else { 4 };
                night(d, bed, wake, quality).with_factor(SleepFactor::Exercise)
            })
            .collect();
        records.extend((5..8).map(|d| night(d, bed, wake, 4)));
        let tips = TipGenerator::generate_tips(&records, 8.0);
        assert_eq!(tips, vec!["You sleep best when you go to bed around 23:00.".to_string()]);

        // 3.6 with late coffee vs 4.0 without: -10%
        let mut records: Vec<_> = (0..5)
            .map(|d| {
                let quality = if d < 3 { 4 } else { 3 };
                night(d, bed, wake, quality).with_factor(SleepFactor::LateCoffee)
            })
            .collect();
        records.extend((5..8).map(|d| night(d, bed, wake, 4)));
        let tips = TipGenerator::generate_tips(&records, 8.0);
        assert_eq!(tips, vec!["You sleep best when you go to bed around 23:00.".to_string()]);
    }

    #[test]
    fn test_at_most_two_avoid_tips() {
        let mut records = Vec::new();
        for d in 0..3 {
            records.push(
                night(d, time(23, 0), time(7, 0), 3)
                    .with_factor(SleepFactor::LateCoffee)
                    .with_factor(SleepFactor::Alcohol)
                    .with_factor(SleepFactor::Screens),
            );
        }
        for d in 3..9 {
            records.push(night(d, time(23, 0), time(7, 0), 5));
        }

        let tips = TipGenerator::generate_tips(&records, 8.0);
        assert_eq!(tips.len(), 3);
        assert_eq!(tips.iter().filter(|t| t.starts_with("Avoid")).count(), FACTOR_TIPS_PER_KIND);
        assert!(tips[0].contains("40%"));
        assert!(tips[2].contains("go to bed around 23:00"));
    }

    #[test]
    fn test_exactly_thirty_minutes_short_has_no_duration_tip() {
        // 7.5 hours against an 8 hour goal
        let records: Vec<_> = (0..7)
            .map(|d| night(d, time(23, 0), time(6, 30), 4))
            .collect();
        let tips = TipGenerator::generate_tips(&records, 8.0);

        assert_eq!(tips, vec!["You sleep best when you go to bed around 23:00.".to_string()]);
    }
}
