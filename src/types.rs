//! Core types for Wellness Insights
//!
//! This module defines the typed records that reach the analytics (sleep and
//! workout logs) and the derived structures the analytics hand back to the
//! caller: factor impacts, correlation bundles, schedule comparisons and the
//! combined sleep insights.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Minutes in a day, used for overnight wraparound
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Whether a factor is expected to help or hurt sleep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorKind {
    Positive,
    Negative,
}

/// Categorical tag attached to a night of sleep
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepFactor {
    // Positive vocabulary
    Exercise,
    Meditation,
    Reading,
    NoScreens,
    CoolRoom,
    ConsistentSchedule,
    Stretching,
    Magnesium,

    // Negative vocabulary
    LateCoffee,
    HeavyMeal,
    LateMeal,
    Alcohol,
    Screens,
    Stress,
    LateWorkout,
    Noise,
    LongNap,
}

impl SleepFactor {
    /// Tags users can report as helping their sleep
    pub const POSITIVE: [SleepFactor; 8] = [
        SleepFactor::Exercise,
        SleepFactor::Meditation,
        SleepFactor::Reading,
        SleepFactor::NoScreens,
        SleepFactor::CoolRoom,
        SleepFactor::ConsistentSchedule,
        SleepFactor::Stretching,
        SleepFactor::Magnesium,
    ];

    /// Tags users can report as hurting their sleep
    pub const NEGATIVE: [SleepFactor; 9] = [
        SleepFactor::LateCoffee,
        SleepFactor::HeavyMeal,
        SleepFactor::LateMeal,
        SleepFactor::Alcohol,
        SleepFactor::Screens,
        SleepFactor::Stress,
        SleepFactor::LateWorkout,
        SleepFactor::Noise,
        SleepFactor::LongNap,
    ];

    pub fn kind(&self) -> FactorKind {
        if Self::POSITIVE.contains(self) {
            FactorKind::Positive
        } else {
            FactorKind::Negative
        }
    }

    /// Stable identifier as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepFactor::Exercise => "exercise",
            SleepFactor::Meditation => "meditation",
            SleepFactor::Reading => "reading",
            SleepFactor::NoScreens => "no_screens",
            SleepFactor::CoolRoom => "cool_room",
            SleepFactor::ConsistentSchedule => "consistent_schedule",
            SleepFactor::Stretching => "stretching",
            SleepFactor::Magnesium => "magnesium",
            SleepFactor::LateCoffee => "late_coffee",
            SleepFactor::HeavyMeal => "heavy_meal",
            SleepFactor::LateMeal => "late_meal",
            SleepFactor::Alcohol => "alcohol",
            SleepFactor::Screens => "screens",
            SleepFactor::Stress => "stress",
            SleepFactor::LateWorkout => "late_workout",
            SleepFactor::Noise => "noise",
            SleepFactor::LongNap => "long_nap",
        }
    }

    /// Human-readable label used in tips
    pub fn label(&self) -> &'static str {
        match self {
            SleepFactor::Exercise => "Exercise",
            SleepFactor::Meditation => "Meditation",
            SleepFactor::Reading => "Reading before bed",
            SleepFactor::NoScreens => "Going screen-free",
            SleepFactor::CoolRoom => "A cool bedroom",
            SleepFactor::ConsistentSchedule => "A consistent schedule",
            SleepFactor::Stretching => "Stretching",
            SleepFactor::Magnesium => "Magnesium",
            SleepFactor::LateCoffee => "late coffee",
            SleepFactor::HeavyMeal => "heavy meals",
            SleepFactor::LateMeal => "eating late",
            SleepFactor::Alcohol => "alcohol",
            SleepFactor::Screens => "screens in bed",
            SleepFactor::Stress => "going to bed stressed",
            SleepFactor::LateWorkout => "late workouts",
            SleepFactor::Noise => "a noisy room",
            SleepFactor::LongNap => "long naps",
        }
    }

    /// Look up a tag by its stored identifier
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::POSITIVE
            .iter()
            .chain(Self::NEGATIVE.iter())
            .copied()
            .find(|factor| factor.as_str() == tag)
    }
}

/// One night of sleep, validated and typed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    /// Night this entry belongs to (unique per user)
    pub date: NaiveDate,
    /// Local clock time the user went to bed
    pub bedtime: NaiveTime,
    /// Local clock time the user woke up
    pub wake_time: NaiveTime,
    /// Derived from bedtime and wake time, wrapping past midnight
    pub duration_minutes: u32,
    /// Subjective rating, 1-5
    pub quality: u8,
    #[serde(default)]
    pub positive_factors: BTreeSet<SleepFactor>,
    #[serde(default)]
    pub negative_factors: BTreeSet<SleepFactor>,
    #[serde(default)]
    pub times_woken: u32,
}

impl SleepRecord {
    /// Create a record with no factors; duration is derived from the clock times
    pub fn new(date: NaiveDate, bedtime: NaiveTime, wake_time: NaiveTime, quality: u8) -> Self {
        Self {
            date,
            bedtime,
            wake_time,
            duration_minutes: sleep_duration_minutes(bedtime, wake_time),
            quality,
            positive_factors: BTreeSet::new(),
            negative_factors: BTreeSet::new(),
            times_woken: 0,
        }
    }

    /// Attach a factor, placing it in the list matching its kind
    pub fn with_factor(mut self, factor: SleepFactor) -> Self {
        match factor.kind() {
            FactorKind::Positive => self.positive_factors.insert(factor),
            FactorKind::Negative => self.negative_factors.insert(factor),
        };
        self
    }

    pub fn has_factor(&self, factor: SleepFactor) -> bool {
        self.positive_factors.contains(&factor) || self.negative_factors.contains(&factor)
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self.date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Clock time for the requested field
    pub fn time_of(&self, field: TimeField) -> NaiveTime {
        match field {
            TimeField::Bedtime => self.bedtime,
            TimeField::WakeTime => self.wake_time,
        }
    }

    /// Hour component of the requested field
    pub fn hour_of(&self, field: TimeField) -> u32 {
        self.time_of(field).hour()
    }
}

/// Minutes between bedtime and wake time, adding a day when wake time is earlier
pub fn sleep_duration_minutes(bedtime: NaiveTime, wake_time: NaiveTime) -> u32 {
    let bed = minutes_since_midnight(bedtime);
    let wake = minutes_since_midnight(wake_time);
    let mut diff = wake - bed;
    if diff < 0 {
        diff += MINUTES_PER_DAY;
    }
    diff as u32
}

/// Clock time expressed as whole minutes since midnight
pub fn minutes_since_midnight(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

/// Which clock time of a sleep record to look at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeField {
    Bedtime,
    WakeTime,
}

/// One workout session from the engagement log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    /// Day the workout happened (paired with the sleep logged that morning)
    pub date: NaiveDate,
    /// Session performance metric (volume, rating, ...), >= 0
    pub performance: f64,
    /// Whether the session set a personal record
    #[serde(default)]
    pub personal_record: bool,
}

/// Percentage quality impact of a factor (derived, never persisted)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorImpact {
    pub factor: SleepFactor,
    /// Signed percentage difference in average quality, rounded
    pub impact: i32,
    /// Nights with the factor present
    pub sample_size: usize,
    #[serde(rename = "type")]
    pub kind: FactorKind,
}

/// Aggregate correlation bundle for a window of sleep records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepCorrelations {
    /// Factor impacts sorted by descending absolute impact
    pub factor_impacts: Vec<FactorImpact>,
    /// Sleep quality vs next-day workout performance, scaled to -100..100
    pub workout_performance_correlation: i32,
    /// Extra chance of a PR after a good night, in percentage points
    pub pr_chance_increase: i32,
    /// Bedtime hour with the best average quality ("HH:00")
    pub best_bedtime: String,
    /// Wake hour with the best average quality ("HH:00")
    pub best_wake_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub late_eating_impact: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caffeine_impact: Option<i32>,
    pub sample_size: usize,
}

/// Averages for one side of the weekday/weekend split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionAverages {
    pub duration_minutes: f64,
    pub quality: f64,
    /// Average bedtime ("HH:MM")
    pub bedtime: String,
    /// Average wake time ("HH:MM")
    pub wake_time: String,
    /// Nights in this partition; zero means the averages are placeholders
    pub sample_size: usize,
}

/// Weekday vs weekend sleep comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayWeekendComparison {
    pub weekday: PartitionAverages,
    pub weekend: PartitionAverages,
}

/// Everything derived from one analysis window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepInsights {
    pub window_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub sample_size: usize,
    pub average_duration_minutes: f64,
    pub average_quality: f64,
    pub correlations: SleepCorrelations,
    pub schedule: WeekdayWeekendComparison,
    pub tips: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_duration_wraps_past_midnight() {
        assert_eq!(sleep_duration_minutes(time(23, 0), time(7, 0)), 480);
        assert_eq!(sleep_duration_minutes(time(0, 30), time(8, 0)), 450);
        assert_eq!(sleep_duration_minutes(time(22, 0), time(22, 0)), 0);
    }

    #[test]
    fn test_factor_vocabulary_is_partitioned() {
        for factor in SleepFactor::POSITIVE {
            assert_eq!(factor.kind(), FactorKind::Positive);
            assert!(!SleepFactor::NEGATIVE.contains(&factor));
        }
        for factor in SleepFactor::NEGATIVE {
            assert_eq!(factor.kind(), FactorKind::Negative);
        }
    }

    #[test]
    fn test_factor_tag_lookup() {
        assert_eq!(SleepFactor::from_tag("late_coffee"), Some(SleepFactor::LateCoffee));
        assert_eq!(SleepFactor::from_tag("exercise"), Some(SleepFactor::Exercise));
        assert_eq!(SleepFactor::from_tag("unicorns"), None);

        let json = serde_json::to_string(&SleepFactor::NoScreens).unwrap();
        assert_eq!(json, "\"no_screens\"");
    }

    #[test]
    fn test_with_factor_places_by_kind() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let record = SleepRecord::new(date, time(23, 0), time(7, 0), 4)
            .with_factor(SleepFactor::Exercise)
            .with_factor(SleepFactor::Alcohol);

        assert!(record.positive_factors.contains(&SleepFactor::Exercise));
        assert!(record.negative_factors.contains(&SleepFactor::Alcohol));
        assert!(record.has_factor(SleepFactor::Alcohol));
        assert!(!record.has_factor(SleepFactor::Noise));
        // 2024-01-15 is a Monday
        assert!(!record.is_weekend());
    }
}
