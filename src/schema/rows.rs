//! Row definitions and row-level validation

use crate::types::{
    sleep_duration_minutes, FactorKind, SleepFactor, SleepRecord, WorkoutRecord,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// A sleep log row as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepLogRow {
    /// Row identifier, kept for error reporting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM or HH:MM:SS
    pub bedtime: String,
    /// HH:MM or HH:MM:SS
    pub wake_time: String,
    pub quality: i64,
    #[serde(default)]
    pub positive_factors: Vec<String>,
    #[serde(default)]
    pub negative_factors: Vec<String>,
    #[serde(default)]
    pub times_woken: Option<i64>,
}

/// A workout log row as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutLogRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// YYYY-MM-DD
    pub date: String,
    pub performance: f64,
    #[serde(default)]
    pub personal_record: bool,
}

/// Reasons a stored row cannot become a typed record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid {field} '{value}', expected HH:MM")]
    InvalidTime { field: String, value: String },

    #[error("Quality {0} is outside 1-5")]
    QualityOutOfRange(i64),

    #[error("times_woken cannot be negative, got {0}")]
    NegativeTimesWoken(i64),

    #[error("times_woken {0} is too large")]
    TimesWokenOutOfRange(i64),

    #[error("Unknown sleep factor '{0}'")]
    UnknownFactor(String),

    #[error("Factor '{factor}' is not a {expected:?} factor")]
    FactorPolarity { factor: String, expected: FactorKind },

    #[error("Workout performance must be a non-negative number, got {0}")]
    InvalidPerformance(f64),

    #[error("Duplicate sleep log for {0}")]
    DuplicateDate(NaiveDate),
}

/// Parse a calendar date (YYYY-MM-DD)
pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}

/// Parse a local clock time, accepting HH:MM and HH:MM:SS
pub fn parse_clock_time(raw: &str) -> Result<NaiveTime, ValidationError> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidTime {
            field: "time".to_string(),
            value: raw.to_string(),
        })
}

fn parse_field_time(field: &str, raw: &str) -> Result<NaiveTime, ValidationError> {
    parse_clock_time(raw).map_err(|_| ValidationError::InvalidTime {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

fn parse_factors(
    tags: &[String],
    expected: FactorKind,
) -> Result<BTreeSet<SleepFactor>, ValidationError> {
    tags.iter()
        .map(|tag| {
            let factor = SleepFactor::from_tag(tag.trim())
                .ok_or_else(|| ValidationError::UnknownFactor(tag.clone()))?;
            if factor.kind() != expected {
                return Err(ValidationError::FactorPolarity {
                    factor: tag.clone(),
                    expected,
                });
            }
            Ok(factor)
        })
        .collect()
}

impl SleepLogRow {
    /// Check the row without converting it
    pub fn validate(&self) -> Result<(), ValidationError> {
        SleepRecord::try_from(self).map(|_| ())
    }
}

impl TryFrom<&SleepLogRow> for SleepRecord {
    type Error = ValidationError;

    fn try_from(row: &SleepLogRow) -> Result<Self, Self::Error> {
        let date = parse_date(&row.date)?;
        let bedtime = parse_field_time("bedtime", &row.bedtime)?;
        let wake_time = parse_field_time("wake_time", &row.wake_time)?;

        if !(1..=5).contains(&row.quality) {
            return Err(ValidationError::QualityOutOfRange(row.quality));
        }

        let times_woken = match row.times_woken {
            Some(n) if n < 0 => return Err(ValidationError::NegativeTimesWoken(n)),
            Some(n) => u32::try_from(n).map_err(|_| ValidationError::TimesWokenOutOfRange(n))?,
            None => 0,
        };

        Ok(SleepRecord {
            date,
            bedtime,
            wake_time,
            duration_minutes: sleep_duration_minutes(bedtime, wake_time),
            quality: row.quality as u8,
            positive_factors: parse_factors(&row.positive_factors, FactorKind::Positive)?,
            negative_factors: parse_factors(&row.negative_factors, FactorKind::Negative)?,
            times_woken,
        })
    }
}

impl TryFrom<&WorkoutLogRow> for WorkoutRecord {
    type Error = ValidationError;

    fn try_from(row: &WorkoutLogRow) -> Result<Self, Self::Error> {
        let date = parse_date(&row.date)?;
        if !row.performance.is_finite() || row.performance < 0.0 {
            return Err(ValidationError::InvalidPerformance(row.performance));
        }
        Ok(WorkoutRecord {
            date,
            performance: row.performance,
            personal_record: row.personal_record,
        })
    }
}
