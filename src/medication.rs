//! Medication timing
//!
//! Some medications must be taken on an empty stomach and restrict certain
//! foods afterwards. The status is derived from the wall-clock time on every
//! call; only the "taken today" flag is persisted by the caller.

use crate::types::minutes_since_midnight;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Minutes after the scheduled time during which the dose is still "take now"
pub const TAKE_WINDOW_MINUTES: i64 = 30;

/// What must be avoided after the dose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictionKind {
    DairyAndCalcium,
    Antacids,
    Minerals,
    Food,
}

impl RestrictionKind {
    pub fn label(&self) -> &'static str {
        match self {
            RestrictionKind::DairyAndCalcium => "dairy and calcium",
            RestrictionKind::Antacids => "antacids",
            RestrictionKind::Minerals => "iron, zinc and magnesium supplements",
            RestrictionKind::Food => "food",
        }
    }
}

/// Per-user dose schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationSchedule {
    pub enabled: bool,
    /// Scheduled local time of the dose
    pub time_of_day: NaiveTime,
    /// Hours of fasting required before the dose
    pub fast_before_hours: u32,
    /// Hours the restriction lasts after the dose
    pub restriction_after_hours: u32,
    pub restriction_kind: RestrictionKind,
    #[serde(default)]
    pub taken_today: bool,
}

impl Default for MedicationSchedule {
    fn default() -> Self {
        Self {
            enabled: false,
            time_of_day: NaiveTime::from_hms_opt(14, 0, 0).unwrap_or_default(),
            fast_before_hours: 2,
            restriction_after_hours: 4,
            restriction_kind: RestrictionKind::DairyAndCalcium,
            taken_today: false,
        }
    }
}

/// Phase of the day relative to the dose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedicationPhase {
    NotConfigured,
    BeforeFast,
    Fasting,
    TakeNow,
    Restriction,
    Free,
}

/// Derived status shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationStatus {
    pub phase: MedicationPhase,
    pub message: String,
    /// Minutes until the next boundary, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes_remaining: Option<i64>,
}

/// Boundaries of the day in minutes since midnight
///
/// `fast_start` can be negative and `restriction_end` can exceed a day; the
/// comparison against the current time stays linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Boundaries {
    fast_start: i64,
    take_time: i64,
    take_window_end: i64,
    restriction_end: i64,
}

impl Boundaries {
    fn of(schedule: &MedicationSchedule) -> Self {
        let take_time = minutes_since_midnight(schedule.time_of_day);
        Self {
            fast_start: take_time - i64::from(schedule.fast_before_hours) * 60,
            take_time,
            take_window_end: take_time + TAKE_WINDOW_MINUTES,
            restriction_end: take_time + i64::from(schedule.restriction_after_hours) * 60,
        }
    }
}

/// Classify the current time against the schedule
pub fn classify(schedule: &MedicationSchedule, now: NaiveTime) -> MedicationStatus {
    if !schedule.enabled {
        return MedicationStatus {
            phase: MedicationPhase::NotConfigured,
            message: "Medication reminders are not set up".to_string(),
            minutes_remaining: None,
        };
    }

    let b = Boundaries::of(schedule);
    let now = minutes_since_midnight(now);
    let restriction = schedule.restriction_kind.label();

    if schedule.taken_today {
        return if now < b.restriction_end {
            let remaining = b.restriction_end - now;
            MedicationStatus {
                phase: MedicationPhase::Restriction,
                message: format!("Dose taken. Avoid {} for {} more minutes", restriction, remaining),
                minutes_remaining: Some(remaining),
            }
        } else {
            MedicationStatus {
                phase: MedicationPhase::Free,
                message: "Dose taken. No restrictions for the rest of the day".to_string(),
                minutes_remaining: None,
            }
        };
    }

    if now < b.fast_start {
        let remaining = b.fast_start - now;
        MedicationStatus {
            phase: MedicationPhase::BeforeFast,
            message: format!(
                "Start fasting at {} ({} minutes from now)",
                format_minutes(b.fast_start),
                remaining
            ),
            minutes_remaining: Some(remaining),
        }
    } else if now < b.take_time {
        let remaining = b.take_time - now;
        MedicationStatus {
            phase: MedicationPhase::Fasting,
            message: format!("Fasting. Take your dose in {} minutes", remaining),
            minutes_remaining: Some(remaining),
        }
    } else if now < b.take_window_end {
        let remaining = b.take_window_end - now;
        MedicationStatus {
            phase: MedicationPhase::TakeNow,
            message: format!("Take your dose now ({} minutes left in the window)", remaining),
            minutes_remaining: Some(remaining),
        }
    } else {
        MedicationStatus {
            phase: MedicationPhase::Free,
            message: "Dose not taken today. The window has passed".to_string(),
            minutes_remaining: None,
        }
    }
}

fn format_minutes(minutes: i64) -> String {
    let m = minutes.rem_euclid(24 * 60);
    format!("{:02}:{:02}", m / 60, m % 60)
}
