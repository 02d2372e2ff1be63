//! Configuration resolution
//!
//! Stored profile settings are sparse: a user may have set a sleep goal but
//! never touched the water goal. [`StoredSettings::resolve`] merges whatever
//! was stored over [`InsightsConfig::default`] once, so the rest of the crate
//! only ever sees a fully-populated [`InsightsConfig`].

use crate::error::InsightsError;
use crate::medication::{MedicationSchedule, RestrictionKind};
use crate::schema::parse_clock_time;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

pub const DEFAULT_SLEEP_GOAL_HOURS: f64 = 8.0;
pub const DEFAULT_CALORIE_GOAL: f64 = 2000.0;
pub const DEFAULT_WATER_GOAL_ML: f64 = 2500.0;

/// Window of days an analysis looks back over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum AnalysisWindow {
    Week,
    #[default]
    Month,
    Quarter,
}

impl AnalysisWindow {
    pub fn days(&self) -> u32 {
        match self {
            AnalysisWindow::Week => 7,
            AnalysisWindow::Month => 30,
            AnalysisWindow::Quarter => 90,
        }
    }
}

impl From<AnalysisWindow> for u32 {
    fn from(window: AnalysisWindow) -> Self {
        window.days()
    }
}

impl TryFrom<u32> for AnalysisWindow {
    type Error = UnsupportedWindow;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            7 => Ok(AnalysisWindow::Week),
            30 => Ok(AnalysisWindow::Month),
            90 => Ok(AnalysisWindow::Quarter),
            other => Err(UnsupportedWindow(other)),
        }
    }
}

/// Window length other than 7, 30 or 90 days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedWindow(pub u32);

impl fmt::Display for UnsupportedWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported analysis window of {} days (use 7, 30 or 90)", self.0)
    }
}

/// Fully-resolved configuration consumed by the analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsConfig {
    pub sleep_goal_hours: f64,
    pub calorie_goal: f64,
    pub water_goal_ml: f64,
    pub analysis_window: AnalysisWindow,
    pub medication: MedicationSchedule,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            sleep_goal_hours: DEFAULT_SLEEP_GOAL_HOURS,
            calorie_goal: DEFAULT_CALORIE_GOAL,
            water_goal_ml: DEFAULT_WATER_GOAL_ML,
            analysis_window: AnalysisWindow::default(),
            medication: MedicationSchedule::default(),
        }
    }
}

/// Medication settings as stored; every field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredMedication {
    pub enabled: Option<bool>,
    /// "HH:MM"
    pub time_of_day: Option<String>,
    pub fast_before_hours: Option<u32>,
    pub restriction_after_hours: Option<u32>,
    pub restriction_kind: Option<RestrictionKind>,
    pub taken_today: Option<bool>,
}

/// Profile and goal settings as stored; every field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredSettings {
    pub sleep_goal_hours: Option<f64>,
    pub calorie_goal: Option<f64>,
    pub water_goal_ml: Option<f64>,
    pub analysis_window_days: Option<u32>,
    pub medication: Option<StoredMedication>,
}

impl StoredSettings {
    /// Parse settings from a TOML document
    pub fn from_toml_str(toml_str: &str) -> Result<Self, InsightsError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Parse settings from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, InsightsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Merge stored values over the defaults and validate the result
    pub fn resolve(self) -> Result<InsightsConfig, InsightsError> {
        let defaults = InsightsConfig::default();

        let analysis_window = match self.analysis_window_days {
            Some(days) => AnalysisWindow::try_from(days)
                .map_err(|e| InsightsError::ConfigError(e.to_string()))?,
            None => defaults.analysis_window,
        };

        let medication = match self.medication {
            Some(stored) => resolve_medication(stored, defaults.medication)?,
            None => defaults.medication,
        };

        let config = InsightsConfig {
            sleep_goal_hours: self.sleep_goal_hours.unwrap_or(defaults.sleep_goal_hours),
            calorie_goal: self.calorie_goal.unwrap_or(defaults.calorie_goal),
            water_goal_ml: self.water_goal_ml.unwrap_or(defaults.water_goal_ml),
            analysis_window,
            medication,
        };

        config.validate()?;
        Ok(config)
    }
}

fn resolve_medication(
    stored: StoredMedication,
    defaults: MedicationSchedule,
) -> Result<MedicationSchedule, InsightsError> {
    let time_of_day = match stored.time_of_day.as_deref() {
        Some(raw) => parse_clock_time(raw).map_err(|e| InsightsError::ConfigError(e.to_string()))?,
        None => defaults.time_of_day,
    };

    Ok(MedicationSchedule {
        enabled: stored.enabled.unwrap_or(defaults.enabled),
        time_of_day,
        fast_before_hours: stored.fast_before_hours.unwrap_or(defaults.fast_before_hours),
        restriction_after_hours: stored
            .restriction_after_hours
            .unwrap_or(defaults.restriction_after_hours),
        restriction_kind: stored.restriction_kind.unwrap_or(defaults.restriction_kind),
        taken_today: stored.taken_today.unwrap_or(defaults.taken_today),
    })
}

impl InsightsConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<(), InsightsError> {
        if !(self.sleep_goal_hours > 0.0 && self.sleep_goal_hours <= 24.0) {
            warn!(goal = self.sleep_goal_hours, "rejecting sleep goal");
            return Err(InsightsError::ConfigError(format!(
                "sleep goal must be within (0, 24] hours, got {}",
                self.sleep_goal_hours
            )));
        }
        for (name, value) in [
            ("calorie_goal", self.calorie_goal),
            ("water_goal_ml", self.water_goal_ml),
        ] {
            if !value.is_finite() || value < 0.0 {
                warn!(field = name, value, "rejecting goal");
                return Err(InsightsError::ConfigError(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.medication.fast_before_hours > 24 || self.medication.restriction_after_hours > 24 {
            return Err(InsightsError::ConfigError(
                "medication fasting and restriction periods must not exceed 24 hours".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_settings_resolve_to_defaults() {
        let config = StoredSettings::default().resolve().unwrap();
        assert_eq!(config, InsightsConfig::default());
        assert_eq!(config.analysis_window.days(), 30);
        assert!(!config.medication.enabled);
    }

    #[test]
    fn test_partial_settings_merge_over_defaults() {
        let toml_str = r#"
            sleep_goal_hours = 7.5
            analysis_window_days = 90

            [medication]
            enabled = true
            time_of_day = "09:30"
        "#;

        let config = StoredSettings::from_toml_str(toml_str).unwrap().resolve().unwrap();
        assert_eq!(config.sleep_goal_hours, 7.5);
        assert_eq!(config.calorie_goal, DEFAULT_CALORIE_GOAL);
        assert_eq!(config.water_goal_ml, DEFAULT_WATER_GOAL_ML);
        assert_eq!(config.analysis_window, AnalysisWindow::Quarter);
        assert!(config.medication.enabled);
        assert_eq!(
            config.medication.time_of_day,
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(config.medication.fast_before_hours, 2);
        assert_eq!(config.medication.restriction_kind, RestrictionKind::DairyAndCalcium);
    }

    #[test]
    fn test_json_settings() {
        let json = r#"{"water_goal_ml": 3000, "medication": {"restriction_kind": "antacids"}}"#;
        let config = StoredSettings::from_json_str(json).unwrap().resolve().unwrap();
        assert_eq!(config.water_goal_ml, 3000.0);
        assert_eq!(config.medication.restriction_kind, RestrictionKind::Antacids);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let bad_goal = StoredSettings {
            sleep_goal_hours: Some(0.0),
            ..StoredSettings::default()
        };
        assert!(matches!(bad_goal.resolve(), Err(InsightsError::ConfigError(_))));

        let bad_window = StoredSettings {
            analysis_window_days: Some(14),
            ..StoredSettings::default()
        };
        assert!(matches!(bad_window.resolve(), Err(InsightsError::ConfigError(_))));

        let bad_time = StoredSettings {
            medication: Some(StoredMedication {
                time_of_day: Some("25:99".to_string()),
                ..StoredMedication::default()
            }),
            ..StoredSettings::default()
        };
        assert!(bad_time.resolve().is_err());
    }

    #[test]
    fn test_window_serializes_as_days() {
        let json = serde_json::to_string(&AnalysisWindow::Week).unwrap();
        assert_eq!(json, "7");
        let window: AnalysisWindow = serde_json::from_str("90").unwrap();
        assert_eq!(window, AnalysisWindow::Quarter);
        assert!(serde_json::from_str::<AnalysisWindow>("12").is_err());
    }
}
