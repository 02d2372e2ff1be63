//! Daily score calculation
//!
//! A weighted 0-100 score for a single day of engagement: training,
//! nutrition, hydration and sleep logging.

use crate::config::InsightsConfig;
use crate::stats::round_half_up;
use serde::{Deserialize, Serialize};

pub const WORKOUT_POINTS: u32 = 30;
pub const NUTRITION_POINTS: u32 = 30;
pub const WATER_POINTS: u32 = 25;
pub const SLEEP_POINTS: u32 = 15;

const _: () = assert!(WORKOUT_POINTS + NUTRITION_POINTS + WATER_POINTS + SLEEP_POINTS == 100);

/// Inputs to the daily score, already expressed as flags and goal ratios
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyScoreInputs {
    pub workout_completed: bool,
    /// Calories consumed over calorie goal
    pub nutrition_ratio: f64,
    /// Water consumed over water goal
    pub water_ratio: f64,
    pub sleep_logged: bool,
}

/// One day of the engagement log as stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyEngagement {
    #[serde(default)]
    pub workout_completed: bool,
    #[serde(default)]
    pub calories_consumed: f64,
    #[serde(default)]
    pub water_ml: f64,
    #[serde(default)]
    pub sleep_logged: bool,
}

impl DailyScoreInputs {
    /// Express a day of engagement as ratios of the configured goals
    pub fn from_engagement(engagement: &DailyEngagement, config: &InsightsConfig) -> Self {
        Self {
            workout_completed: engagement.workout_completed,
            nutrition_ratio: ratio(engagement.calories_consumed, config.calorie_goal),
            water_ratio: ratio(engagement.water_ml, config.water_goal_ml),
            sleep_logged: engagement.sleep_logged,
        }
    }
}

fn ratio(value: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return 0.0;
    }
    value / goal
}

/// Weighted daily score, 0-100
///
/// Ratios are clamped to [0, 1] before weighting; the sum is rounded half-up.
pub fn daily_score(inputs: &DailyScoreInputs) -> u8 {
    let mut score = 0.0;
    if inputs.workout_completed {
        score += f64::from(WORKOUT_POINTS);
    }
    score += clamp_ratio(inputs.nutrition_ratio) * f64::from(NUTRITION_POINTS);
    score += clamp_ratio(inputs.water_ratio) * f64::from(WATER_POINTS);
    if inputs.sleep_logged {
        score += f64::from(SLEEP_POINTS);
    }

    round_half_up(score).clamp(0.0, 100.0) as u8
}

fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        return 0.0;
    }
    ratio.clamp(0.0, 1.0)
}
