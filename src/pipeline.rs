//! Pipeline orchestration
//!
//! This module provides the public API for Wellness Insights.
//! It orchestrates the full pipeline from stored JSON rows to the insights
//! payload.

use crate::config::InsightsConfig;
use crate::correlations::compute_correlations;
use crate::encoder::{InsightsEncoder, InsightsPayload};
use crate::error::InsightsError;
use crate::medication::{classify, MedicationStatus};
use crate::schedule::ScheduleOptimizer;
use crate::schema::{RowAdapter, SleepLogRow, WorkoutLogRow};
use crate::score::{daily_score, DailyEngagement, DailyScoreInputs};
use crate::stats::{average, round_to};
use crate::tips::TipGenerator;
use crate::types::{SleepInsights, SleepRecord, WorkoutRecord};
use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::debug;

/// Convert stored sleep (and optional workout) rows into an insights payload.
///
/// # Arguments
/// * `sleep_json` - Sleep log rows, JSON array or NDJSON
/// * `workouts_json` - Workout log rows, JSON array or NDJSON
///
/// # Returns
/// Insights JSON payload for the default analysis window
///
/// # Example
/// ```ignore
/// let payload = sleep_rows_to_insights(sleep_json, Some(workouts_json))?;
/// ```
pub fn sleep_rows_to_insights(
    sleep_json: String,
    workouts_json: Option<String>,
) -> Result<String, InsightsError> {
    InsightsProcessor::new().process_json(&sleep_json, workouts_json.as_deref())
}

/// Processor holding resolved settings and an encoder.
///
/// Immutable after construction; reuse it across calls to keep one
/// producer instance id.
pub struct InsightsProcessor {
    config: InsightsConfig,
    encoder: InsightsEncoder,
}

impl Default for InsightsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightsProcessor {
    /// Create a new processor with default settings
    pub fn new() -> Self {
        Self::with_config(InsightsConfig::default())
    }

    /// Create a processor with resolved settings
    pub fn with_config(config: InsightsConfig) -> Self {
        Self {
            config,
            encoder: InsightsEncoder::new(),
        }
    }

    /// Replace the encoder, e.g. to pin the instance id
    pub fn with_encoder(mut self, encoder: InsightsEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    /// Analyze the configured window of sleep records.
    ///
    /// The window ends at `as_of`, or at the most recent record when not
    /// given, and covers `analysis_window` days including that date.
    pub fn analyze_sleep(
        &self,
        sleep: &[SleepRecord],
        workouts: &[WorkoutRecord],
        as_of: Option<NaiveDate>,
    ) -> SleepInsights {
        let window_days = self.config.analysis_window.days();
        let end = as_of.or_else(|| sleep.iter().map(|r| r.date).max());

        let (records, workouts) = match end {
            Some(end) => {
                let start = end - Duration::days(i64::from(window_days));
                let in_window = |date: NaiveDate| date > start && date <= end;
                let mut records: Vec<SleepRecord> =
                    sleep.iter().filter(|r| in_window(r.date)).cloned().collect();
                records.sort_by(|a, b| b.date.cmp(&a.date));
                let workouts: Vec<WorkoutRecord> =
                    workouts.iter().filter(|w| in_window(w.date)).cloned().collect();
                (records, workouts)
            }
            None => (Vec::new(), Vec::new()),
        };

        let durations: Vec<f64> = records.iter().map(|r| f64::from(r.duration_minutes)).collect();
        let qualities: Vec<f64> = records.iter().map(|r| f64::from(r.quality)).collect();

        debug!(
            window_days,
            records = records.len(),
            workouts = workouts.len(),
            "analyzing sleep window"
        );

        SleepInsights {
            window_days,
            start_date: records.last().map(|r| r.date),
            end_date: records.first().map(|r| r.date),
            sample_size: records.len(),
            average_duration_minutes: round_to(average(&durations), 1),
            average_quality: round_to(average(&qualities), 1),
            correlations: compute_correlations(&records, &workouts),
            schedule: ScheduleOptimizer::weekday_vs_weekend(&records),
            tips: TipGenerator::generate_tips(&records, self.config.sleep_goal_hours),
        }
    }

    /// Wrap insights in a versioned payload from this processor's encoder
    pub fn encode(&self, insights: &SleepInsights) -> InsightsPayload {
        self.encoder.encode(insights)
    }

    /// Parse rows, analyze, and encode the insights payload
    pub fn process_json(
        &self,
        sleep_json: &str,
        workouts_json: Option<&str>,
    ) -> Result<String, InsightsError> {
        let sleep_rows: Vec<SleepLogRow> = RowAdapter::parse_auto(sleep_json)?;
        let sleep = RowAdapter::to_sleep_records(&sleep_rows)?;

        let workouts = match workouts_json {
            Some(json) => {
                let rows: Vec<WorkoutLogRow> = RowAdapter::parse_auto(json)?;
                RowAdapter::to_workout_records(&rows)?
            }
            None => Vec::new(),
        };

        let insights = self.analyze_sleep(&sleep, &workouts, None);
        self.encoder.encode_to_json(&insights)
    }

    /// Score one day of engagement against the configured goals
    pub fn daily_score(&self, engagement: &DailyEngagement) -> u8 {
        daily_score(&DailyScoreInputs::from_engagement(engagement, &self.config))
    }

    /// Medication status at `now` for the configured schedule
    pub fn medication_status(&self, now: NaiveTime) -> MedicationStatus {
        classify(&self.config.medication, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisWindow;
    use crate::medication::MedicationPhase;
    use pretty_assertions::assert_eq;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    /// Ten nights starting Monday 2024-01-01, 23:00 to 07:00
    fn ten_nights() -> Vec<SleepRecord> {
        (0..10)
            .map(|day| {
                let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(day);
                SleepRecord::new(date, time(23, 0), time(7, 0), if day % 2 == 0 { 4 } else { 3 })
            })
            .collect()
    }

    fn sample_rows_json() -> String {
        let rows: Vec<String> = (1..=9)
            .map(|day| {
                format!(
                    r#"{{"date": "2024-01-{:02}", "bedtime": "22:30", "wake_time": "06:00", "quality": {}}}"#,
                    day,
                    if day <= 5 { 4 } else { 3 }
                )
            })
            .collect();
        format!("[{}]", rows.join(","))
    }

    #[test]
    fn test_analyze_full_window() {
        let processor = InsightsProcessor::new();
        let insights = processor.analyze_sleep(&ten_nights(), &[], None);

        assert_eq!(insights.window_days, 30);
        assert_eq!(insights.sample_size, 10);
        assert_eq!(insights.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(insights.end_date, NaiveDate::from_ymd_opt(2024, 1, 10));
        assert_eq!(insights.average_duration_minutes, 480.0);
        assert_eq!(insights.average_quality, 3.5);
        assert_eq!(insights.schedule.weekend.sample_size, 2);
        assert_eq!(insights.schedule.weekday.sample_size, 8);
        assert!(!insights.tips.is_empty());
    }

    #[test]
    fn test_window_trims_old_records() {
        let config = InsightsConfig {
            analysis_window: AnalysisWindow::Week,
            ..InsightsConfig::default()
        };
        let processor = InsightsProcessor::with_config(config);

        let insights = processor.analyze_sleep(&ten_nights(), &[], None);
        assert_eq!(insights.sample_size, 7);
        assert_eq!(insights.start_date, NaiveDate::from_ymd_opt(2024, 1, 4));

        let as_of = NaiveDate::from_ymd_opt(2024, 1, 5);
        let insights = processor.analyze_sleep(&ten_nights(), &[], as_of);
        assert_eq!(insights.sample_size, 5);
        assert_eq!(insights.end_date, as_of);
    }

    #[test]
    fn test_empty_input_degrades() {
        let insights = InsightsProcessor::new().analyze_sleep(&[], &[], None);

        assert_eq!(insights.sample_size, 0);
        assert_eq!(insights.start_date, None);
        assert_eq!(insights.average_quality, 0.0);
        assert_eq!(insights.correlations.best_bedtime, "22:00");
        assert_eq!(insights.tips.len(), 1);
    }

    #[test]
    fn test_process_json() {
        let processor = InsightsProcessor::new()
            .with_encoder(InsightsEncoder::with_instance_id("pinned".to_string()));
        let workouts = r#"[{"date": "2024-01-02", "performance": 900.0, "personal_record": true}]"#;

        let json = processor
            .process_json(&sample_rows_json(), Some(workouts))
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["producer"]["instance_id"], "pinned");
        assert_eq!(parsed["quality"]["sample_size"], 9);
        assert_eq!(parsed["quality"]["sufficient_data"], true);
        assert_eq!(parsed["insights"]["end_date"], "2024-01-09");
    }

    #[test]
    fn test_sleep_rows_to_insights_rejects_bad_rows() {
        let bad = r#"[{"date": "2024-01-01", "bedtime": "23:00", "wake_time": "07:00", "quality": 7}]"#;
        let result = sleep_rows_to_insights(bad.to_string(), None);
        assert!(matches!(result, Err(InsightsError::Validation(_))));

        assert!(sleep_rows_to_insights("not json".to_string(), None).is_err());
    }

    #[test]
    fn test_daily_score_and_medication() {
        let mut config = InsightsConfig::default();
        config.medication.enabled = true;
        let processor = InsightsProcessor::with_config(config);

        let engagement = DailyEngagement {
            workout_completed: true,
            calories_consumed: 2000.0,
            water_ml: 2500.0,
            sleep_logged: true,
        };
        assert_eq!(processor.daily_score(&engagement), 100);
        assert_eq!(processor.daily_score(&DailyEngagement::default()), 0);

        assert_eq!(
            processor.medication_status(time(13, 0)).phase,
            MedicationPhase::Fasting
        );
        assert_eq!(
            InsightsProcessor::new().medication_status(time(13, 0)).phase,
            MedicationPhase::NotConfigured
        );
    }
}
