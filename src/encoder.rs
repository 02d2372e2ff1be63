//! Insights encoding
//!
//! This module wraps computed sleep insights in a versioned JSON payload.
//! Ensures producer metadata and data-quality fields are always present.

use crate::error::InsightsError;
use crate::schedule::MIN_SCHEDULE_RECORDS;
use crate::types::SleepInsights;
use crate::{INSIGHTS_VERSION, PRODUCER_NAME};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current insights payload schema version
pub const PAYLOAD_SCHEMA_VERSION: &str = "wellness.insights.v1";

/// Versioned payload around one analysis window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsPayload {
    pub schema_version: String,
    pub producer: InsightsProducer,
    pub computed_at_utc: String,
    pub window: InsightsWindow,
    pub quality: InsightsQuality,
    pub insights: SleepInsights,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightsProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightsWindow {
    pub days: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightsQuality {
    pub sample_size: usize,
    /// Enough nights for schedule analysis and personalized tips
    pub sufficient_data: bool,
}

/// Encoder for producing insights payloads
pub struct InsightsEncoder {
    instance_id: String,
}

impl Default for InsightsEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightsEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn encode(&self, insights: &SleepInsights) -> InsightsPayload {
        InsightsPayload {
            schema_version: PAYLOAD_SCHEMA_VERSION.to_string(),
            producer: InsightsProducer {
                name: PRODUCER_NAME.to_string(),
                version: INSIGHTS_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            window: InsightsWindow {
                days: insights.window_days,
                start_date: insights.start_date,
                end_date: insights.end_date,
            },
            quality: InsightsQuality {
                sample_size: insights.sample_size,
                sufficient_data: insights.sample_size >= MIN_SCHEDULE_RECORDS,
            },
            insights: insights.clone(),
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(&self, insights: &SleepInsights) -> Result<String, InsightsError> {
        let payload = self.encode(insights);
        serde_json::to_string_pretty(&payload)
            .map_err(|e| InsightsError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PartitionAverages, SleepCorrelations, WeekdayWeekendComparison};
    use pretty_assertions::assert_eq;

    fn partition(sample_size: usize) -> PartitionAverages {
        PartitionAverages {
            duration_minutes: 450.0,
            quality: 3.5,
            bedtime: "23:00".to_string(),
            wake_time: "06:30".to_string(),
            sample_size,
        }
    }

    fn make_insights(sample_size: usize) -> SleepInsights {
        SleepInsights {
            window_days: 30,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 30),
            sample_size,
            average_duration_minutes: 450.0,
            average_quality: 3.5,
            correlations: SleepCorrelations {
                factor_impacts: vec![],
                workout_performance_correlation: 0,
                pr_chance_increase: 0,
                best_bedtime: "22:00".to_string(),
                best_wake_time: "05:00".to_string(),
                late_eating_impact: None,
                caffeine_impact: None,
                sample_size,
            },
            schedule: WeekdayWeekendComparison {
                weekday: partition(sample_size),
                weekend: partition(0),
            },
            tips: vec!["Keep logging".to_string()],
        }
    }

    #[test]
    fn test_encode_payload() {
        let encoder = InsightsEncoder::with_instance_id("test-instance".to_string());
        let payload = encoder.encode(&make_insights(12));

        assert_eq!(payload.schema_version, PAYLOAD_SCHEMA_VERSION);
        assert_eq!(
            payload.producer,
            InsightsProducer {
                name: PRODUCER_NAME.to_string(),
                version: INSIGHTS_VERSION.to_string(),
                instance_id: "test-instance".to_string(),
            }
        );
        assert_eq!(payload.window.days, 30);
        assert_eq!(payload.window.end_date, NaiveDate::from_ymd_opt(2024, 1, 30));
        assert_eq!(
            payload.quality,
            InsightsQuality {
                sample_size: 12,
                sufficient_data: true,
            }
        );
    }

    #[test]
    fn test_sparse_window_flagged() {
        let payload = InsightsEncoder::new().encode(&make_insights(3));
        assert!(!payload.quality.sufficient_data);
    }

    #[test]
    fn test_encode_to_json() {
        let encoder = InsightsEncoder::new();
        let json = encoder.encode_to_json(&make_insights(8)).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["schema_version"], "wellness.insights.v1");
        assert!(parsed.get("producer").is_some());
        assert!(parsed.get("computed_at_utc").is_some());
        assert_eq!(parsed["insights"]["schedule"]["weekend"]["sample_size"], 0);
    }
}
