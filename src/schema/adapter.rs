//! Adapter for converting stored rows into typed records
//!
//! Accepts rows as a JSON array or NDJSON, validates each one, and returns
//! records in the order the analytics expect (most recent night first).

use crate::error::InsightsError;
use crate::schema::rows::*;
use crate::types::{SleepRecord, WorkoutRecord};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Adapter for converting rows to typed records
pub struct RowAdapter;

impl RowAdapter {
    /// Parse a JSON string containing an array of rows
    pub fn parse_array<T: DeserializeOwned>(json: &str) -> Result<Vec<T>, InsightsError> {
        let rows: Vec<T> = serde_json::from_str(json)?;
        Ok(rows)
    }

    /// Parse NDJSON (newline-delimited JSON) containing rows
    pub fn parse_ndjson<T: DeserializeOwned>(ndjson: &str) -> Result<Vec<T>, InsightsError> {
        let mut rows = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<T>(trimmed) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    return Err(InsightsError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(rows)
    }

    /// Parse either a JSON array or NDJSON, decided by the first character
    pub fn parse_auto<T: DeserializeOwned>(input: &str) -> Result<Vec<T>, InsightsError> {
        if input.trim_start().starts_with('[') {
            Self::parse_array(input)
        } else {
            Self::parse_ndjson(input)
        }
    }

    /// Convert sleep rows to records, most recent first
    ///
    /// Fails on the first invalid row or on two rows for the same night.
    pub fn to_sleep_records(rows: &[SleepLogRow]) -> Result<Vec<SleepRecord>, InsightsError> {
        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(rows.len());

        for (idx, row) in rows.iter().enumerate() {
            let record = SleepRecord::try_from(row).map_err(|e| {
                warn!(index = idx, id = ?row.id, error = %e, "rejecting sleep row");
                e
            })?;
            if !seen.insert(record.date) {
                return Err(ValidationError::DuplicateDate(record.date).into());
            }
            records.push(record);
        }

        records.sort_by(|a, b| b.date.cmp(&a.date));
        debug!(records = records.len(), "validated sleep rows");
        Ok(records)
    }

    /// Convert workout rows to records, most recent first
    pub fn to_workout_records(rows: &[WorkoutLogRow]) -> Result<Vec<WorkoutRecord>, InsightsError> {
        let mut records = rows
            .iter()
            .map(WorkoutRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    /// Validate a batch of sleep rows, reporting every failure
    pub fn validate_sleep_rows(rows: &[SleepLogRow]) -> Vec<ValidationResult> {
        let mut seen = HashSet::new();
        rows.iter()
            .enumerate()
            .filter_map(|(idx, row)| {
                let error = match SleepRecord::try_from(row) {
                    Ok(record) if !seen.insert(record.date) => {
                        Some(ValidationError::DuplicateDate(record.date))
                    }
                    Ok(_) => None,
                    Err(e) => Some(e),
                };
                error.map(|error| ValidationResult {
                    index: idx,
                    row_id: row.id.clone(),
                    date: row.date.clone(),
                    error,
                })
            })
            .collect()
    }
}

/// A row that failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub index: usize,
    pub row_id: Option<String>,
    pub date: String,
    pub error: ValidationError,
}
