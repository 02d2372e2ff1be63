//! Schedule optimization
//!
//! Finds the bedtime and wake hours associated with the best sleep quality
//! and compares weekday against weekend habits.

use crate::stats::{average, round_half_up};
use crate::types::{
    minutes_since_midnight, PartitionAverages, SleepRecord, TimeField, WeekdayWeekendComparison,
};
use chrono::NaiveTime;
use std::collections::BTreeMap;

/// Minimum nights before suggesting a best hour
pub const MIN_SCHEDULE_RECORDS: usize = 7;

/// Minimum nights within an hour bucket
pub const MIN_HOUR_SAMPLES: usize = 3;

pub const DEFAULT_BEDTIME: &str = "22:00";
pub const DEFAULT_WAKE_TIME: &str = "05:00";

/// Optimizer for bedtime and wake time recommendations
pub struct ScheduleOptimizer;

impl ScheduleOptimizer {
    /// Hour ("HH:00") of `field` with the highest average quality
    ///
    /// Falls back to a fixed default when there are fewer than
    /// [`MIN_SCHEDULE_RECORDS`] nights or no hour has [`MIN_HOUR_SAMPLES`].
    /// Ties go to the earliest hour.
    pub fn best_hour_for(records: &[SleepRecord], field: TimeField) -> String {
        let fallback = default_time(field).to_string();
        if records.len() < MIN_SCHEDULE_RECORDS {
            return fallback;
        }

        let mut by_hour: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        for record in records {
            by_hour
                .entry(record.hour_of(field))
                .or_default()
                .push(f64::from(record.quality));
        }

        let mut best: Option<(u32, f64)> = None;
        for (hour, qualities) in &by_hour {
            if qualities.len() < MIN_HOUR_SAMPLES {
                continue;
            }
            let avg = average(qualities);
            if best.map_or(true, |(_, best_avg)| avg > best_avg) {
                best = Some((*hour, avg));
            }
        }

        match best {
            Some((hour, _)) => format!("{:02}:00", hour),
            None => fallback,
        }
    }

    /// Compare weekday nights against weekend nights (Saturday and Sunday)
    pub fn weekday_vs_weekend(records: &[SleepRecord]) -> WeekdayWeekendComparison {
        let (weekend, weekday): (Vec<&SleepRecord>, Vec<&SleepRecord>) =
            records.iter().partition(|r| r.is_weekend());

        WeekdayWeekendComparison {
            weekday: partition_averages(&weekday),
            weekend: partition_averages(&weekend),
        }
    }

    /// Average of clock times, formatted "HH:MM"
    ///
    /// Times are same-day clock values; no wraparound across midnight is
    /// applied. Returns `None` for an empty slice.
    pub fn average_clock_time(times: &[NaiveTime]) -> Option<String> {
        if times.is_empty() {
            return None;
        }
        let minutes: Vec<f64> = times
            .iter()
            .map(|&t| minutes_since_midnight(t) as f64)
            .collect();
        let avg = round_half_up(average(&minutes)) as i64;
        Some(format!("{:02}:{:02}", avg / 60, avg % 60))
    }
}

fn default_time(field: TimeField) -> &'static str {
    match field {
        TimeField::Bedtime => DEFAULT_BEDTIME,
        TimeField::WakeTime => DEFAULT_WAKE_TIME,
    }
}

fn partition_averages(records: &[&SleepRecord]) -> PartitionAverages {
    if records.is_empty() {
        return PartitionAverages {
            duration_minutes: 0.0,
            quality: 0.0,
            bedtime: DEFAULT_BEDTIME.to_string(),
            wake_time: DEFAULT_WAKE_TIME.to_string(),
            sample_size: 0,
        };
    }

    let durations: Vec<f64> = records.iter().map(|r| f64::from(r.duration_minutes)).collect();
    let qualities: Vec<f64> = records.iter().map(|r| f64::from(r.quality)).collect();
    let bedtimes: Vec<NaiveTime> = records.iter().map(|r| r.bedtime).collect();
    let wake_times: Vec<NaiveTime> = records.iter().map(|r| r.wake_time).collect();

    PartitionAverages {
        duration_minutes: average(&durations),
        quality: average(&qualities),
        bedtime: ScheduleOptimizer::average_clock_time(&bedtimes)
            .unwrap_or_else(|| DEFAULT_BEDTIME.to_string()),
        wake_time: ScheduleOptimizer::average_clock_time(&wake_times)
            .unwrap_or_else(|| DEFAULT_WAKE_TIME.to_string()),
        sample_size: records.len(),
    }
}
