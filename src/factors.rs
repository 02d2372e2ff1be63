//! Factor impact analysis
//!
//! Measures how much each tagged factor (caffeine, exercise, ...) moves the
//! average sleep quality, comparing nights with the tag against nights
//! without it.

use crate::stats::{average, round_half_up};
use crate::types::{FactorImpact, SleepFactor, SleepRecord};
use tracing::debug;

/// Both sides of the split need at least this many nights
pub const MIN_FACTOR_SAMPLES: usize = 3;

/// Analyzer for factor quality impacts
pub struct FactorImpactAnalyzer;

impl FactorImpactAnalyzer {
    /// Compute impacts for every factor in `vocabulary`
    ///
    /// Factors with too few nights on either side of the split are omitted.
    /// The result is sorted by descending absolute impact.
    pub fn analyze(records: &[SleepRecord], vocabulary: &[SleepFactor]) -> Vec<FactorImpact> {
        let mut impacts: Vec<FactorImpact> = vocabulary
            .iter()
            .filter_map(|&factor| factor_impact(records, factor))
            .collect();

        sort_by_magnitude(&mut impacts);
        impacts
    }

    /// Analyze the positive and negative vocabularies together
    pub fn analyze_all(records: &[SleepRecord]) -> Vec<FactorImpact> {
        let mut impacts = Self::analyze(records, &SleepFactor::POSITIVE);
        impacts.extend(Self::analyze(records, &SleepFactor::NEGATIVE));
        sort_by_magnitude(&mut impacts);

        debug!(
            records = records.len(),
            factors = impacts.len(),
            "computed factor impacts"
        );
        impacts
    }
}

fn factor_impact(records: &[SleepRecord], factor: SleepFactor) -> Option<FactorImpact> {
    let (with, without): (Vec<&SleepRecord>, Vec<&SleepRecord>) =
        records.iter().partition(|r| r.has_factor(factor));

    if with.len() < MIN_FACTOR_SAMPLES || without.len() < MIN_FACTOR_SAMPLES {
        return None;
    }

    let avg_with = average(&qualities(&with));
    let avg_without = average(&qualities(&without));
    if avg_without == 0.0 {
        return None;
    }

    let impact = round_half_up((avg_with - avg_without) / avg_without * 100.0) as i32;

    Some(FactorImpact {
        factor,
        impact,
        sample_size: with.len(),
        kind: factor.kind(),
    })
}

fn qualities(records: &[&SleepRecord]) -> Vec<f64> {
    records.iter().map(|r| f64::from(r.quality)).collect()
}

fn sort_by_magnitude(impacts: &mut [FactorImpact]) {
    // Stable sort keeps vocabulary order for equal magnitudes
    impacts.sort_by(|a, b| b.impact.abs().cmp(&a.impact.abs()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FactorKind;
    use chrono::{Duration, NaiveDate, NaiveTime};
    use pretty_assertions::assert_eq;

    fn night(day: i64, quality: u8, factors: &[SleepFactor]) -> SleepRecord {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(day);
        let bed = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        let wake = NaiveTime::from_hms_opt(7, 0, 0).unwrap();
        factors
            .iter()
            .fold(SleepRecord::new(date, bed, wake, quality), |r, &f| r.with_factor(f))
    }

    #[test]
    fn test_exercise_impact() {
        let records = vec![
            night(0, 5, &[SleepFactor::Exercise]),
            night(1, 5, &[SleepFactor::Exercise]),
            night(2, 5, &[SleepFactor::Exercise]),
            night(3, 4, &[]),
            night(4, 4, &[]),
            night(5, 4, &[]),
        ];

        let impacts = FactorImpactAnalyzer::analyze(&records, &[SleepFactor::Exercise]);
        assert_eq!(
            impacts,
            vec![FactorImpact {
                factor: SleepFactor::Exercise,
                impact: 25,
                sample_size: 3,
                kind: FactorKind::Positive,
            }]
        );
    }

    #[test]
    fn test_factor_below_sample_floor_is_omitted() {
        let records = vec![
            night(0, 5, &[SleepFactor::Exercise]),
            night(1, 5, &[SleepFactor::Exercise]),
            night(2, 4, &[]),
            night(3, 4, &[]),
            night(4, 4, &[]),
        ];

        let impacts = FactorImpactAnalyzer::analyze(&records, &[SleepFactor::Exercise]);
        assert!(impacts.is_empty());
    }

    #[test]
    fn test_negative_factor_and_ordering() {
        let mut records = Vec::new();
        for day in 0..3 {
            records.push(night(day, 2, &[SleepFactor::LateCoffee]));
        }
        for day in 3..6 {
            records.push(night(day, 4, &[SleepFactor::Reading]));
        }
        for day in 6..9 {
            records.push(night(day, 4, &[]));
        }

        let impacts = FactorImpactAnalyzer::analyze_all(&records);
        assert_eq!(impacts[0].factor, SleepFactor::LateCoffee);
        assert_eq!(impacts[0].kind, FactorKind::Negative);
        // 2 vs (6 nights at 4) = -50%
        assert_eq!(impacts[0].impact, -50);

        let reading = impacts
            .iter()
            .find(|i| i.factor == SleepFactor::Reading)
            .unwrap();
        // 4 vs (3 nights at 2 + 3 nights at 4) = 4 / 3 - 1 = 33%
        assert_eq!(reading.impact, 33);
    }

    #[test]
    fn test_negative_half_impact_rounds_up() {
        // Seven nights at 5 and one at 4 with late coffee (avg 4.875)
        let mut records: Vec<SleepRecord> = (0..7)
            .map(|day| night(day, 5, &[SleepFactor::LateCoffee]))
            .collect();
        records.push(night(7, 4, &[SleepFactor::LateCoffee]));
        for day in 8..11 {
            records.push(night(day, 5, &[]));
        }

        // 4.875 vs 5 is exactly -2.5%
        let impacts = FactorImpactAnalyzer::analyze(&records, &[SleepFactor::LateCoffee]);
        assert_eq!(impacts.len(), 1);
        assert_eq!(impacts[0].impact, -2);
        assert_eq!(impacts[0].sample_size, 8);
    }
}
