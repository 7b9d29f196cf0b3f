//! Aggregation of measurement records into chart series.
//!
//! Three policies are supported: prefix trimming with unit conversion
//! (latency), per-round bucketing for one participant, and per-round
//! averaging over a sweep of player counts.

use crate::error::{PlotError, Result};
use crate::models::{AggregatedSeries, MeasurementRecord, Point, SeriesStats};
use std::collections::BTreeSet;
use std::path::Path;

/// Nanoseconds per millisecond.
pub const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Keep rows `[skip..limit)`, clamped to the slice like a Python slice.
pub fn trim_prefix(
    records: &[MeasurementRecord],
    skip: usize,
    limit: Option<usize>,
) -> &[MeasurementRecord] {
    let end = limit.unwrap_or(records.len()).min(records.len());
    let start = skip.min(end);
    &records[start..end]
}

/// Latency by round: drop unstable leading samples, then scale each value by `divisor`.
pub fn latency_series(
    label: impl Into<String>,
    records: &[MeasurementRecord],
    skip: usize,
    limit: Option<usize>,
    divisor: f64,
) -> AggregatedSeries {
    let points = trim_prefix(records, skip, limit)
        .iter()
        .map(|r| Point::new(r.round as f64, r.value as f64 / divisor))
        .collect();

    AggregatedSeries::new(label, points)
}

/// Sum of `participant`'s values per round, one bucket per observed round.
///
/// Rounds where the participant wrote nothing produce a zero bucket.
/// Sums are kept in `i128` so any run of `i64` values fits.
pub fn bucket_by_round(
    label: impl Into<String>,
    records: &[MeasurementRecord],
    participant: u64,
) -> AggregatedSeries {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.round);

    let mut points = Vec::new();
    let mut current: Option<(u64, i128)> = None;

    for record in &sorted {
        let (round, sum) = match current {
            Some((round, sum)) if round == record.round => (round, sum),
            Some((round, sum)) => {
                points.push(Point::new(round as f64, sum as f64));
                (record.round, 0)
            }
            None => (record.round, 0),
        };

        let sum = if record.participant_id == participant {
            sum + i128::from(record.value)
        } else {
            sum
        };
        current = Some((round, sum));
    }

    if let Some((round, sum)) = current {
        points.push(Point::new(round as f64, sum as f64));
    }

    AggregatedSeries::new(label, points)
}

/// Per-round averages for several participants of a single file.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundAverages {
    /// Distinct rounds seen in the file.
    pub rounds: usize,
    /// Average per round, in the order the participants were requested.
    pub averages: Vec<f64>,
}

/// Sum each participant's values and divide by the number of distinct rounds.
///
/// `source` names the file for the error raised when no rounds were observed.
pub fn average_per_round(
    records: &[MeasurementRecord],
    participants: &[u64],
    source: &Path,
) -> Result<RoundAverages> {
    let rounds = records.iter().map(|r| r.round).collect::<BTreeSet<_>>().len();
    if rounds == 0 {
        return Err(PlotError::NoRounds {
            path: source.to_path_buf(),
        });
    }

    let averages = participants
        .iter()
        .map(|&participant| {
            let sum: i128 = records
                .iter()
                .filter(|r| r.participant_id == participant)
                .map(|r| i128::from(r.value))
                .sum();
            sum as f64 / rounds as f64
        })
        .collect();

    Ok(RoundAverages { rounds, averages })
}

/// Count, min, max and mean of a series' y values.
pub fn series_stats(series: &AggregatedSeries) -> SeriesStats {
    let count = series.len();
    let bounds = series.y_bounds();
    let mean = if count > 0 {
        Some(series.points.iter().map(|p| p.y).sum::<f64>() / count as f64)
    } else {
        None
    };

    SeriesStats {
        label: series.label.clone(),
        count,
        min: bounds.map(|(lo, _)| lo),
        max: bounds.map(|(_, hi)| hi),
        mean,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(round: u64, participant: u64, value: i64) -> MeasurementRecord {
        MeasurementRecord::new(round, participant, value)
    }

    fn rows(n: u64) -> Vec<MeasurementRecord> {
        (1..=n).map(|i| rec(i, 1, i as i64 * 1_000_000)).collect()
    }

    #[test]
    fn test_trim_prefix_lengths() {
        let records = rows(10);
        assert_eq!(trim_prefix(&records, 0, None).len(), 10);
        assert_eq!(trim_prefix(&records, 5, None).len(), 5);
        assert_eq!(trim_prefix(&records, 9, None).len(), 1);
        assert!(trim_prefix(&records, 10, None).is_empty());
        assert!(trim_prefix(&records, 25, None).is_empty());
    }

    #[test]
    fn test_trim_prefix_with_limit() {
        let records = rows(10);
        let kept = trim_prefix(&records, 2, Some(6));
        assert_eq!(kept.len(), 4);
        assert_eq!(kept[0].round, 3);
        assert_eq!(kept[3].round, 6);

        assert_eq!(trim_prefix(&records, 5, Some(500)).len(), 5);
        assert!(trim_prefix(&records, 7, Some(3)).is_empty());
    }

    #[test]
    fn test_latency_series_converts_to_millis() {
        let records = vec![rec(1, 1, 900_000_000), rec(2, 1, 45_000_000), rec(3, 1, 1_500_000)];
        let series = latency_series("latency", &records, 1, None, NANOS_PER_MILLI);

        assert_eq!(
            series.points,
            vec![Point::new(2.0, 45.0), Point::new(3.0, 1.5)]
        );
    }

    #[test]
    fn test_bucket_by_round() {
        let records = vec![
            rec(2, 1, 30),
            rec(1, 1, 10),
            rec(1, 2, 99),
            rec(1, 1, 5),
            rec(3, 2, 7),
            rec(2, 1, 1),
        ];
        let series = bucket_by_round("leader", &records, 1);

        assert_eq!(
            series.points,
            vec![
                Point::new(1.0, 15.0),
                Point::new(2.0, 31.0),
                Point::new(3.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_buckets_are_in_round_order() {
        let records = vec![rec(5, 1, 1), rec(3, 1, 1), rec(4, 1, 1), rec(3, 1, 1)];
        let series = bucket_by_round("leader", &records, 1);
        let xs: Vec<_> = series.points.iter().map(|p| p.x).collect();
        assert!(xs.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(series.points[0], Point::new(3.0, 2.0));
    }

    #[test]
    fn test_bucket_empty_input() {
        assert!(bucket_by_round("leader", &[], 1).is_empty());
    }

    #[test]
    fn test_average_per_round() {
        let records = vec![rec(1, 1, 10), rec(2, 1, 20)];
        let result = average_per_round(&records, &[1], Path::new("t.csv")).unwrap();
        assert_eq!(result.rounds, 2);
        assert_eq!(result.averages, vec![15.0]);
    }

    #[test]
    fn test_average_counts_rounds_across_all_participants() {
        let records = vec![rec(1, 1, 30), rec(1, 2, 8), rec(2, 2, 4), rec(3, 2, 0)];
        let result = average_per_round(&records, &[1, 2, 3], Path::new("t.csv")).unwrap();
        assert_eq!(result.rounds, 3);
        assert_eq!(result.averages, vec![10.0, 4.0, 0.0]);
    }

    #[test]
    fn test_average_without_rounds_fails() {
        let err = average_per_round(&[], &[1, 2], Path::new("readThroughput9.csv")).unwrap_err();
        assert!(matches!(err, PlotError::NoRounds { .. }));
    }

    #[test]
    fn test_series_stats() {
        let series = AggregatedSeries::new(
            "latency",
            vec![Point::new(1.0, 2.0), Point::new(2.0, 6.0), Point::new(3.0, 4.0)],
        );
        let stats = series_stats(&series);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, Some(2.0));
        assert_eq!(stats.max, Some(6.0));
        assert_eq!(stats.mean, Some(4.0));

        let empty = series_stats(&AggregatedSeries::new("none", Vec::new()));
        assert_eq!(empty.count, 0);
        assert_eq!(empty.mean, None);
    }

    #[test]
    fn test_bucket_sums_past_i64_range() {
        let records = vec![rec(1, 1, i64::MAX), rec(1, 1, 1), rec(2, 1, i64::MIN), rec(2, 1, -1)];
        let series = bucket_by_round("leader", &records, 1);

        assert_eq!(series.points[0].y, i64::MAX as f64 + 1.0);
        assert_eq!(series.points[1].y, i64::MIN as f64 - 1.0);
    }

    #[test]
    fn test_average_sums_past_i64_range() {
        let records = vec![rec(1, 1, i64::MAX), rec(2, 1, i64::MAX)];
        let result = average_per_round(&records, &[1], Path::new("t.csv")).unwrap();
        assert_eq!(result.averages, vec![i64::MAX as f64]);
    }
}
