//! Data models for the plotter.
//!
//! This module contains the records read from measurement files, the
//! aggregated series built from them, and the chart and summary structures
//! handed to the renderers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One CSV row: `round,participant_id,value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Protocol round the sample was taken in.
    pub round: u64,
    /// Participant that wrote the sample (leader is 1 by convention).
    pub participant_id: u64,
    /// Raw measurement: nanoseconds for latency, bytes for throughput.
    pub value: i64,
}

impl MeasurementRecord {
    #[cfg(test)]
    pub fn new(round: u64, participant_id: u64, value: i64) -> Self {
        Self {
            round,
            participant_id,
            value,
        }
    }
}

/// Which chart a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PlotKind {
    /// Latency between consecutive rounds
    Latency,
    /// Bytes per round for a single participant
    PerRound,
    /// Average bytes read per round, by number of players
    Read,
    /// Average bytes written per round, by number of players
    Write,
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotKind::Latency => write!(f, "latency"),
            PlotKind::PerRound => write!(f, "per-round"),
            PlotKind::Read => write!(f, "read"),
            PlotKind::Write => write!(f, "write"),
        }
    }
}

/// How series are drawn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ChartStyle {
    /// Connected points with markers
    #[default]
    Line,
    /// One bar per point
    Bar,
    /// Unconnected markers
    Scatter,
}

impl fmt::Display for ChartStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartStyle::Line => write!(f, "line"),
            ChartStyle::Bar => write!(f, "bar"),
            ChartStyle::Scatter => write!(f, "scatter"),
        }
    }
}

/// A single chart coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Derived values keyed by round or by player count, in x order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSeries {
    /// Legend label.
    pub label: String,
    /// Points sorted by x.
    pub points: Vec<Point>,
}

impl AggregatedSeries {
    pub fn new(label: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Smallest and largest x, if any.
    pub fn x_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.points.iter().map(|p| p.x))
    }

    /// Smallest and largest y, if any.
    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.points.iter().map(|p| p.y))
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    /// Label of the series the line was fitted to.
    pub series: String,
    pub slope: f64,
    pub intercept: f64,
    /// x range the segment is drawn over.
    pub x_min: f64,
    pub x_max: f64,
}

impl LinearFit {
    /// Evaluate the line at `x`.
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// The two endpoints drawn on the chart.
    pub fn segment(&self) -> [Point; 2] {
        [
            Point::new(self.x_min, self.at(self.x_min)),
            Point::new(self.x_max, self.at(self.x_max)),
        ]
    }
}

/// Everything needed to draw one chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Fixed x axis range; derived from the data when `None`.
    pub x_range: Option<(f64, f64)>,
    /// Fixed y axis range; derived from the data when `None`.
    pub y_range: Option<(f64, f64)>,
    pub style: ChartStyle,
    pub series: Vec<AggregatedSeries>,
    pub fits: Vec<LinearFit>,
}

impl Chart {
    /// Total number of points across all series.
    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.len()).sum()
    }
}

/// Descriptive statistics for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub label: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
}

/// Metadata about a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryMetadata {
    /// Plot that was produced.
    pub kind: PlotKind,
    /// Measurement files that were read.
    pub inputs: Vec<PathBuf>,
    /// Rows read across all inputs.
    pub records_read: usize,
    /// When the summary was generated.
    pub generated_at: DateTime<Utc>,
}

/// Aggregated data of a run, written with `--format json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotSummary {
    pub metadata: SummaryMetadata,
    pub stats: Vec<SeriesStats>,
    pub chart: Chart,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_bounds() {
        let series = AggregatedSeries::new(
            "leader",
            vec![Point::new(1.0, 5.0), Point::new(3.0, -2.0), Point::new(2.0, 9.0)],
        );
        assert_eq!(series.x_bounds(), Some((1.0, 3.0)));
        assert_eq!(series.y_bounds(), Some((-2.0, 9.0)));
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_empty_series_has_no_bounds() {
        let series = AggregatedSeries::new("empty", Vec::new());
        assert!(series.is_empty());
        assert_eq!(series.x_bounds(), None);
    }

    #[test]
    fn test_fit_segment() {
        let fit = LinearFit {
            series: "client".to_string(),
            slope: 2.0,
            intercept: 1.0,
            x_min: 1.0,
            x_max: 5.0,
        };
        let [start, end] = fit.segment();
        assert_eq!(start, Point::new(1.0, 3.0));
        assert_eq!(end, Point::new(5.0, 11.0));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(PlotKind::PerRound.to_string(), "per-round");
        assert_eq!(ChartStyle::Scatter.to_string(), "scatter");
    }
}
