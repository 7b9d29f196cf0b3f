//! Error types for ingestion, aggregation and rendering.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PlotError>;

/// Failures raised while turning measurement files into a chart.
#[derive(Error, Debug)]
pub enum PlotError {
    /// File could not be opened or read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Row is not three comma-separated integers
    #[error("Malformed row in {path} (line {line}): {reason}")]
    Csv {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    /// Averaging over a file that contains no rounds
    #[error("No rounds observed in {path}; cannot compute a per-round average")]
    NoRounds { path: PathBuf },

    /// Sweep discovery found nothing to plot
    #[error("No files matching {prefix}<N>.csv in {dir}")]
    NoSweepFiles { dir: PathBuf, prefix: String },

    /// Regression needs two distinct x values
    #[error("Cannot fit a line to series '{series}': need at least two distinct x values")]
    DegenerateFit { series: String },

    /// Nothing to draw
    #[error("Chart '{0}' has no data points")]
    EmptyChart(String),

    /// Backend failure while drawing
    #[error("Render error: {0}")]
    Render(String),
}

impl PlotError {
    /// Build an I/O error that remembers which file failed.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlotError::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a row error from a `csv` failure, keeping the line number when known.
    pub fn csv(path: impl Into<PathBuf>, err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        let reason = match err.kind() {
            csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
            csv::ErrorKind::UnequalLengths {
                expected_len, len, ..
            } => format!("expected {} fields, found {}", expected_len, len),
            _ => err.to_string(),
        };
        PlotError::Csv {
            path: path.into(),
            line,
            reason,
        }
    }
}
