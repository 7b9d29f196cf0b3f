//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Options left unset fall back to the
//! configuration file, then to built-in defaults.

use crate::models::{ChartStyle, PlotKind};
use clap::Parser;
use std::path::PathBuf;

/// Roundplot - charts for round latency and throughput measurements
///
/// Reads `round,participant,value` CSV files written during a consensus
/// experiment and draws them as SVG charts.
///
/// Examples:
///   roundplot --plot latency --input roundLatency.csv --skip 5
///   roundplot --plot write --data-dir results/ --players 1,2,3,4,5
///   roundplot --plot read --format json -o read.json
///   roundplot --plot per-round --input readThroughput3.csv --participant 2
///   roundplot --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Chart to produce
    #[arg(short, long, value_name = "KIND", required_unless_present = "init_config")]
    pub plot: Option<PlotKind>,

    /// Measurement file for latency and per-round plots
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Directory holding the throughput sweep files
    #[arg(short, long, value_name = "DIR", env = "ROUNDPLOT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Player counts of the sweep (comma-separated)
    ///
    /// One file per count, e.g. writeThroughput3.csv. Without this and without
    /// a configured list, the data directory is scanned.
    #[arg(long, value_name = "COUNTS", value_delimiter = ',')]
    pub players: Option<Vec<usize>>,

    /// Leading rows to drop from the latency series
    #[arg(long, value_name = "ROWS")]
    pub skip: Option<usize>,

    /// Keep latency rows before this index only
    #[arg(long, value_name = "ROWS")]
    pub limit: Option<usize>,

    /// Raw latency units per plotted unit
    #[arg(long, value_name = "DIVISOR")]
    pub divisor: Option<f64>,

    /// Participant whose bytes are bucketed by round
    #[arg(long, value_name = "ID")]
    pub participant: Option<u64>,

    /// Participant id of the leader
    #[arg(long, value_name = "ID")]
    pub leader_id: Option<u64>,

    /// Participant id of the sampled client
    #[arg(long, value_name = "ID")]
    pub client_id: Option<u64>,

    /// Chart style (line, bar, scatter)
    #[arg(long, value_name = "STYLE")]
    pub chart: Option<ChartStyle>,

    /// Overlay a least-squares best-fit line per series
    #[arg(long, conflicts_with = "no_fit")]
    pub fit: bool,

    /// Do not draw best-fit lines
    #[arg(long, conflicts_with = "fit")]
    pub no_fit: bool,

    /// Fixed x axis range
    #[arg(
        long = "x-range",
        value_name = "MIN,MAX",
        value_delimiter = ',',
        allow_hyphen_values = true
    )]
    pub x_range_values: Option<Vec<f64>>,

    /// Fixed y axis range
    #[arg(
        long = "y-range",
        value_name = "MIN,MAX",
        value_delimiter = ',',
        allow_hyphen_values = true
    )]
    pub y_range_values: Option<Vec<f64>>,

    /// Chart title
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Output file path
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (svg, json)
    #[arg(long, default_value = "svg", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .roundplot.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Load and aggregate the data, print the summary, write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .roundplot.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// SVG chart (default)
    #[default]
    Svg,
    /// Aggregated data as JSON
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        validate_range("--x-range", self.x_range_values.as_deref())?;
        validate_range("--y-range", self.y_range_values.as_deref())?;

        if let Some(divisor) = self.divisor {
            if divisor.is_nan() || divisor <= 0.0 {
                return Err("Divisor must be greater than zero".to_string());
            }
        }

        if let Some(ref players) = self.players {
            if players.is_empty() || players.contains(&0) {
                return Err("Player counts must be at least 1".to_string());
            }
        }

        if let (Some(skip), Some(limit)) = (self.skip, self.limit) {
            if limit < skip {
                return Err(format!("--limit ({}) is before --skip ({})", limit, skip));
            }
        }

        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        if let Some(ref dir) = self.data_dir {
            if !dir.is_dir() {
                return Err(format!("Data directory does not exist: {}", dir.display()));
            }
        }

        Ok(())
    }

    /// The `--x-range` pair, once validated.
    pub fn x_range(&self) -> Option<[f64; 2]> {
        as_pair(self.x_range_values.as_deref())
    }

    /// The `--y-range` pair, once validated.
    pub fn y_range(&self) -> Option<[f64; 2]> {
        as_pair(self.y_range_values.as_deref())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

fn as_pair(values: Option<&[f64]>) -> Option<[f64; 2]> {
    match values {
        Some(&[lo, hi]) => Some([lo, hi]),
        _ => None,
    }
}

fn validate_range(flag: &str, values: Option<&[f64]>) -> Result<(), String> {
    match values {
        None => Ok(()),
        Some(&[lo, hi]) if lo < hi => Ok(()),
        Some(&[_, _]) => Err(format!("{} minimum must be below its maximum", flag)),
        Some(_) => Err(format!("{} takes exactly two values: MIN,MAX", flag)),
    }
}
