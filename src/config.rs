//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.roundplot.toml` files. Defaults match the file names, axis ranges
//! and titles of the experiment's measurement charts.

use crate::cli::Args;
use crate::models::{ChartStyle, PlotKind};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".roundplot.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Round latency chart.
    #[serde(default)]
    pub latency: LatencyConfig,

    /// Bytes per round for one participant.
    #[serde(default)]
    pub per_round: PerRoundConfig,

    /// Settings shared by the read and write sweeps.
    #[serde(default)]
    pub throughput: ThroughputConfig,

    /// Read throughput sweep.
    #[serde(default)]
    pub read: ReadConfig,

    /// Write throughput sweep.
    #[serde(default)]
    pub write: WriteConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "roundplot.svg".to_string()
}

/// Axis and style settings resolved for one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSettings {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub style: ChartStyle,
    pub fit: bool,
    pub x_range: Option<(f64, f64)>,
    pub y_range: Option<(f64, f64)>,
}

fn to_range(range: Option<[f64; 2]>) -> Option<(f64, f64)> {
    range.map(|[lo, hi]| (lo, hi))
}

/// Round latency settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyConfig {
    /// Latency CSV file.
    #[serde(default = "default_latency_file")]
    pub file: PathBuf,

    /// Leading samples to drop (the first rounds are unstable).
    #[serde(default = "default_skip")]
    pub skip: usize,

    /// Keep rows before this index only.
    #[serde(default)]
    pub limit: Option<usize>,

    /// Raw units per plotted unit (nanoseconds to milliseconds).
    #[serde(default = "default_divisor")]
    pub divisor: f64,

    #[serde(default = "default_latency_title")]
    pub title: String,

    #[serde(default = "default_round_label")]
    pub x_label: String,

    #[serde(default = "default_latency_y_label")]
    pub y_label: String,

    #[serde(default)]
    pub style: ChartStyle,

    #[serde(default = "default_latency_x_range")]
    pub x_range: Option<[f64; 2]>,

    #[serde(default = "default_latency_y_range")]
    pub y_range: Option<[f64; 2]>,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            file: default_latency_file(),
            skip: default_skip(),
            limit: None,
            divisor: default_divisor(),
            title: default_latency_title(),
            x_label: default_round_label(),
            y_label: default_latency_y_label(),
            style: ChartStyle::Line,
            x_range: default_latency_x_range(),
            y_range: default_latency_y_range(),
        }
    }
}

impl LatencyConfig {
    pub fn chart(&self) -> ChartSettings {
        ChartSettings {
            title: self.title.clone(),
            x_label: self.x_label.clone(),
            y_label: self.y_label.clone(),
            style: self.style,
            fit: false,
            x_range: to_range(self.x_range),
            y_range: to_range(self.y_range),
        }
    }
}

fn default_latency_file() -> PathBuf {
    PathBuf::from("roundLatency.csv")
}

fn default_skip() -> usize {
    5
}

fn default_divisor() -> f64 {
    1_000_000.0
}

fn default_latency_title() -> String {
    "Latency between Rounds".to_string()
}

fn default_round_label() -> String {
    "Round Number".to_string()
}

fn default_latency_y_label() -> String {
    "Latency (ms)".to_string()
}

fn default_latency_x_range() -> Option<[f64; 2]> {
    Some([0.0, 80.0])
}

fn default_latency_y_range() -> Option<[f64; 2]> {
    Some([0.0, 5000.0])
}

/// Per-round throughput settings for a single participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerRoundConfig {
    /// Throughput CSV file.
    #[serde(default = "default_per_round_file")]
    pub file: PathBuf,

    /// Participant whose bytes are bucketed.
    #[serde(default = "default_leader_id")]
    pub participant: u64,

    #[serde(default = "default_per_round_title")]
    pub title: String,

    #[serde(default = "default_round_label")]
    pub x_label: String,

    #[serde(default = "default_per_round_y_label")]
    pub y_label: String,

    #[serde(default = "default_bar")]
    pub style: ChartStyle,

    #[serde(default)]
    pub x_range: Option<[f64; 2]>,

    #[serde(default)]
    pub y_range: Option<[f64; 2]>,
}

impl Default for PerRoundConfig {
    fn default() -> Self {
        Self {
            file: default_per_round_file(),
            participant: default_leader_id(),
            title: default_per_round_title(),
            x_label: default_round_label(),
            y_label: default_per_round_y_label(),
            style: default_bar(),
            x_range: None,
            y_range: None,
        }
    }
}

impl PerRoundConfig {
    pub fn chart(&self) -> ChartSettings {
        ChartSettings {
            title: self.title.clone(),
            x_label: self.x_label.clone(),
            y_label: self.y_label.clone(),
            style: self.style,
            fit: false,
            x_range: to_range(self.x_range),
            y_range: to_range(self.y_range),
        }
    }
}

fn default_per_round_file() -> PathBuf {
    PathBuf::from("readThroughput1.csv")
}

fn default_per_round_title() -> String {
    "Bytes per Round".to_string()
}

fn default_per_round_y_label() -> String {
    "# Bytes".to_string()
}

fn default_bar() -> ChartStyle {
    ChartStyle::Bar
}

/// Settings shared by both throughput sweeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughputConfig {
    /// Directory holding the `{prefix}{N}.csv` files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Participant id of the leader.
    #[serde(default = "default_leader_id")]
    pub leader_id: u64,

    /// Participant id of the sampled client.
    #[serde(default = "default_client_id")]
    pub client_id: u64,
}

impl Default for ThroughputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            leader_id: default_leader_id(),
            client_id: default_client_id(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_leader_id() -> u64 {
    1
}

fn default_client_id() -> u64 {
    2
}

/// A throughput sweep resolved from either the read or write section.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSettings {
    pub file_prefix: String,
    /// Player counts to load; empty means discover them on disk.
    pub players: Vec<usize>,
    pub chart: ChartSettings,
}

/// Read throughput sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadConfig {
    #[serde(default = "default_read_prefix")]
    pub file_prefix: String,

    #[serde(default = "default_read_players")]
    pub players: Vec<usize>,

    #[serde(default = "default_read_title")]
    pub title: String,

    #[serde(default = "default_players_label")]
    pub x_label: String,

    #[serde(default = "default_read_y_label")]
    pub y_label: String,

    #[serde(default)]
    pub style: ChartStyle,

    #[serde(default)]
    pub fit: bool,

    #[serde(default)]
    pub x_range: Option<[f64; 2]>,

    #[serde(default)]
    pub y_range: Option<[f64; 2]>,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            file_prefix: default_read_prefix(),
            players: default_read_players(),
            title: default_read_title(),
            x_label: default_players_label(),
            y_label: default_read_y_label(),
            style: ChartStyle::Line,
            fit: false,
            x_range: None,
            y_range: None,
        }
    }
}

impl ReadConfig {
    pub fn sweep(&self) -> SweepSettings {
        SweepSettings {
            file_prefix: self.file_prefix.clone(),
            players: self.players.clone(),
            chart: ChartSettings {
                title: self.title.clone(),
                x_label: self.x_label.clone(),
                y_label: self.y_label.clone(),
                style: self.style,
                fit: self.fit,
                x_range: to_range(self.x_range),
                y_range: to_range(self.y_range),
            },
        }
    }
}

fn default_read_prefix() -> String {
    "readThroughput".to_string()
}

fn default_read_players() -> Vec<usize> {
    vec![1, 2, 3, 4, 5, 6, 7, 8, 17]
}

fn default_read_title() -> String {
    "Read Throughput by # Players".to_string()
}

fn default_players_label() -> String {
    "# Players".to_string()
}

fn default_read_y_label() -> String {
    "Average # Bytes Read per Round".to_string()
}

/// Write throughput sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteConfig {
    #[serde(default = "default_write_prefix")]
    pub file_prefix: String,

    #[serde(default = "default_write_players")]
    pub players: Vec<usize>,

    #[serde(default = "default_write_title")]
    pub title: String,

    #[serde(default = "default_players_label")]
    pub x_label: String,

    #[serde(default = "default_write_y_label")]
    pub y_label: String,

    #[serde(default = "default_scatter")]
    pub style: ChartStyle,

    #[serde(default = "default_true")]
    pub fit: bool,

    #[serde(default)]
    pub x_range: Option<[f64; 2]>,

    #[serde(default)]
    pub y_range: Option<[f64; 2]>,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            file_prefix: default_write_prefix(),
            players: default_write_players(),
            title: default_write_title(),
            x_label: default_players_label(),
            y_label: default_write_y_label(),
            style: default_scatter(),
            fit: true,
            x_range: None,
            y_range: None,
        }
    }
}

impl WriteConfig {
    pub fn sweep(&self) -> SweepSettings {
        SweepSettings {
            file_prefix: self.file_prefix.clone(),
            players: self.players.clone(),
            chart: ChartSettings {
                title: self.title.clone(),
                x_label: self.x_label.clone(),
                y_label: self.y_label.clone(),
                style: self.style,
                fit: self.fit,
                x_range: to_range(self.x_range),
                y_range: to_range(self.y_range),
            },
        }
    }
}

fn default_write_prefix() -> String {
    "writeThroughput".to_string()
}

fn default_write_players() -> Vec<usize> {
    vec![1, 2, 3, 4, 5]
}

fn default_write_title() -> String {
    "Write Throughput by # Players".to_string()
}

fn default_write_y_label() -> String {
    "Average # Bytes Written per Round".to_string()
}

fn default_scatter() -> ChartStyle {
    ChartStyle::Scatter
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load `.roundplot.toml` from `dir`.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default_in(dir: &Path) -> Result<Option<Self>> {
        let default_path = dir.join(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(&default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, and only
    /// override when given. Chart options apply to the selected plot.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        // Inputs
        if let Some(ref input) = args.input {
            self.latency.file = input.clone();
            self.per_round.file = input.clone();
        }
        if let Some(skip) = args.skip {
            self.latency.skip = skip;
        }
        if args.limit.is_some() {
            self.latency.limit = args.limit;
        }
        if let Some(divisor) = args.divisor {
            self.latency.divisor = divisor;
        }
        if let Some(participant) = args.participant {
            self.per_round.participant = participant;
        }
        if let Some(ref data_dir) = args.data_dir {
            self.throughput.data_dir = data_dir.clone();
        }
        if let Some(leader_id) = args.leader_id {
            self.throughput.leader_id = leader_id;
        }
        if let Some(client_id) = args.client_id {
            self.throughput.client_id = client_id;
        }
        if let Some(ref players) = args.players {
            self.read.players = players.clone();
            self.write.players = players.clone();
        }

        // Chart options for the selected plot
        let x_range = args.x_range();
        let y_range = args.y_range();
        match args.plot {
            Some(PlotKind::Latency) => {
                merge_chart(
                    args,
                    &mut self.latency.title,
                    &mut self.latency.style,
                    None,
                );
                self.latency.x_range = x_range.or(self.latency.x_range);
                self.latency.y_range = y_range.or(self.latency.y_range);
            }
            Some(PlotKind::PerRound) => {
                merge_chart(
                    args,
                    &mut self.per_round.title,
                    &mut self.per_round.style,
                    None,
                );
                self.per_round.x_range = x_range.or(self.per_round.x_range);
                self.per_round.y_range = y_range.or(self.per_round.y_range);
            }
            Some(PlotKind::Read) => {
                merge_chart(
                    args,
                    &mut self.read.title,
                    &mut self.read.style,
                    Some(&mut self.read.fit),
                );
                self.read.x_range = x_range.or(self.read.x_range);
                self.read.y_range = y_range.or(self.read.y_range);
            }
            Some(PlotKind::Write) => {
                merge_chart(
                    args,
                    &mut self.write.title,
                    &mut self.write.style,
                    Some(&mut self.write.fit),
                );
                self.write.x_range = x_range.or(self.write.x_range);
                self.write.y_range = y_range.or(self.write.y_range);
            }
            None => {}
        }
    }

    /// Check the merged settings.
    ///
    /// Values read from the file get the same rules as their CLI flags.
    pub fn validate(&self) -> Result<()> {
        let divisor = self.latency.divisor;
        if divisor.is_nan() || divisor <= 0.0 {
            bail!("[latency] divisor must be greater than zero, got {}", divisor);
        }

        if let Some(limit) = self.latency.limit {
            if limit < self.latency.skip {
                bail!(
                    "[latency] limit ({}) is before skip ({})",
                    limit,
                    self.latency.skip
                );
            }
        }

        check_players("read", &self.read.players)?;
        check_players("write", &self.write.players)?;

        check_range("latency", "x_range", self.latency.x_range)?;
        check_range("latency", "y_range", self.latency.y_range)?;
        check_range("per_round", "x_range", self.per_round.x_range)?;
        check_range("per_round", "y_range", self.per_round.y_range)?;
        check_range("read", "x_range", self.read.x_range)?;
        check_range("read", "y_range", self.read.y_range)?;
        check_range("write", "x_range", self.write.x_range)?;
        check_range("write", "y_range", self.write.y_range)?;

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

/// An empty list is allowed and means "discover the files".
fn check_players(section: &str, players: &[usize]) -> Result<()> {
    if players.contains(&0) {
        bail!("[{}] player counts must be at least 1", section);
    }
    Ok(())
}

fn check_range(section: &str, key: &str, range: Option<[f64; 2]>) -> Result<()> {
    if let Some([lo, hi]) = range {
        if lo.is_nan() || hi.is_nan() || lo >= hi {
            bail!(
                "[{}] {} minimum must be below its maximum, got [{}, {}]",
                section,
                key,
                lo,
                hi
            );
        }
    }
    Ok(())
}

fn merge_chart(args: &Args, title: &mut String, style: &mut ChartStyle, fit: Option<&mut bool>) {
    if let Some(ref t) = args.title {
        *title = t.clone();
    }
    if let Some(chart) = args.chart {
        *style = chart;
    }
    if let Some(fit) = fit {
        if args.fit {
            *fit = true;
        } else if args.no_fit {
            *fit = false;
        }
    }
}
