//! Chart assembly for each plot kind.
//!
//! Reads the measurement files named by the configuration, applies the
//! aggregation policy of the selected plot and packages the series, fitted
//! lines and statistics into a [`PlotSummary`].

use crate::analysis::{self, linear_fit, residual, NANOS_PER_MILLI};
use crate::config::{ChartSettings, Config, SweepSettings};
use crate::error::Result;
use crate::ingest::{self, resolve_sweep_files};
use crate::models::{AggregatedSeries, Chart, PlotKind, PlotSummary, Point, SummaryMetadata};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Load, aggregate and fit the data for `kind`.
pub fn build_plot(kind: PlotKind, config: &Config, show_progress: bool) -> Result<PlotSummary> {
    let (chart, inputs, records_read) = match kind {
        PlotKind::Latency => latency_chart(config)?,
        PlotKind::PerRound => per_round_chart(config)?,
        PlotKind::Read => sweep_chart(config, &config.read.sweep(), show_progress)?,
        PlotKind::Write => sweep_chart(config, &config.write.sweep(), show_progress)?,
    };

    Ok(summarize(kind, inputs, records_read, chart))
}

type Assembled = (Chart, Vec<PathBuf>, usize);

fn latency_chart(config: &Config) -> Result<Assembled> {
    let settings = &config.latency;
    let records = ingest::read_records(&settings.file)?;

    if settings.divisor != NANOS_PER_MILLI {
        debug!("Scaling latency by 1/{}", settings.divisor);
    }

    let series = analysis::latency_series(
        "latency",
        &records,
        settings.skip,
        settings.limit,
        settings.divisor,
    );
    if series.is_empty() {
        warn!(
            "No latency rows left after skipping {} of {}",
            settings.skip,
            records.len()
        );
    }

    let chart = make_chart(&settings.chart(), vec![series])?;
    Ok((chart, vec![settings.file.clone()], records.len()))
}

fn per_round_chart(config: &Config) -> Result<Assembled> {
    let settings = &config.per_round;
    let records = ingest::read_records(&settings.file)?;

    let series = analysis::bucket_by_round(
        format!("participant {}", settings.participant),
        &records,
        settings.participant,
    );
    debug!("{} round buckets", series.len());

    let chart = make_chart(&settings.chart(), vec![series])?;
    Ok((chart, vec![settings.file.clone()], records.len()))
}

/// One leader and one client point per player count.
fn sweep_chart(config: &Config, sweep: &SweepSettings, show_progress: bool) -> Result<Assembled> {
    let throughput = &config.throughput;
    let files = resolve_sweep_files(&throughput.data_dir, &sweep.file_prefix, &sweep.players)?;
    info!(
        "Loading {} {} files from {}",
        files.len(),
        sweep.file_prefix,
        throughput.data_dir.display()
    );

    let progress = if show_progress {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let participants = [throughput.leader_id, throughput.client_id];
    let mut leader = Vec::with_capacity(files.len());
    let mut client = Vec::with_capacity(files.len());
    let mut inputs = Vec::with_capacity(files.len());
    let mut records_read = 0;

    for file in &files {
        progress.set_message(format!("{} players", file.players));

        let records = ingest::read_records(&file.path)?;
        let averages = analysis::average_per_round(&records, &participants, &file.path)?;
        debug!(
            "{} players: {} rounds, averages {:?}",
            file.players, averages.rounds, averages.averages
        );

        let x = file.players as f64;
        leader.push(Point::new(x, averages.averages[0]));
        client.push(Point::new(x, averages.averages[1]));
        inputs.push(file.path.clone());
        records_read += records.len();

        progress.inc(1);
    }
    progress.finish_and_clear();

    let series = vec![
        AggregatedSeries::new("leader", leader),
        AggregatedSeries::new("client", client),
    ];
    let chart = make_chart(&sweep.chart, series)?;
    Ok((chart, inputs, records_read))
}

/// Combine resolved settings and series, fitting a line per series when asked.
pub fn make_chart(settings: &ChartSettings, series: Vec<AggregatedSeries>) -> Result<Chart> {
    let mut fits = Vec::new();
    if settings.fit {
        for s in &series {
            let fit = linear_fit(s)?;
            debug!(
                "Fit '{}': slope {:.4}, intercept {:.4}, residual {:.4}",
                fit.series,
                fit.slope,
                fit.intercept,
                residual(s, &fit)
            );
            fits.push(fit);
        }
    }

    Ok(Chart {
        title: settings.title.clone(),
        x_label: settings.x_label.clone(),
        y_label: settings.y_label.clone(),
        x_range: settings.x_range,
        y_range: settings.y_range,
        style: settings.style,
        series,
        fits,
    })
}

fn summarize(kind: PlotKind, inputs: Vec<PathBuf>, records_read: usize, chart: Chart) -> PlotSummary {
    let stats = chart.series.iter().map(analysis::series_stats).collect();

    PlotSummary {
        metadata: SummaryMetadata {
            kind,
            inputs,
            records_read,
            generated_at: Utc::now(),
        },
        stats,
        chart,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlotError;
    use crate::models::ChartStyle;
    use std::path::Path;
    use tempfile::TempDir;

    fn fixtures() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn fixture_config() -> Config {
        let mut config = Config::default();
        config.latency.file = fixtures().join("roundLatency.csv");
        config.per_round.file = fixtures().join("readThroughput2.csv");
        config.throughput.data_dir = fixtures();
        config
    }

    fn ys(series: &AggregatedSeries) -> Vec<f64> {
        series.points.iter().map(|p| p.y).collect()
    }

    #[test]
    fn test_latency_plot() {
        let summary = build_plot(PlotKind::Latency, &fixture_config(), false).unwrap();

        assert_eq!(summary.metadata.records_read, 12);
        assert_eq!(summary.chart.title, "Latency between Rounds");
        assert_eq!(summary.chart.x_range, Some((0.0, 80.0)));
        assert!(summary.chart.fits.is_empty());

        let series = &summary.chart.series[0];
        assert_eq!(series.len(), 7);
        assert_eq!(series.points[0], Point::new(6.0, 41.0));
        assert_eq!(ys(series), vec![41.0, 40.0, 42.0, 39.0, 44.0, 1250.0, 43.0]);
    }

    #[test]
    fn test_latency_skip_past_end_gives_empty_series() {
        let mut config = fixture_config();
        config.latency.skip = 50;

        let summary = build_plot(PlotKind::Latency, &config, false).unwrap();
        assert!(summary.chart.series[0].is_empty());
        assert_eq!(summary.stats[0].count, 0);
    }

    #[test]
    fn test_per_round_plot() {
        let mut config = fixture_config();
        config.per_round.participant = 2;

        let summary = build_plot(PlotKind::PerRound, &config, false).unwrap();
        let series = &summary.chart.series[0];

        assert_eq!(summary.chart.style, ChartStyle::Bar);
        assert_eq!(series.label, "participant 2");
        assert_eq!(
            series.points,
            vec![Point::new(1.0, 150.0), Point::new(2.0, 150.0)]
        );
    }

    #[test]
    fn test_read_sweep() {
        let mut config = fixture_config();
        config.read.players = vec![1, 2];

        let summary = build_plot(PlotKind::Read, &config, false).unwrap();
        let chart = &summary.chart;

        assert_eq!(summary.metadata.inputs.len(), 2);
        assert_eq!(summary.metadata.records_read, 8);
        assert_eq!(chart.series[0].label, "leader");
        assert_eq!(ys(&chart.series[0]), vec![100.0, 210.0]);
        assert_eq!(chart.series[1].label, "client");
        assert_eq!(ys(&chart.series[1]), vec![0.0, 150.0]);
        assert!(chart.fits.is_empty());
    }

    #[test]
    fn test_write_sweep_with_fit() {
        let mut config = fixture_config();
        config.write.players = vec![1, 2, 3];

        let summary = build_plot(PlotKind::Write, &config, false).unwrap();
        let chart = &summary.chart;

        assert_eq!(chart.style, ChartStyle::Scatter);
        assert_eq!(ys(&chart.series[0]), vec![100.0, 200.0, 300.0]);
        assert_eq!(ys(&chart.series[1]), vec![0.0, 50.0, 60.0]);

        assert_eq!(chart.fits.len(), 2);
        let leader = &chart.fits[0];
        assert_eq!(leader.series, "leader");
        assert!((leader.slope - 100.0).abs() < 1e-9);
        assert!(leader.intercept.abs() < 1e-9);
        assert_eq!((leader.x_min, leader.x_max), (1.0, 3.0));
    }

    #[test]
    fn test_sweep_discovers_files_when_players_empty() {
        let mut config = fixture_config();
        config.write.players = Vec::new();

        let summary = build_plot(PlotKind::Write, &config, true).unwrap();
        let xs: Vec<_> = summary.chart.series[0].points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_sweep_missing_file_fails() {
        let mut config = fixture_config();
        config.write.players = vec![1, 4];

        let err = build_plot(PlotKind::Write, &config, false).unwrap_err();
        assert!(matches!(err, PlotError::Io { .. }));
    }

    #[test]
    fn test_sweep_empty_file_has_no_rounds() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("readThroughput1.csv"), "").unwrap();

        let mut config = Config::default();
        config.throughput.data_dir = temp_dir.path().to_path_buf();
        config.read.players = vec![1];

        let err = build_plot(PlotKind::Read, &config, false).unwrap_err();
        assert!(matches!(err, PlotError::NoRounds { .. }));
    }

    #[test]
    fn test_fit_on_single_player_count_is_degenerate() {
        let mut config = fixture_config();
        config.write.players = vec![2];

        let err = build_plot(PlotKind::Write, &config, false).unwrap_err();
        assert!(matches!(err, PlotError::DegenerateFit { .. }));
    }
}
