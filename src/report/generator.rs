//! Summary generation.
//!
//! This module renders the aggregated data of a run as JSON (written
//! with `--format json`) or as a short text block printed to the terminal.

use crate::models::{PlotSummary, SeriesStats};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Generate the JSON document for a summary.
pub fn generate_json_summary(summary: &PlotSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).map_err(Into::into)
}

/// Write a JSON summary to a file.
pub fn write_json_summary(summary: &PlotSummary, path: &Path) -> Result<()> {
    let content = generate_json_summary(summary)?;

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

/// Generate the text block printed after a run.
pub fn generate_text_summary(summary: &PlotSummary) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "📊 {} ({} plot)\n",
        summary.chart.title, summary.metadata.kind
    ));
    output.push_str(&generate_inputs_section(&summary.metadata.inputs));
    output.push_str(&format!(
        "   Rows read: {}\n",
        summary.metadata.records_read
    ));

    for stats in &summary.stats {
        output.push_str(&generate_stats_line(stats));
    }

    for fit in &summary.chart.fits {
        output.push_str(&format!(
            "   Fit '{}': y = {:.3}x {} {:.3}\n",
            fit.series,
            fit.slope,
            if fit.intercept < 0.0 { "-" } else { "+" },
            fit.intercept.abs()
        ));
    }

    output
}

fn generate_inputs_section(inputs: &[std::path::PathBuf]) -> String {
    match inputs {
        [] => String::new(),
        [single] => format!("   Input: {}\n", single.display()),
        many => {
            let mut section = format!("   Inputs: {} files\n", many.len());
            for input in many {
                section.push_str(&format!("     📄 {}\n", input.display()));
            }
            section
        }
    }
}

/// One line per series; empty series are called out.
fn generate_stats_line(stats: &SeriesStats) -> String {
    match (stats.min, stats.max, stats.mean) {
        (Some(min), Some(max), Some(mean)) => format!(
            "   Series '{}': {} points, min {:.2}, max {:.2}, mean {:.2}\n",
            stats.label, stats.count, min, max, mean
        ),
        _ => format!("   Series '{}': no points\n", stats.label),
    }
}
