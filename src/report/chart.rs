//! Chart rendering with plotters.
//!
//! Charts are drawn to SVG. Axis ranges come from the chart when set and
//! are otherwise derived from the plotted points and fitted lines.

use crate::error::{PlotError, Result};
use crate::models::{Chart, ChartStyle};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use tracing::debug;

/// Default image size in pixels.
pub const DEFAULT_SIZE: (u32, u32) = (800, 600);

const PALETTE: [RGBColor; 5] = [RED, BLUE, GREEN, MAGENTA, CYAN];

/// Share of the gap between neighbouring x values covered by bars.
const BAR_FILL: f64 = 0.8;

/// Dashes per dashed fit line.
const FIT_DASHES: usize = 24;

/// Render a chart to an SVG file.
///
/// Nothing is written when the chart cannot be drawn.
pub fn render_svg(chart: &Chart, path: &Path, size: (u32, u32)) -> Result<()> {
    let svg = render_svg_string(chart, size)?;
    std::fs::write(path, svg).map_err(|e| PlotError::io(path, e))?;

    debug!("Wrote {}", path.display());
    Ok(())
}

/// Render a chart to an in-memory SVG document.
pub fn render_svg_string(chart: &Chart, size: (u32, u32)) -> Result<String> {
    ensure_drawable(chart)?;

    let mut buffer = String::new();
    {
        let root = SVGBackend::with_string(&mut buffer, size).into_drawing_area();
        draw_chart(&root, chart)?;
        root.present().map_err(render_err)?;
    }
    Ok(buffer)
}

fn ensure_drawable(chart: &Chart) -> Result<()> {
    if chart.point_count() == 0 {
        return Err(PlotError::EmptyChart(chart.title.clone()));
    }
    Ok(())
}

fn render_err<E: std::fmt::Display>(err: E) -> PlotError {
    PlotError::Render(err.to_string())
}

fn draw_chart<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, chart: &Chart) -> Result<()> {
    let ((x_lo, x_hi), (y_lo, y_hi)) = axis_ranges(chart);
    debug!(
        "Axis ranges for '{}': x {}..{}, y {}..{}",
        chart.title, x_lo, x_hi, y_lo, y_hi
    );

    root.fill(&WHITE).map_err(render_err)?;

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", 28))
        .margin(15)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 45)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(render_err)?;

    ctx.configure_mesh()
        .axis_desc_style(("sans-serif", 15))
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .draw()
        .map_err(render_err)?;

    let series_count = chart.series.len();
    let group_width = min_x_spacing(chart) * BAR_FILL;
    let bar_width = group_width / series_count as f64;

    for (index, series) in chart.series.iter().enumerate() {
        let color = PALETTE[index % PALETTE.len()];
        let points: Vec<(f64, f64)> = series.points.iter().map(|p| (p.x, p.y)).collect();

        let anno = match chart.style {
            ChartStyle::Line => {
                ctx.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
                    .map_err(render_err)?;
                ctx.draw_series(
                    points
                        .iter()
                        .map(|&point| Circle::new(point, 3, color.filled())),
                )
            }
            ChartStyle::Scatter => ctx.draw_series(
                points
                    .iter()
                    .map(|&point| Circle::new(point, 4, color.filled())),
            ),
            ChartStyle::Bar => {
                let offset = -group_width / 2.0 + index as f64 * bar_width;
                ctx.draw_series(points.iter().map(|&(x, y)| {
                    let left = x + offset;
                    Rectangle::new([(left, 0.0), (left + bar_width, y)], color.mix(0.8).filled())
                }))
            }
        }
        .map_err(render_err)?;

        anno.label(series.label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    // First fit solid, the rest dashed
    for (fit_index, fit) in chart.fits.iter().enumerate() {
        let index = chart
            .series
            .iter()
            .position(|s| s.label == fit.series)
            .unwrap_or(0);
        let color = PALETTE[index % PALETTE.len()];
        let [start, end] = fit.segment();
        let (start, end) = ((start.x, start.y), (end.x, end.y));

        let pieces = if fit_index == 0 {
            vec![[start, end]]
        } else {
            dash_segments(start, end, FIT_DASHES)
        };

        ctx.draw_series(
            pieces
                .into_iter()
                .map(|[a, b]| PathElement::new(vec![a, b], color.stroke_width(1))),
        )
        .map_err(render_err)?
        .label(format!("{} fit", fit.series))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    if series_count > 1 || !chart.fits.is_empty() {
        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(render_err)?;
    }

    Ok(())
}

/// Split `start..end` into `dashes` pieces separated by equal gaps.
fn dash_segments(start: (f64, f64), end: (f64, f64), dashes: usize) -> Vec<[(f64, f64); 2]> {
    let steps = (dashes * 2).saturating_sub(1).max(1) as f64;
    let at = |i: usize| {
        let i = i as f64;
        (
            start.0 + (end.0 - start.0) * i / steps,
            start.1 + (end.1 - start.1) * i / steps,
        )
    };

    (0..dashes.max(1)).map(|d| [at(2 * d), at(2 * d + 1)]).collect()
}

/// Smallest gap between distinct x values, or 1 when there is none.
fn min_x_spacing(chart: &Chart) -> f64 {
    let mut xs: Vec<f64> = chart
        .series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.x))
        .collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    xs.dedup();

    xs.windows(2)
        .map(|w| w[1] - w[0])
        .fold(None, |acc: Option<f64>, gap| Some(acc.map_or(gap, |m| m.min(gap))))
        .unwrap_or(1.0)
}

/// Resolve the x and y axis ranges for a chart.
pub fn axis_ranges(chart: &Chart) -> ((f64, f64), (f64, f64)) {
    let fit_points = chart.fits.iter().flat_map(|f| f.segment());
    let all_points: Vec<_> = chart
        .series
        .iter()
        .flat_map(|s| s.points.iter().copied())
        .chain(fit_points)
        .collect();

    let x_range = chart.x_range.unwrap_or_else(|| {
        let (lo, hi) = span(all_points.iter().map(|p| p.x));
        let pad = if chart.style == ChartStyle::Bar {
            min_x_spacing(chart) * BAR_FILL
        } else {
            (hi - lo) * 0.05
        };
        widen(lo - pad, hi + pad)
    });

    let y_range = chart.y_range.unwrap_or_else(|| {
        let (lo, hi) = span(all_points.iter().map(|p| p.y));
        let lo = lo.min(0.0);
        let hi = hi.max(0.0);
        widen(lo, hi + (hi - lo) * 0.1)
    });

    (x_range, y_range)
}

fn span(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .unwrap_or((0.0, 1.0))
}

/// Avoid zero-width axes.
fn widen(lo: f64, hi: f64) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else {
        (lo - 1.0, hi + 1.0)
    }
}
