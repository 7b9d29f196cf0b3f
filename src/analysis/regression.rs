//! Least-squares linear regression for best-fit lines.

use crate::error::{PlotError, Result};
use crate::models::{AggregatedSeries, LinearFit};

/// Fit `y = slope * x + intercept` to a series by ordinary least squares.
///
/// The fitted segment spans the series' x range.
pub fn linear_fit(series: &AggregatedSeries) -> Result<LinearFit> {
    let degenerate = || PlotError::DegenerateFit {
        series: series.label.clone(),
    };

    let (x_min, x_max) = series.x_bounds().ok_or_else(degenerate)?;
    if x_min == x_max {
        return Err(degenerate());
    }

    let n = series.len() as f64;
    let mean_x = series.points.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_y = series.points.iter().map(|p| p.y).sum::<f64>() / n;

    let (sxx, sxy) = series.points.iter().fold((0.0, 0.0), |(sxx, sxy), p| {
        let dx = p.x - mean_x;
        (sxx + dx * dx, sxy + dx * (p.y - mean_y))
    });

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    Ok(LinearFit {
        series: series.label.clone(),
        slope,
        intercept,
        x_min,
        x_max,
    })
}

/// Sum of squared vertical distances between the points and the line.
pub fn residual(series: &AggregatedSeries, fit: &LinearFit) -> f64 {
    series
        .points
        .iter()
        .map(|p| {
            let d = p.y - fit.at(p.x);
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Point;

    fn series(points: &[(f64, f64)]) -> AggregatedSeries {
        AggregatedSeries::new(
            "leader",
            points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        )
    }

    #[test]
    fn test_collinear_points_fit_exactly() {
        let s = series(&[(1.0, 3.0), (2.0, 5.0), (4.0, 9.0), (5.0, 11.0)]);
        let fit = linear_fit(&s).unwrap();

        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!((fit.intercept - 1.0).abs() < 1e-9);
        assert!(residual(&s, &fit) < 1e-9);
        assert_eq!((fit.x_min, fit.x_max), (1.0, 5.0));
    }

    #[test]
    fn test_noisy_points() {
        let s = series(&[(0.0, 1.0), (1.0, 0.0), (2.0, 3.0), (3.0, 2.0)]);
        let fit = linear_fit(&s).unwrap();

        assert!((fit.slope - 0.6).abs() < 1e-9);
        assert!((fit.intercept - 0.6).abs() < 1e-9);
        assert!(residual(&s, &fit) > 0.0);
    }

    #[test]
    fn test_single_x_is_degenerate() {
        let s = series(&[(3.0, 1.0), (3.0, 2.0)]);
        assert!(matches!(linear_fit(&s), Err(PlotError::DegenerateFit { .. })));
    }

    #[test]
    fn test_empty_is_degenerate() {
        assert!(linear_fit(&series(&[])).is_err());
    }
}
