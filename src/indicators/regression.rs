// =============================================================================
// Ordinary Least-Squares Linear Regression
// =============================================================================
//
//   slope     = (n·Σxy − Σx·Σy) / (n·Σx² − (Σx)²)
//   intercept = (Σy − slope·Σx) / n
//
// Fitted over (sample index, close price) pairs and used only by the
// prediction heuristic as trend context, not by the live indicator panel.

use serde::{Deserialize, Serialize};

use crate::types::PriceSample;

/// A fitted trend line `y = slope·x + intercept`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    /// Evaluate the fitted line at `x`.
    pub fn project(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a least-squares line through `(x, y)` pairs.
///
/// Degenerate inputs (empty, single point, or all x identical) make the
/// denominator `n·Σx² − (Σx)²` vanish; the fit then reports slope 0 with the
/// mean of `y` as intercept instead of propagating a division fault.
pub fn linear_regression(x: &[f64], y: &[f64]) -> TrendLine {
    let n = x.len().min(y.len());
    if n == 0 {
        return TrendLine::default();
    }

    let nf = n as f64;
    let sum_x: f64 = x[..n].iter().sum();
    let sum_y: f64 = y[..n].iter().sum();
    let sum_xy: f64 = x[..n].iter().zip(&y[..n]).map(|(a, b)| a * b).sum();
    let sum_xx: f64 = x[..n].iter().map(|a| a * a).sum();

    let denominator = nf * sum_xx - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return TrendLine {
            slope: 0.0,
            intercept: sum_y / nf,
        };
    }

    let slope = (nf * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / nf;

    TrendLine { slope, intercept }
}

/// Fit the trend of a price series over `(index, close)` pairs.
pub fn fit_price_trend(series: &[PriceSample]) -> TrendLine {
    let x: Vec<f64> = (0..series.len()).map(|i| i as f64).collect();
    let y: Vec<f64> = series.iter().map(|s| s.close).collect();
    linear_regression(&x, &y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_linear_relationship() {
        // y = 3x + 7 over x = 0..9.
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&v| 3.0 * v + 7.0).collect();
        let fit = linear_regression(&x, &y);
        assert!((fit.slope - 3.0).abs() < 1e-6, "slope {}", fit.slope);
        assert!((fit.intercept - 7.0).abs() < 1e-6, "intercept {}", fit.intercept);
    }

    #[test]
    fn empty_input_is_flat_at_zero() {
        let fit = linear_regression(&[], &[]);
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, 0.0);
    }

    #[test]
    fn single_point_is_flat_at_that_point() {
        let fit = linear_regression(&[5.0], &[123.0]);
        assert_eq!(fit.slope, 0.0);
        assert!((fit.intercept - 123.0).abs() < 1e-10);
    }

    #[test]
    fn identical_x_values_guarded() {
        // All x equal — the normal-equation denominator is exactly zero.
        let fit = linear_regression(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]);
        assert_eq!(fit.slope, 0.0);
        assert!((fit.intercept - 2.0).abs() < 1e-10);
    }

    #[test]
    fn project_evaluates_the_line() {
        let line = TrendLine { slope: 2.0, intercept: 1.0 };
        assert!((line.project(10.0) - 21.0).abs() < 1e-10);
    }

    #[test]
    fn fit_price_trend_uses_closes() {
        let series: Vec<PriceSample> = (0..10)
            .map(|i| PriceSample {
                timestamp_ms: i as i64 * 86_400_000,
                open: 0.0,
                high: 0.0,
                low: 0.0,
                close: 3.0 * i as f64 + 7.0,
                volume: None,
                market_cap: None,
            })
            .collect();
        let fit = fit_price_trend(&series);
        assert!((fit.slope - 3.0).abs() < 1e-6);
        assert!((fit.intercept - 7.0).abs() < 1e-6);
    }
}
