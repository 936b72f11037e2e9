// =============================================================================
// Straight-Line Trend Forecast
// =============================================================================
//
// Ordinary least squares of close price against the time index
// `0..n-1`, evaluated at `n..n+steps-1`.  Unlike the window forecaster
// this needs no training state: every call refits on the series given.
// =============================================================================

use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::market_data::PriceSeries;

/// Fitted line `y = intercept + slope * t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination of the fit.
    pub r_squared: f64,
    /// Number of observations the line was fitted on.
    pub n_observations: usize,
}

impl TrendLine {
    /// Fit on `values` against indices 0, 1, 2, ...
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.len() < 2 {
            return Err(ForecastError::InsufficientHistory {
                required: 2,
                actual: values.len(),
            });
        }

        let n = values.len() as f64;

        let sum_t: f64 = (0..values.len()).map(|i| i as f64).sum();
        let sum_y: f64 = values.iter().sum();
        let sum_t2: f64 = (0..values.len()).map(|i| (i * i) as f64).sum();
        let sum_ty: f64 = values.iter().enumerate().map(|(i, &y)| i as f64 * y).sum();

        let denominator = n * sum_t2 - sum_t * sum_t;
        if denominator.abs() < 1e-10 {
            return Err(ForecastError::Numerical(
                "singular time index in trend line".to_string(),
            ));
        }

        let slope = (n * sum_ty - sum_t * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_t) / n;

        let mean_y = sum_y / n;
        let ss_tot: f64 = values.iter().map(|&y| (y - mean_y).powi(2)).sum();
        let ss_res: f64 = values
            .iter()
            .enumerate()
            .map(|(i, &y)| (y - (intercept + slope * i as f64)).powi(2))
            .sum();

        let r_squared = if ss_tot > 1e-10 {
            1.0 - ss_res / ss_tot
        } else {
            1.0
        };

        Ok(Self {
            slope,
            intercept,
            r_squared,
            n_observations: values.len(),
        })
    }

    pub fn value_at(&self, t: f64) -> f64 {
        self.intercept + self.slope * t
    }

    /// Line values for the `steps` indices following the fitted data.
    pub fn extrapolate(&self, steps: usize) -> Vec<f64> {
        (0..steps)
            .map(|i| self.value_at((self.n_observations + i) as f64))
            .collect()
    }
}

/// Fit a trend line on the clean closes of `series` and extend it `steps`
/// bars into the future.  Bars with a missing close are dropped first.
pub fn forecast_multi_step(series: &PriceSeries, steps: usize) -> Result<Vec<f64>> {
    let closes = series.clean_closes();
    Ok(TrendLine::fit(&closes)?.extrapolate(steps))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_line_exact_fit() {
        let line = TrendLine::fit(&[10.0, 12.0, 14.0, 16.0, 18.0, 20.0]).unwrap();
        assert!((line.slope - 2.0).abs() < 1e-10);
        assert!((line.intercept - 10.0).abs() < 1e-10);
        assert!((line.r_squared - 1.0).abs() < 1e-10);
        let next = line.extrapolate(3);
        for (got, want) in next.iter().zip([22.0, 24.0, 26.0]) {
            assert!((got - want).abs() < 1e-10);
        }
    }

    #[test]
    fn trend_line_needs_two_points() {
        assert_eq!(
            TrendLine::fit(&[1.0]),
            Err(ForecastError::InsufficientHistory {
                required: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn multi_step_drops_missing_closes() {
        let series = PriceSeries::from_closes(&[1.0, f64::NAN, 2.0, 3.0]);
        // Clean closes [1, 2, 3] on indices 0..3.
        let forecast = forecast_multi_step(&series, 2).unwrap();
        assert!((forecast[0] - 4.0).abs() < 1e-10);
        assert!((forecast[1] - 5.0).abs() < 1e-10);
    }

    #[test]
    fn multi_step_zero_steps_is_empty() {
        let series = PriceSeries::from_closes(&[1.0, 2.0]);
        assert!(forecast_multi_step(&series, 0).unwrap().is_empty());
    }

    #[test]
    fn multi_step_all_nan_is_insufficient() {
        let series = PriceSeries::from_closes(&[f64::NAN; 4]);
        assert!(forecast_multi_step(&series, 3).unwrap_err().is_insufficient_history());
    }

    #[test]
    fn flat_series_has_zero_slope() {
        let line = TrendLine::fit(&[7.0; 10]).unwrap();
        assert!(line.slope.abs() < 1e-12);
        assert!((line.value_at(50.0) - 7.0).abs() < 1e-10);
    }
}
