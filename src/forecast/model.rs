// =============================================================================
// Window Forecast Model
// =============================================================================
//
// State machine:  Untrained --train--> Trained --train--> Trained (fresh)
//
// Training pipeline:
//   1. drop bars without a close
//   2. fit a min-max scaler on the remaining closes
//   3. build (window, next value) samples of width `lookback`
//   4. fit the configured regressor from scratch
//
// Prediction scales the trailing `lookback` closes with the *training*
// scaler, predicts one scaled value and maps it back to price units.  A
// series of very different magnitude than the training series is not
// detected; it simply produces meaningless output.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ForecastParams;
use crate::error::{ForecastError, Result};
use crate::forecast::regressor::{build_regressor, Regressor, RegressorKind};
use crate::forecast::scaler::MinMaxScaler;
use crate::forecast::window::{build_samples, trailing_window};
use crate::market_data::PriceSeries;

/// What a successful `train` produced.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    pub regressor: RegressorKind,
    pub lookback: usize,
    pub samples: usize,
    pub scaler_min: f64,
    pub scaler_max: f64,
    pub trained_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Fitted {
    scaler: MinMaxScaler,
    regressor: Box<dyn Regressor>,
    summary: TrainingSummary,
}

/// Sliding-window price forecaster owning its scaler and regressor.
#[derive(Debug)]
pub struct ForecastModel {
    params: ForecastParams,
    fitted: Option<Fitted>,
}

impl ForecastModel {
    /// Create an untrained model.
    pub fn new(params: ForecastParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    pub fn lookback(&self) -> usize {
        self.params.lookback
    }

    pub fn is_trained(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn summary(&self) -> Option<&TrainingSummary> {
        self.fitted.as_ref().map(|f| &f.summary)
    }

    /// Train on `series`, discarding any previous fit.
    ///
    /// Requires at least `lookback + 1` bars with a close.  On failure the
    /// model is left untrained, so a stale fit can never answer for the
    /// new data.
    pub fn train(&mut self, series: &PriceSeries) -> Result<TrainingSummary> {
        self.fitted = None;

        let lookback = self.params.lookback;
        if lookback == 0 {
            return Err(ForecastError::InvalidParameter {
                name: "lookback",
                reason: "must be at least 1".to_string(),
            });
        }

        let closes = series.clean_closes();
        if closes.len() < lookback + 1 {
            debug!(
                bars = closes.len(),
                required = lookback + 1,
                "forecast training skipped: insufficient history"
            );
            return Err(ForecastError::InsufficientHistory {
                required: lookback + 1,
                actual: closes.len(),
            });
        }

        let scaler = MinMaxScaler::fit(&closes).ok_or(ForecastError::InsufficientHistory {
            required: lookback + 1,
            actual: 0,
        })?;
        let scaled = scaler.transform_all(&closes);
        let samples = build_samples(&scaled, lookback);

        let mut regressor = build_regressor(&self.params);
        regressor.fit(&samples.features, &samples.labels)?;

        let summary = TrainingSummary {
            regressor: self.params.regressor,
            lookback,
            samples: samples.len(),
            scaler_min: scaler.min(),
            scaler_max: scaler.max(),
            trained_at: Utc::now(),
        };

        info!(
            regressor = %summary.regressor,
            lookback,
            samples = summary.samples,
            "forecast model trained"
        );

        self.fitted = Some(Fitted {
            scaler,
            regressor,
            summary: summary.clone(),
        });
        Ok(summary)
    }

    /// Predict the close following the last bar of `series`.
    pub fn predict(&self, series: &PriceSeries) -> Result<f64> {
        let fitted = self.fitted.as_ref().ok_or(ForecastError::NotTrained)?;
        let scaled = self.scaled_closes(fitted, series)?;
        let window = trailing_window(&scaled, self.params.lookback).ok_or(
            ForecastError::InsufficientHistory {
                required: self.params.lookback,
                actual: scaled.len(),
            },
        )?;
        let next = fitted.regressor.predict_one(window)?;
        Ok(fitted.scaler.inverse(next))
    }

    /// Predict `steps` successive closes, feeding each scaled prediction
    /// back into the window.
    pub fn predict_path(&self, series: &PriceSeries, steps: usize) -> Result<Vec<f64>> {
        let fitted = self.fitted.as_ref().ok_or(ForecastError::NotTrained)?;
        let lookback = self.params.lookback;
        let scaled = self.scaled_closes(fitted, series)?;
        let mut window = trailing_window(&scaled, lookback)
            .ok_or(ForecastError::InsufficientHistory {
                required: lookback,
                actual: scaled.len(),
            })?
            .to_vec();

        let mut path = Vec::with_capacity(steps);
        for _ in 0..steps {
            let next = fitted.regressor.predict_one(&window)?;
            path.push(fitted.scaler.inverse(next));
            window.remove(0);
            window.push(next);
        }
        Ok(path)
    }

    fn scaled_closes(&self, fitted: &Fitted, series: &PriceSeries) -> Result<Vec<f64>> {
        let closes = series.clean_closes();
        if closes.len() < self.params.lookback {
            return Err(ForecastError::InsufficientHistory {
                required: self.params.lookback,
                actual: closes.len(),
            });
        }
        Ok(fitted.scaler.transform_all(&closes))
    }
}
