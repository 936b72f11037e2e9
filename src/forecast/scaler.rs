// =============================================================================
// Min-Max Scaler
// =============================================================================
//
//   scaled = (x - min) / (max - min)
//   x      = scaled * (max - min) + min
//
// A zero range (constant series) scales by 1 so every value maps to 0 and
// inverts back to `min`.  The scaler is tied to the series it was fitted on:
// transforming a series of a different magnitude is not detected and yields
// values outside [0, 1].

use serde::{Deserialize, Serialize};

/// Fitted min/max parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// Fit on the finite values of `values`; `None` when there are none.
    pub fn fit(values: &[f64]) -> Option<Self> {
        let (min, max) = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            })?;
        Some(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    fn range(&self) -> f64 {
        let range = self.max - self.min;
        if range.abs() < f64::EPSILON {
            1.0
        } else {
            range
        }
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.min) / self.range()
    }

    pub fn transform_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform(v)).collect()
    }

    pub fn inverse(&self, scaled: f64) -> f64 {
        scaled * self.range() + self.min
    }
}
