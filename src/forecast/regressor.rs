// =============================================================================
// Window Regressors
// =============================================================================
//
// The forecaster only needs "fit on (X, y), predict one row".  Both model
// families sit behind `Regressor` so the window/scaling pipeline does not
// care which one is in use.
//
// Linear model: least squares with intercept on centred features:
//
//   (Xcᵀ Xc + λ I) w = Xcᵀ yc,    intercept = ȳ - w · x̄
//
// Window features of a smooth series are almost collinear, so a tiny ridge
// term `λ = 1e-8 · trace / p` keeps the normal equations solvable without
// visibly biasing the fit.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::config::ForecastParams;
use crate::error::{ForecastError, Result};
use crate::forecast::forest::RandomForestRegressor;

/// Relative ridge strength applied to the normal equations.
const RIDGE_SCALE: f64 = 1e-8;

/// A supervised regressor over fixed-width feature rows.
pub trait Regressor: std::fmt::Debug + Send + Sync {
    /// Fit on `features` (one row per sample) and `labels`, replacing any
    /// previous fit.
    fn fit(&mut self, features: &[Vec<f64>], labels: &[f64]) -> Result<()>;

    /// Predict the label for one feature row.
    fn predict_one(&self, features: &[f64]) -> Result<f64>;

    fn is_fitted(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Model family used by the window forecaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RegressorKind {
    Linear,
    #[default]
    RandomForest,
}

impl std::fmt::Display for RegressorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::RandomForest => write!(f, "random_forest"),
        }
    }
}

/// Fresh, unfitted regressor for the configured family.
pub fn build_regressor(params: &ForecastParams) -> Box<dyn Regressor> {
    match params.regressor {
        RegressorKind::Linear => Box::new(LinearRegressor::new()),
        RegressorKind::RandomForest => Box::new(RandomForestRegressor::new(
            params.n_trees,
            params.max_depth,
            params.min_samples_split,
            params.seed,
        )),
    }
}

/// Check that `features` is a non-empty rectangular matrix matching `labels`.
pub(crate) fn check_training_set(features: &[Vec<f64>], labels: &[f64]) -> Result<usize> {
    if features.is_empty() {
        return Err(ForecastError::InsufficientHistory {
            required: 1,
            actual: 0,
        });
    }
    if features.len() != labels.len() {
        return Err(ForecastError::InvalidParameter {
            name: "labels",
            reason: format!("{} rows but {} labels", features.len(), labels.len()),
        });
    }
    let width = features[0].len();
    if width == 0 || features.iter().any(|row| row.len() != width) {
        return Err(ForecastError::InvalidParameter {
            name: "features",
            reason: "rows must be non-empty and of equal width".to_string(),
        });
    }
    Ok(width)
}

// =============================================================================
// LinearRegressor
// =============================================================================

/// Multivariate least-squares regressor with intercept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearRegressor {
    weights: Vec<f64>,
    intercept: f64,
    fitted: bool,
}

impl LinearRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regressor for LinearRegressor {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[f64]) -> Result<()> {
        let p = check_training_set(features, labels)?;
        let n = features.len() as f64;

        let mut x_mean = vec![0.0; p];
        for row in features {
            for (m, &x) in x_mean.iter_mut().zip(row) {
                *m += x / n;
            }
        }
        let y_mean = labels.iter().sum::<f64>() / n;

        // Normal equations on centred data.
        let mut gram = vec![vec![0.0; p]; p];
        let mut rhs = vec![0.0; p];
        for (row, &y) in features.iter().zip(labels) {
            let centred: Vec<f64> = row.iter().zip(&x_mean).map(|(x, m)| x - m).collect();
            let yc = y - y_mean;
            for j in 0..p {
                rhs[j] += centred[j] * yc;
                for k in j..p {
                    gram[j][k] += centred[j] * centred[k];
                }
            }
        }
        for j in 0..p {
            for k in 0..j {
                gram[j][k] = gram[k][j];
            }
        }

        let trace: f64 = (0..p).map(|j| gram[j][j]).sum();
        // Zero trace means constant features: any positive ridge gives w = 0.
        let lambda = if trace > 0.0 {
            RIDGE_SCALE * trace / p as f64
        } else {
            1.0
        };
        for (j, row) in gram.iter_mut().enumerate() {
            row[j] += lambda;
        }

        let weights = solve_linear_system(gram, rhs)?;
        let intercept = y_mean - weights.iter().zip(&x_mean).map(|(w, m)| w * m).sum::<f64>();

        if !intercept.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(ForecastError::Numerical(
                "non-finite least-squares solution".to_string(),
            ));
        }

        self.weights = weights;
        self.intercept = intercept;
        self.fitted = true;
        Ok(())
    }

    fn predict_one(&self, features: &[f64]) -> Result<f64> {
        if !self.fitted {
            return Err(ForecastError::NotTrained);
        }
        if features.len() != self.weights.len() {
            return Err(ForecastError::InvalidParameter {
                name: "features",
                reason: format!("expected {} values, got {}", self.weights.len(), features.len()),
            });
        }
        Ok(self.intercept
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>())
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}

/// Solve `a · x = b` by Gaussian elimination with partial pivoting.
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-300 {
            return Err(ForecastError::Numerical(
                "singular matrix in least squares".to_string(),
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_recovers_exact_plane() {
        // y = 1 + 2 a - 3 b
        let features: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![i as f64, ((i * 7) % 5) as f64])
            .collect();
        let labels: Vec<f64> = features.iter().map(|r| 1.0 + 2.0 * r[0] - 3.0 * r[1]).collect();

        let mut model = LinearRegressor::new();
        model.fit(&features, &labels).unwrap();
        assert!((model.weights()[0] - 2.0).abs() < 1e-6);
        assert!((model.weights()[1] + 3.0).abs() < 1e-6);
        assert!((model.intercept() - 1.0).abs() < 1e-5);
        assert!((model.predict_one(&[100.0, 1.0]).unwrap() - 198.0).abs() < 1e-4);
    }

    #[test]
    fn linear_handles_collinear_windows() {
        // Windows of a straight line are perfectly collinear.
        let line: Vec<f64> = (0..30).map(|i| i as f64 * 0.1).collect();
        let features: Vec<Vec<f64>> = (3..30).map(|i| line[i - 3..i].to_vec()).collect();
        let labels: Vec<f64> = (3..30).map(|i| line[i]).collect();

        let mut model = LinearRegressor::new();
        model.fit(&features, &labels).unwrap();
        let next = model.predict_one(&line[27..30]).unwrap();
        assert!((next - 3.0).abs() < 1e-4, "got {next}");
    }

    #[test]
    fn linear_constant_labels_predict_constant() {
        let features = vec![vec![0.0, 0.0]; 5];
        let labels = vec![0.5; 5];
        let mut model = LinearRegressor::new();
        model.fit(&features, &labels).unwrap();
        assert!((model.predict_one(&[0.0, 0.0]).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn linear_predict_before_fit_fails() {
        let model = LinearRegressor::new();
        assert_eq!(model.predict_one(&[1.0]), Err(ForecastError::NotTrained));
        assert!(!model.is_fitted());
    }

    #[test]
    fn linear_rejects_wrong_width() {
        let mut model = LinearRegressor::new();
        model.fit(&[vec![1.0, 2.0], vec![2.0, 3.0]], &[1.0, 2.0]).unwrap();
        assert!(matches!(
            model.predict_one(&[1.0]),
            Err(ForecastError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn training_set_checks() {
        assert!(check_training_set(&[], &[]).unwrap_err().is_insufficient_history());
        assert!(check_training_set(&[vec![1.0]], &[1.0, 2.0]).is_err());
        assert!(check_training_set(&[vec![1.0], vec![1.0, 2.0]], &[1.0, 2.0]).is_err());
        assert_eq!(check_training_set(&[vec![1.0, 2.0]], &[1.0]), Ok(2));
    }

    #[test]
    fn kind_builds_matching_regressor() {
        let mut params = ForecastParams::default();
        assert_eq!(build_regressor(&params).name(), "random_forest");
        params.regressor = RegressorKind::Linear;
        assert_eq!(build_regressor(&params).name(), "linear");
        assert_eq!(RegressorKind::Linear.to_string(), "linear");
    }
}
