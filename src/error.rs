// =============================================================================
// Forecast Errors
// =============================================================================

use thiserror::Error;

/// Failures reported by the forecast module.
///
/// `InsufficientHistory` is an expected, common condition (short feeds,
/// fresh symbols); callers usually surface it as a soft warning.  The
/// other variants are caller errors or numerical failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("insufficient history: required {required} bars, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("model has not been trained")]
    NotTrained,

    #[error("invalid parameter: {name} - {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("numerical error: {0}")]
    Numerical(String),
}

impl ForecastError {
    pub fn is_insufficient_history(&self) -> bool {
        matches!(self, Self::InsufficientHistory { .. })
    }
}

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;
