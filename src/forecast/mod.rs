// =============================================================================
// Forecast Module
// =============================================================================
//
// Two independent forecasters:
// - `ForecastModel`: min-max scaled sliding windows fed to a pluggable
//   regressor (linear least squares or random forest), trained explicitly
//   and queried for the next close or a recursive path.
// - `forecast_multi_step`: a stateless straight-line fit over the time
//   index, extended a few steps.
//
// `ModelCache` keeps one `ForecastModel` per symbol.

pub mod cache;
pub mod forest;
pub mod model;
pub mod regressor;
pub mod scaler;
pub mod trend_line;
pub mod window;

pub use cache::{ModelCache, SeriesFingerprint};
pub use forest::RandomForestRegressor;
pub use model::{ForecastModel, TrainingSummary};
pub use regressor::{build_regressor, LinearRegressor, Regressor, RegressorKind};
pub use scaler::MinMaxScaler;
pub use trend_line::{forecast_multi_step, TrendLine};
