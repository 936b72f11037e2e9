// =============================================================================
// NeuroTrader Analysis Engine
// =============================================================================
//
// Pure computation behind the market dashboards: technical indicators, the
// EMA trend / support-resistance target heuristic, a buy/sell/hold hint and
// two price forecasters.  Data acquisition and presentation live elsewhere;
// this crate only sees `PriceSeries` values.
// =============================================================================

pub mod analysis;
pub mod config;
pub mod error;
pub mod forecast;
pub mod indicators;
pub mod market_data;
pub mod signal;
pub mod trend;

pub use analysis::{analyse, SymbolReport};
pub use config::EngineConfig;
pub use error::ForecastError;
pub use market_data::{PriceBar, PriceSeries};
