pub mod chart_payload;
pub mod price_series;

pub use chart_payload::{parse_chart_payload, ChartPayload};
pub use price_series::{PriceBar, PriceSeries, SeriesError};
