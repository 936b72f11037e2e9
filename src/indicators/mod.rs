// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators the dashboards
// chart.  Every series function returns a `Vec<Option<f64>>` aligned
// index-for-index with its input: short or malformed input degrades to
// missing values instead of an error.

pub mod ema;
pub mod macd;
pub mod rolling;
pub mod rsi;

use serde::Serialize;

use crate::config::IndicatorParams;
use crate::market_data::PriceSeries;

pub use ema::{calculate_ema, ema_of};
pub use macd::{calculate_macd, MacdSeries};
pub use rolling::{rolling_max, rolling_min};
pub use rsi::{calculate_rsi, calculate_rsi_wilder, RsiSmoothing, RsiZone};

/// One EMA line with the span it was computed for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmaLine {
    pub span: usize,
    pub values: Vec<Option<f64>>,
}

/// Every derived series for one `PriceSeries`, aligned with its bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSet {
    pub emas: Vec<EmaLine>,
    pub rsi_period: usize,
    pub rsi: Vec<Option<f64>>,
    pub macd: MacdSeries,
}

impl IndicatorSet {
    /// EMA line for `span`, if it was requested.
    pub fn ema(&self, span: usize) -> Option<&[Option<f64>]> {
        self.emas
            .iter()
            .find(|line| line.span == span)
            .map(|line| line.values.as_slice())
    }

    pub fn last_rsi(&self) -> Option<f64> {
        last_defined(&self.rsi)
    }
}

/// Compute EMA lines, RSI and MACD over the close column of `series`.
pub fn compute_indicator_set(series: &PriceSeries, params: &IndicatorParams) -> IndicatorSet {
    let closes = series.closes();

    let emas = params
        .ema_spans
        .iter()
        .map(|&span| EmaLine {
            span,
            values: calculate_ema(&closes, span),
        })
        .collect();

    let rsi = match params.rsi_smoothing {
        RsiSmoothing::Rolling => calculate_rsi(&closes, params.rsi_period),
        RsiSmoothing::Wilder => calculate_rsi_wilder(&closes, params.rsi_period),
    };

    IndicatorSet {
        emas,
        rsi_period: params.rsi_period,
        rsi,
        macd: calculate_macd(&closes, params.macd_fast, params.macd_slow, params.macd_signal),
    }
}

/// Last defined value of an aligned series.
pub fn last_defined(series: &[Option<f64>]) -> Option<f64> {
    series.iter().rev().find_map(|v| *v)
}
