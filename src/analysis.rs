// =============================================================================
// Symbol Report
// =============================================================================
//
// One full analysis pass over a single symbol's series:
//
//   indicators -> trend / band / target -> signal -> forecasts
//
// Every stage degrades independently.  Short history leaves the affected
// fields empty and records a warning; it never aborts the report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::forecast::{ModelCache, TrainingSummary, TrendLine};
use crate::indicators::rsi::classify_rsi;
use crate::indicators::{compute_indicator_set, IndicatorSet, RsiZone};
use crate::market_data::PriceSeries;
use crate::signal::{recommend_from_set, Recommendation};
use crate::trend::{assess_target, classify_trend, default_target, TrendAssessment, TrendSignal};

/// Forecast outputs for one report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ForecastSection {
    /// Window model estimate of the next close.
    pub next_close: Option<f64>,
    /// Window model recursive path of `horizon` closes.
    pub path: Vec<f64>,
    pub training: Option<TrainingSummary>,
    /// Straight-line fit over the time index.
    pub trend_line: Option<TrendLine>,
    /// Straight-line extension of `horizon` closes.
    pub trend_line_path: Vec<f64>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolReport {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub bars: usize,
    pub first_bar: Option<DateTime<Utc>>,
    pub last_bar: Option<DateTime<Utc>>,
    pub last_close: Option<f64>,
    pub indicators: IndicatorSet,
    pub rsi: Option<f64>,
    pub rsi_zone: Option<RsiZone>,
    /// Present whenever any EMA is defined, even on short history.
    pub trend: Option<TrendSignal>,
    /// Present once the series covers the band window.
    pub assessment: Option<TrendAssessment>,
    pub recommendation: Option<Recommendation>,
    pub forecast: ForecastSection,
}

/// Build the report for `symbol`, reusing a cached model when `series` is
/// unchanged since the last pass.
pub fn analyse(symbol: &str, series: &PriceSeries, config: &EngineConfig, cache: &ModelCache) -> SymbolReport {
    let ind = &config.indicators;
    let indicators = compute_indicator_set(series, ind);

    let rsi = indicators.last_rsi();
    let rsi_zone = rsi.map(|v| classify_rsi(v, ind.oversold, ind.overbought));
    let recommendation = recommend_from_set(&indicators, ind);

    let trend = classify_trend(series, config.trend.fast_span, config.trend.slow_span);
    let assessment = config
        .target
        .or_else(|| default_target(series))
        .and_then(|target| assess_target(series, target, &config.trend));

    let forecast = run_forecasts(symbol, series, config, cache);

    let bars = series.bars();
    let report = SymbolReport {
        symbol: symbol.to_string(),
        generated_at: Utc::now(),
        bars: bars.len(),
        first_bar: bars.first().and_then(|b| b.time()),
        last_bar: bars.last().and_then(|b| b.time()),
        last_close: series.last_close(),
        indicators,
        rsi,
        rsi_zone,
        trend,
        assessment,
        recommendation,
        forecast,
    };

    info!(
        symbol,
        bars = report.bars,
        trend = ?report.trend.map(|t| t.direction),
        probability = ?report.assessment.as_ref().map(|a| a.probability),
        next_close = ?report.forecast.next_close,
        "symbol report ready"
    );

    report
}

fn run_forecasts(symbol: &str, series: &PriceSeries, config: &EngineConfig, cache: &ModelCache) -> ForecastSection {
    let horizon = config.forecast.horizon;
    let mut section = ForecastSection::default();

    match cache.get_or_train(symbol, series, &config.forecast) {
        Ok(model) => {
            section.training = model.summary().cloned();
            match model.predict(series) {
                Ok(next) => section.next_close = Some(next),
                Err(e) => section.warnings.push(format!("next close: {e}")),
            }
            match model.predict_path(series, horizon) {
                Ok(path) => section.path = path,
                Err(e) => section.warnings.push(format!("forecast path: {e}")),
            }
        }
        Err(e) => {
            debug!(symbol, error = %e, "window forecast unavailable");
            section.warnings.push(format!("window model: {e}"));
        }
    }

    match TrendLine::fit(&series.clean_closes()) {
        Ok(line) => {
            section.trend_line_path = line.extrapolate(horizon);
            section.trend_line = Some(line);
        }
        Err(e) => section.warnings.push(format!("trend line: {e}")),
    }

    section
}
