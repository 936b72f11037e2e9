// =============================================================================
// Trend & Support/Resistance Heuristic
// =============================================================================
//
// Direction comes from a two-EMA comparison on the close column:
//
//   Up   when EMA(fast)[last] > EMA(slow)[last]
//   Down otherwise
//
// Support / resistance are the rolling minimum of `low` / maximum of `high`
// over the trailing `window` bars, read at the most recent bar.  The target
// check is a fixed two-level heuristic, not a statistical estimate:
//
//   support <= target <= resistance  => 0.7
//   otherwise                        => 0.3

use serde::Serialize;
use tracing::debug;

use crate::config::TrendParams;
use crate::indicators::ema::last_ema;
use crate::indicators::{rolling_max, rolling_min};
use crate::market_data::PriceSeries;

/// Probability reported when the target lies inside the recent range.
pub const IN_RANGE_PROBABILITY: f64 = 0.7;
/// Probability reported when the target lies outside the recent range.
pub const OUT_OF_RANGE_PROBABILITY: f64 = 0.3;

/// Binary trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Up,
    Down,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "UP"),
            Self::Down => write!(f, "DOWN"),
        }
    }
}

/// Result of the two-EMA trend comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendSignal {
    pub direction: TrendDirection,
    pub fast_ema: f64,
    pub slow_ema: f64,
    /// `true` iff the series has at least `slow_span` bars.  When `false`
    /// the slow EMA has not absorbed a full span and the signal is
    /// low-confidence.
    pub sufficient_history: bool,
}

/// Trailing trading range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Band {
    pub support: f64,
    pub resistance: f64,
}

/// Full answer to "how likely is this target?" for one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAssessment {
    pub target: f64,
    pub trend: TrendSignal,
    pub band: Band,
    pub probability: f64,
}

/// Classify trend direction from EMA(`fast_span`) vs EMA(`slow_span`).
///
/// Returns `None` only when no EMA value exists (empty series, all-NaN
/// closes, or a zero span).  Short series still produce a signal, flagged
/// through `sufficient_history`.
pub fn classify_trend(series: &PriceSeries, fast_span: usize, slow_span: usize) -> Option<TrendSignal> {
    let closes = series.closes();
    let fast_ema = last_ema(&closes, fast_span)?;
    let slow_ema = last_ema(&closes, slow_span)?;

    let direction = if fast_ema > slow_ema {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    Some(TrendSignal {
        direction,
        fast_ema,
        slow_ema,
        sufficient_history: series.len() >= slow_span,
    })
}

/// Support and resistance over the trailing `window` bars.
///
/// Returns `None` when the series is shorter than `window` or the last
/// window contains a missing low/high.
pub fn compute_band(series: &PriceSeries, window: usize) -> Option<Band> {
    let support = rolling_min(&series.lows(), window).last().copied().flatten()?;
    let resistance = rolling_max(&series.highs(), window).last().copied().flatten()?;
    Some(Band {
        support,
        resistance,
    })
}

/// Fixed heuristic probability that `target` is reachable (inclusive range).
pub fn target_probability(target: f64, support: f64, resistance: f64) -> f64 {
    if support <= target && target <= resistance {
        IN_RANGE_PROBABILITY
    } else {
        OUT_OF_RANGE_PROBABILITY
    }
}

/// Trend, band and target probability in one pass.
pub fn assess_target(series: &PriceSeries, target: f64, params: &TrendParams) -> Option<TrendAssessment> {
    if series.len() < params.band_window {
        debug!(
            bars = series.len(),
            window = params.band_window,
            "target assessment: insufficient data for band"
        );
        return None;
    }

    let trend = classify_trend(series, params.fast_span, params.slow_span)?;
    let band = compute_band(series, params.band_window)?;
    let probability = target_probability(target, band.support, band.resistance);

    if !trend.sufficient_history {
        debug!(
            bars = series.len(),
            slow_span = params.slow_span,
            "trend signal computed on short history"
        );
    }

    Some(TrendAssessment {
        target,
        trend,
        band,
        probability,
    })
}

/// Last close, used as the default target when the caller supplies none.
pub fn default_target(series: &PriceSeries) -> Option<f64> {
    series.last_close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::PriceBar;

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        PriceSeries::from_closes(closes)
    }

    /// Bars with known highs and lows around a base price.
    fn banded_series() -> PriceSeries {
        let bars = (0..30)
            .map(|i| {
                let base = 100.0 + (i % 5) as f64;
                PriceBar::new(i, base, base + 2.0, base - 2.0, base)
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    // ---- classify_trend ---------------------------------------------------

    #[test]
    fn trend_up_on_rising_series() {
        let closes: Vec<f64> = (1..=250).map(|x| x as f64).collect();
        let signal = classify_trend(&series_from_closes(&closes), 50, 200).unwrap();
        assert_eq!(signal.direction, TrendDirection::Up);
        assert!(signal.sufficient_history);
        assert!(signal.fast_ema > signal.slow_ema);
    }

    #[test]
    fn trend_down_on_falling_series() {
        let closes: Vec<f64> = (1..=250).rev().map(|x| x as f64).collect();
        let signal = classify_trend(&series_from_closes(&closes), 50, 200).unwrap();
        assert_eq!(signal.direction, TrendDirection::Down);
    }

    #[test]
    fn trend_flat_is_down() {
        let signal = classify_trend(&series_from_closes(&[10.0; 300]), 50, 200).unwrap();
        assert_eq!(signal.direction, TrendDirection::Down);
    }

    #[test]
    fn trend_short_history_is_flagged() {
        let closes: Vec<f64> = (1..=60).map(|x| x as f64).collect();
        let signal = classify_trend(&series_from_closes(&closes), 50, 200).unwrap();
        assert!(!signal.sufficient_history);
        assert_eq!(signal.direction, TrendDirection::Up);

        let exact: Vec<f64> = (1..=200).map(|x| x as f64).collect();
        assert!(classify_trend(&series_from_closes(&exact), 50, 200).unwrap().sufficient_history);
    }

    #[test]
    fn trend_none_on_empty_or_nan() {
        assert!(classify_trend(&PriceSeries::default(), 50, 200).is_none());
        assert!(classify_trend(&series_from_closes(&[f64::NAN; 5]), 2, 3).is_none());
    }

    // ---- compute_band -----------------------------------------------------

    #[test]
    fn band_equals_rolling_extrema() {
        let series = banded_series();
        let band = compute_band(&series, 20).unwrap();
        let lows = series.lows();
        let highs = series.highs();
        let expected_support = lows[10..].iter().copied().fold(f64::INFINITY, f64::min);
        let expected_resistance = highs[10..].iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(band.support, expected_support);
        assert_eq!(band.resistance, expected_resistance);
        assert_eq!(band.support, 98.0);
        assert_eq!(band.resistance, 106.0);
    }

    #[test]
    fn band_only_sees_trailing_window() {
        let mut bars: Vec<PriceBar> = (0..25).map(|i| PriceBar::new(i, 50.0, 51.0, 49.0, 50.0)).collect();
        // Extreme outside the last 20 bars.
        bars[2] = PriceBar::new(2, 50.0, 500.0, 1.0, 50.0);
        let band = compute_band(&PriceSeries::new(bars).unwrap(), 20).unwrap();
        assert_eq!(band.support, 49.0);
        assert_eq!(band.resistance, 51.0);
    }

    #[test]
    fn band_short_series_is_missing() {
        let series = series_from_closes(&[1.0; 19]);
        assert!(compute_band(&series, 20).is_none());
        assert!(compute_band(&series_from_closes(&[1.0; 20]), 20).is_some());
    }

    // ---- target_probability -------------------------------------------------

    #[test]
    fn probability_boundaries_are_inclusive() {
        assert_eq!(target_probability(90.0, 90.0, 110.0), 0.7);
        assert_eq!(target_probability(110.0, 90.0, 110.0), 0.7);
        assert_eq!(target_probability(100.0, 90.0, 110.0), 0.7);
    }

    #[test]
    fn probability_outside_range() {
        assert_eq!(target_probability(89.99, 90.0, 110.0), 0.3);
        assert_eq!(target_probability(110.01, 90.0, 110.0), 0.3);
        assert_eq!(target_probability(f64::NAN, 90.0, 110.0), 0.3);
    }

    // ---- assess_target ------------------------------------------------------

    #[test]
    fn assess_target_combines_parts() {
        let series = banded_series();
        let params = TrendParams::default();
        let inside = assess_target(&series, 100.0, &params).unwrap();
        assert_eq!(inside.probability, 0.7);
        assert!(!inside.trend.sufficient_history);

        let outside = assess_target(&series, 150.0, &params).unwrap();
        assert_eq!(outside.probability, 0.3);
        assert_eq!(outside.band, inside.band);
    }

    #[test]
    fn assess_target_needs_band_window() {
        let series = series_from_closes(&[100.0; 10]);
        assert!(assess_target(&series, 100.0, &TrendParams::default()).is_none());
    }

    #[test]
    fn default_target_is_last_close() {
        assert_eq!(default_target(&series_from_closes(&[1.0, 2.0, f64::NAN])), Some(2.0));
        assert_eq!(default_target(&PriceSeries::default()), None);
    }
}
