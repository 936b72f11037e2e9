// =============================================================================
// Buy / Sell / Hold Recommendation
// =============================================================================
//
// Decision rule on the latest defined readings:
//
//   BUY   RSI < oversold   AND MACD line > signal line
//   SELL  RSI > overbought AND MACD line < signal line
//   HOLD  otherwise
//
// A coarse dashboard hint, not a trading strategy.

use serde::Serialize;

use crate::config::IndicatorParams;
use crate::indicators::IndicatorSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}

/// Apply the decision rule; `None` when any reading is missing.
pub fn recommend(
    rsi: Option<f64>,
    macd_line: Option<f64>,
    macd_signal: Option<f64>,
    params: &IndicatorParams,
) -> Option<Recommendation> {
    Some(decide(rsi?, macd_line?, macd_signal?, params))
}

fn decide(rsi: f64, macd_line: f64, macd_signal: f64, params: &IndicatorParams) -> Recommendation {
    if rsi < params.oversold && macd_line > macd_signal {
        Recommendation::Buy
    } else if rsi > params.overbought && macd_line < macd_signal {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    }
}

/// Recommendation from the latest values of an indicator set; `None` when
/// RSI or MACD has no defined value yet.
pub fn recommend_from_set(set: &IndicatorSet, params: &IndicatorParams) -> Option<Recommendation> {
    let (line, signal) = set.macd.last().unzip();
    recommend(set.last_rsi(), line, signal, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::compute_indicator_set;
    use crate::market_data::PriceSeries;

    #[test]
    fn recommend_rules() {
        let p = IndicatorParams::default();
        assert_eq!(decide(25.0, 1.0, 0.5, &p), Recommendation::Buy);
        assert_eq!(decide(25.0, 0.5, 1.0, &p), Recommendation::Hold);
        assert_eq!(decide(75.0, 0.5, 1.0, &p), Recommendation::Sell);
        assert_eq!(decide(75.0, 1.0, 0.5, &p), Recommendation::Hold);
        assert_eq!(decide(50.0, 1.0, 0.5, &p), Recommendation::Hold);
        // Thresholds are strict.
        assert_eq!(decide(30.0, 1.0, 0.5, &p), Recommendation::Hold);
        assert_eq!(decide(70.0, 0.5, 1.0, &p), Recommendation::Hold);
    }

    #[test]
    fn recommend_missing_input_is_none() {
        let p = IndicatorParams::default();
        assert_eq!(recommend(None, Some(1.0), Some(0.5), &p), None);
        assert_eq!(recommend(Some(25.0), None, Some(0.5), &p), None);
        assert_eq!(recommend(Some(25.0), Some(1.0), None, &p), None);
        assert_eq!(
            recommend(Some(25.0), Some(1.0), Some(0.5), &p),
            Some(Recommendation::Buy)
        );
    }

    #[test]
    fn thresholds_come_from_params() {
        let p = IndicatorParams {
            oversold: 40.0,
            ..IndicatorParams::default()
        };
        assert_eq!(decide(35.0, 1.0, 0.5, &p), Recommendation::Buy);
    }

    #[test]
    fn recommend_from_set_needs_defined_values() {
        let p = IndicatorParams::default();
        let flat = compute_indicator_set(&PriceSeries::from_closes(&[10.0; 40]), &p);
        // Flat series: RSI undefined.
        assert!(recommend_from_set(&flat, &p).is_none());

        let short = compute_indicator_set(&PriceSeries::from_closes(&[1.0, 2.0]), &p);
        assert!(recommend_from_set(&short, &p).is_none());
    }

    #[test]
    fn recommend_from_set_after_sharp_drop_and_bounce() {
        let p = IndicatorParams::default();
        // Long decline then a small bounce: RSI still low, MACD turning up.
        let mut closes: Vec<f64> = (0..60).map(|i| 200.0 - i as f64 * 2.0).collect();
        closes.extend([82.0, 84.0, 86.0]);
        let set = compute_indicator_set(&PriceSeries::from_closes(&closes), &p);
        let rsi = set.last_rsi().unwrap();
        let (line, signal) = set.macd.last().unwrap();
        assert_eq!(recommend_from_set(&set, &p), Some(decide(rsi, line, signal, &p)));
        assert_eq!(Recommendation::Buy.to_string(), "BUY");
    }
}
