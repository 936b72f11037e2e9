// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   line      = EMA(close, fast) - EMA(close, slow)
//   signal    = EMA(line, signal_span)
//   histogram = line - signal
//
// `fast < slow` is expected but not enforced: with the spans swapped the
// line simply changes sign, and callers get a meaningless (not failing)
// result.

use serde::Serialize;

use super::ema::{calculate_ema, ema_of};

/// MACD output, every series aligned with the input closes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

impl MacdSeries {
    /// Last index where both line and signal are defined.
    pub fn last(&self) -> Option<(f64, f64)> {
        self.line
            .iter()
            .zip(self.signal.iter())
            .rev()
            .find_map(|(l, s)| Some(((*l)?, (*s)?)))
    }
}

/// Compute MACD line, signal line and histogram.
pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_span: usize,
) -> MacdSeries {
    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);

    let line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal = ema_of(&line, signal_span);

    let histogram = line
        .iter()
        .zip(signal.iter())
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();

    MacdSeries {
        line,
        signal,
        histogram,
    }
}
