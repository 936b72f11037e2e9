// =============================================================================
// Relative Strength Index (RSI)
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1: delta_t = close_t - close_{t-1}
// Step 2: gain = max(delta, 0), loss = max(-delta, 0)
// Step 3: average gain / loss over the trailing `period` deltas:
//            * default: plain rolling mean
//            * `calculate_rsi_wilder`: SMA seed, then Wilder's smoothing
//              avg = (prev_avg * (period - 1) + current) / period
// Step 4: RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Conventions:
//   avg_loss == 0 && avg_gain > 0  => 100 (only gains)
//   avg_loss == 0 && avg_gain == 0 => missing (no movement, RS undefined)
// =============================================================================

use serde::{Deserialize, Serialize};

/// Qualitative RSI reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl std::fmt::Display for RsiZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overbought => write!(f, "OVERBOUGHT"),
            Self::Oversold => write!(f, "OVERSOLD"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Averaging used for RSI gains and losses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RsiSmoothing {
    /// Plain rolling mean over the window.
    #[default]
    Rolling,
    /// Wilder's recursive smoothing.
    Wilder,
}

/// Compute the RSI series using a rolling simple mean of gains and losses.
///
/// The output is aligned with `closes`: index `t` is defined only when the
/// `period` deltas ending at `t` are all finite, so indices `0..period` are
/// always missing.
///
/// # Edge cases
/// - `period == 0` or fewer than 2 closes => all-missing series
/// - A NaN close makes every window touching its deltas missing.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    if period == 0 || closes.len() < 2 {
        return result;
    }

    let deltas = deltas(closes);
    let period_f = period as f64;

    for t in period..closes.len() {
        // deltas[t] holds close_t - close_{t-1}; deltas[0] is undefined.
        let window = &deltas[t + 1 - period..=t];
        if window.iter().any(|d| !d.is_finite()) {
            continue;
        }
        let (sum_gain, sum_loss) = split_gain_loss(window);
        result[t] = rsi_from_averages(sum_gain / period_f, sum_loss / period_f);
    }

    result
}

/// Compute the RSI series with Wilder's smoothing.
///
/// The averages are seeded with the SMA of the first `period` deltas, then
/// smoothed recursively.  Same alignment and missing-value conventions as
/// [`calculate_rsi`]; a non-finite delta yields a missing value and leaves
/// the running averages untouched.
pub fn calculate_rsi_wilder(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    if period == 0 || closes.len() < period + 1 {
        return result;
    }

    let deltas = deltas(closes);
    let seed = &deltas[1..=period];
    if seed.iter().any(|d| !d.is_finite()) {
        return result;
    }

    let period_f = period as f64;
    let (sum_gain, sum_loss) = split_gain_loss(seed);
    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;
    result[period] = rsi_from_averages(avg_gain, avg_loss);

    for t in period + 1..closes.len() {
        let delta = deltas[t];
        if !delta.is_finite() {
            continue;
        }
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;

        result[t] = rsi_from_averages(avg_gain, avg_loss);
    }

    result
}

/// Return the most recent RSI value together with its zone.
///
/// Returns `None` when no RSI value is defined.
pub fn current_rsi(
    closes: &[f64],
    period: usize,
    oversold: f64,
    overbought: f64,
) -> Option<(f64, RsiZone)> {
    let value = super::last_defined(&calculate_rsi(closes, period))?;
    Some((value, classify_rsi(value, oversold, overbought)))
}

/// Map an RSI reading onto its zone (thresholds inclusive).
pub fn classify_rsi(value: f64, oversold: f64, overbought: f64) -> RsiZone {
    if value >= overbought {
        RsiZone::Overbought
    } else if value <= oversold {
        RsiZone::Oversold
    } else {
        RsiZone::Neutral
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Per-step deltas aligned with `closes`; index 0 is NaN.
fn deltas(closes: &[f64]) -> Vec<f64> {
    std::iter::once(f64::NAN)
        .chain(closes.windows(2).map(|w| w[1] - w[0]))
        .collect()
}

fn split_gain_loss(deltas: &[f64]) -> (f64, f64) {
    deltas.iter().fold((0.0_f64, 0.0_f64), |(g, l), &d| {
        (g + d.max(0.0), l + (-d).max(0.0))
    })
}

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        return None; // No movement, RS undefined.
    }

    let rsi = if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    if rsi.is_finite() {
        Some(rsi)
    } else {
        None
    }
}
