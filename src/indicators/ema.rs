// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   alpha   = 2 / (span + 1)
//   EMA_0   = close_0
//   EMA_t   = alpha * close_t + (1 - alpha) * EMA_{t-1}
//
// The recurrence is seeded with the first observation (no SMA warm-up), so
// the output is aligned index-for-index with the input.  Values before
// `span` observations are defined but carry little information.
// =============================================================================

/// Compute the EMA series for `closes` with smoothing span `span`.
///
/// The result has the same length as the input.
///
/// # Edge cases
/// - `span == 0` => all-missing series
/// - Non-finite closes produce a missing value at that index; the
///   recurrence continues from the last defined EMA.
/// - Leading non-finite closes delay the seed to the first finite close.
pub fn calculate_ema(closes: &[f64], span: usize) -> Vec<Option<f64>> {
    let values: Vec<Option<f64>> = closes
        .iter()
        .map(|&c| if c.is_finite() { Some(c) } else { None })
        .collect();
    ema_of(&values, span)
}

/// EMA over a series that may already contain missing values (e.g. the
/// MACD line, which is itself derived from two EMAs).
pub fn ema_of(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    if span == 0 {
        return vec![None; values.len()];
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev: Option<f64> = None;

    values
        .iter()
        .map(|value| {
            let x = (*value).filter(|x| x.is_finite())?;
            let ema = match prev {
                Some(p) => alpha * x + (1.0 - alpha) * p,
                None => x,
            };
            prev = Some(ema);
            Some(ema)
        })
        .collect()
}

/// Most recent EMA value, if any close was usable.
pub fn last_ema(closes: &[f64], span: usize) -> Option<f64> {
    super::last_defined(&calculate_ema(closes, span))
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: build a simple ascending price series.
    fn ascending(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema(&[], 5).is_empty());
    }

    #[test]
    fn ema_span_zero_is_all_missing() {
        let ema = calculate_ema(&[1.0, 2.0, 3.0], 0);
        assert_eq!(ema, vec![None, None, None]);
    }

    #[test]
    fn ema_golden_values_span_3() {
        // alpha = 0.5
        let closes = [100.0, 102.0, 101.0, 105.0, 103.0, 108.0, 107.0, 110.0];
        let expected = [100.0, 101.0, 101.0, 103.0, 103.0, 105.5, 106.25, 108.125];
        let ema = calculate_ema(&closes, 3);
        assert_eq!(ema.len(), closes.len());
        for (got, want) in ema.iter().zip(expected.iter()) {
            let got = got.expect("every index is defined");
            assert!((got - want).abs() < 1e-10, "got {got}, expected {want}");
        }
    }

    #[test]
    fn ema_span_one_is_raw_series() {
        let closes = ascending(10);
        let ema = calculate_ema(&closes, 1);
        for (got, want) in ema.iter().zip(closes.iter()) {
            assert!((got.unwrap() - want).abs() < 1e-12);
        }
    }

    #[test]
    fn ema_constant_series_is_constant() {
        let closes = vec![42.0; 50];
        for span in [2, 9, 26, 200] {
            for v in calculate_ema(&closes, span) {
                assert!((v.unwrap() - 42.0).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn ema_nan_is_missing_and_recurrence_continues() {
        let closes = [1.0, f64::NAN, 3.0];
        let ema = calculate_ema(&closes, 3);
        assert_eq!(ema[0], Some(1.0));
        assert_eq!(ema[1], None);
        // 0.5 * 3 + 0.5 * 1
        assert!((ema[2].unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn ema_leading_nan_delays_seed() {
        let ema = calculate_ema(&[f64::NAN, f64::NAN, 5.0, 7.0], 3);
        assert_eq!(ema[..2], [None, None]);
        assert_eq!(ema[2], Some(5.0));
        assert_eq!(ema[3], Some(6.0));
    }

    #[test]
    fn ema_lags_rising_series() {
        let closes = ascending(100);
        let last = last_ema(&closes, 20).unwrap();
        assert!(last < 100.0);
        assert!(last > 80.0);
    }
}
