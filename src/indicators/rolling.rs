// =============================================================================
// Rolling Extrema
// =============================================================================
//
// Trailing-window minimum / maximum, aligned with the input.  Index `t` is
// defined when the `window` values ending at `t` are all finite.

/// Rolling minimum over the trailing `window` values.
pub fn rolling_min(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling_fold(values, window, f64::min)
}

/// Rolling maximum over the trailing `window` values.
pub fn rolling_max(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling_fold(values, window, f64::max)
}

fn rolling_fold(values: &[f64], window: usize, pick: fn(f64, f64) -> f64) -> Vec<Option<f64>> {
    if window == 0 || values.len() < window {
        return vec![None; values.len()];
    }

    let mut result = vec![None; window - 1];
    result.extend(values.windows(window).map(|w| {
        if w.iter().all(|v| v.is_finite()) {
            w.iter().copied().reduce(pick)
        } else {
            None
        }
    }));
    result
}
