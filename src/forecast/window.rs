// =============================================================================
// Sliding-Window Samples
// =============================================================================
//
// For every i in lookback..len: features = values[i - lookback..i],
// label = values[i].  A series of exactly `lookback` values therefore
// yields zero samples.
// =============================================================================

/// Supervised (X, y) pairs built from one series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowSamples {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
}

impl WindowSamples {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Build every window sample of width `lookback` from `values`.
pub fn build_samples(values: &[f64], lookback: usize) -> WindowSamples {
    if lookback == 0 || values.len() <= lookback {
        return WindowSamples::default();
    }

    let (features, labels): (Vec<Vec<f64>>, Vec<f64>) = (lookback..values.len())
        .map(|i| (values[i - lookback..i].to_vec(), values[i]))
        .unzip();

    WindowSamples { features, labels }
}

/// The last `lookback` values, i.e. the feature vector for the next step.
pub fn trailing_window(values: &[f64], lookback: usize) -> Option<&[f64]> {
    if lookback == 0 || values.len() < lookback {
        return None;
    }
    Some(&values[values.len() - lookback..])
}
