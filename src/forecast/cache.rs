// =============================================================================
// Forecast Model Cache
// =============================================================================
//
// One trained `ForecastModel` per symbol.  An entry answers a lookup only
// when both hold:
//
//   - the series hashes to the same `SeriesFingerprint` (every bar with a
//     close contributes its timestamp and close bits)
//   - the `ForecastParams` equal the ones the model was trained with
//
// Anything else retrains from scratch, so a scaler is never reused on data
// it was not fitted on.
// =============================================================================

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::config::ForecastParams;
use crate::error::Result;
use crate::forecast::model::ForecastModel;
use crate::market_data::PriceSeries;

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// Identity of the closes a model was trained on.  Revising any bar,
/// including interior ones, changes the fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeriesFingerprint {
    bars: usize,
    first_timestamp: Option<i64>,
    last_timestamp: Option<i64>,
    closes_digest: u64,
}

impl SeriesFingerprint {
    pub fn of(series: &PriceSeries) -> Self {
        let bars = series.bars();
        let mut hasher = DefaultHasher::new();
        for bar in bars.iter().filter(|b| b.has_close()) {
            bar.timestamp.hash(&mut hasher);
            bar.close.to_bits().hash(&mut hasher);
        }
        Self {
            bars: bars.len(),
            first_timestamp: bars.first().map(|b| b.timestamp),
            last_timestamp: bars.last().map(|b| b.timestamp),
            closes_digest: hasher.finish(),
        }
    }
}

struct CachedModel {
    fingerprint: SeriesFingerprint,
    params: ForecastParams,
    model: Arc<ForecastModel>,
}

// ---------------------------------------------------------------------------
// ModelCache -- one independent model per symbol
// ---------------------------------------------------------------------------

/// Thread-safe map from symbol to its trained `ForecastModel`.
///
/// A model is reused only while the series and parameters it was trained
/// with are unchanged; anything else for the same symbol triggers a full
/// retrain.
#[derive(Default)]
pub struct ModelCache {
    models: RwLock<HashMap<String, CachedModel>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached model for `symbol` if it was trained on `series`
    /// with `params`, otherwise train a fresh one and cache it.
    ///
    /// A failed training evicts any stale entry for the symbol.
    pub fn get_or_train(
        &self,
        symbol: &str,
        series: &PriceSeries,
        params: &ForecastParams,
    ) -> Result<Arc<ForecastModel>> {
        let fingerprint = SeriesFingerprint::of(series);

        if let Some(cached) = self.models.read().get(symbol) {
            if cached.fingerprint == fingerprint && cached.params == *params {
                debug!(symbol, "forecast model cache hit");
                return Ok(cached.model.clone());
            }
        }

        let mut model = ForecastModel::new(params.clone());
        if let Err(e) = model.train(series) {
            self.invalidate(symbol);
            return Err(e);
        }

        let model = Arc::new(model);
        self.models.write().insert(
            symbol.to_string(),
            CachedModel {
                fingerprint,
                params: params.clone(),
                model: model.clone(),
            },
        );
        info!(symbol, bars = series.len(), "forecast model cached");
        Ok(model)
    }

    /// Cached model for `symbol`, regardless of which data it was trained on.
    pub fn get(&self, symbol: &str) -> Option<Arc<ForecastModel>> {
        self.models.read().get(symbol).map(|c| c.model.clone())
    }

    /// Drop the model for `symbol`.  Returns whether one was cached.
    pub fn invalidate(&self, symbol: &str) -> bool {
        let removed = self.models.write().remove(symbol).is_some();
        if removed {
            debug!(symbol, "forecast model invalidated");
        }
        removed
    }

    pub fn clear(&self) {
        self.models.write().clear();
    }

    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }

    /// Symbols with a cached model, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.models.read().keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::RegressorKind;

    fn params() -> ForecastParams {
        ForecastParams {
            lookback: 5,
            regressor: RegressorKind::Linear,
            ..ForecastParams::default()
        }
    }

    fn series(n: usize, offset: f64) -> PriceSeries {
        let closes: Vec<f64> = (0..n).map(|i| offset + i as f64).collect();
        PriceSeries::from_closes(&closes)
    }

    #[test]
    fn same_data_reuses_model() {
        let cache = ModelCache::new();
        let data = series(20, 100.0);
        let a = cache.get_or_train("BTC-USD", &data, &params()).unwrap();
        let b = cache.get_or_train("BTC-USD", &data, &params()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn new_data_retrains() {
        let cache = ModelCache::new();
        let a = cache.get_or_train("BTC-USD", &series(20, 100.0), &params()).unwrap();
        let b = cache.get_or_train("BTC-USD", &series(21, 100.0), &params()).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(b.summary().unwrap().samples, 16);
    }

    #[test]
    fn symbols_own_independent_models() {
        let cache = ModelCache::new();
        let a = cache.get_or_train("ETH-USD", &series(20, 10.0), &params()).unwrap();
        let b = cache.get_or_train("^GDAXI", &series(20, 10.0), &params()).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.symbols(), vec!["ETH-USD".to_string(), "^GDAXI".to_string()]);
    }

    #[test]
    fn failed_training_evicts_stale_model() {
        let cache = ModelCache::new();
        cache.get_or_train("SOL-USD", &series(20, 1.0), &params()).unwrap();
        let err = cache.get_or_train("SOL-USD", &series(3, 1.0), &params()).unwrap_err();
        assert!(err.is_insufficient_history());
        assert!(cache.get("SOL-USD").is_none());
    }

    #[test]
    fn invalidate_and_clear() {
        let cache = ModelCache::new();
        cache.get_or_train("A", &series(20, 1.0), &params()).unwrap();
        cache.get_or_train("B", &series(20, 1.0), &params()).unwrap();
        assert!(cache.invalidate("A"));
        assert!(!cache.invalidate("A"));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn changed_params_retrain() {
        let cache = ModelCache::new();
        let data = series(40, 100.0);
        let a = cache.get_or_train("A", &data, &params()).unwrap();
        assert_eq!(a.lookback(), 5);

        let wider = ForecastParams {
            lookback: 10,
            ..params()
        };
        let b = cache.get_or_train("A", &data, &wider).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(b.lookback(), 10);

        let forest = ForecastParams {
            regressor: RegressorKind::RandomForest,
            n_trees: 5,
            ..wider.clone()
        };
        let c = cache.get_or_train("A", &data, &forest).unwrap();
        assert_eq!(c.summary().unwrap().regressor, RegressorKind::RandomForest);
    }

    #[test]
    fn revised_interior_bar_retrains() {
        let cache = ModelCache::new();
        let mut closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let a = cache
            .get_or_train("A", &PriceSeries::from_closes(&closes), &params())
            .unwrap();
        assert_eq!(a.summary().unwrap().scaler_max, 139.0);

        closes[10] = 5000.0;
        let b = cache
            .get_or_train("A", &PriceSeries::from_closes(&closes), &params())
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(b.summary().unwrap().scaler_max, 5000.0);
    }

    #[test]
    fn fingerprint_tracks_every_close() {
        let mut closes = vec![1.0, 2.0, 3.0, 4.0];
        let before = SeriesFingerprint::of(&PriceSeries::from_closes(&closes));
        closes[1] = 2.5;
        assert_ne!(before, SeriesFingerprint::of(&PriceSeries::from_closes(&closes)));
    }

    #[test]
    fn fingerprint_tracks_last_bar() {
        let a = SeriesFingerprint::of(&PriceSeries::from_closes(&[1.0, 2.0]));
        let b = SeriesFingerprint::of(&PriceSeries::from_closes(&[1.0, 2.5]));
        assert_ne!(a, b);
        assert_eq!(a, SeriesFingerprint::of(&PriceSeries::from_closes(&[1.0, 2.0])));
    }
}
