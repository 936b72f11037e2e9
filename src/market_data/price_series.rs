// =============================================================================
// Price Series: validated, time-ordered OHLC bars
// =============================================================================
//
// A `PriceSeries` is the single input type of the engine.  Construction
// enforces strictly increasing timestamps; open/high/low may be NaN in
// degraded feeds, close is the column every computation reads.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A single time-stamped OHLC observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }

    /// Bar where every price equals `close` (line-chart feeds).
    pub fn from_close(timestamp: i64, close: f64) -> Self {
        Self::new(timestamp, close, close, close, close)
    }

    /// Bar open time as a UTC datetime, if the timestamp is representable.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.timestamp, 0).single()
    }

    pub fn has_close(&self) -> bool {
        self.close.is_finite()
    }
}

/// Reasons a bar sequence cannot become a `PriceSeries`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("timestamps not strictly increasing at index {index} ({previous} -> {current})")]
    Unordered {
        index: usize,
        previous: i64,
        current: i64,
    },
}

/// Ordered sequence of `PriceBar`, strictly increasing by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series, rejecting duplicate or decreasing timestamps.
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(SeriesError::Unordered {
                    index: i + 1,
                    previous: pair[0].timestamp,
                    current: pair[1].timestamp,
                });
            }
        }
        Ok(Self { bars })
    }

    /// Sort by timestamp and keep the last bar seen for each timestamp.
    pub fn from_unsorted(mut bars: Vec<PriceBar>) -> Self {
        // Stable sort keeps arrival order among equal timestamps.
        bars.sort_by_key(|b| b.timestamp);
        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.timestamp == bar.timestamp => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self { bars: deduped }
    }

    /// Close-only series with synthetic timestamps 0, 1, 2, ...
    pub fn from_closes(closes: &[f64]) -> Self {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::from_close(i as i64, c))
            .collect();
        Self { bars }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Close column, NaN entries included so indices stay aligned.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    /// Copy of the series without bars whose close is missing.
    pub fn drop_missing_close(&self) -> Self {
        Self {
            bars: self.bars.iter().copied().filter(PriceBar::has_close).collect(),
        }
    }

    /// Finite closes only, in order.
    pub fn clean_closes(&self) -> Vec<f64> {
        self.bars
            .iter()
            .filter(|b| b.has_close())
            .map(|b| b.close)
            .collect()
    }

    /// Most recent finite close.
    pub fn last_close(&self) -> Option<f64> {
        self.bars.iter().rev().find(|b| b.has_close()).map(|b| b.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_strictly_increasing() {
        let bars = vec![PriceBar::from_close(1, 10.0), PriceBar::from_close(2, 11.0)];
        let series = PriceSeries::new(bars).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.last_close(), Some(11.0));
    }

    #[test]
    fn new_rejects_duplicate_timestamp() {
        let bars = vec![
            PriceBar::from_close(1, 10.0),
            PriceBar::from_close(2, 11.0),
            PriceBar::from_close(2, 12.0),
        ];
        let err = PriceSeries::new(bars).unwrap_err();
        assert_eq!(
            err,
            SeriesError::Unordered {
                index: 2,
                previous: 2,
                current: 2
            }
        );
    }

    #[test]
    fn from_unsorted_sorts_and_keeps_last_duplicate() {
        let bars = vec![
            PriceBar::from_close(3, 30.0),
            PriceBar::from_close(1, 10.0),
            PriceBar::from_close(3, 31.0),
        ];
        let series = PriceSeries::from_unsorted(bars);
        assert_eq!(series.closes(), vec![10.0, 31.0]);
        assert!(PriceSeries::new(series.bars().to_vec()).is_ok());
    }

    #[test]
    fn drop_missing_close_removes_nan_rows() {
        let series = PriceSeries::from_closes(&[1.0, f64::NAN, 3.0]);
        let clean = series.drop_missing_close();
        assert_eq!(clean.len(), 2);
        assert_eq!(clean.closes(), vec![1.0, 3.0]);
        assert_eq!(series.clean_closes(), vec![1.0, 3.0]);
    }

    #[test]
    fn last_close_skips_trailing_nan() {
        let series = PriceSeries::from_closes(&[1.0, 2.0, f64::NAN]);
        assert_eq!(series.last_close(), Some(2.0));
        assert_eq!(PriceSeries::default().last_close(), None);
    }

    #[test]
    fn bar_time_converts_unix_seconds() {
        let bar = PriceBar::from_close(1_700_000_000, 1.0);
        assert_eq!(bar.time().unwrap().timestamp(), 1_700_000_000);
    }
}
