//! Series store: an immutable, time-ordered candle sequence for one instrument.
//!
//! Construction is the only place ordering is established: candles are sorted by
//! timestamp, unusable candles are dropped, and duplicate timestamps collapse to
//! the last one supplied. After that, bar index order equals timestamp order and
//! nothing mutates the candles again.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use super::candle::Candle;
use super::view::HistoryView;
use crate::indicators::IndicatorSet;

/// Errors from building a series.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeriesError {
    #[error("series '{symbol}' has no usable candles")]
    Empty { symbol: String },
}

/// Ordered candles for one instrument, addressable by bar index `0..len`.
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    symbol: String,
    candles: Vec<Candle>,
}

impl Series {
    /// Build a series from candles in any order.
    ///
    /// Duplicate timestamps keep the candle that appeared last in `candles`.
    pub fn new(symbol: impl Into<String>, candles: Vec<Candle>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        let supplied = candles.len();

        let mut usable: Vec<Candle> = candles.into_iter().filter(Candle::is_usable).collect();
        let dropped = supplied - usable.len();
        if dropped > 0 {
            warn!(symbol = %symbol, dropped, "dropped unusable candles");
        }

        // Stable sort keeps input order among equal timestamps, so the last
        // supplied duplicate is the last one seen below.
        usable.sort_by_key(|c| c.timestamp);

        let mut deduped: Vec<Candle> = Vec::with_capacity(usable.len());
        let mut duplicates = 0usize;
        for candle in usable {
            match deduped.last_mut() {
                Some(last) if last.timestamp == candle.timestamp => {
                    *last = candle;
                    duplicates += 1;
                }
                _ => deduped.push(candle),
            }
        }
        if duplicates > 0 {
            warn!(symbol = %symbol, duplicates, "collapsed duplicate timestamps");
        }

        if deduped.is_empty() {
            return Err(SeriesError::Empty { symbol });
        }

        Ok(Self {
            symbol,
            candles: deduped,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    /// Close prices in bar order.
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// Bounded view of bars `0..=t`. Returns `None` if `t` is past the end.
    pub fn view<'a>(&'a self, t: usize, indicators: &'a IndicatorSet) -> Option<HistoryView<'a>> {
        if t >= self.candles.len() {
            return None;
        }
        Some(HistoryView::new(&self.candles[..=t], indicators))
    }

    /// First bar whose date is on or after `date`.
    pub fn index_on_or_after(&self, date: NaiveDate) -> Option<usize> {
        let idx = self.candles.partition_point(|c| c.date() < date);
        (idx < self.candles.len()).then_some(idx)
    }

    /// Last bar whose date is on or before `date`.
    pub fn index_on_or_before(&self, date: NaiveDate) -> Option<usize> {
        let idx = self.candles.partition_point(|c| c.date() <= date);
        idx.checked_sub(1)
    }

    /// Content hash of the candle data, stable across runs.
    pub fn dataset_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.symbol.as_bytes());
        for c in &self.candles {
            hasher.update(&c.timestamp.timestamp().to_le_bytes());
            for v in [c.open, c.high, c.low, c.close, c.volume] {
                hasher.update(&v.to_le_bytes());
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn candle(day: i64, close: f64) -> Candle {
        Candle {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn sorts_by_timestamp() {
        let series = Series::new("BTC", vec![candle(2, 3.0), candle(0, 1.0), candle(1, 2.0)])
            .unwrap();
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn duplicate_timestamp_last_write_wins() {
        let series = Series::new(
            "BTC",
            vec![candle(0, 1.0), candle(1, 2.0), candle(1, 20.0), candle(2, 3.0)],
        )
        .unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![1.0, 20.0, 3.0]);
    }

    #[test]
    fn unusable_candles_are_dropped() {
        let mut bad = candle(1, 2.0);
        bad.high = f64::NAN;
        let series = Series::new("BTC", vec![candle(0, 1.0), bad, candle(2, 3.0)]).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn empty_series_is_rejected() {
        let err = Series::new("BTC", vec![]).unwrap_err();
        assert_eq!(
            err,
            SeriesError::Empty {
                symbol: "BTC".into()
            }
        );
    }

    #[test]
    fn date_lookups() {
        let series = Series::new("BTC", (0..10).map(|d| candle(d * 2, 1.0)).collect()).unwrap();
        let jan3 = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
        // Bars sit on even days: Jan 1, 3, 5, ...
        assert_eq!(series.index_on_or_after(jan3), Some(2));
        assert_eq!(series.index_on_or_before(jan3), Some(1));
        let before = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        assert_eq!(series.index_on_or_before(before), None);
        let after = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(series.index_on_or_after(after), None);
    }

    #[test]
    fn view_past_end_is_none() {
        let series = Series::new("BTC", vec![candle(0, 1.0)]).unwrap();
        let indicators = IndicatorSet::new();
        assert!(series.view(0, &indicators).is_some());
        assert!(series.view(1, &indicators).is_none());
    }

    #[test]
    fn dataset_hash_is_deterministic() {
        let a = Series::new("BTC", vec![candle(0, 1.0), candle(1, 2.0)]).unwrap();
        let b = Series::new("BTC", vec![candle(1, 2.0), candle(0, 1.0)]).unwrap();
        let c = Series::new("BTC", vec![candle(0, 1.0), candle(1, 2.5)]).unwrap();
        assert_eq!(a.dataset_hash(), b.dataset_hash());
        assert_ne!(a.dataset_hash(), c.dataset_hash());
    }
}
