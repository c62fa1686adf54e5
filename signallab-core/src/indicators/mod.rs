//! Indicator library: pure functions from a candle prefix to a derived series.
//!
//! Every indicator declares a `lookback`: the first `lookback` output values are
//! warm-up and carry no meaning. Outputs are wrapped in an `IndicatorSeries` whose
//! `value_at` returns `None` inside the warm-up (or for non-finite values), so a
//! caller can never read a silently wrong default.
//!
//! Indicators are computed once per run over the whole series. That is safe to
//! share with evaluators because each value at `t` depends only on bars `0..=t`
//! (see `tests/lookahead_test.rs`).

pub mod atr;
pub mod autocorr;
pub mod bollinger;
pub mod ema;
pub mod hurst;
pub mod obv;
pub mod rsi;
pub mod sma;

pub use atr::Atr;
pub use autocorr::{autocorrelation, log_returns, Autocorrelation};
pub use bollinger::{Bollinger, BollingerBand};
pub use ema::Ema;
pub use hurst::{hurst_exponent, Hurst, HURST_MIN_PRICES};
pub use obv::Obv;
pub use rsi::Rsi;
pub use sma::{PriceSource, Sma};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::Candle;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No output value at bar t may depend on candle data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Unique name including parameters (e.g., "sma_200", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading bars whose output is undefined.
    fn lookback(&self) -> usize;

    /// Compute the indicator over the entire candle slice.
    ///
    /// Returns a vector of the same length as `candles`; the first `lookback()`
    /// entries are `f64::NAN`.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// A computed indicator aligned to a series, with an explicit warm-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSeries {
    name: String,
    lookback: usize,
    values: Vec<f64>,
}

impl IndicatorSeries {
    pub fn new(name: impl Into<String>, lookback: usize, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            lookback,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Raw values including the warm-up prefix.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// True if index `t` is past the warm-up and holds a finite value.
    pub fn is_valid_at(&self, t: usize) -> bool {
        self.value_at(t).is_some()
    }

    /// Value at `t`, or `None` inside the warm-up, past the end, or if non-finite.
    pub fn value_at(&self, t: usize) -> Option<f64> {
        if t < self.lookback {
            return None;
        }
        self.values.get(t).copied().filter(|v| v.is_finite())
    }
}

/// Named indicator series precomputed for one series.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSet {
    series: HashMap<String, IndicatorSeries>,
}

impl IndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute every indicator over `candles`. Indicators sharing a name are
    /// computed once.
    pub fn precompute(candles: &[Candle], indicators: &[Box<dyn Indicator>]) -> Self {
        let mut set = Self::new();
        for indicator in indicators {
            if set.contains(indicator.name()) {
                continue;
            }
            let values = indicator.compute(candles);
            debug_assert_eq!(
                values.len(),
                candles.len(),
                "indicator '{}' produced {} values for {} candles",
                indicator.name(),
                values.len(),
                candles.len()
            );
            set.insert(IndicatorSeries::new(
                indicator.name(),
                indicator.lookback(),
                values,
            ));
        }
        set
    }

    pub fn insert(&mut self, series: IndicatorSeries) {
        self.series.insert(series.name.clone(), series);
    }

    pub fn get(&self, name: &str) -> Option<&IndicatorSeries> {
        self.series.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Longest warm-up across the stored series.
    pub fn max_lookback(&self) -> usize {
        self.series.values().map(|s| s.lookback).max().unwrap_or(0)
    }
}

/// Longest lookback across a set of indicators.
pub fn max_lookback(indicators: &[Box<dyn Indicator>]) -> usize {
    indicators.iter().map(|i| i.lookback()).max().unwrap_or(0)
}

/// Create synthetic candles from close prices for testing.
///
/// open = previous close (or close for the first bar), high/low = max/min(open, close)
/// ± 1.0, volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: base + Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
