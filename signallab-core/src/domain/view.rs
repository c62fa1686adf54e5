//! Bounded history view handed to signal evaluators.
//!
//! A `HistoryView` for bar `t` owns a slice of exactly `t + 1` candles and an
//! indicator accessor that clamps every lookup to `<= t`. Evaluators cannot reach
//! data past `t` through it: the no-look-ahead rule is enforced by the type, not
//! by each evaluator being careful.

use super::candle::Candle;
use crate::indicators::IndicatorSet;

#[derive(Debug, Clone, Copy)]
pub struct HistoryView<'a> {
    candles: &'a [Candle],
    indicators: &'a IndicatorSet,
}

impl<'a> HistoryView<'a> {
    /// `candles` must be the prefix `0..=t` of a series and be non-empty.
    pub(crate) fn new(candles: &'a [Candle], indicators: &'a IndicatorSet) -> Self {
        debug_assert!(!candles.is_empty(), "history view needs at least one bar");
        Self {
            candles,
            indicators,
        }
    }

    /// Index of the current bar.
    pub fn t(&self) -> usize {
        self.candles.len() - 1
    }

    /// The current bar.
    pub fn current(&self) -> &'a Candle {
        &self.candles[self.candles.len() - 1]
    }

    /// The bar `k` bars before the current one (`k = 0` is the current bar).
    pub fn bars_ago(&self, k: usize) -> Option<&'a Candle> {
        self.t().checked_sub(k).map(|i| &self.candles[i])
    }

    /// All visible candles, `0..=t`.
    pub fn candles(&self) -> &'a [Candle] {
        self.candles
    }

    /// The last `len` visible candles, ending at the current bar.
    pub fn window(&self, len: usize) -> Option<&'a [Candle]> {
        let n = self.candles.len();
        (len <= n).then(|| &self.candles[n - len..])
    }

    /// Valid indicator value at the current bar.
    pub fn indicator(&self, name: &str) -> Option<f64> {
        self.indicator_ago(name, 0)
    }

    /// Valid indicator value `k` bars before the current one.
    ///
    /// `None` when the indicator is unknown, still warming up, or non-finite.
    pub fn indicator_ago(&self, name: &str, k: usize) -> Option<f64> {
        let index = self.t().checked_sub(k)?;
        self.indicators.get(name)?.value_at(index)
    }

    /// Trailing indicator window of `len` values ending at the current bar.
    ///
    /// Returns `None` unless every value in the window is past warm-up and finite.
    pub fn indicator_window(&self, name: &str, len: usize) -> Option<&'a [f64]> {
        let series = self.indicators.get(name)?;
        let end = self.t() + 1;
        let start = end.checked_sub(len)?;
        if start < series.lookback() {
            return None;
        }
        let window = series.values().get(start..end)?;
        window.iter().all(|v| v.is_finite()).then_some(window)
    }
}
