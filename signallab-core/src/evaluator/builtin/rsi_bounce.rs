//! RSI oversold bounce: RSI crosses up through an oversold threshold.

use crate::domain::HistoryView;
use crate::evaluator::{crossed_above, SignalEvaluator};
use crate::indicators::{Indicator, Rsi};

/// # Indicator dependencies
/// - `rsi_{period}`
#[derive(Debug, Clone)]
pub struct RsiOversoldBounce {
    pub period: usize,
    pub threshold: f64,
    id: String,
    rsi_key: String,
}

impl RsiOversoldBounce {
    pub fn new(period: usize, threshold: f64) -> Self {
        assert!(period >= 1, "period must be >= 1");
        assert!(
            (0.0..=100.0).contains(&threshold),
            "threshold must be within [0, 100]"
        );
        Self {
            period,
            threshold,
            id: "rsi_oversold_bounce".into(),
            rsi_key: format!("rsi_{period}"),
        }
    }

    pub fn default_params() -> Self {
        Self::new(14, 30.0)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl SignalEvaluator for RsiOversoldBounce {
    fn id(&self) -> &str {
        &self.id
    }

    fn warmup_bars(&self) -> usize {
        self.period + 1
    }

    fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![Box::new(Rsi::new(self.period))]
    }

    fn fire(&self, view: &HistoryView<'_>) -> bool {
        crossed_above(view, &self.rsi_key, self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::test_support::{fire_bars, series_from_closes};

    #[test]
    fn fires_when_rsi_leaves_oversold() {
        // RSI(3): 0 through bar 5, then 33.3 at bar 6 and 55.6 at bar 7.
        let series = series_from_closes(&[10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 6.0, 7.0]);
        assert_eq!(fire_bars(&RsiOversoldBounce::new(3, 30.0), &series), vec![6]);
    }

    #[test]
    fn no_fire_without_oversold_reading() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i % 2) as f64).collect();
        let series = series_from_closes(&closes);
        assert!(fire_bars(&RsiOversoldBounce::default_params(), &series).is_empty());
    }
}
