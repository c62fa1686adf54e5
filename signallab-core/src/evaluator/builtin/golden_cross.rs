//! Golden cross: fast SMA crosses above slow SMA.

use crate::domain::HistoryView;
use crate::evaluator::SignalEvaluator;
use crate::indicators::{Indicator, Sma};

/// # Indicator dependencies
/// - Fast: `sma_{fast_period}` (e.g., `sma_50`)
/// - Slow: `sma_{slow_period}` (e.g., `sma_200`)
#[derive(Debug, Clone)]
pub struct GoldenCross {
    pub fast_period: usize,
    pub slow_period: usize,
    id: String,
    fast_key: String,
    slow_key: String,
}

impl GoldenCross {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        assert!(fast_period >= 1, "fast_period must be >= 1");
        assert!(
            slow_period > fast_period,
            "slow_period must be > fast_period"
        );
        Self {
            fast_period,
            slow_period,
            id: "golden_cross".into(),
            fast_key: format!("sma_{fast_period}"),
            slow_key: format!("sma_{slow_period}"),
        }
    }

    pub fn default_params() -> Self {
        Self::new(50, 200)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl SignalEvaluator for GoldenCross {
    fn id(&self) -> &str {
        &self.id
    }

    fn warmup_bars(&self) -> usize {
        self.slow_period
    }

    fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Sma::new(self.fast_period)),
            Box::new(Sma::new(self.slow_period)),
        ]
    }

    fn fire(&self, view: &HistoryView<'_>) -> bool {
        let values = (
            view.indicator(&self.fast_key),
            view.indicator(&self.slow_key),
            view.indicator_ago(&self.fast_key, 1),
            view.indicator_ago(&self.slow_key, 1),
        );
        let (Some(fast_cur), Some(slow_cur), Some(fast_prev), Some(slow_prev)) = values else {
            return false;
        };
        fast_cur > slow_cur && fast_prev <= slow_prev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::test_support::{fire_bars, series_from_closes};

    #[test]
    fn fires_on_cross_bar_only() {
        // fast(2) - slow(4): bar 5 = -0.5, bar 6 = +0.75, bar 7 = +2.0
        let series = series_from_closes(&[10.0, 9.0, 8.0, 7.0, 6.0, 7.0, 9.0, 12.0, 15.0]);
        assert_eq!(fire_bars(&GoldenCross::new(2, 4), &series), vec![6]);
    }

    #[test]
    fn no_fire_in_steady_uptrend() {
        // fast is above slow from the first defined bar; there is no cross.
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let series = series_from_closes(&closes);
        assert!(fire_bars(&GoldenCross::new(2, 4), &series).is_empty());
    }

    #[test]
    #[should_panic(expected = "slow_period must be > fast_period")]
    fn rejects_inverted_periods() {
        GoldenCross::new(50, 20);
    }
}
