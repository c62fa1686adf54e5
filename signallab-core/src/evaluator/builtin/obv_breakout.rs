//! OBV breakout: On-Balance Volume exceeds its highest value over the prior N bars.

use crate::domain::HistoryView;
use crate::evaluator::SignalEvaluator;
use crate::indicators::{Indicator, Obv};

/// # Indicator dependencies
/// - `obv`
#[derive(Debug, Clone)]
pub struct ObvBreakout {
    pub lookback: usize,
    id: String,
}

impl ObvBreakout {
    pub fn new(lookback: usize) -> Self {
        assert!(lookback >= 1, "lookback must be >= 1");
        Self {
            lookback,
            id: "obv_breakout".into(),
        }
    }

    pub fn default_params() -> Self {
        Self::new(20)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl SignalEvaluator for ObvBreakout {
    fn id(&self) -> &str {
        &self.id
    }

    fn warmup_bars(&self) -> usize {
        self.lookback
    }

    fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![Box::new(Obv::new())]
    }

    fn fire(&self, view: &HistoryView<'_>) -> bool {
        let Some(window) = view.indicator_window("obv", self.lookback + 1) else {
            return false;
        };
        let (current, prior) = match window.split_last() {
            Some((current, prior)) => (*current, prior),
            None => return false,
        };
        let prior_high = prior.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        current > prior_high
    }
}
