//! ATR expansion: an upward close-to-close move of at least `multiplier` times the
//! previous bar's ATR.

use crate::domain::HistoryView;
use crate::evaluator::SignalEvaluator;
use crate::indicators::{Atr, Indicator};

/// # Indicator dependencies
/// - `atr_{period}`
#[derive(Debug, Clone)]
pub struct AtrExpansion {
    pub period: usize,
    pub multiplier: f64,
    id: String,
    atr_key: String,
}

impl AtrExpansion {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "period must be >= 1");
        assert!(multiplier > 0.0, "multiplier must be > 0");
        Self {
            period,
            multiplier,
            id: "atr_expansion".into(),
            atr_key: format!("atr_{period}"),
        }
    }

    pub fn default_params() -> Self {
        Self::new(14, 2.0)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl SignalEvaluator for AtrExpansion {
    fn id(&self) -> &str {
        &self.id
    }

    fn warmup_bars(&self) -> usize {
        self.period + 1
    }

    fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![Box::new(Atr::new(self.period))]
    }

    fn fire(&self, view: &HistoryView<'_>) -> bool {
        let Some(prev_atr) = view.indicator_ago(&self.atr_key, 1) else {
            return false;
        };
        let Some(prev) = view.bars_ago(1) else {
            return false;
        };
        prev_atr > 0.0 && view.current().close - prev.close >= self.multiplier * prev_atr
    }
}
