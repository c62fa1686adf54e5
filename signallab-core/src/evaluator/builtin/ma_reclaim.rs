//! Moving-average reclaim: close crosses back above the N-bar SMA.
//!
//! The classic "200MA Reclaim": the previous close sat at or below its SMA and the
//! current close is above it.

use crate::domain::HistoryView;
use crate::evaluator::SignalEvaluator;
use crate::indicators::{Indicator, Sma};

/// # Indicator dependencies
/// - `sma_{period}`
#[derive(Debug, Clone)]
pub struct MaReclaim {
    pub period: usize,
    id: String,
    sma_key: String,
}

impl MaReclaim {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "period must be >= 1");
        Self {
            period,
            id: "ma_reclaim".into(),
            sma_key: format!("sma_{period}"),
        }
    }

    pub fn default_params() -> Self {
        Self::new(200)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl SignalEvaluator for MaReclaim {
    fn id(&self) -> &str {
        &self.id
    }

    fn warmup_bars(&self) -> usize {
        // The previous bar's SMA must be defined.
        self.period
    }

    fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![Box::new(Sma::new(self.period))]
    }

    fn fire(&self, view: &HistoryView<'_>) -> bool {
        let (Some(sma_cur), Some(sma_prev)) = (
            view.indicator(&self.sma_key),
            view.indicator_ago(&self.sma_key, 1),
        ) else {
            return false;
        };
        let Some(prev) = view.bars_ago(1) else {
            return false;
        };
        prev.close <= sma_prev && view.current().close > sma_cur
    }
}
