//! Hurst trend: the rolling Hurst exponent crosses above a persistence threshold.

use crate::domain::HistoryView;
use crate::evaluator::{crossed_above, SignalEvaluator};
use crate::indicators::{Hurst, Indicator, HURST_MIN_PRICES};

/// # Indicator dependencies
/// - `hurst_{window}`
#[derive(Debug, Clone)]
pub struct HurstTrend {
    pub window: usize,
    pub threshold: f64,
    id: String,
    hurst_key: String,
}

impl HurstTrend {
    pub fn new(window: usize, threshold: f64) -> Self {
        assert!(
            window >= HURST_MIN_PRICES,
            "window must be >= {HURST_MIN_PRICES}"
        );
        assert!(
            threshold > 0.0 && threshold < 1.0,
            "threshold must be within (0, 1)"
        );
        Self {
            window,
            threshold,
            id: "hurst_trend".into(),
            hurst_key: format!("hurst_{window}"),
        }
    }

    pub fn default_params() -> Self {
        Self::new(100, 0.55)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl SignalEvaluator for HurstTrend {
    fn id(&self) -> &str {
        &self.id
    }

    fn warmup_bars(&self) -> usize {
        self.window
    }

    fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![Box::new(Hurst::new(self.window))]
    }

    fn fire(&self, view: &HistoryView<'_>) -> bool {
        crossed_above(view, &self.hurst_key, self.threshold)
    }
}
