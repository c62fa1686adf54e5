//! Bollinger bounce: the low pierces the lower band but the close finishes back inside.

use crate::domain::HistoryView;
use crate::evaluator::SignalEvaluator;
use crate::indicators::{Bollinger, Indicator};

/// # Indicator dependencies
/// - `bb_lower_{period}_{multiplier}`
#[derive(Debug, Clone)]
pub struct BollingerBounce {
    pub period: usize,
    pub multiplier: f64,
    id: String,
    band: Bollinger,
}

impl BollingerBounce {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 2, "period must be >= 2");
        assert!(multiplier > 0.0, "multiplier must be > 0");
        Self {
            period,
            multiplier,
            id: "bollinger_bounce".into(),
            band: Bollinger::lower(period, multiplier),
        }
    }

    pub fn default_params() -> Self {
        Self::new(20, 2.0)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl SignalEvaluator for BollingerBounce {
    fn id(&self) -> &str {
        &self.id
    }

    fn warmup_bars(&self) -> usize {
        self.band.lookback()
    }

    fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![Box::new(self.band.clone())]
    }

    fn fire(&self, view: &HistoryView<'_>) -> bool {
        let Some(lower) = view.indicator(self.band.name()) else {
            return false;
        };
        let bar = view.current();
        bar.low < lower && bar.close > lower
    }
}
