//! Volume surge: volume at least `multiplier` times its prior average on an up bar.
//!
//! The baseline is the volume SMA as of the previous bar, so the surge bar does
//! not dilute its own reference.

use crate::domain::HistoryView;
use crate::evaluator::SignalEvaluator;
use crate::indicators::{Indicator, PriceSource, Sma};

/// # Indicator dependencies
/// - `volume_sma_{period}`
#[derive(Debug, Clone)]
pub struct VolumeSurge {
    pub period: usize,
    pub multiplier: f64,
    id: String,
    volume_key: String,
}

impl VolumeSurge {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "period must be >= 1");
        assert!(multiplier > 0.0, "multiplier must be > 0");
        Self {
            period,
            multiplier,
            id: "volume_surge".into(),
            volume_key: format!("volume_sma_{period}"),
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

impl SignalEvaluator for VolumeSurge {
    fn id(&self) -> &str {
        &self.id
    }

    fn warmup_bars(&self) -> usize {
        self.period
    }

    fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![Box::new(Sma::of(self.period, PriceSource::Volume))]
    }

    fn fire(&self, view: &HistoryView<'_>) -> bool {
        let Some(baseline) = view.indicator_ago(&self.volume_key, 1) else {
            return false;
        };
        let Some(prev) = view.bars_ago(1) else {
            return false;
        };
        let bar = view.current();
        baseline > 0.0 && bar.close > prev.close && bar.volume >= self.multiplier * baseline
    }
}
