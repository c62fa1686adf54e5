//! Signal evaluators: named predicates that decide whether a condition fires at a bar.
//!
//! Evaluators are stateless: they receive a `HistoryView` of bars `0..=t` and the
//! indicators they declared, and answer yes or no. Debounce, combos and outcome
//! measurement belong to the walk-forward runner, never to an evaluator.

pub mod builtin;
pub mod factory;
pub mod registry;

pub use builtin::{
    AtrExpansion, BollingerBounce, GoldenCross, HurstTrend, MaReclaim, ObvBreakout,
    RsiOversoldBounce, VolumeSurge,
};
pub use factory::{create_evaluator, EvaluatorSpec, FactoryError, EVALUATOR_TYPES};
pub use registry::{EvaluatorRegistry, RegistryError};

use crate::domain::HistoryView;
use crate::indicators::Indicator;

/// Trait for signal evaluators.
///
/// # Look-ahead guard
/// `fire` receives only a `HistoryView`, which physically cannot reach bars
/// after `t`. Implementations must be deterministic in the view they are given.
pub trait SignalEvaluator: Send + Sync {
    /// Registry key (e.g., "ma_reclaim_200"). Must be unique within a registry.
    fn id(&self) -> &str;

    /// First bar index at which `fire` can return a meaningful answer.
    fn warmup_bars(&self) -> usize;

    /// Indicators this evaluator reads. The runner precomputes them once per series.
    fn required_indicators(&self) -> Vec<Box<dyn Indicator>>;

    /// Does the condition hold at the current bar of `view`?
    ///
    /// Returns false when any input is undefined (warm-up, missing indicator).
    fn fire(&self, view: &HistoryView<'_>) -> bool;
}

type Predicate = dyn Fn(&HistoryView<'_>) -> bool + Send + Sync;
type IndicatorMaker = dyn Fn() -> Box<dyn Indicator> + Send + Sync;

/// Adapter that turns a closure over the bounded view into an evaluator.
pub struct FnEvaluator {
    id: String,
    warmup: usize,
    indicators: Vec<Box<IndicatorMaker>>,
    predicate: Box<Predicate>,
}

impl FnEvaluator {
    pub fn new<F>(id: impl Into<String>, warmup: usize, predicate: F) -> Self
    where
        F: Fn(&HistoryView<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            warmup,
            indicators: Vec::new(),
            predicate: Box::new(predicate),
        }
    }

    /// Declare an indicator the predicate reads through the view.
    pub fn with_indicator<I>(mut self, indicator: I) -> Self
    where
        I: Indicator + Clone + 'static,
    {
        self.indicators
            .push(Box::new(move || Box::new(indicator.clone()) as Box<dyn Indicator>));
        self
    }
}

impl std::fmt::Debug for FnEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnEvaluator")
            .field("id", &self.id)
            .field("warmup", &self.warmup)
            .field("indicators", &self.indicators.len())
            .finish()
    }
}

impl SignalEvaluator for FnEvaluator {
    fn id(&self) -> &str {
        &self.id
    }

    fn warmup_bars(&self) -> usize {
        self.warmup
    }

    fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        self.indicators.iter().map(|make| make()).collect()
    }

    fn fire(&self, view: &HistoryView<'_>) -> bool {
        (self.predicate)(view)
    }
}

/// Did `name` cross from at or below `level` to above it at the current bar?
pub(crate) fn crossed_above(view: &HistoryView<'_>, name: &str, level: f64) -> bool {
    match (view.indicator_ago(name, 1), view.indicator(name)) {
        (Some(prev), Some(cur)) => prev <= level && cur > level,
        _ => false,
    }
}
