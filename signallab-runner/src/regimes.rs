//! Regime breakdown: evaluator statistics restricted to named date ranges.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use signallab_core::domain::Series;
use signallab_core::engine::{MeasuredFire, WalkForwardResult};

use crate::comparator::BuyAndHold;
use crate::stats::{EvaluatorStats, GradingConfig, StatsConfig};

/// A named, inclusive calendar window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regime {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Regime {
    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start..=self.end).contains(&date)
    }
}

/// Statistics of every evaluator over one regime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub regime: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub evaluators: Vec<EvaluatorStats>,
    /// Buy-and-hold over the bars inside the window. `None` if fewer than two bars fall in it.
    pub buy_and_hold: Option<BuyAndHold>,
}

/// One `PeriodStats` per regime, in the order given.
///
/// Fires are assigned by the date of their entry bar.
pub fn regime_breakdown(
    result: &WalkForwardResult,
    series: &Series,
    regimes: &[Regime],
    horizons: &[usize],
    stats: &StatsConfig,
    grading: &GradingConfig,
) -> Vec<PeriodStats> {
    regimes
        .iter()
        .map(|regime| {
            let evaluators = result
                .fires
                .iter()
                .map(|(id, fires)| {
                    let inside: Vec<MeasuredFire> = fires
                        .iter()
                        .filter(|f| regime.contains(f.fire.date))
                        .cloned()
                        .collect();
                    EvaluatorStats::compute(id, &inside, horizons, stats, grading)
                })
                .collect();

            let buy_and_hold = match (
                series.index_on_or_after(regime.start),
                series.index_on_or_before(regime.end),
            ) {
                (Some(a), Some(b)) if b > a => BuyAndHold::over(series, a, b),
                _ => None,
            };

            PeriodStats {
                regime: regime.name.clone(),
                start: regime.start,
                end: regime.end,
                evaluators,
                buy_and_hold,
            }
        })
        .collect()
}
