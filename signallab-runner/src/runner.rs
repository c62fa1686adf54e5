//! Backtest runner: wires together the registry, the walk-forward pass and reporting.
//!
//! Entry points:
//! - `run_backtest()`: builds the registry from the config's evaluator specs.
//! - `run_backtest_with_registry()`: caller-supplied registry (closure evaluators).
//! - `run_assets()`: many series in parallel, one shared registry.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use signallab_core::domain::Series;
use signallab_core::engine::{EngineError, WalkForwardResult, WalkForwardRunner};
use signallab_core::evaluator::{EvaluatorRegistry, RegistryError};

use crate::comparator::{compare_groups, ComparisonReport};
use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::leaderboard::Leaderboard;
use crate::predictability::{assess_predictability, PredictabilityReport};
use crate::regimes::{regime_breakdown, PeriodStats};
use crate::stats::{aggregate_combos, aggregate_evaluators, ComboStats, EvaluatorStats};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything one backtest produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub symbol: String,
    pub dataset_hash: String,
    pub config: BacktestConfig,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub evaluators: Vec<EvaluatorStats>,
    pub combos: Vec<ComboStats>,
    pub leaderboard: Leaderboard,
    pub comparison: Option<ComparisonReport>,
    pub regimes: Vec<PeriodStats>,
    pub predictability: PredictabilityReport,
    /// Raw pass output: every fire with its outcome, combos and diagnostics.
    pub walk_forward: WalkForwardResult,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestReport {
    pub fn evaluator(&self, id: &str) -> Option<&EvaluatorStats> {
        self.evaluators.iter().find(|s| s.id == id)
    }

    pub fn never_fired(&self) -> impl Iterator<Item = &EvaluatorStats> {
        self.evaluators.iter().filter(|s| s.never_fired())
    }
}

/// Run one backtest, building evaluators from `config.evaluators`.
pub fn run_backtest(series: &Series, config: &BacktestConfig) -> Result<BacktestReport, RunError> {
    config.validate()?;
    let registry = EvaluatorRegistry::from_specs(&config.evaluators)?;
    run_validated(series, &registry, config)
}

/// Run one backtest against an already-built registry.
///
/// `config.evaluators` is ignored; group and combo members are checked against
/// the registry instead.
pub fn run_backtest_with_registry(
    series: &Series,
    registry: &EvaluatorRegistry,
    config: &BacktestConfig,
) -> Result<BacktestReport, RunError> {
    let mut check = config.clone();
    check.evaluators = registry
        .ids()
        .map(signallab_core::evaluator::EvaluatorSpec::new)
        .collect();
    check.validate()?;
    run_validated(series, registry, config)
}

/// Run every series in parallel with one shared registry.
///
/// Each asset gets its own runner and debounce state. A failing asset does not
/// stop the others; results come back in input order.
pub fn run_assets(
    series: &[Series],
    config: &BacktestConfig,
) -> Result<Vec<(String, Result<BacktestReport, RunError>)>, RunError> {
    config.validate()?;
    let registry = EvaluatorRegistry::from_specs(&config.evaluators)?;
    info!(assets = series.len(), evaluators = registry.len(), "multi-asset run started");

    let results: Vec<_> = series
        .par_iter()
        .map(|s| (s.symbol().to_string(), run_validated(s, &registry, config)))
        .collect();

    for (symbol, result) in &results {
        if let Err(e) = result {
            warn!(symbol = %symbol, error = %e, "asset failed");
        }
    }
    Ok(results)
}

fn run_validated(
    series: &Series,
    registry: &EvaluatorRegistry,
    config: &BacktestConfig,
) -> Result<BacktestReport, RunError> {
    let dataset_hash = series.dataset_hash();
    let run_id = config.run_id(&dataset_hash)?;

    let result = WalkForwardRunner::new(registry, &config.walk_forward)?.run(series)?;

    for (id, diag) in &result.diagnostics {
        if diag.unmeasured > 0 {
            warn!(evaluator = %id, unmeasured = diag.unmeasured, "fires without forward data");
        }
    }

    let horizons = config.horizons();
    let evaluators = aggregate_evaluators(&result, horizons, &config.stats, &config.grading);
    let combos = aggregate_combos(&result, horizons, &config.stats, &config.grading);
    let leaderboard = Leaderboard::build(&evaluators, &combos, config.ranking);
    let comparison = if config.comparison.is_empty() {
        None
    } else {
        compare_groups(&result, series, &config.comparison, &config.stats)
    };
    let regimes = regime_breakdown(
        &result,
        series,
        &config.regimes,
        horizons,
        &config.stats,
        &config.grading,
    );

    let closes = series.closes();
    let window = match result.range {
        Some((start, end)) => &closes[start..=end],
        None => &closes[..],
    };
    let predictability = assess_predictability(window, &config.predictability);

    let (start_date, end_date) = result
        .date_range(series)
        .map_or((None, None), |(a, b)| (Some(a), Some(b)));

    info!(
        symbol = series.symbol(),
        run_id = %run_id,
        fires = result.total_fires(),
        never_fired = evaluators.iter().filter(|s| s.never_fired()).count(),
        combos = combos.len(),
        "backtest finished"
    );

    Ok(BacktestReport {
        schema_version: SCHEMA_VERSION,
        run_id,
        symbol: series.symbol().to_string(),
        dataset_hash,
        config: config.clone(),
        start_date,
        end_date,
        evaluators,
        combos,
        leaderboard,
        comparison,
        regimes,
        predictability,
        walk_forward: result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::{generate_synthetic, SyntheticConfig};
    use signallab_core::evaluator::{EvaluatorSpec, FnEvaluator};

    fn synthetic(bars: usize, seed: u64) -> Series {
        generate_synthetic(
            &format!("S{seed}"),
            &SyntheticConfig { bars, seed, ..Default::default() },
        )
        .unwrap()
    }

    #[test]
    fn default_config_runs_every_builtin() {
        let report = run_backtest(&synthetic(600, 1), &BacktestConfig::default()).unwrap();
        assert_eq!(report.evaluators.len(), 8);
        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert!(report.start_date.is_some());
        assert_eq!(report.leaderboard.rows.len(), 8 + report.combos.len());
    }

    #[test]
    fn invalid_config_fails_before_the_pass() {
        let mut config = BacktestConfig::default();
        config.walk_forward.outcome.horizons = vec![];
        let err = run_backtest(&synthetic(300, 1), &config).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }

    #[test]
    fn unknown_evaluator_type_is_a_registry_error() {
        let config = BacktestConfig {
            evaluators: vec![EvaluatorSpec::new("tea_leaves")],
            ..Default::default()
        };
        let err = run_backtest(&synthetic(300, 1), &config).unwrap_err();
        assert!(matches!(err, RunError::Registry(_)));
    }

    #[test]
    fn custom_registry_reports_never_fired() {
        let mut registry = EvaluatorRegistry::new();
        registry
            .register(Box::new(FnEvaluator::new("never", 0, |_| false)))
            .unwrap();
        let report =
            run_backtest_with_registry(&synthetic(200, 3), &registry, &BacktestConfig::default())
                .unwrap();
        let stats = report.evaluator("never").unwrap();
        assert!(stats.never_fired());
        assert_eq!(stats.fires, 0);
        assert_eq!(report.never_fired().count(), 1);
    }

    #[test]
    fn assets_run_independently() {
        let assets = vec![synthetic(400, 1), synthetic(400, 2), synthetic(20, 3)];
        let config = BacktestConfig::default();
        let results = run_assets(&assets, &config).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, "S1");

        let solo = run_backtest(&assets[1], &config).unwrap();
        let parallel = results[1].1.as_ref().unwrap();
        assert_eq!(parallel.walk_forward, solo.walk_forward);
        assert_eq!(parallel.run_id, solo.run_id);

        // Too short for any warm-up: empty range, zero fires, no error.
        let short = results[2].1.as_ref().unwrap();
        assert_eq!(short.walk_forward.range, None);
        assert!(short.evaluators.iter().all(|s| s.never_fired()));
    }
}
