//! SignalLab Runner: backtest orchestration, statistics, comparison reports.
//!
//! This crate builds on `signallab-core` to provide:
//! - Per-evaluator and per-combo aggregation (win rate, Sharpe, drawdown, Calmar, grade)
//! - Welch's t-test and confidence intervals
//! - Leaderboard, customized-vs-generic-vs-buy-and-hold comparison, regime breakdown
//! - Predictability scoring of the series itself
//! - TOML run configuration with a deterministic run id
//! - CSV and synthetic data loading, single and parallel multi-asset runs
//! - JSON / CSV / Markdown export

pub mod comparator;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod leaderboard;
pub mod metrics;
pub mod predictability;
pub mod regimes;
pub mod runner;
pub mod significance;
pub mod stats;

pub use comparator::{
    compare_groups, head_to_head, BuyAndHold, ComparisonGroups, ComparisonReport, GroupSummary,
};
pub use config::{BacktestConfig, ConfigError, RunId};
pub use data_loader::{
    generate_synthetic, load_csv, parse_timestamp, read_candles, LoadError, SyntheticConfig,
};
pub use export::{
    export_candles_csv, export_fires_csv, export_json, generate_report, import_json,
    load_artifacts, save_artifacts,
};
pub use leaderboard::{EntryKind, Leaderboard, LeaderboardRow, RankingMetric};
pub use predictability::{
    assess_predictability, PredictabilityConfig, PredictabilityReport, TrendCharacter,
};
pub use regimes::{regime_breakdown, PeriodStats, Regime};
pub use runner::{
    run_assets, run_backtest, run_backtest_with_registry, BacktestReport, RunError,
    SCHEMA_VERSION,
};
pub use significance::{
    banded_p_value, confidence_interval, welch_t_test, ConfidenceInterval, PValueMethod,
    WelchTest,
};
pub use stats::{
    aggregate_combos, aggregate_evaluators, ComboStats, EvaluatorStats, FireStatus,
    GradeThreshold, GradingConfig, HorizonStats, RaceTally, StatsConfig,
};
