//! Serializable backtest configuration, loaded from TOML.
//!
//! ```toml
//! symbol = "SPY"
//!
//! [[evaluators]]
//! type = "ma_reclaim"
//! params = { period = 200 }
//!
//! [walk_forward]
//! debounce_bars = 5
//!
//! [walk_forward.outcome]
//! horizons = [7, 14, 30]
//! take_profit = 0.10
//! stop_loss = -0.05
//!
//! [ranking]
//! metric = "mean_return"
//! horizon = 30
//! ```
//!
//! Every section is optional; missing fields take their defaults. `validate()`
//! runs before any walk-forward pass and names the offending parameter.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use signallab_core::engine::{ConfigError as EngineConfigError, WalkForwardConfig};
use signallab_core::evaluator::{EvaluatorSpec, EVALUATOR_TYPES};

use crate::comparator::ComparisonGroups;
use crate::leaderboard::RankingMetric;
use crate::predictability::PredictabilityConfig;
use crate::regimes::Regime;
use crate::stats::{GradingConfig, StatsConfig};

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Engine(#[from] EngineConfigError),
    #[error("evaluators must list at least one evaluator")]
    NoEvaluators,
    #[error("evaluators: duplicate id '{0}'")]
    DuplicateEvaluator(String),
    #[error("stats.annualization_factor must be a finite value > 0, got {0}")]
    AnnualizationFactor(f64),
    #[error("stats.confidence_level must be within (0, 1), got {0}")]
    ConfidenceLevel(f64),
    #[error("{param} = {horizon} is not one of walk_forward.outcome.horizons {available:?}")]
    UnknownHorizon {
        param: &'static str,
        horizon: usize,
        available: Vec<usize>,
    },
    #[error("grading.thresholds[{index}] is invalid: {reason}")]
    GradeThreshold { index: usize, reason: &'static str },
    #[error("regimes: '{name}' ends before it starts")]
    InvertedRegime { name: String },
    #[error("comparison.{group} references unknown evaluator '{member}'")]
    UnknownGroupMember { group: &'static str, member: String },
    #[error("walk_forward.tracked_combos: '{combo}' references unknown evaluator '{member}'")]
    UnknownComboMember { combo: String, member: String },
    #[error("predictability.max_lag must be >= 1")]
    MaxLag,
}

/// Complete configuration of one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Symbol reported when the data source does not name one.
    pub symbol: String,
    pub evaluators: Vec<EvaluatorSpec>,
    pub walk_forward: WalkForwardConfig,
    pub stats: StatsConfig,
    pub grading: GradingConfig,
    pub ranking: RankingMetric,
    pub comparison: ComparisonGroups,
    pub regimes: Vec<Regime>,
    pub predictability: PredictabilityConfig,
}

impl Default for BacktestConfig {
    /// Every built-in evaluator with its default parameters.
    fn default() -> Self {
        Self {
            symbol: "SYNTH".into(),
            evaluators: EVALUATOR_TYPES.iter().map(|t| EvaluatorSpec::new(*t)).collect(),
            walk_forward: WalkForwardConfig::default(),
            stats: StatsConfig::default(),
            grading: GradingConfig::default(),
            ranking: RankingMetric::default(),
            comparison: ComparisonGroups::default(),
            regimes: Vec::new(),
            predictability: PredictabilityConfig::default(),
        }
    }
}

impl BacktestConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn horizons(&self) -> &[usize] {
        &self.walk_forward.outcome.horizons
    }

    /// Check every parameter that does not depend on the data.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.walk_forward.validate()?;

        if self.evaluators.is_empty() {
            return Err(ConfigError::NoEvaluators);
        }
        let mut ids = HashSet::new();
        for spec in &self.evaluators {
            if !ids.insert(spec.resolved_id()) {
                return Err(ConfigError::DuplicateEvaluator(spec.resolved_id().to_string()));
            }
        }

        let stats = &self.stats;
        if !(stats.annualization_factor.is_finite() && stats.annualization_factor > 0.0) {
            return Err(ConfigError::AnnualizationFactor(stats.annualization_factor));
        }
        if !(stats.confidence_level > 0.0 && stats.confidence_level < 1.0) {
            return Err(ConfigError::ConfidenceLevel(stats.confidence_level));
        }

        self.check_horizon("stats.primary_horizon", stats.primary_horizon)?;
        self.check_horizon("grading.horizon", self.grading.horizon)?;
        if let Some(h) = self.ranking.horizon() {
            self.check_horizon("ranking.horizon", h)?;
        }
        if let Some(h) = self.comparison.horizon {
            self.check_horizon("comparison.horizon", h)?;
        }

        for (index, t) in self.grading.thresholds.iter().enumerate() {
            if t.grade.trim().is_empty() {
                return Err(ConfigError::GradeThreshold { index, reason: "grade must not be empty" });
            }
            if !(t.min_mean_return.is_finite() && t.min_win_rate.is_finite()) {
                return Err(ConfigError::GradeThreshold { index, reason: "minimums must be finite" });
            }
        }

        if let Some(r) = self.regimes.iter().find(|r| r.end < r.start) {
            return Err(ConfigError::InvertedRegime { name: r.name.clone() });
        }

        for (group, member) in self.comparison.members() {
            if !ids.contains(member.as_str()) {
                return Err(ConfigError::UnknownGroupMember {
                    group,
                    member: member.clone(),
                });
            }
        }
        for combo in &self.walk_forward.tracked_combos {
            if let Some(member) = combo.members.iter().find(|m| !ids.contains(m.as_str())) {
                return Err(ConfigError::UnknownComboMember {
                    combo: combo.name.clone(),
                    member: member.clone(),
                });
            }
        }

        if self.predictability.max_lag == 0 {
            return Err(ConfigError::MaxLag);
        }
        Ok(())
    }

    fn check_horizon(&self, param: &'static str, horizon: usize) -> Result<(), ConfigError> {
        if self.horizons().contains(&horizon) {
            Ok(())
        } else {
            Err(ConfigError::UnknownHorizon {
                param,
                horizon,
                available: self.horizons().to_vec(),
            })
        }
    }

    /// Deterministic id over the full configuration and the dataset it runs on.
    ///
    /// Two runs with identical configs on identical data share a run id.
    pub fn run_id(&self, dataset_hash: &str) -> Result<RunId, ConfigError> {
        let json = serde_json::to_vec(self)?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(&json);
        hasher.update(dataset_hash.as_bytes());
        Ok(hasher.finalize().to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signallab_core::engine::TrackedCombo;

    #[test]
    fn defaults_are_valid() {
        let config = BacktestConfig::default();
        config.validate().unwrap();
        assert_eq!(config.evaluators.len(), EVALUATOR_TYPES.len());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = BacktestConfig::from_toml_str(
            r#"
symbol = "SPY"

[[evaluators]]
type = "ma_reclaim"
id = "reclaim_50"
params = { period = 50 }

[[evaluators]]
type = "rsi_oversold_bounce"

[walk_forward]
debounce_bars = 3

[walk_forward.outcome]
take_profit = 0.08
tie_break = "stop_loss"

[ranking]
metric = "win_rate"
horizon = 14

[[regimes]]
name = "h1"
start = "2024-01-01"
end = "2024-06-30"
"#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.symbol, "SPY");
        assert_eq!(config.evaluators.len(), 2);
        assert_eq!(config.evaluators[0].resolved_id(), "reclaim_50");
        assert_eq!(config.walk_forward.debounce_bars, 3);
        assert_eq!(config.walk_forward.combo_debounce_bars, 10);
        assert_eq!(config.walk_forward.outcome.take_profit, 0.08);
        assert_eq!(config.walk_forward.outcome.stop_loss, -0.05);
        assert_eq!(config.ranking, RankingMetric::WinRate { horizon: 14 });
        assert_eq!(config.stats.annualization_factor, 52.0);
        assert_eq!(config.regimes[0].name, "h1");
    }

    #[test]
    fn invalid_parameters_are_named() {
        let mut config = BacktestConfig::default();
        config.stats.confidence_level = 1.5;
        assert!(config.validate().unwrap_err().to_string().contains("confidence_level"));

        let mut config = BacktestConfig::default();
        config.grading.horizon = 60;
        assert!(config.validate().unwrap_err().to_string().contains("grading.horizon"));

        let mut config = BacktestConfig::default();
        config.walk_forward.outcome.stop_loss = 0.05;
        assert!(config.validate().unwrap_err().to_string().contains("stop_loss"));

        let mut config = BacktestConfig::default();
        config.comparison.generic = vec!["nope".into()];
        assert!(config.validate().unwrap_err().to_string().contains("comparison.generic"));
    }

    #[test]
    fn duplicate_ids_and_unknown_combo_members_are_rejected() {
        let mut config = BacktestConfig::default();
        config.evaluators.push(EvaluatorSpec::new("ma_reclaim"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateEvaluator(id)) if id == "ma_reclaim"
        ));

        let mut config = BacktestConfig::default();
        config.walk_forward.tracked_combos.push(TrackedCombo {
            name: "pair".into(),
            members: vec!["ma_reclaim".into(), "ghost".into()],
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownComboMember { member, .. }) if member == "ghost"
        ));
    }

    #[test]
    fn tracked_combo_cannot_reuse_an_automatic_key() {
        let mut config = BacktestConfig::default();
        config.walk_forward.tracked_combos.push(TrackedCombo {
            name: "golden_cross+ma_reclaim".into(),
            members: vec!["ma_reclaim".into(), "golden_cross".into()],
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Engine(EngineConfigError::ComboName(name)))
                if name == "golden_cross+ma_reclaim"
        ));
    }

    #[test]
    fn run_id_is_deterministic_and_data_sensitive() {
        let config = BacktestConfig::default();
        let a = config.run_id("hash-a").unwrap();
        assert_eq!(a, config.run_id("hash-a").unwrap());
        assert_ne!(a, config.run_id("hash-b").unwrap());

        let mut changed = config.clone();
        changed.walk_forward.debounce_bars = 7;
        assert_ne!(a, changed.run_id("hash-a").unwrap());
    }
}
