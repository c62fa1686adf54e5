//! Walk-forward and outcome configuration, validated before any pass runs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid configuration. Each variant names the offending parameter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("outcome.horizons must not be empty")]
    EmptyHorizons,
    #[error("outcome.horizons must be strictly ascending and >= 1, got {0:?}")]
    UnorderedHorizons(Vec<usize>),
    #[error("outcome.race_horizon ({race}) is shorter than the largest horizon bucket ({bucket})")]
    RaceHorizonTooShort { race: usize, bucket: usize },
    #[error("outcome.min_forward_bars must be between 1 and the largest horizon ({max}), got {value}")]
    MinForwardBars { value: usize, max: usize },
    #[error("outcome.take_profit must be a finite value > 0, got {0}")]
    TakeProfit(f64),
    #[error("outcome.stop_loss must be a finite value in (-1, 0), got {0}")]
    StopLoss(f64),
    #[error("walk_forward.min_combo_size must be >= 2, got {0}")]
    MinComboSize(usize),
    #[error("walk_forward.end ({end}) is before walk_forward.start ({start})")]
    EndBeforeStart { start: usize, end: usize },
    #[error("walk_forward.start ({start}) is inside the indicator warm-up ({warmup} bars)")]
    StartBeforeWarmup { start: usize, warmup: usize },
    #[error("tracked combo '{0}' needs at least two members")]
    ComboTooSmall(String),
    #[error("tracked combo name '{0}' must not contain '+', which joins automatic combo keys")]
    ComboName(String),
    #[error("tracked combo name '{0}' is used twice")]
    DuplicateCombo(String),
    #[error("tracked combo '{combo}' references unknown evaluator '{member}'")]
    UnknownComboMember { combo: String, member: String },
}

/// Which side wins when take-profit and stop-loss are both crossed on the same bar.
///
/// The intrabar path between open and close is unknown, so this is an assumption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Optimistic: count the bar as a win.
    #[default]
    TakeProfit,
    /// Conservative: count the bar as a loss.
    StopLoss,
    /// Count the bar as neither.
    Neither,
}

/// Forward-outcome measurement settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeConfig {
    /// Horizon buckets in bars, strictly ascending.
    pub horizons: Vec<usize>,
    /// Bars over which the take-profit / stop-loss race runs.
    pub race_horizon: usize,
    /// Fires with fewer forward bars than this get no outcome.
    pub min_forward_bars: usize,
    /// Take-profit threshold as a fraction of entry (0.10 = +10%).
    pub take_profit: f64,
    /// Stop-loss threshold as a negative fraction of entry (-0.05 = -5%).
    pub stop_loss: f64,
    pub tie_break: TieBreak,
}

impl Default for OutcomeConfig {
    fn default() -> Self {
        Self {
            horizons: vec![7, 14, 30],
            race_horizon: 30,
            min_forward_bars: 7,
            take_profit: 0.10,
            stop_loss: -0.05,
            tie_break: TieBreak::TakeProfit,
        }
    }
}

impl OutcomeConfig {
    /// Largest horizon bucket.
    pub fn max_bucket(&self) -> usize {
        self.horizons.last().copied().unwrap_or(0)
    }

    /// Furthest bar the measurer looks at after a fire.
    pub fn max_horizon(&self) -> usize {
        self.max_bucket().max(self.race_horizon)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizons.is_empty() {
            return Err(ConfigError::EmptyHorizons);
        }
        let ascending = self.horizons[0] >= 1 && self.horizons.windows(2).all(|w| w[0] < w[1]);
        if !ascending {
            return Err(ConfigError::UnorderedHorizons(self.horizons.clone()));
        }
        if self.race_horizon < self.max_bucket() {
            return Err(ConfigError::RaceHorizonTooShort {
                race: self.race_horizon,
                bucket: self.max_bucket(),
            });
        }
        if self.min_forward_bars == 0 || self.min_forward_bars > self.max_horizon() {
            return Err(ConfigError::MinForwardBars {
                value: self.min_forward_bars,
                max: self.max_horizon(),
            });
        }
        if !(self.take_profit.is_finite() && self.take_profit > 0.0) {
            return Err(ConfigError::TakeProfit(self.take_profit));
        }
        if !(self.stop_loss.is_finite() && self.stop_loss < 0.0 && self.stop_loss > -1.0) {
            return Err(ConfigError::StopLoss(self.stop_loss));
        }
        Ok(())
    }
}

/// Joins the sorted member ids of an automatic combo key.
pub const COMBO_SEPARATOR: &str = "+";

/// A named evaluator combination to track explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedCombo {
    pub name: String,
    pub members: Vec<String>,
}

/// Walk-forward pass settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForwardConfig {
    /// First bar evaluated. Defaults to the longest warm-up.
    pub start: Option<usize>,
    /// Last bar evaluated. Always capped so the longest horizon fits.
    pub end: Option<usize>,
    /// Minimum bar distance between two recorded fires of one evaluator.
    pub debounce_bars: usize,
    /// Minimum bar distance between two recorded fires of one combo key.
    pub combo_debounce_bars: usize,
    /// Fewest simultaneous evaluators that form an automatic combo.
    pub min_combo_size: usize,
    pub tracked_combos: Vec<TrackedCombo>,
    pub outcome: OutcomeConfig,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            debounce_bars: 5,
            combo_debounce_bars: 10,
            min_combo_size: 2,
            tracked_combos: Vec::new(),
            outcome: OutcomeConfig::default(),
        }
    }
}

impl WalkForwardConfig {
    /// Checks that do not depend on the series or the registry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.outcome.validate()?;
        if self.min_combo_size < 2 {
            return Err(ConfigError::MinComboSize(self.min_combo_size));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                return Err(ConfigError::EndBeforeStart { start, end });
            }
        }
        let mut names = HashSet::new();
        for combo in &self.tracked_combos {
            if combo.name.contains(COMBO_SEPARATOR) {
                return Err(ConfigError::ComboName(combo.name.clone()));
            }
            if !names.insert(combo.name.as_str()) {
                return Err(ConfigError::DuplicateCombo(combo.name.clone()));
            }
            let mut members = combo.members.clone();
            members.sort();
            members.dedup();
            if members.len() < 2 {
                return Err(ConfigError::ComboTooSmall(combo.name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = WalkForwardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.outcome.max_horizon(), 30);
    }

    #[test]
    fn race_horizon_shorter_than_bucket_is_rejected() {
        let mut config = WalkForwardConfig::default();
        config.outcome.race_horizon = 20;
        assert_eq!(
            config.validate(),
            Err(ConfigError::RaceHorizonTooShort { race: 20, bucket: 30 })
        );
    }

    #[test]
    fn each_invalid_parameter_is_named() {
        let cases: Vec<(OutcomeConfig, &str)> = vec![
            (OutcomeConfig { horizons: vec![], ..Default::default() }, "horizons"),
            (OutcomeConfig { horizons: vec![14, 7, 30], ..Default::default() }, "horizons"),
            (OutcomeConfig { take_profit: 0.0, ..Default::default() }, "take_profit"),
            (OutcomeConfig { stop_loss: 0.05, ..Default::default() }, "stop_loss"),
            (OutcomeConfig { min_forward_bars: 0, ..Default::default() }, "min_forward_bars"),
        ];
        for (outcome, param) in cases {
            let err = outcome.validate().unwrap_err();
            assert!(err.to_string().contains(param), "{err} should name {param}");
        }
    }

    #[test]
    fn combo_settings_are_checked() {
        let config = WalkForwardConfig { min_combo_size: 1, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::MinComboSize(1)));

        let config = WalkForwardConfig {
            tracked_combos: vec![TrackedCombo {
                name: "solo".into(),
                members: vec!["a".into(), "a".into()],
            }],
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ComboTooSmall("solo".into())));
    }

    #[test]
    fn tracked_names_cannot_look_like_automatic_keys() {
        let combo = |name: &str| TrackedCombo {
            name: name.into(),
            members: vec!["a".into(), "b".into()],
        };
        let config = WalkForwardConfig {
            tracked_combos: vec![combo("a+b")],
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ComboName("a+b".into())));

        let config = WalkForwardConfig {
            tracked_combos: vec![combo("pair"), combo("pair")],
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::DuplicateCombo("pair".into())));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: WalkForwardConfig =
            serde_json::from_str(r#"{"debounce_bars": 3, "outcome": {"take_profit": 0.2}}"#)
                .unwrap();
        assert_eq!(config.debounce_bars, 3);
        assert_eq!(config.combo_debounce_bars, 10);
        assert_eq!(config.outcome.take_profit, 0.2);
        assert_eq!(config.outcome.horizons, vec![7, 14, 30]);
        assert_eq!(config.outcome.tie_break, TieBreak::TakeProfit);
    }
}
