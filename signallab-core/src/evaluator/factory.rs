//! Factory: converts an `EvaluatorSpec` into a boxed evaluator.
//!
//! Specs come straight from user configuration, so every parameter is range-checked
//! here and reported as a `FactoryError` before any constructor assertion can trip.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::indicators::HURST_MIN_PRICES;

use super::builtin::{
    AtrExpansion, BollingerBounce, GoldenCross, HurstTrend, MaReclaim, ObvBreakout,
    RsiOversoldBounce, VolumeSurge,
};
use super::SignalEvaluator;

// ─── Spec ────────────────────────────────────────────────────────────

/// Configuration of one evaluator.
///
/// ```toml
/// [[evaluators]]
/// type = "ma_reclaim"
/// id = "reclaim_200"
/// params = { period = 200 }
/// ```
///
/// Uses `BTreeMap` so serialization (and therefore the run id) is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorSpec {
    #[serde(rename = "type")]
    pub evaluator_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl EvaluatorSpec {
    pub fn new(evaluator_type: impl Into<String>) -> Self {
        Self {
            evaluator_type: evaluator_type.into(),
            id: None,
            params: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Id the evaluator will register under: the explicit id, else the type name.
    pub fn resolved_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.evaluator_type)
    }
}

// ─── Error type ──────────────────────────────────────────────────────

/// Errors that can occur during evaluator construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactoryError {
    #[error("unknown evaluator type: {0}")]
    UnknownEvaluator(String),
    #[error("evaluator '{evaluator}': invalid parameter '{param}' = {value}: {reason}")]
    InvalidParam {
        evaluator: String,
        param: String,
        value: f64,
        reason: &'static str,
    },
}

// ─── Helpers ─────────────────────────────────────────────────────────

struct Params<'a> {
    spec: &'a EvaluatorSpec,
}

impl Params<'_> {
    fn invalid(&self, param: &str, value: f64, reason: &'static str) -> FactoryError {
        FactoryError::InvalidParam {
            evaluator: self.spec.resolved_id().to_string(),
            param: param.to_string(),
            value,
            reason,
        }
    }

    /// Named f64 parameter, falling back to `default`.
    fn float(&self, name: &str, default: f64) -> Result<f64, FactoryError> {
        let value = self.spec.params.get(name).copied().unwrap_or(default);
        if !value.is_finite() {
            return Err(self.invalid(name, value, "must be finite"));
        }
        Ok(value)
    }

    fn positive(&self, name: &str, default: f64) -> Result<f64, FactoryError> {
        let value = self.float(name, default)?;
        if value <= 0.0 {
            return Err(self.invalid(name, value, "must be > 0"));
        }
        Ok(value)
    }

    /// Named whole-number parameter of at least `min`.
    fn period(&self, name: &str, default: usize, min: usize) -> Result<usize, FactoryError> {
        let value = self.float(name, default as f64)?;
        if value.fract() != 0.0 || value < min as f64 {
            return Err(self.invalid(name, value, "must be a whole number at or above its minimum"));
        }
        Ok(value as usize)
    }
}

// ─── Factory ─────────────────────────────────────────────────────────

/// Create an evaluator from its spec.
pub fn create_evaluator(spec: &EvaluatorSpec) -> Result<Box<dyn SignalEvaluator>, FactoryError> {
    let p = Params { spec };
    let id = spec.resolved_id();

    let evaluator: Box<dyn SignalEvaluator> = match spec.evaluator_type.as_str() {
        "ma_reclaim" => {
            let period = p.period("period", 200, 1)?;
            Box::new(MaReclaim::new(period).with_id(id))
        }
        "golden_cross" => {
            let fast_period = p.period("fast_period", 50, 1)?;
            let slow_period = p.period("slow_period", 200, 2)?;
            if slow_period <= fast_period {
                return Err(p.invalid(
                    "slow_period",
                    slow_period as f64,
                    "must be > fast_period",
                ));
            }
            Box::new(GoldenCross::new(fast_period, slow_period).with_id(id))
        }
        "rsi_oversold_bounce" => {
            let period = p.period("period", 14, 1)?;
            let threshold = p.float("threshold", 30.0)?;
            if !(0.0..=100.0).contains(&threshold) {
                return Err(p.invalid("threshold", threshold, "must be within [0, 100]"));
            }
            Box::new(RsiOversoldBounce::new(period, threshold).with_id(id))
        }
        "bollinger_bounce" => {
            let period = p.period("period", 20, 2)?;
            let multiplier = p.positive("multiplier", 2.0)?;
            Box::new(BollingerBounce::new(period, multiplier).with_id(id))
        }
        "volume_surge" => {
            let period = p.period("period", 20, 1)?;
            let multiplier = p.positive("multiplier", 2.0)?;
            Box::new(VolumeSurge::new(period, multiplier).with_id(id))
        }
        "obv_breakout" => {
            let lookback = p.period("lookback", 20, 1)?;
            Box::new(ObvBreakout::new(lookback).with_id(id))
        }
        "atr_expansion" => {
            let period = p.period("period", 14, 1)?;
            let multiplier = p.positive("multiplier", 2.0)?;
            Box::new(AtrExpansion::new(period, multiplier).with_id(id))
        }
        "hurst_trend" => {
            let window = p.period("window", 100, HURST_MIN_PRICES)?;
            let threshold = p.float("threshold", 0.55)?;
            if threshold <= 0.0 || threshold >= 1.0 {
                return Err(p.invalid("threshold", threshold, "must be within (0, 1)"));
            }
            Box::new(HurstTrend::new(window, threshold).with_id(id))
        }
        other => return Err(FactoryError::UnknownEvaluator(other.to_string())),
    };
    Ok(evaluator)
}

/// Every evaluator type the factory understands.
pub const EVALUATOR_TYPES: &[&str] = &[
    "ma_reclaim",
    "golden_cross",
    "rsi_oversold_bounce",
    "bollinger_bounce",
    "volume_surge",
    "obv_breakout",
    "atr_expansion",
    "hurst_trend",
];
