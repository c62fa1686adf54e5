//! Predictability scoring: how much structure the price series itself carries.
//!
//! Combines the Hurst exponent (trend persistence vs mean reversion) with the
//! lag-1..k autocorrelations of log returns into a trend-character label and a
//! 0 to 100 score. A pure random walk scores near zero.
//!
//! score = 60 · min(|H - 0.5| / 0.5, 1) + 40 · min(mean_k |ρ(k)| / ac_saturation, 1)

use serde::{Deserialize, Serialize};

use signallab_core::indicators::{autocorrelation, hurst_exponent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictabilityConfig {
    /// Highest autocorrelation lag reported.
    pub max_lag: usize,
    /// Half-width of the band around 0.5 labelled a random walk.
    pub random_walk_band: f64,
    /// Mean |autocorrelation| that earns the full autocorrelation share.
    pub ac_saturation: f64,
}

impl Default for PredictabilityConfig {
    fn default() -> Self {
        Self {
            max_lag: 5,
            random_walk_band: 0.05,
            ac_saturation: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendCharacter {
    Trending,
    MeanReverting,
    RandomWalk,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LagCorrelation {
    pub lag: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictabilityReport {
    pub prices: usize,
    /// `None` when the sample is too short or flat for R/S analysis.
    pub hurst: Option<f64>,
    pub autocorrelations: Vec<LagCorrelation>,
    pub character: TrendCharacter,
    pub score: f64,
}

const HURST_WEIGHT: f64 = 60.0;
const AC_WEIGHT: f64 = 40.0;

/// Score the closes of a test window.
pub fn assess_predictability(closes: &[f64], config: &PredictabilityConfig) -> PredictabilityReport {
    let hurst = hurst_exponent(closes);
    let autocorrelations: Vec<LagCorrelation> = (1..=config.max_lag)
        .filter_map(|lag| autocorrelation(closes, lag).map(|value| LagCorrelation { lag, value }))
        .collect();

    let character = match hurst {
        Some(h) if h > 0.5 + config.random_walk_band => TrendCharacter::Trending,
        Some(h) if h < 0.5 - config.random_walk_band => TrendCharacter::MeanReverting,
        _ => TrendCharacter::RandomWalk,
    };

    let hurst_part = hurst.map_or(0.0, |h| ((h - 0.5).abs() / 0.5).min(1.0));
    let ac_part = if autocorrelations.is_empty() || config.ac_saturation <= 0.0 {
        0.0
    } else {
        let mean_abs = autocorrelations.iter().map(|a| a.value.abs()).sum::<f64>()
            / autocorrelations.len() as f64;
        (mean_abs / config.ac_saturation).min(1.0)
    };

    PredictabilityReport {
        prices: closes.len(),
        hurst,
        autocorrelations,
        character,
        score: (HURST_WEIGHT * hurst_part + AC_WEIGHT * ac_part).clamp(0.0, 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Prices whose log returns follow `returns`.
    fn from_returns(returns: impl IntoIterator<Item = f64>) -> Vec<f64> {
        let mut price = 100.0_f64;
        let mut out = vec![price];
        for r in returns {
            price *= r.exp();
            out.push(price);
        }
        out
    }

    #[test]
    fn alternating_returns_are_mean_reverting() {
        let prices = from_returns((0..256).map(|i| if i % 2 == 0 { 0.01 } else { -0.01 }));
        let report = assess_predictability(&prices, &PredictabilityConfig::default());
        assert_eq!(report.character, TrendCharacter::MeanReverting);
        let lag1 = report.autocorrelations.iter().find(|a| a.lag == 1).unwrap();
        assert!(lag1.value < -0.9);
        assert!(report.score > 80.0);
    }

    #[test]
    fn short_series_is_random_walk_with_zero_hurst_share() {
        let report = assess_predictability(&[100.0, 101.0, 100.5], &PredictabilityConfig::default());
        assert_eq!(report.hurst, None);
        assert_eq!(report.character, TrendCharacter::RandomWalk);
        assert!(report.autocorrelations.is_empty());
        assert_eq!(report.score, 0.0);
    }

    #[test]
    fn score_is_bounded() {
        let prices = from_returns((0..300).map(|i| ((i * 7919) % 13) as f64 * 0.002 - 0.012));
        let report = assess_predictability(&prices, &PredictabilityConfig::default());
        assert!((0.0..=100.0).contains(&report.score));
        assert_eq!(report.autocorrelations.len(), 5);
    }
}
