//! Lag-k autocorrelation of log returns.
//!
//! ρ(k) = Σ_{i=k}^{n-1} (r_i - m)(r_{i-k} - m) / Σ_{i=0}^{n-1} (r_i - m)²
//!
//! A zero-variance sample has no defined autocorrelation and reports 0.0.

use super::Indicator;
use crate::domain::Candle;

/// Natural-log returns of a price series. Empty if fewer than two prices or if
/// any price is non-positive.
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    if prices.iter().any(|p| !(p.is_finite() && *p > 0.0)) {
        return Vec::new();
    }
    prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect()
}

/// Lag-`lag` autocorrelation of the log returns of `prices`.
///
/// Returns `None` unless there are more than `lag + 1` returns.
pub fn autocorrelation(prices: &[f64], lag: usize) -> Option<f64> {
    let returns = log_returns(prices);
    autocorrelation_of_returns(&returns, lag)
}

pub(crate) fn autocorrelation_of_returns(returns: &[f64], lag: usize) -> Option<f64> {
    let n = returns.len();
    if n <= lag + 1 {
        return None;
    }
    let mean = returns.iter().sum::<f64>() / n as f64;
    let c0: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum();
    if (c0 / n as f64).sqrt() < 1e-12 {
        return Some(0.0);
    }
    let ck: f64 = (lag..n)
        .map(|i| (returns[i] - mean) * (returns[i - lag] - mean))
        .sum();
    Some(ck / c0)
}

/// Rolling autocorrelation over the trailing `window` closes.
/// Lookback: window - 1.
#[derive(Debug, Clone)]
pub struct Autocorrelation {
    window: usize,
    lag: usize,
    name: String,
}

impl Autocorrelation {
    pub fn new(window: usize, lag: usize) -> Self {
        assert!(lag >= 1, "autocorrelation lag must be >= 1");
        assert!(
            window > lag + 2,
            "autocorrelation window must exceed lag + 2"
        );
        Self {
            window,
            lag,
            name: format!("autocorr_{window}_{lag}"),
        }
    }
}

impl Indicator for Autocorrelation {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let mut result = vec![f64::NAN; closes.len()];
        for t in self.lookback()..closes.len() {
            let window = &closes[t + 1 - self.window..=t];
            if let Some(rho) = autocorrelation(window, self.lag) {
                result[t] = rho;
            }
        }
        result
    }
}
