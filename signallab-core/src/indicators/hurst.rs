//! Hurst exponent via rescaled-range (R/S) analysis.
//!
//! For window sizes 8, 16, 32, ... (doubling while a full window fits), the log
//! returns are cut into non-overlapping chunks. Each chunk contributes
//! R/S = (max - min of cumulative mean-deviations) / population stddev; the
//! chunk ratios are averaged per size. The slope of log(R/S) against log(size)
//! is the Hurst estimate, clamped to [0.01, 0.99].
//!
//! H > 0.5 suggests trend persistence, H < 0.5 mean reversion, H = 0.5 a random walk.

use super::autocorr::log_returns;
use super::Indicator;
use crate::domain::Candle;

const MIN_WINDOW: usize = 8;
const MIN_SIZES: usize = 3;
const HURST_MIN: f64 = 0.01;
const HURST_MAX: f64 = 0.99;

/// Fewest prices that can yield an estimate (32 returns → sizes 8, 16, 32).
pub const HURST_MIN_PRICES: usize = 33;

/// Hurst exponent of a price series. `None` if fewer than three window sizes
/// produce a usable R/S statistic (short input or flat returns).
pub fn hurst_exponent(prices: &[f64]) -> Option<f64> {
    let returns = log_returns(prices);
    let n = returns.len();

    let mut points: Vec<(f64, f64)> = Vec::new();
    let mut size = MIN_WINDOW;
    while size <= n {
        if let Some(rs) = mean_rescaled_range(&returns, size) {
            points.push(((size as f64).ln(), rs.ln()));
        }
        size *= 2;
    }

    if points.len() < MIN_SIZES {
        return None;
    }

    let slope = ols_slope(&points)?;
    Some(slope.clamp(HURST_MIN, HURST_MAX))
}

/// Mean R/S over the non-overlapping chunks of length `size`.
fn mean_rescaled_range(returns: &[f64], size: usize) -> Option<f64> {
    let ratios: Vec<f64> = returns
        .chunks_exact(size)
        .filter_map(rescaled_range)
        .collect();
    if ratios.is_empty() {
        return None;
    }
    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    (mean > 0.0).then_some(mean)
}

fn rescaled_range(chunk: &[f64]) -> Option<f64> {
    let n = chunk.len() as f64;
    let mean = chunk.iter().sum::<f64>() / n;
    let std = (chunk.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
    if std < 1e-12 {
        return None;
    }

    let mut cumulative = 0.0;
    let mut max = f64::NEG_INFINITY;
    let mut min = f64::INFINITY;
    for x in chunk {
        cumulative += x - mean;
        max = max.max(cumulative);
        min = min.min(cumulative);
    }
    Some((max - min) / std)
}

fn ols_slope(points: &[(f64, f64)]) -> Option<f64> {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    if sxx <= 0.0 {
        return None;
    }
    let sxy: f64 = points
        .iter()
        .map(|p| (p.0 - mean_x) * (p.1 - mean_y))
        .sum();
    Some(sxy / sxx)
}

/// Rolling Hurst exponent over the trailing `window` closes.
/// Lookback: window - 1.
#[derive(Debug, Clone)]
pub struct Hurst {
    window: usize,
    name: String,
}

impl Hurst {
    pub fn new(window: usize) -> Self {
        assert!(
            window >= HURST_MIN_PRICES,
            "Hurst window must be >= {HURST_MIN_PRICES}"
        );
        Self {
            window,
            name: format!("hurst_{window}"),
        }
    }
}

impl Indicator for Hurst {
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
            if let Some(h) = hurst_exponent(&closes[t + 1 - self.window..=t]) {
                result[t] = h;
            }
        }
        result
    }
}
