//! Simple Moving Average (SMA).
//!
//! Rolling mean over a lookback window, of either close prices or volume.
//! Lookback: period - 1 (first valid value at index period-1).

use serde::{Deserialize, Serialize};

use super::Indicator;
use crate::domain::Candle;

/// Which candle field an indicator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Close,
    Volume,
}

impl PriceSource {
    pub fn extract(&self, candles: &[Candle]) -> Vec<f64> {
        match self {
            PriceSource::Close => candles.iter().map(|c| c.close).collect(),
            PriceSource::Volume => candles.iter().map(|c| c.volume).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    source: PriceSource,
    name: String,
}

impl Sma {
    /// SMA of close prices.
    pub fn new(period: usize) -> Self {
        Self::of(period, PriceSource::Close)
    }

    pub fn of(period: usize, source: PriceSource) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        let name = match source {
            PriceSource::Close => format!("sma_{period}"),
            PriceSource::Volume => format!("volume_sma_{period}"),
        };
        Self {
            period,
            source,
            name,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        sma_of_series(&self.source.extract(candles), self.period)
    }
}

/// Rolling mean of an arbitrary series. A window holding any non-finite value
/// yields NaN.
pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut non_finite = 0usize;
    for i in 0..n {
        let entering = values[i];
        if entering.is_finite() {
            sum += entering;
        } else {
            non_finite += 1;
        }
        if i >= period {
            let leaving = values[i - period];
            if leaving.is_finite() {
                sum -= leaving;
            } else {
                non_finite -= 1;
            }
        }
        if i + 1 >= period && non_finite == 0 {
            result[i] = sum / period as f64;
        }
    }
    result
}
