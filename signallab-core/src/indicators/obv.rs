//! On-Balance Volume (OBV).
//!
//! Running sum of volume signed by the close-to-close direction. OBV[0] = 0.
//! Lookback: 0.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone, Default)]
pub struct Obv;

impl Obv {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Obv {
    fn name(&self) -> &str {
        "obv"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let mut result = Vec::with_capacity(candles.len());
        let mut obv = 0.0;
        if !candles.is_empty() {
            result.push(obv);
        }
        for w in candles.windows(2) {
            let (prev, cur) = (&w[0], &w[1]);
            if cur.close > prev.close {
                obv += cur.volume;
            } else if cur.close < prev.close {
                obv -= cur.volume;
            }
            result.push(obv);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn obv_accumulates_signed_volume() {
        let mut candles = make_candles(&[10.0, 11.0, 11.0, 9.0, 12.0]);
        for (i, c) in candles.iter_mut().enumerate() {
            c.volume = 100.0 * (i + 1) as f64;
        }
        let obv = Obv::new().compute(&candles);
        // 0, +200, +0, -400, +500
        let expected = [0.0, 200.0, 200.0, -200.0, 300.0];
        for (v, e) in obv.iter().zip(expected) {
            assert_approx(*v, e, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn obv_empty() {
        assert!(Obv::new().compute(&[]).is_empty());
    }
}
