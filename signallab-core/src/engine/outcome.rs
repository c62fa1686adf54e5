//! Outcome measurer: forward returns, excursions and the take-profit / stop-loss race.
//!
//! Given a fire at bar `e` with entry price `P = close[e]`, the measurer walks
//! `d = 1..=min(max_horizon, N-1-e)` once and records, per horizon bucket:
//! - `max_gain`: running max of `(high[e+d] - P) / P`
//! - `max_drawdown`: running min of `(low[e+d] - P) / P`
//! - `return`: `(close[e+h] - P) / P` at the bucket's last observed bar
//!
//! The race uses intraday highs and lows: the first bar crossing take-profit or
//! stop-loss decides the result. A bar crossing both goes to the configured
//! `TieBreak`.

use serde::{Deserialize, Serialize};

use crate::domain::Candle;

use super::config::{OutcomeConfig, TieBreak};

/// Result of the take-profit / stop-loss race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RaceResult {
    Win,
    Loss,
    Neither,
}

/// Race result plus the bar offset (1-based) at which it was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceOutcome {
    pub result: RaceResult,
    /// `None` for `Neither`.
    pub day: Option<usize>,
}

/// Snapshot of one horizon bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonSnapshot {
    pub horizon: usize,
    /// Forward bars actually observed. Less than `horizon` near the end of a series.
    pub bars_observed: usize,
    #[serde(rename = "return")]
    pub horizon_return: f64,
    pub max_gain: f64,
    pub max_drawdown: f64,
}

impl HorizonSnapshot {
    pub fn is_truncated(&self) -> bool {
        self.bars_observed < self.horizon
    }
}

/// Forward outcome of one fire. Computed once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub entry_bar: usize,
    pub entry_price: f64,
    pub horizons: Vec<HorizonSnapshot>,
    pub race: RaceOutcome,
}

impl Outcome {
    pub fn horizon(&self, horizon: usize) -> Option<&HorizonSnapshot> {
        self.horizons.iter().find(|h| h.horizon == horizon)
    }

    pub fn return_at(&self, horizon: usize) -> Option<f64> {
        self.horizon(horizon).map(|h| h.horizon_return)
    }
}

/// Measure the outcome of a fire at `entry_bar`.
///
/// Returns `None` when fewer than `min_forward_bars` bars follow the entry or the
/// entry bar is out of range.
pub fn measure_outcome(candles: &[Candle], entry_bar: usize, config: &OutcomeConfig) -> Option<Outcome> {
    let entry = candles.get(entry_bar)?;
    let remaining = candles.len() - 1 - entry_bar;
    if remaining < config.min_forward_bars {
        return None;
    }

    let p = entry.close;
    let walk = config.max_horizon().min(remaining);

    let mut horizons = Vec::with_capacity(config.horizons.len());
    let mut buckets = config.horizons.iter().copied().peekable();
    let mut race: Option<RaceOutcome> = None;
    let mut max_gain = f64::NEG_INFINITY;
    let mut max_drawdown = f64::INFINITY;

    for d in 1..=walk {
        let bar = &candles[entry_bar + d];
        let gain = (bar.high - p) / p;
        let drawdown = (bar.low - p) / p;
        max_gain = max_gain.max(gain);
        max_drawdown = max_drawdown.min(drawdown);

        if race.is_none() && d <= config.race_horizon {
            race = race_step(gain, drawdown, d, config);
        }

        // Close every bucket whose last bar is `d`, or the last walked bar.
        while let Some(&h) = buckets.peek() {
            if h != d && d != walk {
                break;
            }
            horizons.push(HorizonSnapshot {
                horizon: h,
                bars_observed: d,
                horizon_return: (bar.close - p) / p,
                max_gain,
                max_drawdown,
            });
            buckets.next();
        }
    }

    Some(Outcome {
        entry_bar,
        entry_price: p,
        horizons,
        race: race.unwrap_or(RaceOutcome {
            result: RaceResult::Neither,
            day: None,
        }),
    })
}

fn race_step(gain: f64, drawdown: f64, day: usize, config: &OutcomeConfig) -> Option<RaceOutcome> {
    let tp = gain >= config.take_profit;
    let sl = drawdown <= config.stop_loss;
    let result = match (tp, sl) {
        (false, false) => return None,
        (true, false) => RaceResult::Win,
        (false, true) => RaceResult::Loss,
        (true, true) => match config.tie_break {
            TieBreak::TakeProfit => RaceResult::Win,
            TieBreak::StopLoss => RaceResult::Loss,
            TieBreak::Neither => RaceResult::Neither,
        },
    };
    // A tie settled as `Neither` has no winning day.
    let day = (result != RaceResult::Neither).then_some(day);
    Some(RaceOutcome { result, day })
}
