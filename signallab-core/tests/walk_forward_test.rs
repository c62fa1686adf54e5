//! End-to-end walk-forward tests: scripted scenarios plus debounce and race properties.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use signallab_core::domain::{Candle, Series};
use signallab_core::engine::{
    measure_outcome, run_walk_forward, OutcomeConfig, RaceResult, WalkForwardConfig,
};
use signallab_core::evaluator::{EvaluatorRegistry, FnEvaluator, MaReclaim};

// ── Helpers ──────────────────────────────────────────────────────────

fn candles_from(closes: &[f64]) -> Vec<Candle> {
    let base = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: base + Duration::days(i as i64),
                open,
                high: open.max(close) * 1.005,
                low: open.min(close) * 0.995,
                close,
                volume: 1_000_000.0,
            }
        })
        .collect()
}

/// 300 bars: flat, a dip below the 200-bar average at 215, a reclaim at 250.
fn reclaim_series() -> Series {
    let closes: Vec<f64> = (0..300)
        .map(|i| match i {
            0..=214 => 100.0,
            215..=249 => 90.0,
            _ => 120.0,
        })
        .collect();
    Series::new("SCRIPTED", candles_from(&closes)).unwrap()
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn ma_reclaim_fires_exactly_once_at_bar_250() {
    let series = reclaim_series();
    let mut registry = EvaluatorRegistry::new();
    registry.register(Box::new(MaReclaim::new(200))).unwrap();
    let config = WalkForwardConfig {
        start: Some(210),
        ..Default::default()
    };

    let result = run_walk_forward(&series, &registry, &config).unwrap();
    assert_eq!(result.range, Some((210, 269)));

    let fires = result.fires_for("ma_reclaim");
    assert_eq!(fires.len(), 1);
    let fire = &fires[0];
    assert_eq!(fire.fire.bar_index, 250);
    assert_eq!(fire.fire.entry_price, 120.0);
    assert_eq!(fire.fire.date, series.get(250).unwrap().date());

    // Flat at 120 afterwards: zero return, neither threshold hit.
    let outcome = fire.outcome.as_ref().unwrap();
    assert_eq!(outcome.return_at(30), Some(0.0));
    assert_eq!(outcome.race.result, RaceResult::Neither);
}

#[test]
fn win_reported_on_day_five() {
    // Entry at bar 40; +12% high on day 5, lows never below -3%.
    let mut closes = vec![100.0; 80];
    for (d, close) in [(1, 101.0), (2, 102.0), (3, 103.0), (4, 104.0), (5, 111.0)] {
        closes[40 + d] = close;
    }
    for close in closes.iter_mut().skip(46) {
        *close = 110.0;
    }
    let mut candles = candles_from(&closes);
    candles[45].high = 112.0;
    for c in candles.iter_mut().skip(41) {
        c.low = c.low.max(97.0);
    }
    let series = Series::new("SCRIPTED", candles).unwrap();

    let mut registry = EvaluatorRegistry::new();
    registry
        .register(Box::new(FnEvaluator::new("entry_40", 0, |v| v.t() == 40)))
        .unwrap();
    let result = run_walk_forward(&series, &registry, &WalkForwardConfig::default()).unwrap();

    let outcome = result.fires_for("entry_40")[0].outcome.clone().unwrap();
    assert_eq!(outcome.race.result, RaceResult::Win);
    assert_eq!(outcome.race.day, Some(5));
    assert!(outcome.horizon(7).unwrap().max_drawdown >= -0.03);
}

#[test]
fn never_firing_evaluator_reports_zero_fires() {
    let series = reclaim_series();
    let mut registry = EvaluatorRegistry::new();
    registry
        .register(Box::new(FnEvaluator::new("never", 0, |_| false)))
        .unwrap();
    let result = run_walk_forward(&series, &registry, &WalkForwardConfig::default()).unwrap();
    assert!(result.fires_for("never").is_empty());
    assert_eq!(result.diagnostics["never"].raw_fires, 0);
    assert!(result.combos.is_empty());
}

#[test]
fn fires_near_the_end_keep_their_outcome_horizon() {
    // With an explicit end and a short horizon config, every recorded fire is measured.
    let series = reclaim_series();
    let mut registry = EvaluatorRegistry::new();
    registry
        .register(Box::new(FnEvaluator::new("always", 0, |_| true)))
        .unwrap();
    let config = WalkForwardConfig {
        outcome: OutcomeConfig {
            horizons: vec![5, 10],
            race_horizon: 10,
            min_forward_bars: 5,
            ..Default::default()
        },
        ..Default::default()
    };
    let result = run_walk_forward(&series, &registry, &config).unwrap();
    assert_eq!(result.range, Some((0, 289)));
    assert_eq!(result.diagnostics["always"].unmeasured, 0);
    assert!(result
        .fires_for("always")
        .iter()
        .all(|f| f.outcome.as_ref().is_some_and(|o| !o.horizon(10).unwrap().is_truncated())));
}

// ── Properties ───────────────────────────────────────────────────────

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.97f64..1.03, 60..160).prop_map(|steps| {
        let mut price = 100.0;
        steps
            .into_iter()
            .map(|s| {
                price *= s;
                price
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// No two recorded fires of one evaluator are closer than the debounce window.
    #[test]
    fn recorded_fires_respect_debounce(
        closes in arb_closes(),
        fire_mask in prop::collection::vec(any::<bool>(), 160),
        window in 1usize..12,
    ) {
        let series = Series::new("PROP", candles_from(&closes)).unwrap();
        let mut registry = EvaluatorRegistry::new();
        registry
            .register(Box::new(FnEvaluator::new("masked", 0, move |v| fire_mask[v.t()])))
            .unwrap();
        let config = WalkForwardConfig { debounce_bars: window, ..Default::default() };
        let result = run_walk_forward(&series, &registry, &config).unwrap();

        let bars: Vec<usize> = result.fires_for("masked").iter().map(|f| f.fire.bar_index).collect();
        for pair in bars.windows(2) {
            prop_assert!(pair[1] - pair[0] >= window, "fires {:?} closer than {}", pair, window);
        }
        let diag = result.diagnostics["masked"];
        prop_assert_eq!(diag.recorded + diag.suppressed, diag.raw_fires);
        prop_assert_eq!(diag.recorded, bars.len());
    }

    /// The race result is a pure function of the forward path.
    #[test]
    fn race_is_deterministic(closes in arb_closes(), entry in 0usize..50) {
        let candles = candles_from(&closes);
        let config = OutcomeConfig::default();
        let first = measure_outcome(&candles, entry, &config);
        let second = measure_outcome(&candles, entry, &config);
        prop_assert_eq!(&first, &second);

        if let Some(outcome) = first {
            match outcome.race.result {
                RaceResult::Neither => prop_assert!(outcome.race.day.is_none()),
                _ => prop_assert!(outcome.race.day.is_some_and(|d| d >= 1 && d <= config.race_horizon)),
            }
        }
    }
}
