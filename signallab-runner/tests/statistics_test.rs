//! Statistical behaviour over hand-built fire sets.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use signallab_core::engine::{
    EvaluatorDiagnostics, HorizonSnapshot, MeasuredFire, Outcome, RaceOutcome, RaceResult,
    SignalFire, WalkForwardResult,
};
use signallab_runner::metrics::{sharpe_approx, win_rate_pct};
use signallab_runner::{
    aggregate_evaluators, confidence_interval, head_to_head, welch_t_test, EvaluatorStats,
    GradingConfig, PValueMethod, StatsConfig,
};

const HORIZONS: [usize; 3] = [7, 14, 30];

fn fire(id: &str, bar: usize, ret: Option<f64>) -> MeasuredFire {
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(bar as i64);
    MeasuredFire {
        fire: SignalFire {
            evaluator_id: id.to_string(),
            bar_index: bar,
            date,
            entry_price: 100.0,
        },
        outcome: ret.map(|r| Outcome {
            entry_bar: bar,
            entry_price: 100.0,
            horizons: HORIZONS
                .iter()
                .map(|&h| HorizonSnapshot {
                    horizon: h,
                    bars_observed: h,
                    horizon_return: r,
                    max_gain: r.max(0.0),
                    max_drawdown: r.min(0.0),
                })
                .collect(),
            race: RaceOutcome {
                result: RaceResult::Neither,
                day: None,
            },
        }),
    }
}

fn pass_with(fires: Vec<(&str, Vec<MeasuredFire>)>) -> WalkForwardResult {
    WalkForwardResult {
        symbol: "HAND".into(),
        bars: 500,
        warmup: 0,
        range: Some((0, 469)),
        diagnostics: fires
            .iter()
            .map(|(id, _)| (id.to_string(), EvaluatorDiagnostics::default()))
            .collect(),
        fires: fires
            .into_iter()
            .map(|(id, f)| (id.to_string(), f))
            .collect(),
        combos: BTreeMap::new(),
    }
}

#[test]
fn disjoint_distributions_on_identical_bars_are_significant() {
    let bars = [10, 40, 70, 100, 130, 160, 190, 220];
    let wobble = |i: usize| (i % 3) as f64 * 0.002;
    let ups = bars
        .iter()
        .enumerate()
        .map(|(i, &b)| fire("up", b, Some(0.05 + wobble(i))))
        .collect();
    let downs = bars
        .iter()
        .enumerate()
        .map(|(i, &b)| fire("down", b, Some(-0.05 - wobble(i))))
        .collect();
    let result = pass_with(vec![("down", downs), ("up", ups)]);

    let test = head_to_head(&result, "up", "down", 30, &StatsConfig::default()).unwrap();
    assert!(test.t > 3.5);
    assert!(test.p_approx <= 0.01);
    assert!(test.p_exact < 0.001);
    assert!(test.is_approximate());

    let reversed = head_to_head(&result, "down", "up", 30, &StatsConfig::default()).unwrap();
    assert!((reversed.t + test.t).abs() < 1e-9);
}

#[test]
fn overlapping_distributions_are_not_significant() {
    let a = [0.01, -0.02, 0.03, -0.01, 0.02, 0.0];
    let b = [0.02, -0.01, 0.01, -0.02, 0.03, -0.01];
    let test = welch_t_test(&a, &b, PValueMethod::Exact).unwrap();
    assert!(test.t.abs() < 1.0);
    assert!(!test.is_significant(0.05));
    assert_eq!(test.p_value, test.p_exact);
}

#[test]
fn unmeasured_fires_count_but_do_not_dilute_rates() {
    let fires = vec![
        fire("x", 10, Some(0.04)),
        fire("x", 30, Some(-0.02)),
        fire("x", 50, Some(0.01)),
        fire("x", 490, None),
    ];
    let stats = EvaluatorStats::compute(
        "x",
        &fires,
        &HORIZONS,
        &StatsConfig::default(),
        &GradingConfig::default(),
    );
    assert_eq!(stats.fires, 4);
    assert_eq!(stats.measured, 3);
    assert!((stats.win_rate(7) - 200.0 / 3.0).abs() < 1e-9);
    assert!((stats.mean_return(30) - 0.01).abs() < 1e-12);
}

#[test]
fn aggregation_keeps_registry_order_and_silent_entries() {
    let result = pass_with(vec![
        ("alpha", vec![fire("alpha", 5, Some(0.02))]),
        ("omega", Vec::new()),
    ]);
    let stats = aggregate_evaluators(
        &result,
        &HORIZONS,
        &StatsConfig::default(),
        &GradingConfig::default(),
    );
    let ids: Vec<_> = stats.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["alpha", "omega"]);
    assert!(stats[1].never_fired());
}

fn returns() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.5f64..0.5, 0..60)
}

proptest! {
    #[test]
    fn win_rate_is_the_share_of_positive_returns(values in returns()) {
        let rate = win_rate_pct(&values);
        prop_assert!((0.0..=100.0).contains(&rate));
        if values.is_empty() {
            prop_assert_eq!(rate, 0.0);
        } else {
            let positives = values.iter().filter(|&&v| v > 0.0).count();
            let expected = positives as f64 / values.len() as f64 * 100.0;
            prop_assert!((rate - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn sharpe_of_constant_returns_is_zero(value in -0.5f64..0.5, n in 0usize..40) {
        let values = vec![value; n];
        prop_assert_eq!(sharpe_approx(&values, 52.0), 0.0);
    }

    #[test]
    fn sharpe_sign_follows_the_mean(values in prop::collection::vec(-0.5f64..0.5, 2..60)) {
        let sharpe = sharpe_approx(&values, 52.0);
        prop_assert!(sharpe.is_finite());
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        if sharpe != 0.0 {
            prop_assert_eq!(sharpe > 0.0, mean > 0.0);
        }
    }

    #[test]
    fn confidence_interval_brackets_the_mean(values in returns(), level in 0.5f64..0.99) {
        let ci = confidence_interval(&values, level);
        prop_assert!(ci.lower <= ci.mean && ci.mean <= ci.upper);
        prop_assert!(ci.contains(ci.mean));
    }

    #[test]
    fn evaluator_win_rate_uses_measured_fires(
        outcomes in prop::collection::vec(prop::option::of(-0.3f64..0.3), 0..40)
    ) {
        let fires: Vec<_> = outcomes
            .iter()
            .enumerate()
            .map(|(i, r)| fire("p", i * 10, *r))
            .collect();
        let stats = EvaluatorStats::compute(
            "p",
            &fires,
            &HORIZONS,
            &StatsConfig::default(),
            &GradingConfig::default(),
        );
        let measured: Vec<f64> = outcomes.iter().flatten().copied().collect();
        prop_assert_eq!(stats.fires, outcomes.len());
        prop_assert_eq!(stats.measured, measured.len());
        prop_assert!((stats.win_rate(30) - win_rate_pct(&measured)).abs() < 1e-9);
        if stats.fires == 0 {
            prop_assert!(stats.grade.is_none());
        }
    }
}
