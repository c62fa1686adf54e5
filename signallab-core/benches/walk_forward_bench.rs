//! Criterion benchmarks for the hot paths.
//!
//! 1. Indicator precompute over a multi-year daily series
//! 2. A full walk-forward pass with every built-in evaluator registered

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use signallab_core::domain::{Candle, Series};
use signallab_core::engine::{run_walk_forward, WalkForwardConfig};
use signallab_core::evaluator::{EvaluatorRegistry, EvaluatorSpec, EVALUATOR_TYPES};
use signallab_core::indicators::IndicatorSet;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_candles(n: usize) -> Vec<Candle> {
    let base = Utc.with_ymd_and_hms(2015, 1, 2, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.05).sin() * 10.0 + i as f64 * 0.02;
            let open = close - 0.3;
            Candle {
                timestamp: base + Duration::days(i as i64),
                open,
                high: close + 1.5,
                low: open - 1.5,
                close,
                volume: 1_000_000.0 + (i % 500) as f64 * 1000.0,
            }
        })
        .collect()
}

fn full_registry() -> EvaluatorRegistry {
    let specs: Vec<EvaluatorSpec> = EVALUATOR_TYPES.iter().map(|t| EvaluatorSpec::new(*t)).collect();
    EvaluatorRegistry::from_specs(&specs).unwrap()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_indicator_precompute(c: &mut Criterion) {
    let registry = full_registry();
    let indicators = registry.required_indicators();
    let mut group = c.benchmark_group("indicator_precompute");
    for n in [500usize, 2500] {
        let candles = make_candles(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &candles, |b, candles| {
            b.iter(|| IndicatorSet::precompute(black_box(candles), &indicators))
        });
    }
    group.finish();
}

fn bench_walk_forward(c: &mut Criterion) {
    let registry = full_registry();
    let config = WalkForwardConfig::default();
    let mut group = c.benchmark_group("walk_forward");
    for n in [500usize, 2500] {
        let series = Series::new("BENCH", make_candles(n)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &series, |b, series| {
            b.iter(|| run_walk_forward(black_box(series), &registry, &config).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_indicator_precompute, bench_walk_forward);
criterion_main!(benches);
