//! SignalLab Core: series store, indicators, signal evaluators, walk-forward runner.
//!
//! This crate contains the no-look-ahead evaluation engine:
//! - Domain types (candles, the series store, the bounded history view)
//! - Indicator library with an explicit warm-up contract
//! - Signal evaluator trait, registry, built-in evaluators and factory
//! - Walk-forward runner with per-evaluator and per-combo debounce
//! - Outcome measurer (horizon snapshots and the take-profit / stop-loss race)

pub mod domain;
pub mod engine;
pub mod evaluator;
pub mod indicators;
