//! Walk-forward engine: configuration, the bar loop, and outcome measurement.
//!
//! Control flow per series:
//! 1. Validate `WalkForwardConfig` (and tracked combos against the registry)
//! 2. Precompute every indicator the registry declares, once
//! 3. Walk `[start, end]`, handing each evaluator a bounded view
//! 4. Debounce fires per evaluator and per combo key
//! 5. Measure each recorded fire's forward outcome

pub mod config;
pub mod outcome;
pub mod walk_forward;

pub use config::{
    ConfigError, OutcomeConfig, TieBreak, TrackedCombo, WalkForwardConfig, COMBO_SEPARATOR,
};
pub use outcome::{measure_outcome, HorizonSnapshot, Outcome, RaceOutcome, RaceResult};
pub use walk_forward::{
    run_walk_forward, ComboRecord, Debouncer, EngineError, EvaluatorDiagnostics, MeasuredFire,
    SignalFire, WalkForwardResult, WalkForwardRunner,
};
