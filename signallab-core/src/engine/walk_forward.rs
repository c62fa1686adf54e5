//! Walk-forward runner: one sequential pass over the test range.
//!
//! For each bar `t` in `[start, end]`:
//! 1. Every registered evaluator sees a `HistoryView` of bars `0..=t`.
//! 2. A fire is recorded only if the evaluator's last recorded fire is at least
//!    `debounce_bars` behind; otherwise it is counted as suppressed.
//! 3. If `min_combo_size` or more evaluators fired on the bar, the sorted set of
//!    their ids forms a combo key with its own debounce. Tracked combos fire when
//!    all their members fired on the bar, under a separate debounce and record.
//!
//! An evaluator reading an indicator that is undefined across the whole range is
//! skipped for the pass and flagged in its diagnostics.
//!
//! Debounce state lives in the runner instance, so independent runs never share it.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::Series;
use crate::evaluator::EvaluatorRegistry;
use crate::indicators::IndicatorSet;

use super::config::{ConfigError, WalkForwardConfig, COMBO_SEPARATOR};
use super::outcome::{measure_outcome, Outcome};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// A recorded fire. Created once per debounce window, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalFire {
    pub evaluator_id: String,
    pub bar_index: usize,
    pub date: NaiveDate,
    pub entry_price: f64,
}

/// A fire together with its forward outcome, if enough bars followed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasuredFire {
    pub fire: SignalFire,
    pub outcome: Option<Outcome>,
}

impl MeasuredFire {
    pub fn return_at(&self, horizon: usize) -> Option<f64> {
        self.outcome.as_ref()?.return_at(horizon)
    }
}

/// Fires of one combination key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboRecord {
    pub members: Vec<String>,
    /// True for caller-named combos, false for automatically detected sets.
    pub tracked: bool,
    pub fires: Vec<MeasuredFire>,
}

/// Per-evaluator counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorDiagnostics {
    /// Bars on which `fire` returned true.
    pub raw_fires: usize,
    /// Raw fires swallowed by debounce.
    pub suppressed: usize,
    /// Fires recorded (raw - suppressed).
    pub recorded: usize,
    /// Recorded fires without an outcome.
    pub unmeasured: usize,
    /// Never evaluated: a required indicator is undefined over the whole test range.
    #[serde(default)]
    pub skipped: bool,
}

/// Everything one walk-forward pass produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardResult {
    pub symbol: String,
    pub bars: usize,
    /// Longest warm-up across evaluators and indicators.
    pub warmup: usize,
    /// Inclusive bar range evaluated; `None` when the range is empty.
    pub range: Option<(usize, usize)>,
    /// One entry per registered evaluator, including those that never fired.
    pub fires: BTreeMap<String, Vec<MeasuredFire>>,
    pub combos: BTreeMap<String, ComboRecord>,
    pub diagnostics: BTreeMap<String, EvaluatorDiagnostics>,
}

impl WalkForwardResult {
    pub fn total_fires(&self) -> usize {
        self.fires.values().map(Vec::len).sum()
    }

    pub fn fires_for(&self, evaluator_id: &str) -> &[MeasuredFire] {
        self.fires.get(evaluator_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Dates of the first and last evaluated bars.
    pub fn date_range(&self, series: &Series) -> Option<(NaiveDate, NaiveDate)> {
        let (start, end) = self.range?;
        Some((series.get(start)?.date(), series.get(end)?.date()))
    }
}

/// Minimum-distance debounce keyed by evaluator id or combo key.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: usize,
    last: HashMap<String, usize>,
}

impl Debouncer {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            last: HashMap::new(),
        }
    }

    /// Record `key` at bar `t` if its last recorded bar is at least `window` back.
    pub fn try_record(&mut self, key: &str, t: usize) -> bool {
        if let Some(&last) = self.last.get(key) {
            if t.saturating_sub(last) < self.window {
                return false;
            }
        }
        self.last.insert(key.to_string(), t);
        true
    }
}

/// Automatic keys and tracked names are debounced independently.
struct ComboDebounce {
    automatic: Debouncer,
    tracked: Debouncer,
}

/// Single-series walk-forward runner.
pub struct WalkForwardRunner<'a> {
    registry: &'a EvaluatorRegistry,
    config: &'a WalkForwardConfig,
}

impl<'a> WalkForwardRunner<'a> {
    /// Validates the configuration against the registry.
    pub fn new(
        registry: &'a EvaluatorRegistry,
        config: &'a WalkForwardConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        for combo in &config.tracked_combos {
            if let Some(member) = combo.members.iter().find(|m| !registry.contains(m)) {
                return Err(ConfigError::UnknownComboMember {
                    combo: combo.name.clone(),
                    member: member.clone(),
                }
                .into());
            }
        }
        Ok(Self { registry, config })
    }

    /// Run the pass over `series`.
    ///
    /// A series too short for the warm-up plus the longest horizon yields an empty
    /// range and zero fires rather than an error.
    pub fn run(&self, series: &Series) -> Result<WalkForwardResult, EngineError> {
        let candles = series.candles();
        let n = candles.len();
        let indicators = self.registry.required_indicators();
        let indicator_warmup = crate::indicators::max_lookback(&indicators);
        let warmup = indicator_warmup.max(self.registry.max_warmup());

        if let Some(start) = self.config.start {
            if start < warmup {
                return Err(ConfigError::StartBeforeWarmup { start, warmup }.into());
            }
        }

        let mut result = WalkForwardResult {
            symbol: series.symbol().to_string(),
            bars: n,
            warmup,
            range: None,
            fires: self.registry.ids().map(|id| (id.to_string(), Vec::new())).collect(),
            combos: BTreeMap::new(),
            diagnostics: self
                .registry
                .ids()
                .map(|id| (id.to_string(), EvaluatorDiagnostics::default()))
                .collect(),
        };

        let start = self.config.start.unwrap_or(warmup);
        let last_allowed = (n - 1).checked_sub(self.config.outcome.max_horizon());
        let end = match (last_allowed, self.config.end) {
            (Some(limit), Some(end)) => Some(limit.min(end)),
            (limit, None) => limit,
            (None, Some(_)) => None,
        };
        let end = match end {
            Some(end) if end >= start => end,
            _ => {
                warn!(
                    symbol = series.symbol(),
                    bars = n,
                    warmup,
                    horizon = self.config.outcome.max_horizon(),
                    "empty test range; no bars evaluated"
                );
                return Ok(result);
            }
        };
        result.range = Some((start, end));

        info!(
            symbol = series.symbol(),
            start,
            end,
            evaluators = self.registry.len(),
            "walk-forward pass started"
        );

        let indicator_set = IndicatorSet::precompute(candles, &indicators);
        let skipped = self.unusable_evaluators(&indicator_set, start, end);
        for &id in &skipped {
            result.diagnostics.entry(id.to_string()).or_default().skipped = true;
        }

        let mut debounce = Debouncer::new(self.config.debounce_bars);
        let mut combo_debounce = ComboDebounce {
            automatic: Debouncer::new(self.config.combo_debounce_bars),
            tracked: Debouncer::new(self.config.combo_debounce_bars),
        };
        let mut fired: Vec<&str> = Vec::with_capacity(self.registry.len());

        for t in start..=end {
            let Some(view) = series.view(t, &indicator_set) else {
                break;
            };

            fired.clear();
            for evaluator in self.registry.iter() {
                if t >= evaluator.warmup_bars()
                    && !skipped.contains(evaluator.id())
                    && evaluator.fire(&view)
                {
                    fired.push(evaluator.id());
                }
            }

            for &id in &fired {
                let diag = result.diagnostics.entry(id.to_string()).or_default();
                diag.raw_fires += 1;
                if !debounce.try_record(id, t) {
                    diag.suppressed += 1;
                    continue;
                }
                diag.recorded += 1;
                let measured = self.measure(series, id, t);
                if measured.outcome.is_none() {
                    diag.unmeasured += 1;
                }
                debug!(evaluator = id, bar = t, "fire recorded");
                result.fires.entry(id.to_string()).or_default().push(measured);
            }

            self.record_combos(series, t, &fired, &mut combo_debounce, &mut result.combos);
        }

        info!(
            symbol = series.symbol(),
            fires = result.total_fires(),
            combos = result.combos.len(),
            "walk-forward pass finished"
        );
        Ok(result)
    }

    /// Evaluators reading an indicator with no valid value anywhere in `[start, end]`.
    fn unusable_evaluators(
        &self,
        set: &IndicatorSet,
        start: usize,
        end: usize,
    ) -> HashSet<&'a str> {
        let registry: &'a EvaluatorRegistry = self.registry;
        registry
            .iter()
            .filter_map(|evaluator| {
                let missing = evaluator.required_indicators().into_iter().find(|indicator| {
                    set.get(indicator.name())
                        .map_or(true, |s| !(start..=end).any(|t| s.is_valid_at(t)))
                })?;
                warn!(
                    evaluator = evaluator.id(),
                    indicator = missing.name(),
                    "indicator undefined over the test range; evaluator skipped"
                );
                Some(evaluator.id())
            })
            .collect()
    }

    fn measure(&self, series: &Series, key: &str, t: usize) -> MeasuredFire {
        let candles = series.candles();
        let bar = &candles[t];
        MeasuredFire {
            fire: SignalFire {
                evaluator_id: key.to_string(),
                bar_index: t,
                date: bar.date(),
                entry_price: bar.close,
            },
            outcome: measure_outcome(candles, t, &self.config.outcome),
        }
    }

    fn record_combos(
        &self,
        series: &Series,
        t: usize,
        fired: &[&str],
        debounce: &mut ComboDebounce,
        combos: &mut BTreeMap<String, ComboRecord>,
    ) {
        // `fired` follows registry order, which is already sorted by id.
        if fired.len() >= self.config.min_combo_size {
            let key = fired.join(COMBO_SEPARATOR);
            if debounce.automatic.try_record(&key, t) {
                let measured = self.measure(series, &key, t);
                combos
                    .entry(key)
                    .or_insert_with(|| ComboRecord {
                        members: fired.iter().map(|s| s.to_string()).collect(),
                        tracked: false,
                        fires: Vec::new(),
                    })
                    .fires
                    .push(measured);
            }
        }

        for combo in &self.config.tracked_combos {
            let all_fired = combo.members.iter().all(|m| fired.contains(&m.as_str()));
            if !all_fired || !debounce.tracked.try_record(&combo.name, t) {
                continue;
            }
            let measured = self.measure(series, &combo.name, t);
            combos
                .entry(combo.name.clone())
                .or_insert_with(|| {
                    let mut members = combo.members.clone();
                    members.sort();
                    members.dedup();
                    ComboRecord {
                        members,
                        tracked: true,
                        fires: Vec::new(),
                    }
                })
                .fires
                .push(measured);
        }
    }
}

/// Convenience wrapper: validate, then run one pass.
pub fn run_walk_forward(
    series: &Series,
    registry: &EvaluatorRegistry,
    config: &WalkForwardConfig,
) -> Result<WalkForwardResult, EngineError> {
    WalkForwardRunner::new(registry, config)?.run(series)
}
