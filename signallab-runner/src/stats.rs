//! Aggregator: collapses measured fires into per-evaluator and per-combo statistics.
//!
//! Only fires with an outcome contribute to return statistics; unmeasured fires are
//! still counted in `fires`. An evaluator with no recorded fires gets a complete
//! record with status `NeverFired` and zeroed metrics, so nothing downstream has to
//! special-case it.

use serde::{Deserialize, Serialize};

use signallab_core::engine::{ComboRecord, MeasuredFire, RaceResult, SignalFire, WalkForwardResult};

use crate::metrics::{
    calmar_ratio, equity_curve, max_drawdown, mean, median, sample_variance, sharpe_approx,
    total_return, win_rate_pct,
};
use crate::significance::{confidence_interval, ConfidenceInterval, PValueMethod};

// ─── Configuration ───────────────────────────────────────────────────

/// Aggregation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Multiplier under the square root in the Sharpe approximation.
    pub annualization_factor: f64,
    /// Confidence level for mean-return intervals, in (0, 1).
    pub confidence_level: f64,
    /// Horizon whose returns feed Sharpe, the equity curve and Calmar.
    pub primary_horizon: usize,
    /// Combos with fewer recorded fires are left out of the report.
    pub min_combo_fires: usize,
    /// Number of fires kept verbatim in each stats record.
    pub sample_fires: usize,
    pub p_value_method: PValueMethod,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            annualization_factor: 52.0,
            confidence_level: 0.95,
            primary_horizon: 30,
            min_combo_fires: 2,
            sample_fires: 5,
            p_value_method: PValueMethod::Banded,
        }
    }
}

/// One rung of the grading ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeThreshold {
    pub grade: String,
    /// Minimum mean return at the grading horizon, as a fraction.
    pub min_mean_return: f64,
    /// Minimum win rate at the grading horizon, in percent.
    pub min_win_rate: f64,
}

impl GradeThreshold {
    pub fn new(grade: impl Into<String>, min_mean_return: f64, min_win_rate: f64) -> Self {
        Self {
            grade: grade.into(),
            min_mean_return,
            min_win_rate,
        }
    }
}

/// Ordered grading ladder. The first threshold whose minimums are both met wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
    pub horizon: usize,
    pub thresholds: Vec<GradeThreshold>,
    /// Grade for a fired evaluator that meets no threshold.
    pub fallback: String,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            horizon: 30,
            thresholds: vec![
                GradeThreshold::new("A+", 0.08, 70.0),
                GradeThreshold::new("A", 0.05, 60.0),
                GradeThreshold::new("B", 0.03, 55.0),
                GradeThreshold::new("C", 0.01, 50.0),
                GradeThreshold::new("D", 0.0, 45.0),
            ],
            fallback: "F".into(),
        }
    }
}

impl GradingConfig {
    /// Grade a `(mean return, win rate %)` pair.
    pub fn grade(&self, mean_return: f64, win_rate: f64) -> &str {
        self.thresholds
            .iter()
            .find(|t| mean_return >= t.min_mean_return && win_rate >= t.min_win_rate)
            .map(|t| t.grade.as_str())
            .unwrap_or(self.fallback.as_str())
    }
}

// ─── Records ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FireStatus {
    Fired,
    NeverFired,
}

/// Return distribution at one horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonStats {
    pub horizon: usize,
    pub samples: usize,
    /// Percent of samples with a strictly positive return, 0..=100.
    pub win_rate: f64,
    pub mean_return: f64,
    pub median_return: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub mean_max_gain: f64,
    pub mean_max_drawdown: f64,
    pub confidence_interval: ConfidenceInterval,
}

/// Take-profit / stop-loss race counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RaceTally {
    pub wins: usize,
    pub losses: usize,
    pub neither: usize,
    /// Wins as a percent of all measured races.
    pub win_rate: f64,
    /// Mean bar offset of winning races. 0.0 without wins.
    pub mean_days_to_win: f64,
}

/// Aggregated statistics for one evaluator or combo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorStats {
    pub id: String,
    pub status: FireStatus,
    /// Recorded fires, measured or not.
    pub fires: usize,
    /// Fires with an outcome. The denominator of every rate below.
    pub measured: usize,
    pub horizons: Vec<HorizonStats>,
    pub sharpe: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub calmar: f64,
    pub race: RaceTally,
    /// `None` when the evaluator never fired.
    pub grade: Option<String>,
    pub sample_fires: Vec<SignalFire>,
}

impl EvaluatorStats {
    /// Aggregate `fires` (in bar order) over the configured horizons.
    pub fn compute(
        id: &str,
        fires: &[MeasuredFire],
        horizons: &[usize],
        config: &StatsConfig,
        grading: &GradingConfig,
    ) -> Self {
        let measured: Vec<_> = fires.iter().filter_map(|f| f.outcome.as_ref()).collect();

        let horizon_stats: Vec<HorizonStats> = horizons
            .iter()
            .map(|&h| {
                let snaps: Vec<_> = measured.iter().filter_map(|o| o.horizon(h)).collect();
                let returns: Vec<f64> = snaps.iter().map(|s| s.horizon_return).collect();
                let gains: Vec<f64> = snaps.iter().map(|s| s.max_gain).collect();
                let drawdowns: Vec<f64> = snaps.iter().map(|s| s.max_drawdown).collect();
                let variance = sample_variance(&returns);
                HorizonStats {
                    horizon: h,
                    samples: returns.len(),
                    win_rate: win_rate_pct(&returns),
                    mean_return: mean(&returns),
                    median_return: median(&returns),
                    variance,
                    std_dev: variance.sqrt(),
                    mean_max_gain: mean(&gains),
                    mean_max_drawdown: mean(&drawdowns),
                    confidence_interval: confidence_interval(&returns, config.confidence_level),
                }
            })
            .collect();

        let primary: Vec<f64> = measured
            .iter()
            .filter_map(|o| o.return_at(config.primary_horizon))
            .collect();
        let curve = equity_curve(&primary);
        let total = total_return(&curve);
        let mdd = max_drawdown(&curve);

        let mut race = RaceTally::default();
        let mut win_days = Vec::new();
        for outcome in &measured {
            match outcome.race.result {
                RaceResult::Win => {
                    race.wins += 1;
                    if let Some(day) = outcome.race.day {
                        win_days.push(day as f64);
                    }
                }
                RaceResult::Loss => race.losses += 1,
                RaceResult::Neither => race.neither += 1,
            }
        }
        if !measured.is_empty() {
            race.win_rate = race.wins as f64 / measured.len() as f64 * 100.0;
        }
        race.mean_days_to_win = mean(&win_days);

        let status = if fires.is_empty() {
            FireStatus::NeverFired
        } else {
            FireStatus::Fired
        };
        let grade = (status == FireStatus::Fired).then(|| {
            let (mean_return, win_rate) = horizon_stats
                .iter()
                .find(|s| s.horizon == grading.horizon)
                .map(|s| (s.mean_return, s.win_rate))
                .unwrap_or((0.0, 0.0));
            grading.grade(mean_return, win_rate).to_string()
        });

        Self {
            id: id.to_string(),
            status,
            fires: fires.len(),
            measured: measured.len(),
            horizons: horizon_stats,
            sharpe: sharpe_approx(&primary, config.annualization_factor),
            total_return: total,
            max_drawdown: mdd,
            calmar: calmar_ratio(total, mdd),
            race,
            grade,
            sample_fires: fires
                .iter()
                .take(config.sample_fires)
                .map(|f| f.fire.clone())
                .collect(),
        }
    }

    pub fn never_fired(&self) -> bool {
        self.status == FireStatus::NeverFired
    }

    pub fn horizon(&self, horizon: usize) -> Option<&HorizonStats> {
        self.horizons.iter().find(|s| s.horizon == horizon)
    }

    /// Mean return at `horizon`, 0.0 if the horizon is not tracked.
    pub fn mean_return(&self, horizon: usize) -> f64 {
        self.horizon(horizon).map_or(0.0, |s| s.mean_return)
    }

    /// Win rate (percent) at `horizon`, 0.0 if the horizon is not tracked.
    pub fn win_rate(&self, horizon: usize) -> f64 {
        self.horizon(horizon).map_or(0.0, |s| s.win_rate)
    }
}

/// Statistics of one combination key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboStats {
    pub key: String,
    pub members: Vec<String>,
    pub tracked: bool,
    pub stats: EvaluatorStats,
}

/// Returns of `fires` at `horizon`, skipping unmeasured fires.
pub fn returns_at(fires: &[MeasuredFire], horizon: usize) -> Vec<f64> {
    fires.iter().filter_map(|f| f.return_at(horizon)).collect()
}

// ─── Aggregation over a pass ─────────────────────────────────────────

/// One record per registered evaluator, in id order.
pub fn aggregate_evaluators(
    result: &WalkForwardResult,
    horizons: &[usize],
    config: &StatsConfig,
    grading: &GradingConfig,
) -> Vec<EvaluatorStats> {
    result
        .fires
        .iter()
        .map(|(id, fires)| EvaluatorStats::compute(id, fires, horizons, config, grading))
        .collect()
}

/// Combo records with at least `min_combo_fires` recorded fires.
pub fn aggregate_combos(
    result: &WalkForwardResult,
    horizons: &[usize],
    config: &StatsConfig,
    grading: &GradingConfig,
) -> Vec<ComboStats> {
    result
        .combos
        .iter()
        .filter(|(_, combo)| combo.fires.len() >= config.min_combo_fires)
        .map(|(key, combo)| combo_stats(key, combo, horizons, config, grading))
        .collect()
}

fn combo_stats(
    key: &str,
    combo: &ComboRecord,
    horizons: &[usize],
    config: &StatsConfig,
    grading: &GradingConfig,
) -> ComboStats {
    ComboStats {
        key: key.to_string(),
        members: combo.members.clone(),
        tracked: combo.tracked,
        stats: EvaluatorStats::compute(key, &combo.fires, horizons, config, grading),
    }
}
