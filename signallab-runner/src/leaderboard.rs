//! Leaderboard: evaluators and combos ranked by one configurable metric.
//!
//! Never-fired entries always sort after fired ones regardless of metric, so a
//! zero "mean return" from an empty sample never outranks a real negative one.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::stats::{ComboStats, EvaluatorStats, FireStatus};

/// Which metric to rank by. Higher is better for every variant; max drawdown is
/// negative, so closer to zero ranks higher.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum RankingMetric {
    MeanReturn { horizon: usize },
    MedianReturn { horizon: usize },
    WinRate { horizon: usize },
    Sharpe,
    Calmar,
    MaxDrawdown,
    RaceWinRate,
    Fires,
}

impl Default for RankingMetric {
    fn default() -> Self {
        Self::MeanReturn { horizon: 30 }
    }
}

impl RankingMetric {
    pub fn extract(&self, stats: &EvaluatorStats) -> f64 {
        match *self {
            Self::MeanReturn { horizon } => stats.mean_return(horizon),
            Self::MedianReturn { horizon } => stats.horizon(horizon).map_or(0.0, |h| h.median_return),
            Self::WinRate { horizon } => stats.win_rate(horizon),
            Self::Sharpe => stats.sharpe,
            Self::Calmar => stats.calmar,
            Self::MaxDrawdown => stats.max_drawdown,
            Self::RaceWinRate => stats.race.win_rate,
            Self::Fires => stats.fires as f64,
        }
    }

    /// Horizon the metric reads, if any.
    pub fn horizon(&self) -> Option<usize> {
        match *self {
            Self::MeanReturn { horizon }
            | Self::MedianReturn { horizon }
            | Self::WinRate { horizon } => Some(horizon),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match *self {
            Self::MeanReturn { horizon } => format!("mean {horizon}-bar return"),
            Self::MedianReturn { horizon } => format!("median {horizon}-bar return"),
            Self::WinRate { horizon } => format!("{horizon}-bar win rate"),
            Self::Sharpe => "sharpe".into(),
            Self::Calmar => "calmar".into(),
            Self::MaxDrawdown => "max drawdown".into(),
            Self::RaceWinRate => "race win rate".into(),
            Self::Fires => "fires".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Evaluator,
    Combo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    /// 1-based.
    pub rank: usize,
    pub id: String,
    pub kind: EntryKind,
    pub value: f64,
    pub fires: usize,
    pub status: FireStatus,
    pub grade: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub metric: RankingMetric,
    pub rows: Vec<LeaderboardRow>,
}

impl Leaderboard {
    /// Rank evaluators and combos together.
    pub fn build(
        evaluators: &[EvaluatorStats],
        combos: &[ComboStats],
        metric: RankingMetric,
    ) -> Self {
        let mut rows: Vec<LeaderboardRow> = evaluators
            .iter()
            .map(|s| (s, EntryKind::Evaluator))
            .chain(combos.iter().map(|c| (&c.stats, EntryKind::Combo)))
            .map(|(stats, kind)| LeaderboardRow {
                rank: 0,
                id: stats.id.clone(),
                kind,
                value: metric.extract(stats),
                fires: stats.fires,
                status: stats.status,
                grade: stats.grade.clone(),
            })
            .collect();

        rows.sort_by(compare_rows);
        for (i, row) in rows.iter_mut().enumerate() {
            row.rank = i + 1;
        }
        Self { metric, rows }
    }

    pub fn top(&self, n: usize) -> &[LeaderboardRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn rank_of(&self, id: &str) -> Option<usize> {
        self.rows.iter().find(|r| r.id == id).map(|r| r.rank)
    }
}

fn compare_rows(a: &LeaderboardRow, b: &LeaderboardRow) -> Ordering {
    let fired = |r: &LeaderboardRow| r.status == FireStatus::Fired;
    fired(b)
        .cmp(&fired(a))
        .then_with(|| b.value.total_cmp(&a.value))
        .then_with(|| a.id.cmp(&b.id))
}
