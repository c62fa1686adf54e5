//! Comparator: customized vs generic evaluator groups vs buy-and-hold.
//!
//! A group's sample is the pooled set of its members' measured fires. Each side
//! gets the same summary (mean, win rate, confidence interval) and the two groups
//! are compared with Welch's t-test. Buy-and-hold is `(close[end] - close[start])
//! / close[start]` over the evaluated bar range.

use serde::{Deserialize, Serialize};

use signallab_core::domain::Series;
use signallab_core::engine::{MeasuredFire, WalkForwardResult};

use crate::metrics::{mean, sharpe_approx, std_dev, win_rate_pct};
use crate::significance::{confidence_interval, welch_t_test, ConfidenceInterval, WelchTest};
use crate::stats::{returns_at, StatsConfig};

/// Evaluator ids forming each side of the comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonGroups {
    pub customized: Vec<String>,
    pub generic: Vec<String>,
    /// Horizon compared. Defaults to the stats primary horizon.
    pub horizon: Option<usize>,
}

impl ComparisonGroups {
    pub fn is_empty(&self) -> bool {
        self.customized.is_empty() && self.generic.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = (&'static str, &String)> {
        self.customized
            .iter()
            .map(|m| ("customized", m))
            .chain(self.generic.iter().map(|m| ("generic", m)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub name: String,
    pub members: Vec<String>,
    pub fires: usize,
    pub samples: usize,
    pub mean_return: f64,
    pub std_dev: f64,
    pub win_rate: f64,
    pub sharpe: f64,
    pub confidence_interval: ConfidenceInterval,
    /// `mean_return` minus the buy-and-hold return.
    pub excess_over_hold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuyAndHold {
    pub start_bar: usize,
    pub end_bar: usize,
    pub start_price: f64,
    pub end_price: f64,
    pub total_return: f64,
}

impl BuyAndHold {
    /// Hold from `start` to `end`. `None` for an inverted or out-of-range window.
    pub fn over(series: &Series, start: usize, end: usize) -> Option<Self> {
        if end < start {
            return None;
        }
        let start_price = series.get(start)?.close;
        let end_price = series.get(end)?.close;
        Some(Self {
            start_bar: start,
            end_bar: end,
            start_price,
            end_price,
            total_return: (end_price - start_price) / start_price,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub horizon: usize,
    pub customized: GroupSummary,
    pub generic: GroupSummary,
    pub buy_and_hold: BuyAndHold,
    /// Customized minus generic. `None` when either side has fewer than two samples.
    pub welch: Option<WelchTest>,
}

/// Build the three-way comparison. `None` when no bars were evaluated.
pub fn compare_groups(
    result: &WalkForwardResult,
    series: &Series,
    groups: &ComparisonGroups,
    config: &StatsConfig,
) -> Option<ComparisonReport> {
    let (start, end) = result.range?;
    let horizon = groups.horizon.unwrap_or(config.primary_horizon);
    let hold = BuyAndHold::over(series, start, end)?;

    let pooled = |members: &[String]| -> Vec<MeasuredFire> {
        members
            .iter()
            .flat_map(|id| result.fires_for(id).iter().cloned())
            .collect()
    };
    let customized_fires = pooled(&groups.customized);
    let generic_fires = pooled(&groups.generic);

    let customized = summarize(
        "customized",
        &groups.customized,
        &customized_fires,
        horizon,
        hold.total_return,
        config,
    );
    let generic = summarize(
        "generic",
        &groups.generic,
        &generic_fires,
        horizon,
        hold.total_return,
        config,
    );
    let welch = welch_t_test(
        &returns_at(&customized_fires, horizon),
        &returns_at(&generic_fires, horizon),
        config.p_value_method,
    );

    Some(ComparisonReport {
        horizon,
        customized,
        generic,
        buy_and_hold: hold,
        welch,
    })
}

/// Welch's t-test between two evaluators' returns at `horizon`.
pub fn head_to_head(
    result: &WalkForwardResult,
    a: &str,
    b: &str,
    horizon: usize,
    config: &StatsConfig,
) -> Option<WelchTest> {
    welch_t_test(
        &returns_at(result.fires_for(a), horizon),
        &returns_at(result.fires_for(b), horizon),
        config.p_value_method,
    )
}

fn summarize(
    name: &str,
    members: &[String],
    fires: &[MeasuredFire],
    horizon: usize,
    hold_return: f64,
    config: &StatsConfig,
) -> GroupSummary {
    let returns = returns_at(fires, horizon);
    let mean_return = mean(&returns);
    GroupSummary {
        name: name.to_string(),
        members: members.to_vec(),
        fires: fires.len(),
        samples: returns.len(),
        mean_return,
        std_dev: std_dev(&returns),
        win_rate: win_rate_pct(&returns),
        sharpe: sharpe_approx(&returns, config.annualization_factor),
        confidence_interval: confidence_interval(&returns, config.confidence_level),
        excess_over_hold: mean_return - hold_return,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::test_support::fire_returning;
    use chrono::{Duration, TimeZone, Utc};
    use signallab_core::domain::Candle;
    use std::collections::BTreeMap;

    fn series(closes: &[f64]) -> Series {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle {
                timestamp: base + Duration::days(i as i64),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 1000.0,
            })
            .collect();
        Series::new("CMP", candles).unwrap()
    }

    fn result_with(fires: Vec<(&str, Vec<f64>)>, range: Option<(usize, usize)>) -> WalkForwardResult {
        let fires: BTreeMap<String, Vec<MeasuredFire>> = fires
            .into_iter()
            .map(|(id, rets)| {
                let measured = rets
                    .iter()
                    .enumerate()
                    .map(|(i, &r)| fire_returning(id, i * 10, r))
                    .collect();
                (id.to_string(), measured)
            })
            .collect();
        WalkForwardResult {
            symbol: "CMP".into(),
            bars: 100,
            warmup: 0,
            range,
            fires,
            combos: BTreeMap::new(),
            diagnostics: BTreeMap::new(),
        }
    }

    #[test]
    fn buy_and_hold_uses_range_closes() {
        let s = series(&[100.0, 105.0, 110.0, 120.0]);
        let hold = BuyAndHold::over(&s, 1, 3).unwrap();
        assert!((hold.total_return - (120.0 - 105.0) / 105.0).abs() < 1e-12);
        assert!(BuyAndHold::over(&s, 3, 1).is_none());
        assert!(BuyAndHold::over(&s, 0, 10).is_none());
    }

    #[test]
    fn groups_pool_member_fires() {
        let s = series(&vec![100.0; 50]);
        let result = result_with(
            vec![
                ("custom_a", vec![0.05, 0.05]),
                ("custom_b", vec![0.05]),
                ("generic", vec![-0.05, -0.05, -0.05]),
            ],
            Some((0, 40)),
        );
        let groups = ComparisonGroups {
            customized: vec!["custom_a".into(), "custom_b".into()],
            generic: vec!["generic".into()],
            horizon: None,
        };
        let report = compare_groups(&result, &s, &groups, &StatsConfig::default()).unwrap();
        assert_eq!(report.horizon, 30);
        assert_eq!(report.customized.fires, 3);
        assert!((report.customized.mean_return - 0.05).abs() < 1e-12);
        assert!((report.customized.win_rate - 100.0).abs() < 1e-12);
        assert_eq!(report.buy_and_hold.total_return, 0.0);
        assert!((report.generic.excess_over_hold + 0.05).abs() < 1e-12);

        let welch = report.welch.unwrap();
        assert!(welch.t > 0.0);
        assert!(welch.p_approx <= 0.01);
    }

    #[test]
    fn empty_range_has_no_report() {
        let s = series(&[100.0; 10]);
        let result = result_with(vec![], None);
        assert!(compare_groups(&result, &s, &ComparisonGroups::default(), &StatsConfig::default())
            .is_none());
    }

    #[test]
    fn head_to_head_is_signed() {
        let result = result_with(
            vec![("up", vec![0.05; 4]), ("down", vec![-0.05; 4])],
            Some((0, 40)),
        );
        let config = StatsConfig::default();
        let up_vs_down = head_to_head(&result, "up", "down", 30, &config).unwrap();
        let down_vs_up = head_to_head(&result, "down", "up", 30, &config).unwrap();
        assert!(up_vs_down.t > 0.0);
        assert!(down_vs_up.t < 0.0);
        assert!(head_to_head(&result, "up", "missing", 30, &config).is_none());
    }
}
