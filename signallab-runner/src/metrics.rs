//! Return-distribution metrics: pure functions over a list of per-fire returns.
//!
//! Every function defines a fallback for degenerate input (empty slice, zero
//! variance, no drawdown) and returns 0.0 there, never NaN or infinity.

/// Starting value of the synthetic equity curve.
pub const EQUITY_BASE: f64 = 100.0;

/// Arithmetic mean. 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median. 0.0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample variance with an N-1 denominator. 0.0 when fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Percentage (0..=100) of values strictly above zero.
pub fn win_rate_pct(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let winners = values.iter().filter(|&&r| r > 0.0).count();
    winners as f64 / values.len() as f64 * 100.0
}

/// Sharpe approximation: `mean / stdev * sqrt(annualization_factor)`.
///
/// Returns 0.0 when the standard deviation is zero (including a single sample).
pub fn sharpe_approx(values: &[f64], annualization_factor: f64) -> f64 {
    let sd = std_dev(values);
    if sd < 1e-15 {
        return 0.0;
    }
    mean(values) / sd * annualization_factor.sqrt()
}

/// Compound returns in order onto an equity curve starting at `EQUITY_BASE`.
///
/// The curve has `returns.len() + 1` points.
pub fn equity_curve(returns: &[f64]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(returns.len() + 1);
    let mut equity = EQUITY_BASE;
    curve.push(equity);
    for r in returns {
        equity *= 1.0 + r;
        curve.push(equity);
    }
    curve
}

/// Total return of an equity curve as a fraction.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    match (equity_curve.first(), equity_curve.last()) {
        (Some(&first), Some(&last)) if equity_curve.len() >= 2 && first > 0.0 => {
            (last - first) / first
        }
        _ => 0.0,
    }
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if equity is constant or monotonically increasing.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.min((eq - peak) / peak);
        }
    }
    max_dd
}

/// Calmar ratio: total compounded return / |max drawdown|.
///
/// Returns 0.0 when no drawdown occurred.
pub fn calmar_ratio(total_return: f64, max_drawdown: f64) -> f64 {
    if max_drawdown >= 0.0 {
        return 0.0;
    }
    total_return / max_drawdown.abs()
}
