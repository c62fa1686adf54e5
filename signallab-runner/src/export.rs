//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: the full `BacktestReport`, schema-versioned; unknown versions are
//!   rejected on load
//! - **CSV**: the fire log with outcomes, and candles (for synthetic series)
//! - **Markdown**: leaderboard, evaluator table, comparison and regimes

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use signallab_core::domain::Series;
use signallab_core::engine::MeasuredFire;

use crate::runner::{BacktestReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Deserialize a report, rejecting schema versions newer than this build understands.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Fire log: one row per recorded evaluator fire, then one per combo fire.
///
/// Columns: kind, key, bar_index, date, entry_price, then `return_{h}`,
/// `max_gain_{h}`, `max_drawdown_{h}` per horizon, race_result, race_day.
/// Unmeasured fires leave the outcome columns empty.
pub fn export_fires_csv(report: &BacktestReport) -> Result<String> {
    let horizons = report.config.horizons();
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<String> = ["kind", "key", "bar_index", "date", "entry_price"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    for h in horizons {
        header.push(format!("return_{h}"));
        header.push(format!("max_gain_{h}"));
        header.push(format!("max_drawdown_{h}"));
    }
    header.push("race_result".into());
    header.push("race_day".into());
    wtr.write_record(&header)?;

    let wf = &report.walk_forward;
    let rows = wf
        .fires
        .values()
        .flatten()
        .map(|f| ("evaluator", f))
        .chain(wf.combos.values().flat_map(|c| c.fires.iter()).map(|f| ("combo", f)));

    for (kind, fire) in rows {
        wtr.write_record(fire_record(kind, fire, horizons))?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn fire_record(kind: &str, measured: &MeasuredFire, horizons: &[usize]) -> Vec<String> {
    let f = &measured.fire;
    let mut record = vec![
        kind.to_string(),
        f.evaluator_id.clone(),
        f.bar_index.to_string(),
        f.date.to_string(),
        format!("{:.6}", f.entry_price),
    ];
    for &h in horizons {
        match measured.outcome.as_ref().and_then(|o| o.horizon(h)) {
            Some(s) => {
                record.push(format!("{:.6}", s.horizon_return));
                record.push(format!("{:.6}", s.max_gain));
                record.push(format!("{:.6}", s.max_drawdown));
            }
            None => record.extend(std::iter::repeat(String::new()).take(3)),
        }
    }
    match &measured.outcome {
        Some(o) => {
            record.push(format!("{:?}", o.race.result).to_uppercase());
            record.push(o.race.day.map(|d| d.to_string()).unwrap_or_default());
        }
        None => record.extend([String::new(), String::new()]),
    }
    record
}

/// Candles as CSV in the format `data_loader::read_candles` accepts.
pub fn export_candles_csv(series: &Series) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "open", "high", "low", "close", "volume"])?;
    for c in series.candles() {
        wtr.write_record([
            c.timestamp.to_rfc3339(),
            format!("{:.6}", c.open),
            format!("{:.6}", c.high),
            format!("{:.6}", c.low),
            format!("{:.6}", c.close),
            format!("{:.0}", c.volume),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one report.
///
/// Creates `{symbol}_{run_id prefix}/` under `output_dir` containing
/// `report.json`, `fires.csv` and `report.md`. Returns the directory.
pub fn save_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<PathBuf> {
    let short_id: String = report.run_id.chars().take(12).collect();
    let run_dir = output_dir.join(format!("{}_{}", path_safe(&report.symbol), short_id));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write_file(&run_dir.join("report.json"), &export_json(report)?)?;
    write_file(&run_dir.join("fires.csv"), &export_fires_csv(report)?)?;
    write_file(&run_dir.join("report.md"), &generate_report(report))?;
    Ok(run_dir)
}

/// Symbol as a single path component: separators and `..` cannot escape `output_dir`.
fn path_safe(symbol: &str) -> String {
    let cleaned: String = symbol
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') => c,
            _ => '_',
        })
        .collect();
    let cleaned = cleaned.replace("..", "__");
    if cleaned.is_empty() {
        "UNKNOWN".into()
    } else {
        cleaned
    }
}

/// Load a report from an artifact directory. Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BacktestReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

// ─── Markdown report ────────────────────────────────────────────────

fn pct(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Human-readable report.
pub fn generate_report(report: &BacktestReport) -> String {
    let mut md = String::with_capacity(4096);
    // Writing to a String cannot fail.
    let _ = write_report(&mut md, report);
    md
}

fn write_report(md: &mut String, r: &BacktestReport) -> std::fmt::Result {
    let wf = &r.walk_forward;
    writeln!(md, "# Signal Backtest Report\n")?;

    writeln!(md, "## Metadata\n")?;
    writeln!(md, "| Field | Value |")?;
    writeln!(md, "| --- | --- |")?;
    writeln!(md, "| Symbol | {} |", r.symbol)?;
    writeln!(md, "| Run ID | {} |", r.run_id)?;
    writeln!(md, "| Dataset Hash | {} |", r.dataset_hash)?;
    writeln!(md, "| Bars | {} ({} warmup) |", wf.bars, wf.warmup)?;
    match (wf.range, r.start_date, r.end_date) {
        (Some((s, e)), Some(a), Some(b)) => {
            writeln!(md, "| Test Range | bars {s}..={e} ({a} to {b}) |")?
        }
        _ => writeln!(md, "| Test Range | empty |")?,
    }
    writeln!(md, "| Recorded Fires | {} |", wf.total_fires())?;
    writeln!(md)?;

    writeln!(md, "## Leaderboard ({})\n", r.leaderboard.metric.label())?;
    writeln!(md, "| Rank | Id | Kind | Value | Fires | Grade |")?;
    writeln!(md, "| --- | --- | --- | --- | --- | --- |")?;
    for row in &r.leaderboard.rows {
        writeln!(
            md,
            "| {} | {} | {:?} | {:.4} | {} | {} |",
            row.rank,
            row.id,
            row.kind,
            row.value,
            row.fires,
            row.grade.as_deref().unwrap_or("never fired"),
        )?;
    }
    writeln!(md)?;

    let horizons = r.config.horizons();
    writeln!(md, "## Evaluators\n")?;
    write!(md, "| Id | Fires | Measured |")?;
    for h in horizons {
        write!(md, " Win {h} | Mean {h} |")?;
    }
    writeln!(md, " Sharpe | Max DD | Calmar | Race W/L/N |")?;
    write!(md, "| --- | --- | --- |")?;
    for _ in horizons {
        write!(md, " --- | --- |")?;
    }
    writeln!(md, " --- | --- | --- | --- |")?;
    for s in &r.evaluators {
        write!(md, "| {} | {} | {} |", s.id, s.fires, s.measured)?;
        for &h in horizons {
            write!(md, " {:.1}% | {} |", s.win_rate(h), pct(s.mean_return(h)))?;
        }
        writeln!(
            md,
            " {:.3} | {} | {:.3} | {}/{}/{} |",
            s.sharpe,
            pct(s.max_drawdown),
            s.calmar,
            s.race.wins,
            s.race.losses,
            s.race.neither
        )?;
    }
    writeln!(md)?;

    if !r.combos.is_empty() {
        writeln!(md, "## Combos\n")?;
        writeln!(md, "| Key | Tracked | Fires | Mean {} | Grade |", r.config.stats.primary_horizon)?;
        writeln!(md, "| --- | --- | --- | --- | --- |")?;
        for c in &r.combos {
            writeln!(
                md,
                "| {} | {} | {} | {} | {} |",
                c.key,
                c.tracked,
                c.stats.fires,
                pct(c.stats.mean_return(r.config.stats.primary_horizon)),
                c.stats.grade.as_deref().unwrap_or("-"),
            )?;
        }
        writeln!(md)?;
    }

    if let Some(cmp) = &r.comparison {
        writeln!(md, "## Comparison ({}-bar returns)\n", cmp.horizon)?;
        writeln!(md, "| Side | Samples | Mean | Win Rate | CI ({:.0}%) |", cmp.customized.confidence_interval.level * 100.0)?;
        writeln!(md, "| --- | --- | --- | --- | --- |")?;
        for g in [&cmp.customized, &cmp.generic] {
            writeln!(
                md,
                "| {} | {} | {} | {:.1}% | [{}, {}] |",
                g.name,
                g.samples,
                pct(g.mean_return),
                g.win_rate,
                pct(g.confidence_interval.lower),
                pct(g.confidence_interval.upper),
            )?;
        }
        writeln!(md, "| buy & hold | - | {} | - | - |", pct(cmp.buy_and_hold.total_return))?;
        writeln!(md)?;
        match &cmp.welch {
            Some(w) => {
                let label = if w.is_approximate() { "approximate, banded" } else { "exact" };
                writeln!(
                    md,
                    "Welch's t = {:.3}, df = {:.1}, p = {} ({label})\n",
                    w.t, w.df, w.p_value
                )?;
            }
            None => writeln!(md, "Welch's t-test: not enough samples\n")?,
        }
    }

    if !r.regimes.is_empty() {
        writeln!(md, "## Regimes\n")?;
        let h = r.config.stats.primary_horizon;
        for period in &r.regimes {
            writeln!(md, "### {} ({} to {})\n", period.regime, period.start, period.end)?;
            if let Some(hold) = &period.buy_and_hold {
                writeln!(md, "Buy & hold: {}\n", pct(hold.total_return))?;
            }
            writeln!(md, "| Id | Fires | Win {h} | Mean {h} |")?;
            writeln!(md, "| --- | --- | --- | --- |")?;
            for s in &period.evaluators {
                writeln!(
                    md,
                    "| {} | {} | {:.1}% | {} |",
                    s.id,
                    s.fires,
                    s.win_rate(h),
                    pct(s.mean_return(h))
                )?;
            }
            writeln!(md)?;
        }
    }

    let p = &r.predictability;
    writeln!(md, "## Predictability\n")?;
    writeln!(
        md,
        "Hurst: {}, character: {:?}, score: {:.1}/100",
        p.hurst.map_or("n/a".to_string(), |h| format!("{h:.3}")),
        p.character,
        p.score
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BacktestConfig;
    use crate::data_loader::{generate_synthetic, read_candles, SyntheticConfig};
    use crate::runner::run_backtest;

    fn report() -> BacktestReport {
        let series = generate_synthetic(
            "EXP",
            &SyntheticConfig { bars: 400, ..Default::default() },
        )
        .unwrap();
        run_backtest(&series, &BacktestConfig::default()).unwrap()
    }

    #[test]
    fn json_round_trip() {
        let r = report();
        let back = import_json(&export_json(&r).unwrap()).unwrap();
        assert_eq!(back.run_id, r.run_id);
        assert_eq!(back.config, r.config);
        assert_eq!(back.walk_forward.total_fires(), r.walk_forward.total_fires());
        let ids = |rep: &BacktestReport| -> Vec<String> {
            rep.evaluators.iter().map(|s| s.id.clone()).collect()
        };
        assert_eq!(ids(&back), ids(&r));
    }

    #[test]
    fn future_schema_is_rejected() {
        let mut r = report();
        r.schema_version = SCHEMA_VERSION + 1;
        let json = serde_json::to_string(&r).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn fire_csv_has_one_row_per_fire() {
        let r = report();
        let csv = export_fires_csv(&r).unwrap();
        let combo_fires: usize = r.walk_forward.combos.values().map(|c| c.fires.len()).sum();
        assert_eq!(csv.lines().count(), 1 + r.walk_forward.total_fires() + combo_fires);
        assert!(csv.lines().next().unwrap().contains("return_30"));
    }

    #[test]
    fn candles_csv_reloads() {
        let series = generate_synthetic("EXP", &SyntheticConfig { bars: 30, ..Default::default() })
            .unwrap();
        let csv = export_candles_csv(&series).unwrap();
        let candles = read_candles(csv.as_bytes()).unwrap();
        assert_eq!(candles.len(), 30);
        assert_eq!(candles[0].timestamp, series.candles()[0].timestamp);
    }

    #[test]
    fn artifact_dir_stays_under_output_dir() {
        assert_eq!(path_safe("BRK.B"), "BRK.B");
        assert_eq!(path_safe("../../etc"), "______etc");
        assert_eq!(path_safe("a\\b/c"), "a_b_c");
        assert_eq!(path_safe(""), "UNKNOWN");

        let mut r = report();
        r.symbol = "../escape".into();
        let dir = tempfile::tempdir().unwrap();
        let run_dir = save_artifacts(&r, dir.path()).unwrap();
        assert_eq!(run_dir.parent(), Some(dir.path()));
        assert!(run_dir.join("report.json").is_file());
    }

    #[test]
    fn markdown_lists_every_evaluator() {
        let r = report();
        let md = generate_report(&r);
        assert!(md.starts_with("# Signal Backtest Report"));
        for s in &r.evaluators {
            assert!(md.contains(&format!("| {} |", s.id)), "missing {}", s.id);
        }
    }
}
