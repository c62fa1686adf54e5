//! SignalLab CLI: backtest runs, synthetic data and predictability checks.
//!
//! Commands:
//! - `run`: walk-forward backtest from a TOML config over CSV files or synthetic bars
//! - `synthetic`: write a seeded random-walk series as CSV
//! - `predict`: score how predictable a price series is

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use signallab_core::domain::Series;
use signallab_runner::data_loader::symbol_from_path;
use signallab_runner::{
    assess_predictability, export_candles_csv, generate_synthetic, load_csv, run_assets,
    run_backtest, save_artifacts, BacktestConfig, BacktestReport, PredictabilityConfig,
    SyntheticConfig,
};

#[derive(Parser)]
#[command(
    name = "signallab",
    version,
    about = "SignalLab CLI: walk-forward evaluation of trading signals"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// CSV candle files. More than one runs the assets in parallel.
        #[arg(long, num_args = 1..)]
        data: Vec<PathBuf>,

        /// Use this many synthetic bars instead of CSV data.
        #[arg(long, conflicts_with = "data")]
        synthetic: Option<usize>,

        /// Seed for synthetic data.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output directory for report artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Write a seeded synthetic series as CSV.
    Synthetic {
        #[arg(long, default_value_t = 750)]
        bars: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Symbol recorded for the series.
        #[arg(long, default_value = "SYNTH")]
        symbol: String,

        /// Output CSV path. Prints to stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Hurst exponent, autocorrelations and predictability score of a CSV series.
    Predict {
        #[arg(long)]
        data: PathBuf,

        /// Highest autocorrelation lag.
        #[arg(long, default_value_t = 5)]
        max_lag: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            data,
            synthetic,
            seed,
            output_dir,
        } => run_cmd(&config, &data, synthetic, seed, &output_dir),
        Commands::Synthetic {
            bars,
            seed,
            symbol,
            out,
        } => synthetic_cmd(bars, seed, &symbol, out.as_deref()),
        Commands::Predict { data, max_lag } => predict_cmd(&data, max_lag),
    }
}

fn run_cmd(
    config_path: &Path,
    data: &[PathBuf],
    synthetic: Option<usize>,
    seed: u64,
    output_dir: &Path,
) -> Result<()> {
    let config = BacktestConfig::load(config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    config.validate().context("invalid config")?;

    let series: Vec<Series> = match (synthetic, data) {
        (Some(bars), _) => {
            let synth = SyntheticConfig {
                bars,
                seed,
                ..Default::default()
            };
            vec![generate_synthetic(&config.symbol, &synth)?]
        }
        (None, []) => bail!("one of --data or --synthetic is required"),
        (None, paths) => paths
            .iter()
            .map(|p| {
                load_csv(p, &symbol_from_path(p))
                    .with_context(|| format!("failed to load {}", p.display()))
            })
            .collect::<Result<_>>()?,
    };

    if let [single] = series.as_slice() {
        let report = run_backtest(single, &config)?;
        finish(&report, output_dir, synthetic.is_some())?;
        return Ok(());
    }

    let mut failures = 0;
    for (symbol, result) in run_assets(&series, &config)? {
        match result {
            Ok(report) => finish(&report, output_dir, false)?,
            Err(e) => {
                eprintln!("Error for {symbol}: {e}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {} assets failed", series.len());
    }
    Ok(())
}

fn finish(report: &BacktestReport, output_dir: &Path, synthetic: bool) -> Result<()> {
    print_summary(report);
    if synthetic {
        println!("WARNING: Results based on SYNTHETIC data");
        println!();
    }
    let run_dir = save_artifacts(report, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn synthetic_cmd(bars: usize, seed: u64, symbol: &str, out: Option<&Path>) -> Result<()> {
    let config = SyntheticConfig {
        bars,
        seed,
        ..Default::default()
    };
    let series = generate_synthetic(symbol, &config)?;
    let csv = export_candles_csv(&series)?;
    match out {
        Some(path) => {
            std::fs::write(path, csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(symbol, bars = series.len(), path = %path.display(), "synthetic series written");
        }
        None => print!("{csv}"),
    }
    Ok(())
}

fn predict_cmd(path: &Path, max_lag: usize) -> Result<()> {
    let series = load_csv(path, &symbol_from_path(path))
        .with_context(|| format!("failed to load {}", path.display()))?;
    let config = PredictabilityConfig {
        max_lag,
        ..Default::default()
    };
    let report = assess_predictability(&series.closes(), &config);

    println!();
    println!("=== Predictability: {} ===", series.symbol());
    println!("Prices:         {}", report.prices);
    match report.hurst {
        Some(h) => println!("Hurst:          {h:.3}"),
        None => println!("Hurst:          n/a"),
    }
    for ac in &report.autocorrelations {
        println!("Autocorr lag {:<2} {:+.3}", ac.lag, ac.value);
    }
    println!("Character:      {:?}", report.character);
    println!("Score:          {:.1} / 100", report.score);
    println!();
    Ok(())
}

fn print_summary(report: &BacktestReport) {
    let wf = &report.walk_forward;
    println!();
    println!("=== Backtest Report ===");
    println!("Symbol:         {}", report.symbol);
    match (report.start_date, report.end_date) {
        (Some(start), Some(end)) => println!("Period:         {start} to {end}"),
        _ => println!("Period:         (empty test range)"),
    }
    println!("Bars:           {} ({} warmup)", wf.bars, wf.warmup);
    println!("Fires:          {}", wf.total_fires());
    println!("Combos:         {}", report.combos.len());
    println!("Run id:         {}", report.run_id);
    println!();

    println!("--- Leaderboard ({}) ---", report.leaderboard.metric.label());
    for row in report.leaderboard.top(10) {
        println!(
            "{:>3}. {:<32} {:>10.4} {:>5} fires  {}",
            row.rank,
            row.id,
            row.value,
            row.fires,
            row.grade.as_deref().unwrap_or("never fired"),
        );
    }

    if let Some(cmp) = &report.comparison {
        println!();
        println!("--- Comparison ({}-bar horizon) ---", cmp.horizon);
        println!("Customized:     {:+.2}%", cmp.customized.mean_return * 100.0);
        println!("Generic:        {:+.2}%", cmp.generic.mean_return * 100.0);
        println!("Buy and hold:   {:+.2}%", cmp.buy_and_hold.total_return * 100.0);
        if let Some(w) = &cmp.welch {
            let label = if w.is_approximate() { " (approx.)" } else { "" };
            println!("Welch t:        {:.3}  p = {:.4}{label}", w.t, w.p_value);
        }
    }

    let silent: Vec<&str> = report.never_fired().map(|s| s.id.as_str()).collect();
    if !silent.is_empty() {
        println!();
        println!("Never fired:    {}", silent.join(", "));
    }
    println!();
}
