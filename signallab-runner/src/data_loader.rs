//! Candle loading for the runner: CSV files and seeded synthetic series.
//!
//! CSV input needs a header row with `timestamp` (or `date`), `open`, `high`, `low`,
//! `close` and optionally `volume`. Timestamps may be RFC 3339, `YYYY-MM-DD`, or Unix
//! seconds. Ordering, deduplication and dropping of unusable rows are left to
//! `Series::new`, so a file in any order loads the same series.
//!
//! Synthetic data is a developer-only mode: a seeded random walk, identical for
//! identical settings.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use signallab_core::domain::{Candle, Series, SeriesError};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unrecognized timestamp '{value}'")]
    Timestamp { row: usize, value: String },
    #[error(transparent)]
    Series(#[from] SeriesError),
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "date", alias = "time", alias = "Date", alias = "Timestamp")]
    timestamp: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(default, alias = "Volume")]
    volume: f64,
}

/// Parse a timestamp as RFC 3339, `YYYY-MM-DD` (midnight UTC), or Unix seconds.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    let secs: i64 = value.parse().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

/// Read candles from any CSV source.
pub fn read_candles<R: Read>(reader: R) -> Result<Vec<Candle>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut candles = Vec::new();
    for (i, row) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        // Header is line 1.
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::Timestamp {
            row: i + 2,
            value: row.timestamp.clone(),
        })?;
        candles.push(Candle {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }
    Ok(candles)
}

/// Load a CSV file as a series named `symbol`.
pub fn load_csv(path: &Path, symbol: &str) -> Result<Series, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let candles = read_candles(file)?;
    let rows = candles.len();
    let series = Series::new(symbol, candles)?;
    info!(symbol, path = %path.display(), rows, bars = series.len(), "loaded candles");
    Ok(series)
}

/// Symbol for a data file: its file stem, upper-cased.
pub fn symbol_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_else(|| "UNKNOWN".into())
}

// ─── Synthetic series ────────────────────────────────────────────────

/// Settings of the synthetic random walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub bars: usize,
    pub seed: u64,
    pub start_price: f64,
    /// Mean daily return.
    pub drift: f64,
    /// Daily return standard deviation.
    pub volatility: f64,
    pub start_date: NaiveDate,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            bars: 750,
            seed: 42,
            start_price: 100.0,
            drift: 0.0003,
            volatility: 0.015,
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN),
        }
    }
}

/// Generate a seeded random walk of weekday bars.
///
/// Returns are uniform with the configured mean and standard deviation.
pub fn generate_synthetic(symbol: &str, config: &SyntheticConfig) -> Result<Series, LoadError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    // Uniform(-a, a) has standard deviation a / sqrt(3).
    let spread = config.volatility * 3.0_f64.sqrt();

    let mut candles = Vec::with_capacity(config.bars);
    let mut price = config.start_price;
    let mut day = config.start_date;

    while candles.len() < config.bars {
        if matches!(day.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
            day += Duration::days(1);
            continue;
        }
        let daily_return = if spread > 0.0 {
            config.drift + rng.gen_range(-spread..spread)
        } else {
            config.drift
        };
        let open = price;
        let close = (price * (1.0 + daily_return)).max(0.01);
        let wick = config.volatility.max(1e-4) / 2.0;
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..wick));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..wick));
        let volume = rng.gen_range(500_000.0..5_000_000.0_f64).round();

        let Some(midnight) = day.and_hms_opt(0, 0, 0) else {
            break;
        };
        candles.push(Candle {
            timestamp: midnight.and_utc(),
            open,
            high,
            low,
            close,
            volume,
        });
        price = close;
        day += Duration::days(1);
    }

    Ok(Series::new(symbol, candles)?)
}
