//! CSV export for validated bar tables.
//!
//! Writes `Datetime,Open,High,Low,Close,Volume` with the index formatted in
//! its New York offset (`2024-01-02 04:30:00-05:00`). Null prices become
//! empty fields; volume is written as an integer.

use crate::data::provider::{Interval, Period};
use crate::schema::{self, INDEX_NAME, VOLUME_COLUMN};
use polars::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataframe operation failed: {0}")]
    Frame(#[from] PolarsError),

    #[error("export error: {0}")]
    Other(String),
}

/// Canonical output file name for a prepared series.
pub fn output_filename(symbol: &str, period: Period, interval: Interval) -> String {
    format!("{symbol}_{}_{}_raw.csv", period.as_str(), interval.as_str())
}

/// Write a validated table to `path` as CSV.
///
/// Expects the canonical shape produced by validation: `Datetime` index,
/// Float64 prices, Int64 volume. The writer is flushed before returning on
/// every path, including failure.
pub fn write_series_csv(table: &DataFrame, path: &Path) -> Result<(), ExportError> {
    let index = table.column(INDEX_NAME)?.cast(&DataType::Int64)?;
    let index = index.i64()?;
    let opens = table.column("Open")?.f64()?;
    let highs = table.column("High")?.f64()?;
    let lows = table.column("Low")?.f64()?;
    let closes = table.column("Close")?.f64()?;
    let volumes = table.column(VOLUME_COLUMN)?.i64()?;

    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([INDEX_NAME, "Open", "High", "Low", "Close", VOLUME_COLUMN])?;

    for i in 0..table.height() {
        let ts = index
            .get(i)
            .and_then(format_index_value)
            .ok_or_else(|| ExportError::Other(format!("null index value at row {i}")))?;
        wtr.write_record([
            ts,
            format_price(opens.get(i)),
            format_price(highs.get(i)),
            format_price(lows.get(i)),
            format_price(closes.get(i)),
            volumes.get(i).unwrap_or(0).to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn format_index_value(millis: i64) -> Option<String> {
    schema::ny_datetime(millis).map(|dt| dt.format("%Y-%m-%d %H:%M:%S%:z").to_string())
}

fn format_price(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v}"),
        None => String::new(),
    }
}
