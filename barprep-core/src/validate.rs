//! Series validation and normalization — the core of the pipeline.
//!
//! Takes a raw, possibly malformed bar table and produces a typed,
//! timezone-normalized table plus a [`ValidationReport`], or fails with a
//! descriptive error when the input cannot be made conformant.
//!
//! The routine is two-phase by design: coercion never fails (bad cells become
//! nulls), then hard post-condition gates assert the invariants. Ordering and
//! uniqueness of the index are measured and reported, never enforced.

use crate::schema::{
    self, INDEX_NAME, PRICE_COLUMNS, REQUIRED_COLUMNS, TIME_ZONE, VOLUME_COLUMN,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Quality report for one validated table. Derived data — assembled once,
/// never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub symbol: String,
    pub timezone: String,
    pub is_monotonic_increasing: bool,
    pub has_duplicate_datetimes: bool,
    /// Missing-value count per required column, post-coercion.
    pub null_counts: BTreeMap<String, usize>,
    /// Resulting dtype label per required column.
    pub dtypes: BTreeMap<String, String>,
    pub rows: usize,
    pub datetime_min: Option<DateTime<Tz>>,
    pub datetime_max: Option<DateTime<Tz>>,
}

/// A post-coercion dtype that does not match the required schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtypeMismatch {
    pub column: String,
    pub expected: String,
    pub actual: String,
}

fn format_mismatches(mismatches: &[DtypeMismatch]) -> String {
    mismatches
        .iter()
        .map(|m| format!("{}: expected {}, got {}", m.column, m.expected, m.actual))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Hard validation failures. Anything else the routine observes is a soft
/// measurement surfaced through the report.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("missing required columns: [{}]", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("dtype mismatch after coercion: {}", format_mismatches(mismatches))]
    DtypeMismatch { mismatches: Vec<DtypeMismatch> },

    #[error(
        "datetime index contains {unparseable} unparseable timestamp(s) out of {rows} row(s)"
    )]
    UnparseableTimestamps { unparseable: usize, rows: usize },

    #[error("dataframe operation failed: {0}")]
    Frame(#[from] PolarsError),
}

/// Validate and normalize a raw bar table.
///
/// The first column of `data` is the timestamp index (any name, any dtype);
/// the remaining columns are fields. On success the returned table has a
/// `Datetime` index in America/New_York, Float64 prices, Int64 volume, and
/// any extra columns passed through untouched. `data` itself is never
/// mutated.
pub fn validate_series(
    symbol: &str,
    data: &DataFrame,
) -> Result<(DataFrame, ValidationReport), ValidateError> {
    // 1) Schema gate: every required field column must be present.
    let missing = schema::missing_columns(data);
    if !missing.is_empty() {
        return Err(ValidateError::MissingColumns(missing));
    }

    let rows = data.height();

    // 2) Index normalization. Unparseable values become null here; the index
    //    gate below decides whether that is fatal.
    let millis = match data.get_columns().first() {
        Some(raw_index) => index_to_epoch_millis(raw_index)?,
        None => Vec::new(),
    };
    let index = Column::new(INDEX_NAME.into(), millis.clone()).cast(&schema::index_dtype())?;

    // 3) Numeric coercion. A wholesale cast failure leaves the column as-is
    //    for the dtype gate to report.
    let mut columns: Vec<Column> = Vec::with_capacity(data.width());
    columns.push(index);
    for col in data.get_columns().iter().skip(1) {
        let name = col.name().as_str();
        if PRICE_COLUMNS.contains(&name) {
            columns.push(coerce_price(col));
        } else if name == VOLUME_COLUMN {
            columns.push(coerce_volume(col));
        } else {
            columns.push(col.clone());
        }
    }
    let table = DataFrame::new(columns)?;

    // 4) Soft measurements.
    let is_monotonic = millis.windows(2).all(|w| w[0] <= w[1]) && !millis.contains(&None);
    let has_duplicates = {
        let mut seen = HashSet::with_capacity(millis.len());
        millis.iter().any(|m| !seen.insert(*m))
    };
    let mut null_counts = BTreeMap::new();
    for name in REQUIRED_COLUMNS {
        null_counts.insert(name.to_string(), table.column(name)?.null_count());
    }

    // 5) Hard dtype gate.
    let mut mismatches = Vec::new();
    for name in REQUIRED_COLUMNS {
        let expected = schema::required_dtype(name);
        let actual = table.column(name)?.dtype();
        if actual != &expected {
            mismatches.push(DtypeMismatch {
                column: name.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
    }
    if !mismatches.is_empty() {
        return Err(ValidateError::DtypeMismatch { mismatches });
    }

    // 6) Hard index gate: a table with unparseable timestamps is never valid.
    let unparseable = millis.iter().filter(|m| m.is_none()).count();
    if unparseable > 0 {
        return Err(ValidateError::UnparseableTimestamps { unparseable, rows });
    }

    // 7) Report.
    let instants: Vec<i64> = millis.iter().flatten().copied().collect();
    let mut dtypes = BTreeMap::new();
    for name in REQUIRED_COLUMNS {
        dtypes.insert(name.to_string(), table.column(name)?.dtype().to_string());
    }
    let report = ValidationReport {
        symbol: symbol.to_string(),
        timezone: TIME_ZONE.to_string(),
        is_monotonic_increasing: is_monotonic,
        has_duplicate_datetimes: has_duplicates,
        null_counts,
        dtypes,
        rows,
        datetime_min: instants.iter().min().and_then(|m| schema::ny_datetime(*m)),
        datetime_max: instants.iter().max().and_then(|m| schema::ny_datetime(*m)),
    };

    Ok((table, report))
}

/// Coerce a price column to Float64; unparseable cells become null.
fn coerce_price(col: &Column) -> Column {
    col.cast(&DataType::Float64).unwrap_or_else(|_| col.clone())
}

/// Coerce the volume column: numeric first, nulls filled with zero, then
/// finalized as Int64.
fn coerce_volume(col: &Column) -> Column {
    let numeric = match col.cast(&DataType::Float64) {
        Ok(c) => c,
        Err(_) => return col.clone(),
    };
    let filled = match numeric
        .as_materialized_series()
        .fill_null(FillNullStrategy::Zero)
    {
        Ok(s) => s,
        Err(_) => return numeric,
    };
    match filled.cast(&DataType::Int64) {
        Ok(s) => s.into_column(),
        Err(_) => numeric,
    }
}

/// Reinterpret an index column as UTC epoch milliseconds, one entry per row.
///
/// Strings are parsed with chrono (an explicit zone is trusted, naive values
/// are treated as UTC); integers are epoch seconds; datetime and date columns
/// are converted through their physical representation. Values that cannot be
/// interpreted become `None`.
fn index_to_epoch_millis(col: &Column) -> Result<Vec<Option<i64>>, ValidateError> {
    match col.dtype() {
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let phys = col.cast(&DataType::Int64)?;
            let ca = phys.i64()?;
            Ok(ca
                .iter()
                .map(|v| {
                    v.map(|raw| match unit {
                        TimeUnit::Nanoseconds => raw / 1_000_000,
                        TimeUnit::Microseconds => raw / 1_000,
                        TimeUnit::Milliseconds => raw,
                    })
                })
                .collect())
        }
        DataType::Date => {
            let phys = col.cast(&DataType::Int32)?;
            let ca = phys.i32()?;
            Ok(ca
                .iter()
                .map(|v| v.map(|days| i64::from(days) * 86_400_000))
                .collect())
        }
        DataType::Int64 | DataType::Int32 | DataType::UInt64 | DataType::UInt32 => {
            let as_i64 = col.cast(&DataType::Int64)?;
            let ca = as_i64.i64()?;
            Ok(ca
                .iter()
                .map(|v| v.and_then(|secs| secs.checked_mul(1000)))
                .collect())
        }
        DataType::String => {
            let ca = col.str()?;
            Ok(ca.iter().map(|v| v.and_then(parse_timestamp_str)).collect())
        }
        _ => Ok(vec![None; col.len()]),
    }
}

/// Parse one textual timestamp to UTC epoch milliseconds.
fn parse_timestamp_str(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    // Zone-aware, pandas-style ("2024-01-02 09:30:00-05:00").
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%z", "%Y-%m-%d %H:%M%z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.timestamp_millis());
        }
    }
    // Naive: treated as UTC.
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    None
}
