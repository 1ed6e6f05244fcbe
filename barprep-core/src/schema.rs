//! Canonical schema for validated bar tables.
//!
//! A validated table is a DataFrame whose first column is the `Datetime`
//! index (millisecond datetimes in America/New_York) followed by the five
//! required OHLCV fields. Extra columns are tolerated on input and pass
//! through untouched.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use polars::prelude::*;

/// Canonical name of the timestamp index column.
pub const INDEX_NAME: &str = "Datetime";

/// Fixed zone every validated index is re-expressed in.
pub const TIME_ZONE: &str = "America/New_York";

/// The four price columns, coerced to Float64.
pub const PRICE_COLUMNS: [&str; 4] = ["Open", "High", "Low", "Close"];

/// The volume column, finalized as Int64.
pub const VOLUME_COLUMN: &str = "Volume";

/// All required field columns, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 5] = ["Open", "High", "Low", "Close", "Volume"];

/// The fixed zone as a chrono-tz value.
pub fn time_zone() -> Tz {
    chrono_tz::America::New_York
}

/// Dtype of the validated index column.
pub fn index_dtype() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, Some(TIME_ZONE.into()))
}

/// Expected dtype for a required field column.
pub fn required_dtype(column: &str) -> DataType {
    if column == VOLUME_COLUMN {
        DataType::Int64
    } else {
        DataType::Float64
    }
}

/// The required field schema (index column excluded).
pub fn required_schema() -> Schema {
    Schema::from_iter(
        REQUIRED_COLUMNS
            .iter()
            .map(|c| Field::new((*c).into(), required_dtype(c))),
    )
}

/// Required columns absent from `df`, in canonical order.
///
/// The first column of a frame is the timestamp index and does not count
/// toward the field set.
pub fn missing_columns(df: &DataFrame) -> Vec<String> {
    let fields: Vec<&str> = df
        .get_column_names()
        .into_iter()
        .skip(1)
        .map(|n| n.as_str())
        .collect();
    REQUIRED_COLUMNS
        .iter()
        .filter(|c| !fields.contains(c))
        .map(|c| (*c).to_string())
        .collect()
}

/// Epoch milliseconds to a New York instant.
pub fn ny_datetime(millis: i64) -> Option<DateTime<Tz>> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.with_timezone(&time_zone()))
}
