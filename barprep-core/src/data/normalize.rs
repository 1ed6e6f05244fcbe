//! Column normalization glue.
//!
//! Sits between the fetcher and the validator: flattens the per-symbol column
//! suffix scheme a multi-symbol fetch produces, and narrows a frame to the
//! canonical column set. Deliberately thin — anything judgemental belongs to
//! the validator.

use crate::schema::REQUIRED_COLUMNS;
use polars::prelude::*;

/// Flatten a field × symbol column scheme for one symbol.
///
/// A batch fetch labels columns `{field}_{symbol}` (e.g. `Close_AAPL`); this
/// strips the suffix for the requested symbol. Already-flat names pass
/// through unchanged.
pub fn flatten_symbol_columns(df: &DataFrame, symbol: &str) -> PolarsResult<DataFrame> {
    let suffix = format!("_{symbol}");
    let columns: Vec<Column> = df
        .get_columns()
        .iter()
        .map(|col| match col.name().as_str().strip_suffix(&suffix) {
            Some(base) => col
                .as_materialized_series()
                .clone()
                .with_name(base.into())
                .into_column(),
            None => col.clone(),
        })
        .collect();
    DataFrame::new(columns)
}

/// Select the canonical column set: the index column plus whichever required
/// fields are present, extras dropped.
///
/// Missing required columns are NOT an error here — the validator owns the
/// schema gate and its error message.
pub fn select_canonical(df: &DataFrame) -> PolarsResult<DataFrame> {
    let Some(index) = df.get_columns().first() else {
        return Ok(df.clone());
    };
    let mut columns = vec![index.clone()];
    for name in REQUIRED_COLUMNS {
        if let Ok(col) = df.column(name) {
            columns.push(col.clone());
        }
    }
    DataFrame::new(columns)
}
