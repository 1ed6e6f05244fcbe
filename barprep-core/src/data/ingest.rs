//! Raw CSV ingest.
//!
//! Reads a delimited file into an all-string DataFrame. Schema inference is
//! deliberately disabled: typing (and the decision that a cell is garbage) is
//! the validator's job, not the reader's.

use polars::prelude::*;
use std::path::Path;

/// Read a CSV file as raw, untyped bar data.
///
/// The first column is expected to be the timestamp index, per the table
/// convention used throughout the pipeline.
pub fn read_raw_csv(path: &Path) -> PolarsResult<DataFrame> {
    LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // every column stays a string
        .finish()?
        .collect()
}
