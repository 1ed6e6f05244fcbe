//! BarPrep core — OHLCV download, validation/normalization, charting, export.
//!
//! The heart of the crate is [`validate::validate_series`]: raw, possibly
//! malformed bar tables go in; typed, timezone-normalized tables plus a
//! [`validate::ValidationReport`] come out. Everything else is thin glue:
//! - [`data`] — the Yahoo Finance provider, CSV ingest, column normalization
//! - [`plot`] — diagnostic close-price chart
//! - [`export`] — cleaned CSV output
//! - [`pipeline`] — the per-symbol fetch→validate→plot→write loop

pub mod config;
pub mod data;
pub mod export;
pub mod pipeline;
pub mod plot;
pub mod schema;
pub mod validate;

pub use config::PrepConfig;
pub use data::{DataProvider, Interval, Period, YahooProvider};
pub use pipeline::{prep_symbols, OutputPaths, PrepSummary, StdoutProgress};
pub use validate::{validate_series, ValidateError, ValidationReport};
