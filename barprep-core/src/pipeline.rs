//! Per-symbol preparation pipeline.
//!
//! Runs fetch → normalize → validate → plot → write for each symbol in turn,
//! sequentially. A failure aborts that symbol only; the remaining symbols are
//! still attempted, and everything is collected into a [`PrepSummary`].

use crate::data::normalize;
use crate::data::provider::{DataError, DataProvider, Interval, Period};
use crate::export::{self, ExportError};
use crate::plot::{self, PlotError};
use crate::validate::{self, ValidateError, ValidationReport};
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort preparation of a single symbol.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error(transparent)]
    Fetch(#[from] DataError),

    #[error(transparent)]
    Validate(#[from] ValidateError),

    #[error(transparent)]
    Plot(#[from] PlotError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("dataframe operation failed: {0}")]
    Frame(#[from] polars::prelude::PolarsError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the pipeline writes its artifacts.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    /// Directory for the cleaned CSV files.
    pub data_dir: PathBuf,
    /// Directory for the diagnostic charts.
    pub figures_dir: PathBuf,
}

/// Progress callback for multi-symbol runs.
pub trait PrepProgress {
    /// Called when a symbol starts.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called when a symbol finishes, either way.
    fn on_complete(
        &self,
        symbol: &str,
        index: usize,
        total: usize,
        result: &Result<ValidationReport, PrepError>,
    );

    /// Called once the whole batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl PrepProgress for StdoutProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        println!("[{}/{}] Preparing {symbol}...", index + 1, total);
    }

    fn on_complete(
        &self,
        symbol: &str,
        _index: usize,
        _total: usize,
        result: &Result<ValidationReport, PrepError>,
    ) {
        match result {
            Ok(report) => println!("  OK: {symbol} ({} rows)", report.rows),
            Err(e) => println!("  FAIL: {symbol}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nPreparation complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}

/// Summary of a batch preparation run.
#[derive(Debug)]
pub struct PrepSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub reports: Vec<ValidationReport>,
    pub errors: Vec<(String, PrepError)>,
}

impl PrepSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Prepare multiple symbols, isolating failures per symbol.
pub fn prep_symbols(
    provider: &dyn DataProvider,
    symbols: &[&str],
    period: Period,
    interval: Interval,
    out: &OutputPaths,
    progress: &dyn PrepProgress,
) -> PrepSummary {
    let total = symbols.len();
    let mut succeeded = 0;
    let mut failed = 0;
    let mut reports = Vec::new();
    let mut errors: Vec<(String, PrepError)> = Vec::new();

    for (i, symbol) in symbols.iter().enumerate() {
        progress.on_start(symbol, i, total);

        let result = prep_single(provider, symbol, period, interval, out);
        progress.on_complete(symbol, i, total, &result);

        match result {
            Ok(report) => {
                reports.push(report);
                succeeded += 1;
            }
            Err(e) => {
                errors.push((symbol.to_string(), e));
                failed += 1;
            }
        }
    }

    progress.on_batch_complete(succeeded, failed, total);

    PrepSummary {
        total,
        succeeded,
        failed,
        reports,
        errors,
    }
}

/// Prepare a single symbol: fetch → normalize → validate → plot → write.
fn prep_single(
    provider: &dyn DataProvider,
    symbol: &str,
    period: Period,
    interval: Interval,
    out: &OutputPaths,
) -> Result<ValidationReport, PrepError> {
    let raw = provider.fetch(symbol, period, interval)?;
    let flat = normalize::flatten_symbol_columns(&raw, symbol)?;
    let frame = normalize::select_canonical(&flat)?;

    let (table, report) = validate::validate_series(symbol, &frame)?;

    let figure_path = out.figures_dir.join(format!("{symbol}.png"));
    plot::render_close_chart(&table, symbol, &figure_path)?;

    std::fs::create_dir_all(&out.data_dir)?;
    let csv_path = out
        .data_dir
        .join(export::output_filename(symbol, period, interval));
    export::write_series_csv(&table, &csv_path)?;

    Ok(report)
}
