//! End-to-end pipeline tests with a mock provider.

use barprep_core::data::provider::{DataError, DataProvider, Interval, Period};
use barprep_core::pipeline::{prep_symbols, OutputPaths, PrepError, PrepProgress};
use barprep_core::validate::ValidationReport;
use polars::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_out() -> OutputPaths {
    let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let root = std::env::temp_dir().join(format!("barprep_pipeline_{}_{id}", std::process::id()));
    let _ = std::fs::remove_dir_all(&root);
    OutputPaths {
        data_dir: root.join("data"),
        figures_dir: root.join("figures"),
    }
}

fn cleanup(out: &OutputPaths) {
    if let Some(root) = out.data_dir.parent() {
        let _ = std::fs::remove_dir_all(root);
    }
}

/// Provider returning a fixed frame per symbol; unknown symbols error.
struct MockProvider;

impl MockProvider {
    fn frame() -> DataFrame {
        df!(
            // epoch seconds, one hour apart
            "Datetime" => &[1_704_205_800i64, 1_704_209_400, 1_704_213_000],
            "Open" => &[Some(100.0), Some(101.0), Some(102.0)],
            "High" => &[Some(105.0), Some(106.0), Some(107.0)],
            "Low" => &[Some(99.0), Some(100.0), Some(101.0)],
            "Close" => &[Some(103.0), None, Some(104.5)],
            "Volume" => &[Some(1000u64), None, Some(1200)],
        )
        .unwrap()
    }
}

impl DataProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn fetch(
        &self,
        symbol: &str,
        _period: Period,
        _interval: Interval,
    ) -> Result<DataFrame, DataError> {
        if symbol == "DOWN" {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(Self::frame())
    }
}

/// Progress sink that stays quiet and counts calls.
struct CountingProgress {
    starts: AtomicU64,
    completes: AtomicU64,
}

impl CountingProgress {
    fn new() -> Self {
        Self {
            starts: AtomicU64::new(0),
            completes: AtomicU64::new(0),
        }
    }
}

impl PrepProgress for CountingProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {
        self.starts.fetch_add(1, Ordering::Relaxed);
    }

    fn on_complete(
        &self,
        _symbol: &str,
        _index: usize,
        _total: usize,
        _result: &Result<ValidationReport, PrepError>,
    ) {
        self.completes.fetch_add(1, Ordering::Relaxed);
    }

    fn on_batch_complete(&self, _succeeded: usize, _failed: usize, _total: usize) {}
}

#[test]
fn full_pipeline_writes_csv_and_chart() {
    let out = temp_out();
    let progress = CountingProgress::new();

    let summary = prep_symbols(
        &MockProvider,
        &["AAPL"],
        Period::TwoYears,
        Interval::OneHour,
        &out,
        &progress,
    );

    assert!(summary.all_succeeded());
    assert_eq!(summary.total, 1);
    assert_eq!(summary.reports.len(), 1);

    let report = &summary.reports[0];
    assert_eq!(report.symbol, "AAPL");
    assert_eq!(report.rows, 3);
    assert_eq!(report.timezone, "America/New_York");
    assert!(report.is_monotonic_increasing);
    assert_eq!(report.null_counts["Close"], 1);
    assert_eq!(report.null_counts["Volume"], 0); // filled with zero before the count

    let csv_path = out.data_dir.join("AAPL_2y_1h_raw.csv");
    assert!(csv_path.exists());
    let content = std::fs::read_to_string(&csv_path).unwrap();
    assert!(content.starts_with("Datetime,Open,High,Low,Close,Volume"));
    assert_eq!(content.lines().count(), 4);
    // 14:30 UTC renders as 09:30 New York
    assert!(content.contains("2024-01-02 09:30:00-05:00"));

    let png_path = out.figures_dir.join("AAPL.png");
    assert!(png_path.exists());
    let bytes = std::fs::read(&png_path).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

    assert_eq!(progress.starts.load(Ordering::Relaxed), 1);
    assert_eq!(progress.completes.load(Ordering::Relaxed), 1);

    cleanup(&out);
}

#[test]
fn one_failing_symbol_does_not_stop_the_rest() {
    let out = temp_out();
    let progress = CountingProgress::new();

    let summary = prep_symbols(
        &MockProvider,
        &["DOWN", "SPY"],
        Period::OneYear,
        Interval::OneDay,
        &out,
        &progress,
    );

    assert!(!summary.all_succeeded());
    assert_eq!(summary.total, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].0, "DOWN");
    assert!(matches!(
        summary.errors[0].1,
        PrepError::Fetch(DataError::SymbolNotFound { .. })
    ));

    // The healthy symbol still produced its artifacts.
    assert!(out.data_dir.join("SPY_1y_1d_raw.csv").exists());
    assert!(out.figures_dir.join("SPY.png").exists());
    assert_eq!(progress.completes.load(Ordering::Relaxed), 2);

    cleanup(&out);
}

#[test]
fn written_csv_revalidates_cleanly() {
    let out = temp_out();

    let summary = prep_symbols(
        &MockProvider,
        &["QQQ"],
        Period::TwoYears,
        Interval::OneHour,
        &out,
        &NoopProgress,
    );
    assert!(summary.all_succeeded());

    // Round-trip: the file the pipeline wrote passes validation again.
    let csv_path = out.data_dir.join("QQQ_2y_1h_raw.csv");
    let raw = barprep_core::data::ingest::read_raw_csv(&csv_path).unwrap();
    let (table, report) = barprep_core::validate_series("QQQ", &raw).unwrap();

    assert_eq!(table.height(), 3);
    assert_eq!(report.null_counts["Close"], 1);
    assert_eq!(report.rows, summary.reports[0].rows);
    assert_eq!(report.datetime_min, summary.reports[0].datetime_min);
    assert_eq!(report.datetime_max, summary.reports[0].datetime_max);

    cleanup(&out);
}

struct NoopProgress;

impl PrepProgress for NoopProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}
    fn on_complete(
        &self,
        _symbol: &str,
        _index: usize,
        _total: usize,
        _result: &Result<ValidationReport, PrepError>,
    ) {
    }
    fn on_batch_complete(&self, _succeeded: usize, _failed: usize, _total: usize) {}
}
