//! BarPrep CLI — download, validate, and export OHLCV research data.
//!
//! Commands:
//! - `run` — fetch symbols from Yahoo Finance, validate, chart, and write CSVs
//! - `validate` — run the validator over a previously written CSV file

use anyhow::{bail, Context, Result};
use barprep_core::data::ingest;
use barprep_core::data::normalize;
use barprep_core::pipeline::{prep_symbols, OutputPaths, StdoutProgress};
use barprep_core::validate::validate_series;
use barprep_core::{Interval, Period, PrepConfig, YahooProvider};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "barprep",
    about = "BarPrep CLI — OHLCV data preparation for research"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, validate, chart, and export symbols.
    Run {
        /// Symbols to prepare (e.g. AAPL SPY BTC-USD). Omit when using --config.
        symbols: Vec<String>,

        /// TOML config file describing the run.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Lookback period: 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max.
        #[arg(long, default_value = "2y")]
        period: String,

        /// Bar interval: 1m, 5m, 15m, 30m, 1h, 1d, 1wk, 1mo.
        #[arg(long, default_value = "1h")]
        interval: String,

        /// Output directory for cleaned CSV files.
        #[arg(long, default_value = "data/raw")]
        data_dir: PathBuf,

        /// Output directory for diagnostic charts.
        #[arg(long, default_value = "reports/figures")]
        figures_dir: PathBuf,
    },
    /// Validate a previously written CSV file and print its report.
    Validate {
        /// Path to the CSV file.
        file: PathBuf,

        /// Symbol label for the report. Defaults to the file stem.
        #[arg(long)]
        symbol: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            symbols,
            config,
            period,
            interval,
            data_dir,
            figures_dir,
        } => run_prep(symbols, config, period, interval, data_dir, figures_dir),
        Commands::Validate { file, symbol } => run_validate(file, symbol),
    }
}

fn run_prep(
    symbols: Vec<String>,
    config: Option<PathBuf>,
    period: String,
    interval: String,
    data_dir: PathBuf,
    figures_dir: PathBuf,
) -> Result<()> {
    let (symbols, period, interval, out) = match config {
        Some(path) => {
            if !symbols.is_empty() {
                bail!("pass symbols on the command line or via --config, not both");
            }
            let config = PrepConfig::from_file(&path)
                .with_context(|| format!("loading config {}", path.display()))?;
            let period: Period = config.period.parse()?;
            let interval: Interval = config.interval.parse()?;
            (
                config.symbols,
                period,
                interval,
                OutputPaths {
                    data_dir: config.data_dir,
                    figures_dir: config.figures_dir,
                },
            )
        }
        None => {
            if symbols.is_empty() {
                bail!("no symbols given (pass them on the command line or via --config)");
            }
            let period: Period = period.parse()?;
            let interval: Interval = interval.parse()?;
            (
                symbols,
                period,
                interval,
                OutputPaths {
                    data_dir,
                    figures_dir,
                },
            )
        }
    };

    let provider = YahooProvider::new();
    let progress = StdoutProgress;
    let sym_refs: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();

    let summary = prep_symbols(&provider, &sym_refs, period, interval, &out, &progress);

    for report in &summary.reports {
        println!("{}", serde_json::to_string_pretty(report)?);
    }

    if !summary.all_succeeded() {
        for (sym, err) in &summary.errors {
            eprintln!("Error for {sym}: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_validate(file: PathBuf, symbol: Option<String>) -> Result<()> {
    let symbol = symbol.unwrap_or_else(|| {
        file.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "UNKNOWN".to_string())
    });

    let raw = ingest::read_raw_csv(&file)
        .with_context(|| format!("reading {}", file.display()))?;
    let frame = normalize::select_canonical(&raw)?;

    let (table, report) = validate_series(&symbol, &frame)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    println!("Validated {} rows for {symbol}", table.height());

    Ok(())
}
