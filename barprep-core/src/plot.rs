//! Diagnostic chart rendering.
//!
//! Renders the validated close-price series against time as a PNG at a fixed
//! resolution. DejaVu Sans ships embedded so rendering works without system
//! fonts (headless CI included).

use crate::schema::{self, INDEX_NAME};
use chrono::NaiveDateTime;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use polars::prelude::*;
use std::path::Path;
use std::sync::Once;
use thiserror::Error;

/// Fixed output resolution.
pub const CHART_SIZE: (u32, u32) = (1600, 800);

static FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
static FONT_INIT: Once = Once::new();

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("chart rendering failed: {0}")]
    Render(String),

    #[error("dataframe operation failed: {0}")]
    Frame(#[from] PolarsError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Render the close-price chart for a validated table to `out_path`.
///
/// Rows with a null close are skipped. An empty table renders empty axes
/// rather than failing. The parent directory is created on demand; the
/// backend is finalized (and the file handle released) on every exit path.
pub fn render_close_chart(table: &DataFrame, symbol: &str, out_path: &Path) -> Result<(), PlotError> {
    FONT_INIT.call_once(|| {
        let _ = register_font("sans-serif", FontStyle::Normal, FONT_BYTES);
    });

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let points = close_points(table)?;
    let (x_range, y_range) = axis_ranges(&points);
    let x_range: RangedDateTime<NaiveDateTime> = x_range.into();

    let root = BitMapBackend::new(out_path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{symbol} Close Price over Time"), ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(48)
        .y_label_area_size(64)
        .build_cartesian_2d(x_range, y_range)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Price ($)")
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(LineSeries::new(points, &BLUE))
        .map_err(render_err)?
        .label(format!("{symbol} Close"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

fn render_err<E: std::error::Error>(e: E) -> PlotError {
    PlotError::Render(e.to_string())
}

/// Extract (local New York time, close) points, skipping null closes.
fn close_points(table: &DataFrame) -> Result<Vec<(NaiveDateTime, f64)>, PlotError> {
    let index = table.column(INDEX_NAME)?.cast(&DataType::Int64)?;
    let index = index.i64()?;
    let closes = table.column("Close")?.f64()?;

    let mut points = Vec::with_capacity(table.height());
    for i in 0..table.height() {
        let (Some(millis), Some(close)) = (index.get(i), closes.get(i)) else {
            continue;
        };
        if let Some(dt) = schema::ny_datetime(millis) {
            points.push((dt.naive_local(), close));
        }
    }
    Ok(points)
}

/// Axis ranges with padding; degenerate inputs get a synthetic span so the
/// chart never fails to build.
fn axis_ranges(
    points: &[(NaiveDateTime, f64)],
) -> (std::ops::Range<NaiveDateTime>, std::ops::Range<f64>) {
    use chrono::Duration;

    let (x_min, x_max) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => {
            let lo = points.iter().map(|p| p.0).min().unwrap_or(first.0);
            let hi = points.iter().map(|p| p.0).max().unwrap_or(last.0);
            (lo, hi)
        }
        _ => {
            let epoch = chrono::DateTime::UNIX_EPOCH.naive_utc();
            (epoch, epoch + Duration::days(1))
        }
    };
    let (x_min, x_max) = if x_min == x_max {
        (x_min - Duration::hours(12), x_max + Duration::hours(12))
    } else {
        (x_min, x_max)
    };

    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for (_, y) in points {
        y_min = y_min.min(*y);
        y_max = y_max.max(*y);
    }
    let (y_min, y_max) = if y_min.is_finite() && y_max.is_finite() {
        let pad = ((y_max - y_min) * 0.05).max(0.5);
        (y_min - pad, y_max + pad)
    } else {
        (0.0, 1.0)
    };

    (x_min..x_max, y_min..y_max)
}
