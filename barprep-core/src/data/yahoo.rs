//! Yahoo Finance data provider.
//!
//! Fetches OHLCV bars from Yahoo's v8 chart API and assembles them into a raw
//! DataFrame for validation. Yahoo Finance has no official API and is subject
//! to unannounced format changes; the CSV ingest path is the fallback when it
//! is unavailable.
//!
//! There is deliberately no retry or backoff here: a failed fetch fails the
//! symbol, and the pipeline moves on to the next one.

use super::provider::{DataError, DataProvider, Interval, Period};
use polars::prelude::*;
use serde::Deserialize;
use std::time::Duration;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooProvider {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .expect("failed to build HTTP client");

        Self { client }
    }

    /// Build the chart API URL for a symbol, lookback period, and interval.
    fn chart_url(symbol: &str, period: Period, interval: Interval) -> String {
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?range={}&interval={}&includeAdjustedClose=false",
            period.as_str(),
            interval.as_str()
        )
    }

    /// Parse the chart API response into a raw DataFrame.
    ///
    /// The index column carries epoch-second timestamps; validation
    /// reinterprets them. Bars where every OHLCV value is absent (holidays,
    /// non-trading hours) are skipped; partially missing values survive as
    /// nulls for the validator to count.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<DataFrame, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let timestamps = data
            .timestamp
            .ok_or_else(|| DataError::ResponseFormatChanged("no timestamps".into()))?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let n = timestamps.len();
        let mut ts: Vec<i64> = Vec::with_capacity(n);
        let mut opens: Vec<Option<f64>> = Vec::with_capacity(n);
        let mut highs: Vec<Option<f64>> = Vec::with_capacity(n);
        let mut lows: Vec<Option<f64>> = Vec::with_capacity(n);
        let mut closes: Vec<Option<f64>> = Vec::with_capacity(n);
        let mut volumes: Vec<Option<u64>> = Vec::with_capacity(n);

        for (i, &t) in timestamps.iter().enumerate() {
            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            ts.push(t);
            opens.push(open);
            highs.push(high);
            lows.push(low);
            closes.push(close);
            volumes.push(volume);
        }

        if ts.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        DataFrame::new(vec![
            Column::new("Datetime".into(), ts),
            Column::new("Open".into(), opens),
            Column::new("High".into(), highs),
            Column::new("Low".into(), lows),
            Column::new("Close".into(), closes),
            Column::new("Volume".into(), volumes),
        ])
        .map_err(|e| DataError::Other(format!("raw frame assembly: {e}")))
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<DataFrame, DataError> {
        let url = Self::chart_url(symbol, period, interval);

        let resp = self.client.get(&url).send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                DataError::NetworkUnreachable(e.to_string())
            } else {
                DataError::Other(e.to_string())
            }
        })?;

        let status = resp.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(DataError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(DataError::AuthenticationRequired(format!(
                "Yahoo Finance refused the request (HTTP {status})"
            )));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        if !status.is_success() {
            return Err(DataError::Other(format!("HTTP {status} for {symbol}")));
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        Self::parse_response(symbol, chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canned_response(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn chart_url_carries_range_and_interval() {
        let url = YahooProvider::chart_url("AAPL", Period::TwoYears, Interval::OneHour);
        assert!(url.contains("/v8/finance/chart/AAPL"));
        assert!(url.contains("range=2y"));
        assert!(url.contains("interval=1h"));
    }

    #[test]
    fn parse_response_builds_a_raw_frame() {
        let resp = canned_response(
            r#"{"chart":{"result":[{"timestamp":[1704205800,1704209400],
                "indicators":{"quote":[{
                    "open":[100.0,101.0],"high":[105.0,106.0],
                    "low":[99.0,100.0],"close":[103.0,104.0],
                    "volume":[1000,1100]}]}}],"error":null}}"#,
        );

        let df = YahooProvider::parse_response("SPY", resp).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.get_columns()[0].name().as_str(), "Datetime");
        assert_eq!(df.column("Close").unwrap().f64().unwrap().get(1), Some(104.0));
        assert_eq!(df.column("Datetime").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn parse_response_skips_all_null_rows_but_keeps_partial_ones() {
        let resp = canned_response(
            r#"{"chart":{"result":[{"timestamp":[1,2,3],
                "indicators":{"quote":[{
                    "open":[100.0,null,null],"high":[105.0,null,106.0],
                    "low":[99.0,null,100.0],"close":[103.0,null,null],
                    "volume":[1000,null,null]}]}}],"error":null}}"#,
        );

        let df = YahooProvider::parse_response("SPY", resp).unwrap();
        // Row 2 was entirely null and is dropped; row 3 is partial and kept.
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("Close").unwrap().null_count(), 1);
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let resp = canned_response(
            r#"{"chart":{"result":null,
                "error":{"code":"Not Found","description":"No data found"}}}"#,
        );

        match YahooProvider::parse_response("NOPE", resp) {
            Err(DataError::SymbolNotFound { symbol }) => assert_eq!(symbol, "NOPE"),
            other => panic!("expected SymbolNotFound, got {other:?}"),
        }
    }

    #[test]
    fn other_chart_errors_surface_code_and_description() {
        let resp = canned_response(
            r#"{"chart":{"result":null,
                "error":{"code":"Bad Request","description":"Invalid interval"}}}"#,
        );

        match YahooProvider::parse_response("SPY", resp) {
            Err(DataError::ResponseFormatChanged(msg)) => {
                assert!(msg.contains("Bad Request"));
                assert!(msg.contains("Invalid interval"));
            }
            other => panic!("expected ResponseFormatChanged, got {other:?}"),
        }
    }
}
