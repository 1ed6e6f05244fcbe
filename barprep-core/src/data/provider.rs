//! Data provider seam and structured error types.
//!
//! The [`DataProvider`] trait abstracts over the market-data source so the
//! pipeline can be driven by a mock in tests. Fetches are parameterized by a
//! lookback [`Period`] and a bar [`Interval`] rather than explicit dates,
//! matching the chart-API convention.

use polars::prelude::DataFrame;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Structured error types for data retrieval.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Lookback window for a fetch, in the provider's range vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    #[default]
    TwoYears,
    FiveYears,
    TenYears,
    YearToDate,
    Max,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown period '{0}' (expected one of 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max)")]
pub struct ParsePeriodError(String);

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1mo" => Ok(Period::OneMonth),
            "3mo" => Ok(Period::ThreeMonths),
            "6mo" => Ok(Period::SixMonths),
            "1y" => Ok(Period::OneYear),
            "2y" => Ok(Period::TwoYears),
            "5y" => Ok(Period::FiveYears),
            "10y" => Ok(Period::TenYears),
            "ytd" => Ok(Period::YearToDate),
            "max" => Ok(Period::Max),
            other => Err(ParsePeriodError(other.to_string())),
        }
    }
}

/// Bar width for a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    #[default]
    OneHour,
    OneDay,
    OneWeek,
    OneMonth,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
            Interval::OneWeek => "1wk",
            Interval::OneMonth => "1mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown interval '{0}' (expected one of 1m, 5m, 15m, 30m, 1h, 1d, 1wk, 1mo)")]
pub struct ParseIntervalError(String);

impl FromStr for Interval {
    type Err = ParseIntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Interval::OneMinute),
            "5m" => Ok(Interval::FiveMinutes),
            "15m" => Ok(Interval::FifteenMinutes),
            "30m" => Ok(Interval::ThirtyMinutes),
            "1h" | "60m" => Ok(Interval::OneHour),
            "1d" => Ok(Interval::OneDay),
            "1wk" => Ok(Interval::OneWeek),
            "1mo" => Ok(Interval::OneMonth),
            other => Err(ParseIntervalError(other.to_string())),
        }
    }
}

/// Trait for market-data providers.
///
/// Implementations return a raw table: a timestamp index in the first column
/// followed by OHLCV-like field columns, untyped and unvalidated. The
/// validation step owns all typing.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch raw bars for a symbol over a lookback period.
    fn fetch(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<DataFrame, DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_roundtrips_through_strings() {
        for p in [
            Period::OneMonth,
            Period::TwoYears,
            Period::TenYears,
            Period::YearToDate,
            Period::Max,
        ] {
            assert_eq!(p.as_str().parse::<Period>().unwrap(), p);
        }
    }

    #[test]
    fn interval_roundtrips_through_strings() {
        for i in [
            Interval::OneMinute,
            Interval::OneHour,
            Interval::OneDay,
            Interval::OneMonth,
        ] {
            assert_eq!(i.as_str().parse::<Interval>().unwrap(), i);
        }
    }

    #[test]
    fn sixty_minutes_is_an_alias_for_one_hour() {
        assert_eq!("60m".parse::<Interval>().unwrap(), Interval::OneHour);
    }

    #[test]
    fn unknown_values_are_rejected_with_the_input_in_the_message() {
        let err = "2w".parse::<Period>().unwrap_err();
        assert!(err.to_string().contains("2w"));
        let err = "7m".parse::<Interval>().unwrap_err();
        assert!(err.to_string().contains("7m"));
    }

    #[test]
    fn defaults_match_the_research_workflow() {
        assert_eq!(Period::default(), Period::TwoYears);
        assert_eq!(Interval::default(), Interval::OneHour);
    }
}
