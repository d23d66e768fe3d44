//! Adjusted close prices from Yahoo Finance.

use crate::error::{DataError, Result};
use chrono::{Duration as ChronoDuration, NaiveDate};
use polars::prelude::*;
use std::time::Duration;
use tokio::time::sleep;
use yahoo_finance_api as yahoo;

/// Default pause after each request.
const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(250);

/// Yahoo Finance quote provider with a fixed pause between requests.
pub struct YahooQuoteProvider {
    provider: yahoo::YahooConnector,
    request_delay: Duration,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("request_delay", &self.request_delay)
            .finish_non_exhaustive()
    }
}

impl YahooQuoteProvider {
    /// Create a provider with the default request delay.
    pub fn new() -> Result<Self> {
        Self::with_request_delay(DEFAULT_REQUEST_DELAY)
    }

    /// Create a provider with a custom request delay.
    pub fn with_request_delay(request_delay: Duration) -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            request_delay,
        })
    }

    /// Fetch daily closes for a single symbol.
    ///
    /// Both `start` and `end` are inclusive calendar dates.
    ///
    /// # Returns
    /// A Polars DataFrame with columns: symbol, date, close, adjusted_close,
    /// sorted by date
    pub async fn fetch_quotes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        if symbol.trim().is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let start_time = to_offset_datetime(start)?;
        let end_time = to_offset_datetime(end + ChronoDuration::days(1))?;

        tracing::debug!(symbol, %start, %end, "requesting quote history");

        let response = self
            .provider
            .get_quote_history(symbol, start_time, end_time)
            .await?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        if quotes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }

        let timestamps: Vec<i64> = quotes.iter().map(|q| q.timestamp).collect();
        let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
        let adj_closes: Vec<f64> = quotes.iter().map(|q| q.adjclose).collect();

        let mut df = DataFrame::new(vec![
            Series::new("timestamp".into(), timestamps).into(),
            Series::new("close".into(), closes).into(),
            Series::new("adjusted_close".into(), adj_closes).into(),
        ])?;

        let symbol_col: Column = Series::new("symbol".into(), vec![symbol; df.height()]).into();
        df.with_column(symbol_col)?;

        let df = df
            .lazy()
            .with_column(
                (col("timestamp") * lit(1_000_000_000))
                    .cast(DataType::Datetime(TimeUnit::Nanoseconds, None))
                    .cast(DataType::Date)
                    .alias("date"),
            )
            .sort(["date"], SortMultipleOptions::default())
            .select(&[
                col("symbol"),
                col("date"),
                col("close"),
                col("adjusted_close"),
            ])
            .collect()?;

        tracing::debug!(symbol, rows = df.height(), "received quotes");

        sleep(self.request_delay).await;

        Ok(df)
    }
}

fn to_offset_datetime(date: NaiveDate) -> Result<time::OffsetDateTime> {
    let timestamp = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| DataError::TimeConversion(format!("invalid midnight for {date}")))?
        .and_utc()
        .timestamp();
    time::OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| DataError::TimeConversion(e.to_string()))
}
