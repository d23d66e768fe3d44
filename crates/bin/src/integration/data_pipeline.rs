//! Data pipeline for fetching quotes and building daily return series.
//!
//! Quotes arrive from Yahoo as Polars frames. Holdings are valued at their
//! share counts, inner-joined on date and summed into one portfolio value
//! series; every price series is then turned into daily percent changes and
//! handed to the analytics layer as a [`ReturnSeries`].

use chrono::NaiveDate;
use fremantle::Holding;
use fremantle::analytics::{ReturnSeries, WindowKind, WindowPlan, columns};
use fremantle::data::{DataError, FactorObservation, FactorTable, YahooQuoteProvider};
use indicatif::ProgressBar;
use polars::prelude::*;

/// Error type for data pipeline operations.
#[derive(Debug, thiserror::Error)]
pub(crate) enum DataPipelineError {
    /// Data fetch error from Yahoo.
    #[error("Data fetch error: {0}")]
    Fetch(#[from] DataError),
    /// Polars DataFrame error.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    /// A quote date could not be read back.
    #[error("Invalid date '{0}' in quote frame")]
    Date(String),
}

/// Column holding the summed portfolio value.
const VALUE: &str = "value";

/// Column holding adjusted closes in provider frames.
const ADJUSTED_CLOSE: &str = "adjusted_close";

/// Everything fetched from Yahoo for one run.
#[derive(Debug)]
pub(crate) struct RunQuotes {
    /// Portfolio returns over the full analysis range
    pub(crate) portfolio: ReturnSeries,
    /// Watch-list returns fetched separately for each window
    pub(crate) watchlist: Vec<(WindowKind, Vec<ReturnSeries>)>,
}

impl RunQuotes {
    /// Watch-list returns for a window.
    pub(crate) fn watchlist(&self, kind: WindowKind) -> &[ReturnSeries] {
        self.watchlist
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, series)| series.as_slice())
            .unwrap_or_default()
    }
}

/// Number of provider requests [`fetch_run_quotes`] will make.
pub(crate) fn request_count(holdings: &[Holding], watchlist: &[String]) -> usize {
    holdings.len() + watchlist.len() * WindowKind::ALL.len()
}

/// Fetch the portfolio over the full range, then each watch-list symbol over
/// each window's own range, one request at a time.
pub(crate) async fn fetch_run_quotes(
    provider: &YahooQuoteProvider,
    holdings: &[Holding],
    watchlist: &[String],
    plan: &WindowPlan,
    progress: Option<&ProgressBar>,
) -> Result<RunQuotes, DataPipelineError> {
    let (start, end) = plan.full_range();
    let portfolio = fetch_portfolio_returns(provider, holdings, start, end, progress).await?;

    let mut by_window = Vec::with_capacity(WindowKind::ALL.len());
    for kind in WindowKind::ALL {
        let window = plan.window(kind);
        let mut series = Vec::with_capacity(watchlist.len());
        for symbol in watchlist {
            if let Some(pb) = progress {
                pb.set_message(format!("Fetching {symbol} ({kind})..."));
            }
            series.push(fetch_symbol_returns(provider, symbol, window.start, window.end).await?);
            if let Some(pb) = progress {
                pb.inc(1);
            }
        }
        by_window.push((kind, series));
    }

    Ok(RunQuotes {
        portfolio,
        watchlist: by_window,
    })
}

/// Fetch every holding and build the portfolio's daily returns.
pub(crate) async fn fetch_portfolio_returns(
    provider: &YahooQuoteProvider,
    holdings: &[Holding],
    start: NaiveDate,
    end: NaiveDate,
    progress: Option<&ProgressBar>,
) -> Result<ReturnSeries, DataPipelineError> {
    let mut quotes = Vec::with_capacity(holdings.len());
    for holding in holdings {
        if let Some(pb) = progress {
            pb.set_message(format!("Fetching {} (portfolio)...", holding.symbol));
        }
        let df = provider.fetch_quotes(&holding.symbol, start, end).await?;
        quotes.push((holding.clone(), df));
        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    let value = portfolio_value(&quotes)?;
    let returns = percent_change(value, VALUE, columns::PORTFOLIO).collect()?;
    let series = to_return_series(&returns, columns::PORTFOLIO)?;

    tracing::info!(
        holdings = holdings.len(),
        days = series.len(),
        "built portfolio return series"
    );
    Ok(series)
}

/// Fetch one symbol and convert its adjusted closes to daily returns.
pub(crate) async fn fetch_symbol_returns(
    provider: &YahooQuoteProvider,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<ReturnSeries, DataPipelineError> {
    let quotes = provider.fetch_quotes(symbol, start, end).await?;
    let returns = percent_change(quotes.lazy(), ADJUSTED_CLOSE, symbol).collect()?;
    to_return_series(&returns, symbol)
}

/// Market value of the holdings on every date all of them traded.
///
/// Returns a LazyFrame with columns: [date, value]
pub(crate) fn portfolio_value(
    quotes: &[(Holding, DataFrame)],
) -> Result<LazyFrame, DataPipelineError> {
    let mut positions = quotes.iter().map(|(holding, df)| {
        df.clone().lazy().select([
            col("date"),
            (col(ADJUSTED_CLOSE) * lit(holding.shares)).alias(holding.symbol.as_str()),
        ])
    });

    let Some(first) = positions.next() else {
        return Err(DataError::MissingData {
            symbol: columns::PORTFOLIO.to_string(),
            reason: "no holdings to value".to_string(),
        }
        .into());
    };

    let joined = positions.fold(first, |acc, position| {
        acc.join(
            position,
            [col("date")],
            [col("date")],
            JoinArgs::new(JoinType::Inner),
        )
    });

    let total = quotes
        .iter()
        .map(|(holding, _)| col(holding.symbol.as_str()))
        .reduce(|acc, position| acc + position)
        .unwrap_or_else(|| lit(0.0));

    Ok(joined
        .sort(["date"], SortMultipleOptions::default())
        .select([col("date"), total.alias(VALUE)]))
}

/// Daily percent change of `price_col`, named `name`.
///
/// The first row has no predecessor and is dropped.
///
/// Returns a LazyFrame with columns: [date, name]
pub(crate) fn percent_change(prices: LazyFrame, price_col: &str, name: &str) -> LazyFrame {
    prices
        .sort(["date"], SortMultipleOptions::default())
        .with_column(
            ((col(price_col) / col(price_col).shift(lit(1)) - lit(1.0)) * lit(100.0)).alias(name),
        )
        .filter(col(name).is_not_null())
        .select([col("date"), col(name)])
}

/// Read a `[date, column]` frame into a [`ReturnSeries`].
pub(crate) fn to_return_series(
    df: &DataFrame,
    column: &str,
) -> Result<ReturnSeries, DataPipelineError> {
    let date_strings = df.column("date")?.cast(&DataType::String)?;
    let dates = date_strings.str()?;
    let values = df.column(column)?.f64()?;

    let observations = dates
        .into_iter()
        .zip(values)
        .filter_map(|(date, value)| Some((date?, value?)))
        .map(|(date, value)| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map(|d| (d, value))
                .map_err(|_| DataPipelineError::Date(date.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(column, rows = observations.len(), "converted return frame");
    Ok(ReturnSeries::from_observations(column, observations))
}

/// The market and factor columns of the factor table as return series:
/// `Mkt`, `Mkt-RF`, `SMB`, `HML`, `RF`, `MOM`.
pub(crate) fn factor_series(table: &FactorTable) -> Vec<ReturnSeries> {
    let rows = table.rows();
    let series = |name: &str, value: fn(&FactorObservation) -> f64| {
        ReturnSeries::from_observations(name, rows.iter().map(|r| (r.date, value(r))))
    };

    vec![
        series(columns::MARKET, FactorObservation::market),
        series(columns::MKT_RF, |r| r.mkt_rf),
        series(columns::SMB, |r| r.smb),
        series(columns::HML, |r| r.hml),
        series(columns::RF, |r| r.rf),
        series(columns::MOM, |r| r.mom),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::Duration;

    /// 2020-01-01 as days since the Unix epoch.
    const JAN_1_2020: i32 = 18_262;

    fn day(offset: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Duration::days(offset as i64)
    }

    fn quotes(symbol: &str, days: &[i32], closes: &[f64]) -> DataFrame {
        let dates = Series::new(
            "date".into(),
            days.iter().map(|d| JAN_1_2020 + d).collect::<Vec<i32>>(),
        )
        .cast(&DataType::Date)
        .unwrap();
        DataFrame::new(vec![
            Series::new("symbol".into(), vec![symbol; days.len()]).into(),
            dates.into(),
            Series::new("close".into(), closes.to_vec()).into(),
            Series::new(ADJUSTED_CLOSE.into(), closes.to_vec()).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_percent_change_drops_first_row() {
        let df = quotes("SPY", &[2, 0, 1], &[110.0, 100.0, 105.0]);
        let returns = percent_change(df.lazy(), ADJUSTED_CLOSE, "SPY")
            .collect()
            .unwrap();
        let series = to_return_series(&returns, "SPY").unwrap();

        assert_eq!(series.name(), "SPY");
        assert_eq!(series.len(), 2);
        assert_eq!(series.get(day(0)), None);
        assert_abs_diff_eq!(series.get(day(1)).unwrap(), 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            series.get(day(2)).unwrap(),
            (110.0 / 105.0 - 1.0) * 100.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_portfolio_value_uses_common_dates() {
        let holdings = vec![
            (Holding::new("AAA", 2.0), quotes("AAA", &[0, 1, 2, 3], &[10.0, 11.0, 12.0, 13.0])),
            (Holding::new("BBB", 1.0), quotes("BBB", &[1, 2, 3, 4], &[50.0, 49.0, 51.0, 52.0])),
        ];

        let value = portfolio_value(&holdings).unwrap().collect().unwrap();
        let series = to_return_series(&value, VALUE).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.date_range(), Some((day(1), day(3))));
        assert_abs_diff_eq!(series.get(day(1)).unwrap(), 72.0);
        assert_abs_diff_eq!(series.get(day(2)).unwrap(), 73.0);
        assert_abs_diff_eq!(series.get(day(3)).unwrap(), 77.0);
    }

    #[test]
    fn test_portfolio_returns_from_value() {
        let holdings = vec![
            (Holding::new("AAA", 1.0), quotes("AAA", &[0, 1, 2], &[100.0, 102.0, 99.0])),
            (Holding::new("BBB", 3.0), quotes("BBB", &[0, 1, 2], &[10.0, 10.0, 11.0])),
        ];
        let value = portfolio_value(&holdings).unwrap();
        let returns = percent_change(value, VALUE, columns::PORTFOLIO)
            .collect()
            .unwrap();
        let series = to_return_series(&returns, columns::PORTFOLIO).unwrap();

        // values: 130, 132, 132
        assert_abs_diff_eq!(
            series.get(day(1)).unwrap(),
            (132.0 / 130.0 - 1.0) * 100.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(series.get(day(2)).unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_holdings() {
        assert!(matches!(
            portfolio_value(&[]),
            Err(DataPipelineError::Fetch(DataError::MissingData { .. }))
        ));
    }

    #[test]
    fn test_factor_series_columns() {
        let table = FactorTable::from_rows(vec![FactorObservation {
            date: day(0),
            mkt_rf: 1.0,
            smb: 0.2,
            hml: -0.1,
            rf: 0.01,
            mom: 0.3,
        }])
        .unwrap();

        let series = factor_series(&table);
        let names: Vec<&str> = series.iter().map(ReturnSeries::name).collect();
        assert_eq!(names, vec!["Mkt", "Mkt-RF", "SMB", "HML", "RF", "MOM"]);
        assert_abs_diff_eq!(series[0].get(day(0)).unwrap(), 1.01);
        assert_abs_diff_eq!(series[5].get(day(0)).unwrap(), 0.3);
    }

    #[test]
    fn test_request_count() {
        let holdings = vec![Holding::new("SPY", 1.0), Holding::new("VOO", 1.0)];
        let watchlist = vec!["MTB".to_string()];
        assert_eq!(request_count(&holdings, &watchlist), 4);
    }
}
