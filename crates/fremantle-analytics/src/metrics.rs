//! Per-column performance metrics for one analysis window.
//!
//! All inputs are daily percent returns taken from an aligned
//! [`ReturnFrame`]. The frame must carry every output label plus the
//! benchmark columns ([`MARKET`], [`PORTFOLIO`]) and the factor columns
//! ([`RF`] and [`FOUR_FACTORS`]).
//!
//! Ratio metrics are not guarded: a zero volatility or zero tracking error
//! produces a non-finite value, which is kept in the table and logged.

use crate::columns::{BENCHMARKS, FOUR_FACTORS, MARKET, RF};
use crate::error::{AnalyticsError, Result};
use crate::frame::ReturnFrame;
use crate::regression::{CONST_TERM, OlsFit, Regressor, ols};
use crate::stats::{
    TRADING_DAYS_PER_YEAR, annualized_geometric_return, annualized_mean, annualized_volatility,
    difference, mean, sample_std,
};
use serde::{Deserialize, Serialize};

/// Metric row labels.
pub mod names {
    /// Annualised arithmetic mean of daily returns
    pub const ARITHMETIC_RETURN: &str = "Arithmetic Average Return";
    /// Annualised standard deviation of daily returns
    pub const VOLATILITY: &str = "Volatility";
    /// Annualised compounded return
    pub const GEOMETRIC_RETURN: &str = "Geometric Average Return";
    /// Excess return per unit volatility
    pub const SHARPE_RATIO: &str = "Sharpe Ratio";
    /// Modigliani-Modigliani measure
    pub const M2: &str = "M2";
    /// R² of the four-factor regression
    pub const FAMA_FRENCH_R2: &str = "Fama-French R2";

    /// `Beta (<benchmark>)`
    pub fn beta(benchmark: &str) -> String {
        format!("Beta ({benchmark})")
    }

    /// `Jensen's Alpha (<benchmark>)`
    pub fn jensens_alpha(benchmark: &str) -> String {
        format!("Jensen's Alpha ({benchmark})")
    }

    /// `Tracking Error (<benchmark>)`
    pub fn tracking_error(benchmark: &str) -> String {
        format!("Tracking Error ({benchmark})")
    }

    /// `Appraisal Ratio (<benchmark>)`
    pub fn appraisal_ratio(benchmark: &str) -> String {
        format!("Appraisal Ratio ({benchmark})")
    }

    /// `Fama-French <term> (coef)`
    pub fn fama_french_coef(term: &str) -> String {
        format!("Fama-French {term} (coef)")
    }

    /// `Fama-French <term> (t)`
    pub fn fama_french_t(term: &str) -> String {
        format!("Fama-French {term} (t)")
    }
}

/// One metric across every column label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    /// Metric label
    pub name: String,
    /// One value per column label, in label order
    pub values: Vec<f64>,
}

/// Metric name → values per column label, for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTable {
    labels: Vec<String>,
    rows: Vec<MetricRow>,
}

impl MetricTable {
    /// Empty table over the given column labels.
    pub const fn new(labels: Vec<String>) -> Self {
        Self {
            labels,
            rows: Vec::new(),
        }
    }

    /// Append a metric row.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::LengthMismatch`] if `values` does not have
    /// one entry per label.
    pub fn push(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        if values.len() != self.labels.len() {
            return Err(AnalyticsError::LengthMismatch {
                expected: self.labels.len(),
                actual: values.len(),
            });
        }
        self.rows.push(MetricRow {
            name: name.into(),
            values,
        });
        Ok(())
    }

    /// Column labels.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Metric rows in insertion order.
    pub fn rows(&self) -> &[MetricRow] {
        &self.rows
    }

    /// Values of a metric across labels.
    pub fn get(&self, metric: &str) -> Option<&[f64]> {
        self.rows
            .iter()
            .find(|r| r.name == metric)
            .map(|r| r.values.as_slice())
    }

    /// Single value for a metric and column label.
    pub fn value(&self, metric: &str, label: &str) -> Option<f64> {
        let idx = self.labels.iter().position(|l| l == label)?;
        self.get(metric).map(|v| v[idx])
    }

    /// `(metric, label)` pairs whose value is NaN or infinite.
    pub fn non_finite(&self) -> Vec<(&str, &str)> {
        self.rows
            .iter()
            .flat_map(|row| {
                row.values
                    .iter()
                    .zip(&self.labels)
                    .filter(|(v, _)| !v.is_finite())
                    .map(move |(_, label)| (row.name.as_str(), label.as_str()))
            })
            .collect()
    }
}

/// Stand-alone statistics of one column.
#[derive(Debug, Clone, Copy)]
struct ColumnSummary {
    arithmetic: f64,
    volatility: f64,
    geometric: f64,
    sharpe: f64,
}

impl ColumnSummary {
    fn compute(returns: &[f64], risk_free: f64) -> Self {
        let arithmetic = annualized_mean(returns);
        let volatility = annualized_volatility(returns);
        Self {
            arithmetic,
            volatility,
            geometric: annualized_geometric_return(returns),
            sharpe: (arithmetic - risk_free) / volatility,
        }
    }
}

/// Statistics of one column relative to a benchmark.
#[derive(Debug, Clone, Copy)]
struct RelativeSummary {
    beta: f64,
    alpha: f64,
    tracking_error: f64,
    appraisal: f64,
}

impl RelativeSummary {
    fn compute(
        label: &str,
        returns: &[f64],
        summary: &ColumnSummary,
        benchmark: &str,
        benchmark_returns: &[f64],
        benchmark_summary: &ColumnSummary,
        risk_free: f64,
    ) -> Result<Self> {
        let fit = ols(
            &format!("{label} ~ {benchmark}"),
            returns,
            &[Regressor::new(benchmark, benchmark_returns)],
        )?;
        let beta = fit.params[1];
        let alpha =
            summary.arithmetic - (risk_free + beta * (benchmark_summary.arithmetic - risk_free));
        let residuals = fit.residuals.to_vec();
        let tracking_error = sample_std(&residuals) * (TRADING_DAYS_PER_YEAR as f64).sqrt();

        Ok(Self {
            beta,
            alpha,
            tracking_error,
            appraisal: alpha / tracking_error,
        })
    }
}

/// Fit the four-factor model on a column's excess return.
fn fama_french(label: &str, frame: &ReturnFrame, excess: &[f64]) -> Result<OlsFit> {
    let factors = FOUR_FACTORS
        .iter()
        .map(|name| frame.column(name).map(|values| Regressor::new(name, values)))
        .collect::<Result<Vec<_>>>()?;
    ols(&format!("{label} four-factor"), excess, &factors)
}

/// Compute the metric table for `labels` over an aligned frame.
///
/// Rows are emitted in a fixed order: stand-alone statistics, then the
/// relative block for each benchmark, then the four-factor coefficients,
/// t-statistics and R².
///
/// # Errors
/// * [`AnalyticsError::EmptySeries`] if the frame has no rows
/// * [`AnalyticsError::MissingColumn`] if a label or required column is absent
/// * regression errors from [`ols`]
pub fn compute_metrics(frame: &ReturnFrame, labels: &[String]) -> Result<MetricTable> {
    if frame.is_empty() {
        return Err(AnalyticsError::EmptySeries("aligned window".to_string()));
    }

    let risk_free = mean(frame.column(RF)?) * TRADING_DAYS_PER_YEAR as f64;

    let columns = labels
        .iter()
        .map(|label| frame.column(label))
        .collect::<Result<Vec<_>>>()?;
    let summaries: Vec<ColumnSummary> = columns
        .iter()
        .map(|returns| ColumnSummary::compute(returns, risk_free))
        .collect();

    let mut table = MetricTable::new(labels.to_vec());
    table.push(
        names::ARITHMETIC_RETURN,
        summaries.iter().map(|s| s.arithmetic).collect(),
    )?;
    table.push(
        names::VOLATILITY,
        summaries.iter().map(|s| s.volatility).collect(),
    )?;
    table.push(
        names::GEOMETRIC_RETURN,
        summaries.iter().map(|s| s.geometric).collect(),
    )?;
    table.push(
        names::SHARPE_RATIO,
        summaries.iter().map(|s| s.sharpe).collect(),
    )?;

    let market = ColumnSummary::compute(frame.column(MARKET)?, risk_free);
    table.push(
        names::M2,
        summaries
            .iter()
            .map(|s| (s.sharpe - market.sharpe) * market.volatility)
            .collect(),
    )?;

    for benchmark in BENCHMARKS {
        let benchmark_returns = frame.column(benchmark)?;
        let benchmark_summary = ColumnSummary::compute(benchmark_returns, risk_free);

        let relative = labels
            .iter()
            .zip(&columns)
            .zip(&summaries)
            .map(|((label, returns), summary)| {
                RelativeSummary::compute(
                    label,
                    returns,
                    summary,
                    benchmark,
                    benchmark_returns,
                    &benchmark_summary,
                    risk_free,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        table.push(
            names::beta(benchmark),
            relative.iter().map(|r| r.beta).collect(),
        )?;
        table.push(
            names::jensens_alpha(benchmark),
            relative.iter().map(|r| r.alpha).collect(),
        )?;
        table.push(
            names::tracking_error(benchmark),
            relative.iter().map(|r| r.tracking_error).collect(),
        )?;
        table.push(
            names::appraisal_ratio(benchmark),
            relative.iter().map(|r| r.appraisal).collect(),
        )?;
    }

    let rf_daily = frame.column(RF)?;
    let fits = labels
        .iter()
        .zip(&columns)
        .map(|(label, returns)| fama_french(label, frame, &difference(returns, rf_daily)))
        .collect::<Result<Vec<_>>>()?;

    for term in std::iter::once(CONST_TERM).chain(FOUR_FACTORS) {
        table.push(
            names::fama_french_coef(term),
            fits.iter()
                .map(|f| f.param(term).unwrap_or(f64::NAN))
                .collect(),
        )?;
        table.push(
            names::fama_french_t(term),
            fits.iter()
                .map(|f| f.t_value(term).unwrap_or(f64::NAN))
                .collect(),
        )?;
    }
    table.push(
        names::FAMA_FRENCH_R2,
        fits.iter().map(|f| f.r_squared).collect(),
    )?;

    for (metric, label) in table.non_finite() {
        tracing::warn!(metric, label, "non-finite metric value");
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_push_and_lookup() {
        let mut table = MetricTable::new(vec!["Mkt".to_string(), "Portfolio".to_string()]);
        table.push("Volatility", vec![15.0, 18.0]).unwrap();
        table.push("Sharpe Ratio", vec![0.5, f64::NAN]).unwrap();

        assert_eq!(table.get("Volatility"), Some(&[15.0, 18.0][..]));
        assert_eq!(table.value("Volatility", "Portfolio"), Some(18.0));
        assert_eq!(table.value("Volatility", "XYZ"), None);
        assert_eq!(table.non_finite(), vec![("Sharpe Ratio", "Portfolio")]);
        assert_eq!(table.rows()[0].name, "Volatility");
    }

    #[test]
    fn test_table_rejects_wrong_width() {
        let mut table = MetricTable::new(vec!["Mkt".to_string()]);
        let result = table.push("M2", vec![1.0, 2.0]);
        assert!(matches!(
            result,
            Err(AnalyticsError::LengthMismatch {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_metric_names() {
        assert_eq!(names::beta("Mkt"), "Beta (Mkt)");
        assert_eq!(names::jensens_alpha("Portfolio"), "Jensen's Alpha (Portfolio)");
        assert_eq!(names::fama_french_coef("const"), "Fama-French const (coef)");
        assert_eq!(names::fama_french_t("MOM"), "Fama-French MOM (t)");
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let frame = ReturnFrame::default();
        let result = compute_metrics(&frame, &["Mkt".to_string()]);
        assert!(matches!(result, Err(AnalyticsError::EmptySeries(_))));
    }
}
