//! Descriptive statistics over daily return samples.
//!
//! Returns are expressed in percent (1.5 means 1.5%), matching the scale of
//! the French factor files. Annualisation uses [`TRADING_DAYS_PER_YEAR`].

/// Trading days per year used for annualisation.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Arithmetic mean. `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (divisor `n - 1`). `NaN` for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Geometric mean computed as `exp(mean(ln x))`.
///
/// Non-positive inputs make the logarithm undefined and yield `NaN`.
pub fn geometric_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let log_sum: f64 = values.iter().map(|v| v.ln()).sum();
    (log_sum / values.len() as f64).exp()
}

/// Annualised arithmetic average of daily percent returns.
pub fn annualized_mean(daily_pct: &[f64]) -> f64 {
    mean(daily_pct) * TRADING_DAYS_PER_YEAR as f64
}

/// Annualised volatility of daily percent returns.
pub fn annualized_volatility(daily_pct: &[f64]) -> f64 {
    sample_std(daily_pct) * (TRADING_DAYS_PER_YEAR as f64).sqrt()
}

/// Annualised geometric average return, in percent.
///
/// `(gmean(1 + r/100)^252 - 1) * 100`
pub fn annualized_geometric_return(daily_pct: &[f64]) -> f64 {
    let growth: Vec<f64> = daily_pct.iter().map(|r| 1.0 + r / 100.0).collect();
    (geometric_mean(&growth).powi(TRADING_DAYS_PER_YEAR as i32) - 1.0) * 100.0
}

/// Element-wise `a - b`. Slices must be the same length.
pub(crate) fn difference(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}
