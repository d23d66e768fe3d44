//! Ordinary least squares with an intercept.
//!
//! Fits `y = Xβ + ε` where the first column of `X` is a constant. Standard
//! errors use the classical (homoskedastic) estimator
//! `σ̂² = SSR / (n - k)` and `se(β̂ⱼ) = sqrt(σ̂² [(XᵀX)⁻¹]ⱼⱼ)`.

use crate::error::{AnalyticsError, Result};
use ndarray::{Array1, Array2, ArrayView1};

/// Name reported for the intercept term.
pub const CONST_TERM: &str = "const";

/// A named explanatory variable.
#[derive(Debug, Clone, Copy)]
pub struct Regressor<'a> {
    /// Variable name, used to look up its coefficient in the fit
    pub name: &'a str,
    /// Observations, aligned with the dependent variable
    pub values: &'a [f64],
}

impl<'a> Regressor<'a> {
    /// Create a new regressor.
    pub const fn new(name: &'a str, values: &'a [f64]) -> Self {
        Self { name, values }
    }
}

/// Result of an OLS fit.
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// Term names, `const` first
    pub terms: Vec<String>,
    /// Estimated coefficients, in `terms` order
    pub params: Array1<f64>,
    /// Standard errors of the coefficients
    pub std_errors: Array1<f64>,
    /// t-statistics of the coefficients
    pub t_values: Array1<f64>,
    /// Coefficient of determination
    pub r_squared: f64,
    /// Fitted values `Xβ̂`
    pub fitted: Array1<f64>,
    /// Residuals `y - Xβ̂`
    pub residuals: Array1<f64>,
}

impl OlsFit {
    fn index_of(&self, term: &str) -> Option<usize> {
        self.terms.iter().position(|t| t == term)
    }

    /// Coefficient for a term, if present.
    pub fn param(&self, term: &str) -> Option<f64> {
        self.index_of(term).map(|i| self.params[i])
    }

    /// t-statistic for a term, if present.
    pub fn t_value(&self, term: &str) -> Option<f64> {
        self.index_of(term).map(|i| self.t_values[i])
    }

    /// The intercept.
    pub fn intercept(&self) -> f64 {
        self.params[0]
    }

    /// Number of observations used.
    pub fn n_obs(&self) -> usize {
        self.residuals.len()
    }
}

/// Fit `y` on a constant plus `regressors`.
///
/// `label` identifies the regression in error messages.
///
/// # Errors
/// * [`AnalyticsError::LengthMismatch`] if a regressor is not aligned with `y`
/// * [`AnalyticsError::InsufficientObservations`] if `n <= k`
/// * [`AnalyticsError::SingularMatrix`] if `XᵀX` is not invertible
pub fn ols(label: &str, y: &[f64], regressors: &[Regressor<'_>]) -> Result<OlsFit> {
    let n = y.len();
    let k = regressors.len() + 1;

    for reg in regressors {
        if reg.values.len() != n {
            return Err(AnalyticsError::LengthMismatch {
                expected: n,
                actual: reg.values.len(),
            });
        }
    }

    if n <= k {
        return Err(AnalyticsError::InsufficientObservations {
            required: k,
            actual: n,
        });
    }

    let x = Array2::from_shape_fn((n, k), |(i, j)| {
        if j == 0 {
            1.0
        } else {
            regressors[j - 1].values[i]
        }
    });
    let y = ArrayView1::from(y);

    let xt = x.t();
    let xtx = xt.dot(&x);
    let xty = xt.dot(&y);
    let xtx_inv = invert(&xtx).ok_or_else(|| AnalyticsError::SingularMatrix(label.to_string()))?;

    let params = xtx_inv.dot(&xty);
    let fitted = x.dot(&params);
    let residuals = &y - &fitted;

    let ssr = residuals.dot(&residuals);
    let y_mean = y.mean().unwrap_or(f64::NAN);
    let sst: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = 1.0 - ssr / sst;

    let sigma2 = ssr / (n - k) as f64;
    let std_errors = xtx_inv.diag().mapv(|d| (sigma2 * d).sqrt());
    let t_values = &params / &std_errors;

    let mut terms = Vec::with_capacity(k);
    terms.push(CONST_TERM.to_string());
    terms.extend(regressors.iter().map(|r| r.name.to_string()));

    tracing::trace!(regression = label, n, k, r_squared, "ols fit");

    Ok(OlsFit {
        terms,
        params,
        std_errors,
        t_values,
        r_squared,
        fitted,
        residuals,
    })
}

/// Invert a square matrix by Gauss-Jordan elimination with partial pivoting.
///
/// Returns `None` when a pivot vanishes relative to the matrix scale.
fn invert(matrix: &Array2<f64>) -> Option<Array2<f64>> {
    let n = matrix.nrows();
    let mut a = matrix.clone();
    let mut inv = Array2::<f64>::eye(n);

    let scale = a.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return None;
    }
    let tolerance = scale * f64::EPSILON * n as f64 * 16.0;

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))?;
        if a[[pivot_row, col]].abs() <= tolerance {
            return None;
        }

        if pivot_row != col {
            for j in 0..n {
                a.swap([col, j], [pivot_row, j]);
                inv.swap([col, j], [pivot_row, j]);
            }
        }

        let pivot = a[[col, col]];
        for j in 0..n {
            a[[col, j]] /= pivot;
            inv[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                a[[row, j]] -= factor * a[[col, j]];
                inv[[row, j]] -= factor * inv[[col, j]];
            }
        }
    }

    Some(inv)
}
