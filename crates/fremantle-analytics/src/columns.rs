//! Column labels shared by the pipeline, the metric table and the exports.

/// Market return (`Mkt-RF + RF`)
pub const MARKET: &str = "Mkt";
/// User portfolio return
pub const PORTFOLIO: &str = "Portfolio";

/// Market excess return factor
pub const MKT_RF: &str = "Mkt-RF";
/// Size factor
pub const SMB: &str = "SMB";
/// Value factor
pub const HML: &str = "HML";
/// Risk-free rate
pub const RF: &str = "RF";
/// Momentum factor
pub const MOM: &str = "MOM";

/// Regressors of the four-factor model, in output order.
pub const FOUR_FACTORS: [&str; 4] = [MKT_RF, SMB, HML, MOM];

/// Benchmarks that relative metrics are computed against, in output order.
pub const BENCHMARKS: [&str; 2] = [MARKET, PORTFOLIO];

/// Labels that may not be used for watch-list symbols.
pub fn is_reserved(label: &str) -> bool {
    [MARKET, PORTFOLIO, MKT_RF, SMB, HML, RF, MOM]
        .iter()
        .any(|r| r.eq_ignore_ascii_case(label))
}

/// Output column labels: `[Mkt, Portfolio, ...watchlist]`.
pub fn output_labels<S: AsRef<str>>(watchlist: &[S]) -> Vec<String> {
    BENCHMARKS
        .iter()
        .map(|s| (*s).to_string())
        .chain(watchlist.iter().map(|s| s.as_ref().to_string()))
        .collect()
}
