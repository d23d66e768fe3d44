//! Integration tests for the window metric table.

use approx::assert_abs_diff_eq;
use chrono::{Duration, NaiveDate};
use fremantle_analytics::columns::{self, HML, MARKET, MKT_RF, MOM, PORTFOLIO, RF, SMB};
use fremantle_analytics::metrics::names;
use fremantle_analytics::{MetricTable, ReturnFrame, ReturnSeries, compute_metrics};
use rstest::{fixture, rstest};

const MKT_RF_VALUES: [f64; 12] = [
    0.52, -0.31, 0.87, -1.12, 0.24, 0.66, -0.45, 0.13, 1.05, -0.72, 0.38, -0.09,
];
const SMB_VALUES: [f64; 12] = [
    0.11, -0.25, 0.07, 0.32, -0.14, 0.05, 0.21, -0.33, 0.02, 0.17, -0.08, 0.26,
];
const HML_VALUES: [f64; 12] = [
    -0.18, 0.09, 0.23, -0.05, 0.31, -0.27, 0.04, 0.15, -0.22, 0.12, 0.35, -0.11,
];
const MOM_VALUES: [f64; 12] = [
    0.27, 0.14, -0.36, 0.08, -0.19, 0.41, -0.02, 0.22, -0.15, 0.06, -0.29, 0.18,
];
const RF_VALUES: [f64; 12] = [
    0.01, 0.01, 0.012, 0.012, 0.011, 0.01, 0.009, 0.01, 0.011, 0.012, 0.01, 0.01,
];
const PORTFOLIO_VALUES: [f64; 12] = [
    0.3, -0.2, 0.9, -0.8, 0.1, 0.5, -0.6, 0.4, 0.7, -0.3, 0.2, 0.05,
];
const NOISE: [f64; 12] = [
    0.1, -0.05, 0.02, 0.07, -0.12, 0.04, 0.03, -0.06, 0.08, -0.02, 0.01, -0.09,
];

fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 6, 1).unwrap() + Duration::days(i as i64)
}

fn series(name: &str, values: &[f64]) -> ReturnSeries {
    ReturnSeries::from_observations(name, values.iter().enumerate().map(|(i, v)| (day(i), *v)))
}

struct Window {
    frame: ReturnFrame,
    labels: Vec<String>,
}

#[fixture]
fn window() -> Window {
    let market: Vec<f64> = MKT_RF_VALUES
        .iter()
        .zip(RF_VALUES)
        .map(|(a, b)| a + b)
        .collect();
    let aaa: Vec<f64> = market
        .iter()
        .zip(NOISE)
        .map(|(m, e)| 0.05 + 1.5 * m + e)
        .collect();

    let all = [
        series(MARKET, &market),
        series(PORTFOLIO, &PORTFOLIO_VALUES),
        series("AAA", &aaa),
        series(MKT_RF, &MKT_RF_VALUES),
        series(SMB, &SMB_VALUES),
        series(HML, &HML_VALUES),
        series(RF, &RF_VALUES),
        series(MOM, &MOM_VALUES),
    ];

    Window {
        frame: ReturnFrame::inner_join(&all).unwrap(),
        labels: columns::output_labels(&["AAA"]),
    }
}

fn metrics(window: &Window) -> MetricTable {
    compute_metrics(&window.frame, &window.labels).unwrap()
}

#[rstest]
fn test_hand_computed_statistics(window: Window) {
    let table = metrics(&window);

    let value = |metric: &str, label: &str| table.value(metric, label).unwrap();

    assert_abs_diff_eq!(value(names::ARITHMETIC_RETURN, MARKET), 27.027, epsilon = 1e-6);
    assert_abs_diff_eq!(value(names::VOLATILITY, MARKET), 10.431512184460384, epsilon = 1e-6);
    assert_abs_diff_eq!(value(names::SHARPE_RATIO, MARKET), 2.3352318982370175, epsilon = 1e-6);
    assert_abs_diff_eq!(value(names::SHARPE_RATIO, PORTFOLIO), 2.9174146310437403, epsilon = 1e-6);
    assert_abs_diff_eq!(value(names::SHARPE_RATIO, "AAA"), 3.190265172218179, epsilon = 1e-6);
    assert_abs_diff_eq!(value(names::M2, "AAA"), 8.91929001565354, epsilon = 1e-6);

    let beta_mkt = names::beta(MARKET);
    assert_abs_diff_eq!(value(&beta_mkt, "AAA"), 1.5194103095433575, epsilon = 1e-6);
    assert_abs_diff_eq!(
        value(&names::beta(PORTFOLIO), "AAA"),
        1.8367212037104663,
        epsilon = 1e-6
    );
    assert_abs_diff_eq!(
        value(&names::jensens_alpha(MARKET), "AAA"),
        13.67066485952381,
        epsilon = 1e-6
    );
    assert_abs_diff_eq!(
        value(&names::tracking_error(MARKET), "AAA"),
        1.0862163409343482,
        epsilon = 1e-6
    );
    assert_abs_diff_eq!(
        value(&names::appraisal_ratio(MARKET), "AAA"),
        13.67066485952381 / 1.0862163409343482,
        epsilon = 1e-6
    );

    // M2 of the market against itself is zero
    assert_abs_diff_eq!(value(names::M2, MARKET), 0.0, epsilon = 1e-12);
}

#[rstest]
#[case(MARKET)]
#[case(PORTFOLIO)]
fn test_benchmark_against_itself(window: Window, #[case] benchmark: &str) {
    let table = metrics(&window);

    assert_abs_diff_eq!(
        table.value(&names::beta(benchmark), benchmark).unwrap(),
        1.0,
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(
        table
            .value(&names::jensens_alpha(benchmark), benchmark)
            .unwrap(),
        0.0,
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(
        table
            .value(&names::tracking_error(benchmark), benchmark)
            .unwrap(),
        0.0,
        epsilon = 1e-9
    );
}

#[rstest]
fn test_row_and_column_order(window: Window) {
    let table = metrics(&window);

    assert_eq!(table.labels(), &["Mkt", "Portfolio", "AAA"]);

    let rows: Vec<&str> = table.rows().iter().map(|r| r.name.as_str()).collect();
    let mut expected = vec![
        "Arithmetic Average Return".to_string(),
        "Volatility".to_string(),
        "Geometric Average Return".to_string(),
        "Sharpe Ratio".to_string(),
        "M2".to_string(),
    ];
    for benchmark in ["Mkt", "Portfolio"] {
        expected.push(format!("Beta ({benchmark})"));
        expected.push(format!("Jensen's Alpha ({benchmark})"));
        expected.push(format!("Tracking Error ({benchmark})"));
        expected.push(format!("Appraisal Ratio ({benchmark})"));
    }
    for term in ["const", "Mkt-RF", "SMB", "HML", "MOM"] {
        expected.push(format!("Fama-French {term} (coef)"));
        expected.push(format!("Fama-French {term} (t)"));
    }
    expected.push("Fama-French R2".to_string());

    assert_eq!(rows, expected);
    assert!(table.rows().iter().all(|r| r.values.len() == 3));
}

#[rstest]
fn test_four_factor_fit_of_market(window: Window) {
    let table = metrics(&window);

    // Mkt - RF is exactly the Mkt-RF regressor
    assert_abs_diff_eq!(
        table
            .value(&names::fama_french_coef(MKT_RF), MARKET)
            .unwrap(),
        1.0,
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(
        table.value(&names::fama_french_coef("const"), MARKET).unwrap(),
        0.0,
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(
        table.value(names::FAMA_FRENCH_R2, MARKET).unwrap(),
        1.0,
        epsilon = 1e-9
    );

    let r2 = table.value(names::FAMA_FRENCH_R2, "AAA").unwrap();
    assert!(r2 > 0.9 && r2 <= 1.0);
}

#[rstest]
fn test_portfolio_geometric_return_and_factor_fit(window: Window) {
    let table = metrics(&window);

    // (exp(mean(ln(1 + r/100)))^252 - 1) * 100
    assert_abs_diff_eq!(
        table.value(names::GEOMETRIC_RETURN, PORTFOLIO).unwrap(),
        29.611591307209185,
        epsilon = 1e-6
    );

    // Portfolio - RF on const, Mkt-RF, SMB, HML, MOM; 12 days, 7 residual dof
    assert_abs_diff_eq!(
        table
            .value(&names::fama_french_coef(MKT_RF), PORTFOLIO)
            .unwrap(),
        0.7967666056521894,
        epsilon = 1e-6
    );
    assert_abs_diff_eq!(
        table
            .value(&names::fama_french_t(MKT_RF), PORTFOLIO)
            .unwrap(),
        5.83178088630967,
        epsilon = 1e-6
    );
    assert_abs_diff_eq!(
        table.value(&names::fama_french_t("const"), PORTFOLIO).unwrap(),
        -0.22703173481510655,
        epsilon = 1e-6
    );
}

#[rstest]
fn test_missing_label_is_an_error(window: Window) {
    let labels = columns::output_labels(&["ZZZ"]);
    let result = compute_metrics(&window.frame, &labels);
    assert!(result.is_err());
}
