//! Daily Fama-French factor tables.
//!
//! Reads the CSV layout published by the Kenneth R. French data library:
//!
//! ```text
//! This file was created by CMPT_ME_BEME_RETS_DAILY using the 202005 CRSP database.
//!
//! ,Mkt-RF,SMB,HML,RF
//! 19630701,   -0.67,    0.02,   -0.35,    0.012
//! 19630702,    0.79,   -0.28,    0.28,    0.012
//! ...
//!
//!  Annual Factors: January-December
//! ```
//!
//! The header row is the first row whose leading cell is blank or `Date`.
//! Data rows are keyed by `YYYYMMDD`; the first non-date row after the data
//! ends the daily block. Values are daily returns in percent.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Market excess return header
pub const MKT_RF: &str = "Mkt-RF";
/// Size header
pub const SMB: &str = "SMB";
/// Value header
pub const HML: &str = "HML";
/// Risk-free rate header
pub const RF: &str = "RF";
/// Momentum header (`Mom` in the library's momentum file)
pub const MOM: &str = "MOM";

/// Sentinels the library uses for missing observations.
const MISSING_SENTINELS: [f64; 2] = [-99.99, -999.0];

/// One trading day of factor returns, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorObservation {
    /// Trading date
    pub date: NaiveDate,
    /// Market return minus risk-free rate
    pub mkt_rf: f64,
    /// Small minus big
    pub smb: f64,
    /// High minus low book-to-market
    pub hml: f64,
    /// Risk-free rate
    pub rf: f64,
    /// Momentum (up minus down)
    pub mom: f64,
}

impl FactorObservation {
    /// Total market return, `Mkt-RF + RF`.
    pub fn market(&self) -> f64 {
        self.mkt_rf + self.rf
    }
}

/// Daily factor table, ascending by date with unique dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorTable {
    rows: Vec<FactorObservation>,
}

impl FactorTable {
    /// Build a table from observations in any order.
    ///
    /// # Errors
    /// Returns [`DataError::Parse`] when a date appears twice.
    pub fn from_rows(mut rows: Vec<FactorObservation>) -> Result<Self> {
        rows.sort_by_key(|r| r.date);
        if let Some(pair) = rows.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(DataError::Parse(format!(
                "duplicate factor date {}",
                pair[0].date
            )));
        }
        Ok(Self { rows })
    }

    /// Load the factor file and, when momentum is not one of its columns,
    /// merge the separate momentum file on date.
    pub fn load(factors_path: &Path, momentum_path: Option<&Path>) -> Result<Self> {
        let factors = FrenchSheet::from_path(factors_path)?;
        let momentum = momentum_path.map(FrenchSheet::from_path).transpose()?;
        let table = Self::from_sheets(&factors, momentum.as_ref())?;

        tracing::info!(
            path = %factors_path.display(),
            rows = table.len(),
            first = ?table.first_date(),
            last = ?table.last_date(),
            "loaded factor table"
        );

        Ok(table)
    }

    /// Combine parsed sheets into a table.
    ///
    /// Momentum is taken from `factors` if it has a momentum column,
    /// otherwise from `momentum`; in the latter case only dates present in
    /// both sheets are kept.
    pub fn from_sheets(factors: &FrenchSheet, momentum: Option<&FrenchSheet>) -> Result<Self> {
        let mkt_rf = factors.require_column(MKT_RF)?;
        let smb = factors.require_column(SMB)?;
        let hml = factors.require_column(HML)?;
        let rf = factors.require_column(RF)?;

        let momentum_by_date: BTreeMap<NaiveDate, f64> = match factors.column_index(MOM) {
            Some(idx) => factors.values(idx).collect(),
            None => {
                let sheet = momentum.ok_or_else(|| DataError::MissingColumn {
                    column: MOM.to_string(),
                    source_name: factors.source_name.clone(),
                })?;
                let idx = sheet.require_column(MOM)?;
                sheet.values(idx).collect()
            }
        };

        let rows = factors
            .rows
            .iter()
            .filter_map(|(date, values)| {
                let mom = momentum_by_date.get(date)?;
                Some(FactorObservation {
                    date: *date,
                    mkt_rf: values[mkt_rf],
                    smb: values[smb],
                    hml: values[hml],
                    rf: values[rf],
                    mom: *mom,
                })
            })
            .filter(|obs| {
                [obs.mkt_rf, obs.smb, obs.hml, obs.rf, obs.mom]
                    .iter()
                    .all(|v| !is_missing(*v))
            })
            .collect::<Vec<_>>();

        if rows.is_empty() {
            return Err(DataError::MissingData {
                symbol: factors.source_name.clone(),
                reason: "no daily factor rows after merging momentum".to_string(),
            });
        }

        Self::from_rows(rows)
    }

    /// Observations in date order.
    pub fn rows(&self) -> &[FactorObservation] {
        &self.rows
    }

    /// Trading dates in order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// Number of trading days.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First trading date.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    /// Last trading date.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }
}

fn is_missing(value: f64) -> bool {
    !value.is_finite() || MISSING_SENTINELS.iter().any(|s| (value - s).abs() < 1e-9)
}

/// The daily block of one French data-library CSV file.
#[derive(Debug, Clone, PartialEq)]
pub struct FrenchSheet {
    /// Where the sheet came from, for error messages
    pub source_name: String,
    /// Column headers, excluding the date column
    pub columns: Vec<String>,
    /// Date-keyed rows, one value per column
    pub rows: Vec<(NaiveDate, Vec<f64>)>,
}

impl FrenchSheet {
    /// Read a sheet from a file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, path.display().to_string())
    }

    /// Read a sheet from any reader.
    ///
    /// # Errors
    /// * [`DataError::Parse`] if no header row precedes the data or a value
    ///   is not numeric
    /// * [`DataError::Csv`] on malformed CSV
    pub fn from_reader<R: Read>(reader: R, source_name: impl Into<String>) -> Result<Self> {
        let source_name = source_name.into();
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut columns: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for record in csv_reader.records() {
            let record = record?;
            let first = record.get(0).unwrap_or_default();

            let Some(cols) = columns.as_ref() else {
                if record.len() >= 2
                    && (first.is_empty() || first.eq_ignore_ascii_case("date"))
                    && record.iter().skip(1).any(|f| !f.is_empty())
                {
                    columns = Some(
                        record
                            .iter()
                            .skip(1)
                            .filter(|c| !c.is_empty())
                            .map(str::to_string)
                            .collect(),
                    );
                }
                continue;
            };

            let Some(date) = parse_date(first) else {
                if rows.is_empty() {
                    continue;
                }
                break;
            };

            let values = record
                .iter()
                .skip(1)
                .take(cols.len())
                .map(|field| {
                    field.parse::<f64>().map_err(|e| {
                        DataError::Parse(format!(
                            "{source_name}: invalid value '{field}' on {date}: {e}"
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            if values.len() != cols.len() {
                return Err(DataError::Parse(format!(
                    "{source_name}: expected {} values on {date}, found {}",
                    cols.len(),
                    values.len()
                )));
            }
            rows.push((date, values));
        }

        let columns = columns.ok_or_else(|| {
            DataError::Parse(format!("{source_name}: no header row found"))
        })?;

        tracing::debug!(
            source = %source_name,
            columns = ?columns,
            rows = rows.len(),
            "parsed factor sheet"
        );

        Ok(Self {
            source_name,
            columns,
            rows,
        })
    }

    /// Position of a column, matched case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| DataError::MissingColumn {
                column: name.to_string(),
                source_name: self.source_name.clone(),
            })
    }

    fn values(&self, idx: usize) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.rows.iter().map(move |(d, v)| (*d, v[idx]))
    }
}

/// Parse a `YYYYMMDD` date key.
fn parse_date(field: &str) -> Option<NaiveDate> {
    if field.len() != 8 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(field, "%Y%m%d").ok()
}
