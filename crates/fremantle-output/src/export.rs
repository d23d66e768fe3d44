//! Export of per-window metric tables.
//!
//! A table is written as one header row (run date followed by the column
//! labels) and one row per metric (metric name followed by one value per
//! label). Every CSV field is quoted.

use chrono::NaiveDate;
use fremantle_analytics::{AnalysisWindow, MetricTable};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::PrettyJson),
            "compact-json" => Ok(Self::Json),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// A metric table stamped with the run date and the window it covers.
#[derive(Debug, Clone, Serialize)]
pub struct MetricTableExport<'a> {
    /// Date of the run, written in the header's first cell
    pub date: NaiveDate,
    /// Window the table was computed over
    pub window: AnalysisWindow,
    /// The metrics
    pub table: &'a MetricTable,
}

impl<'a> MetricTableExport<'a> {
    /// Create a new table export.
    pub const fn new(date: NaiveDate, window: AnalysisWindow, table: &'a MetricTable) -> Self {
        Self {
            date,
            window,
            table,
        }
    }

    /// File name for this table under a run stamp, e.g.
    /// `1700000000__fiveYearAnalysis.csv`.
    pub fn file_name(&self, run_stamp: i64, format: ExportFormat) -> String {
        format!(
            "{run_stamp}__{}.{}",
            self.window.kind.file_stem(),
            format.extension()
        )
    }

    fn to_csv(&self) -> Result<String, ExportError> {
        let mut wtr = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(vec![]);

        let mut header = vec![self.date.to_string()];
        header.extend(self.table.labels().iter().cloned());
        wtr.write_record(&header)?;

        for row in self.table.rows() {
            let mut record = vec![row.name.clone()];
            record.extend(row.values.iter().map(f64::to_string));
            wtr.write_record(&record)?;
        }

        let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
        String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
    }
}

impl Exporter for MetricTableExport<'_> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => self.to_csv(),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

/// Write every table into `dir`, named by `run_stamp` and window.
///
/// CSV is always written; a JSON format additionally writes a `.json` copy.
/// Returns the paths written, in table order.
pub fn write_window_tables(
    dir: &Path,
    run_stamp: i64,
    tables: &[MetricTableExport<'_>],
    format: ExportFormat,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir)?;

    let mut formats = vec![ExportFormat::Csv];
    if format != ExportFormat::Csv {
        formats.push(format);
    }

    let mut written = Vec::with_capacity(tables.len() * formats.len());
    for table in tables {
        for fmt in &formats {
            let path = dir.join(table.file_name(run_stamp, *fmt));
            table.export_to_file(&path, *fmt)?;
            tracing::info!(path = %path.display(), window = %table.window.kind, "wrote metric table");
            written.push(path);
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fremantle_analytics::WindowKind;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_table() -> MetricTable {
        let mut table = MetricTable::new(vec!["Mkt".to_string(), "Portfolio".to_string()]);
        table
            .push("Arithmetic Average Return", vec![10.5, 12.25])
            .unwrap();
        table.push("Sharpe Ratio", vec![0.5, f64::NAN]).unwrap();
        table
    }

    fn window() -> AnalysisWindow {
        AnalysisWindow {
            kind: WindowKind::FiveYear,
            start: ymd(2015, 5, 29),
            end: ymd(2020, 5, 29),
        }
    }

    #[test]
    fn test_csv_layout() {
        let table = sample_table();
        let export = MetricTableExport::new(ymd(2020, 6, 1), window(), &table);

        let csv = export.export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], r#""2020-06-01","Mkt","Portfolio""#);
        assert_eq!(lines[1], r#""Arithmetic Average Return","10.5","12.25""#);
        assert_eq!(lines[2], r#""Sharpe Ratio","0.5","NaN""#);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_json_contains_window() {
        let table = sample_table();
        let export = MetricTableExport::new(ymd(2020, 6, 1), window(), &table);

        let json = export.export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(json.contains("\"FiveYear\""));
        assert!(json.contains("\"Portfolio\""));
        assert!(json.contains("  "));
    }

    #[test]
    fn test_file_name() {
        let table = sample_table();
        let export = MetricTableExport::new(ymd(2020, 6, 1), window(), &table);
        assert_eq!(
            export.file_name(1_591_000_000, ExportFormat::Csv),
            "1591000000__fiveYearAnalysis.csv"
        );
        assert_eq!(
            export.file_name(1_591_000_000, ExportFormat::PrettyJson),
            "1591000000__fiveYearAnalysis.json"
        );
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Json.extension(), "json");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(
            "json".parse::<ExportFormat>().unwrap(),
            ExportFormat::PrettyJson
        );
        assert!(matches!(
            "xlsx".parse::<ExportFormat>(),
            Err(ExportError::InvalidFormat(_))
        ));
    }
}
