//! Console and Markdown rendering of metric tables.

use fremantle_analytics::{AnalysisWindow, MetricTable};
use std::fmt::Write as _;

/// Minimum width of the metric-name column.
const NAME_WIDTH: usize = 20;

/// Width of each value column.
const VALUE_WIDTH: usize = 12;

/// A metric table paired with the window it was computed over.
#[derive(Debug, Clone, Copy)]
pub struct WindowSummary<'a> {
    /// Window covered
    pub window: &'a AnalysisWindow,
    /// Metrics for the window
    pub table: &'a MetricTable,
    /// Number of aligned trading days behind the metrics
    pub observations: usize,
}

impl<'a> WindowSummary<'a> {
    /// Create a new summary.
    pub const fn new(
        window: &'a AnalysisWindow,
        table: &'a MetricTable,
        observations: usize,
    ) -> Self {
        Self {
            window,
            table,
            observations,
        }
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let name_width = self
            .table
            .rows()
            .iter()
            .map(|r| r.name.len())
            .max()
            .unwrap_or(0)
            .max(NAME_WIDTH);
        let rule_width = name_width + (VALUE_WIDTH + 1) * self.table.labels().len();

        let mut output = String::new();
        let _ = writeln!(output, "\nPerformance Summary: {} window", self.window.kind);
        let _ = writeln!(
            output,
            "Period: {} to {} ({} trading days)",
            self.window.start, self.window.end, self.observations
        );
        output.push_str(&"=".repeat(rule_width));
        output.push('\n');

        let _ = write!(output, "{:<name_width$}", "Metric");
        for label in self.table.labels() {
            let _ = write!(output, " {label:>VALUE_WIDTH$}");
        }
        output.push('\n');
        output.push_str(&"-".repeat(rule_width));
        output.push('\n');

        for row in self.table.rows() {
            let _ = write!(output, "{:<name_width$}", row.name);
            for value in &row.values {
                let _ = write!(output, " {:>VALUE_WIDTH$}", format_value(*value));
            }
            output.push('\n');
        }

        output.push_str(&"=".repeat(rule_width));
        output.push('\n');
        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "# Performance Summary: {} window\n", self.window.kind);
        let _ = writeln!(
            output,
            "**Period:** {} to {} ({} trading days)\n",
            self.window.start, self.window.end, self.observations
        );

        output.push_str("| Metric |");
        for label in self.table.labels() {
            let _ = write!(output, " {label} |");
        }
        output.push_str("\n|--------|");
        for _ in self.table.labels() {
            output.push_str("-------:|");
        }
        output.push('\n');

        for row in self.table.rows() {
            let _ = write!(output, "| {} |", row.name);
            for value in &row.values {
                let _ = write!(output, " {} |", format_value(*value));
            }
            output.push('\n');
        }
        output
    }
}

fn format_value(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.4}")
    } else {
        value.to_string()
    }
}
