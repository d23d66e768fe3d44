//! Per-window alignment and metric computation.

use fremantle::analytics::{
    AnalysisWindow, AnalyticsError, MetricTable, ReturnFrame, ReturnSeries, compute_metrics,
};

/// Series that feed one window's table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WindowInputs<'a> {
    pub(crate) window: &'a AnalysisWindow,
    /// Portfolio returns, typically covering more than the window
    pub(crate) portfolio: &'a ReturnSeries,
    pub(crate) watchlist: &'a [ReturnSeries],
    /// `Mkt` and the factor columns
    pub(crate) factors: &'a [ReturnSeries],
}

/// Aligned returns and metrics for one window.
#[derive(Debug)]
pub(crate) struct WindowResult {
    pub(crate) window: AnalysisWindow,
    pub(crate) frame: ReturnFrame,
    pub(crate) table: MetricTable,
}

/// Restrict every series to the window, inner-join them on date and compute
/// the metric table for `labels`.
pub(crate) fn analyze_window(
    inputs: &WindowInputs<'_>,
    labels: &[String],
) -> Result<WindowResult, AnalyticsError> {
    let window = *inputs.window;

    let series: Vec<ReturnSeries> = inputs
        .factors
        .iter()
        .chain(std::iter::once(inputs.portfolio))
        .chain(inputs.watchlist)
        .map(|s| s.restrict(window.start, window.end))
        .collect();

    let frame = ReturnFrame::inner_join(&series)?;
    tracing::info!(
        window = %window.kind,
        rows = frame.n_rows(),
        first = ?frame.date_range().map(|r| r.0),
        last = ?frame.date_range().map(|r| r.1),
        "aligned window"
    );

    let table = compute_metrics(&frame, labels)?;
    Ok(WindowResult {
        window,
        frame,
        table,
    })
}
