//! Analysis windows anchored on the factor table's trading-day index.
//!
//! Both windows are placed by counting trading days back from the last
//! factor date rather than by calendar arithmetic:
//!
//! * five-year: `[index(len - 5·252), last]`
//! * ten-year: `[index(len - 10·252), index(len - 5·252)]`, i.e. the five
//!   years that precede the five-year window

use crate::error::{AnalyticsError, Result};
use crate::stats::TRADING_DAYS_PER_YEAR;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two analysis windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowKind {
    /// Most recent five years
    FiveYear,
    /// The five years before that, reaching back ten years
    TenYear,
}

impl WindowKind {
    /// Both kinds, in output order.
    pub const ALL: [Self; 2] = [Self::FiveYear, Self::TenYear];

    /// Years counted back from the last factor date.
    pub const fn years_back(&self) -> usize {
        match self {
            Self::FiveYear => 5,
            Self::TenYear => 10,
        }
    }

    /// File stem used for exported tables.
    pub const fn file_stem(&self) -> &'static str {
        match self {
            Self::FiveYear => "fiveYearAnalysis",
            Self::TenYear => "tenYearAnalysis",
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FiveYear => write!(f, "five-year"),
            Self::TenYear => write!(f, "ten-year"),
        }
    }
}

/// A contiguous, inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    /// Window kind
    pub kind: WindowKind,
    /// First date (inclusive)
    pub start: NaiveDate,
    /// Last date (inclusive)
    pub end: NaiveDate,
}

impl AnalysisWindow {
    /// Whether `date` falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The pair of windows for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPlan {
    /// Most recent five years
    pub five_year: AnalysisWindow,
    /// The preceding five years
    pub ten_year: AnalysisWindow,
}

impl WindowPlan {
    /// Place both windows on an ascending trading-day index.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::InsufficientHistory`] when the index holds
    /// fewer than ten years of trading days.
    pub fn from_trading_days(dates: &[NaiveDate]) -> Result<Self> {
        let n = dates.len();
        let five_back = WindowKind::FiveYear.years_back() * TRADING_DAYS_PER_YEAR;
        let ten_back = WindowKind::TenYear.years_back() * TRADING_DAYS_PER_YEAR;

        if n < ten_back {
            return Err(AnalyticsError::InsufficientHistory {
                required: ten_back,
                actual: n,
            });
        }

        let last = dates[n - 1];
        let five_start = dates[n - five_back];
        let ten_start = dates[n - ten_back];

        Ok(Self {
            five_year: AnalysisWindow {
                kind: WindowKind::FiveYear,
                start: five_start,
                end: last,
            },
            ten_year: AnalysisWindow {
                kind: WindowKind::TenYear,
                start: ten_start,
                end: five_start,
            },
        })
    }

    /// Window by kind.
    pub const fn window(&self, kind: WindowKind) -> &AnalysisWindow {
        match kind {
            WindowKind::FiveYear => &self.five_year,
            WindowKind::TenYear => &self.ten_year,
        }
    }

    /// Date range that covers both windows, used for fetching benchmark data.
    pub const fn full_range(&self) -> (NaiveDate, NaiveDate) {
        (self.ten_year.start, self.five_year.end)
    }
}
