//! Daily return series and date-aligned return frames.
//!
//! A [`ReturnSeries`] maps trading dates to percent returns for one
//! instrument or factor. A [`ReturnFrame`] is the inner join of several
//! series: one shared, ascending date index and one column per series.

use crate::error::{AnalyticsError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Date-indexed percent returns for a single instrument or factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    name: String,
    observations: BTreeMap<NaiveDate, f64>,
}

impl ReturnSeries {
    /// Create an empty series.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            observations: BTreeMap::new(),
        }
    }

    /// Build a series from `(date, value)` pairs.
    ///
    /// Non-finite values (the undefined first percent change, failed
    /// divisions) are treated as missing and skipped. A repeated date keeps
    /// the last value.
    pub fn from_observations(
        name: impl Into<String>,
        observations: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Self {
        Self {
            name: name.into(),
            observations: observations
                .into_iter()
                .filter(|(_, v)| v.is_finite())
                .collect(),
        }
    }

    /// Series name, used as the column label once joined.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Value on a given date.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.observations.get(&date).copied()
    }

    /// Iterate observations in date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.observations.iter().map(|(d, v)| (*d, *v))
    }

    /// First and last observation dates.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.observations.keys().next()?;
        let last = self.observations.keys().next_back()?;
        Some((*first, *last))
    }

    /// Same observations under a different name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Observations with `start <= date <= end`.
    pub fn restrict(&self, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            name: self.name.clone(),
            observations: self
                .observations
                .range(start..=end)
                .map(|(d, v)| (*d, *v))
                .collect(),
        }
    }

    /// Combine two series on their common dates.
    pub fn zip_with(
        &self,
        other: &Self,
        name: impl Into<String>,
        f: impl Fn(f64, f64) -> f64,
    ) -> Self {
        Self::from_observations(
            name,
            self.observations
                .iter()
                .filter_map(|(d, a)| other.get(*d).map(|b| (*d, f(*a, b)))),
        )
    }
}

/// Inner-joined return series sharing one date index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnFrame {
    dates: Vec<NaiveDate>,
    columns: Vec<(String, Vec<f64>)>,
}

impl ReturnFrame {
    /// Inner join of `series` on date.
    ///
    /// The resulting index is exactly the intersection of every series'
    /// dates, ascending. Columns keep the order in which series were given.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::DuplicateColumn`] if two series share a name.
    pub fn inner_join<'a>(series: impl IntoIterator<Item = &'a ReturnSeries>) -> Result<Self> {
        let series: Vec<&ReturnSeries> = series.into_iter().collect();

        let mut seen = HashSet::new();
        for s in &series {
            if !seen.insert(s.name()) {
                return Err(AnalyticsError::DuplicateColumn(s.name().to_string()));
            }
        }

        let Some((first, rest)) = series.split_first() else {
            return Ok(Self::default());
        };

        let mut common: BTreeSet<NaiveDate> = first.observations.keys().copied().collect();
        for s in rest {
            common.retain(|d| s.observations.contains_key(d));
        }
        let dates: Vec<NaiveDate> = common.into_iter().collect();

        let columns = series
            .iter()
            .map(|s| {
                let values = dates
                    .iter()
                    .filter_map(|d| s.observations.get(d).copied())
                    .collect();
                (s.name().to_string(), values)
            })
            .collect();

        tracing::debug!(
            columns = series.len(),
            rows = dates.len(),
            "aligned return series"
        );

        Ok(Self { dates, columns })
    }

    /// Shared date index.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of rows (dates).
    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    /// Whether the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Column labels in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    /// Values of a column, aligned with [`Self::dates`].
    ///
    /// # Errors
    /// Returns [`AnalyticsError::MissingColumn`] for an unknown name.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
            .ok_or_else(|| AnalyticsError::MissingColumn(name.to_string()))
    }

    /// First and last dates of the index.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.dates.first()?, *self.dates.last()?))
    }
}
