//! Integration of quote fetching, factor data and the analytics layer.
//!
//! This module provides the data pipeline that turns Yahoo quotes into
//! return series and the per-window assembly that feeds the metric table.

pub(crate) mod analysis;
pub(crate) mod data_pipeline;
