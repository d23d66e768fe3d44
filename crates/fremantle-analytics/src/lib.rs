#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fremantle/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod columns;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod regression;
pub mod stats;
pub mod window;

pub use error::{AnalyticsError, Result};
pub use frame::{ReturnFrame, ReturnSeries};
pub use metrics::{MetricRow, MetricTable, compute_metrics};
pub use regression::{OlsFit, Regressor, ols};
pub use window::{AnalysisWindow, WindowKind, WindowPlan};
