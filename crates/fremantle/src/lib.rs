#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fremantle/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;

// Re-export main types from sub-crates
pub use fremantle_analytics as analytics;
pub use fremantle_data as data;
pub use fremantle_output as output;

pub use config::{ConfigError, FactorSources, Holding, PortfolioConfig, default_config_path};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
