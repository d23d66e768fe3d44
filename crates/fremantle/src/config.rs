//! Portfolio configuration.
//!
//! A run is described by a JSON file listing the holdings (symbol and share
//! count), the watch-list to compare against, the factor files and the
//! output directory:
//!
//! ```json
//! {
//!   "holdings": [{"symbol": "SPY", "shares": 1.0}],
//!   "watchlist": ["MTB", "IJR"],
//!   "factors": {
//!     "factors_path": "F-F_Research_Data_5_Factors_2x3_daily.CSV",
//!     "momentum_path": "F-F_Momentum_Factor_daily.CSV"
//!   },
//!   "output_dir": "."
//! }
//! ```

use fremantle_analytics::columns;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while reading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Semantically invalid configuration
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The platform has no configuration directory
    #[error("No configuration directory available on this platform")]
    NoConfigDir,

    /// Refused to overwrite an existing file
    #[error("Configuration already exists at {0}")]
    AlreadyExists(PathBuf),
}

/// A position in the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Ticker symbol
    pub symbol: String,
    /// Number of shares held
    pub shares: f64,
}

impl Holding {
    /// Create a new holding.
    pub fn new(symbol: impl Into<String>, shares: f64) -> Self {
        Self {
            symbol: symbol.into(),
            shares,
        }
    }
}

/// Locations of the daily factor files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorSources {
    /// Fama-French daily factors (`Mkt-RF`, `SMB`, `HML`, `RF`, optionally `Mom`)
    pub factors_path: PathBuf,
    /// Daily momentum factor, when not already a column of `factors_path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub momentum_path: Option<PathBuf>,
}

/// Everything one analysis run needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    /// Portfolio positions
    pub holdings: Vec<Holding>,
    /// Symbols analysed alongside the portfolio
    #[serde(default)]
    pub watchlist: Vec<String>,
    /// Factor file locations
    pub factors: FactorSources,
    /// Directory the result tables are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl PortfolioConfig {
    /// Read and validate a configuration file.
    ///
    /// Relative factor paths are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)?;

        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        config.trim_symbols();
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            holdings = config.holdings.len(),
            watchlist = config.watchlist.len(),
            "loaded portfolio configuration"
        );
        Ok(config)
    }

    /// Write the configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check the invariants a run depends on.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when there are no holdings, a share
    /// count is not a positive finite number, a symbol is blank, padded with
    /// whitespace or repeated, or a watch-list symbol collides with a
    /// reserved column label.
    pub fn validate(&self) -> Result<()> {
        if self.holdings.is_empty() {
            return Err(ConfigError::Invalid(
                "portfolio needs at least one holding".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for holding in &self.holdings {
            let symbol = holding.symbol.as_str();
            if symbol.trim().is_empty() {
                return Err(ConfigError::Invalid("holding with empty symbol".to_string()));
            }
            check_padding(symbol)?;
            if !(holding.shares.is_finite() && holding.shares > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{symbol}: share count must be positive, got {}",
                    holding.shares
                )));
            }
            if !seen.insert(symbol.to_ascii_uppercase()) {
                return Err(ConfigError::Invalid(format!(
                    "{symbol} is listed twice in holdings"
                )));
            }
        }

        let mut seen = HashSet::new();
        for symbol in &self.watchlist {
            let symbol = symbol.as_str();
            if symbol.trim().is_empty() {
                return Err(ConfigError::Invalid("empty watch-list symbol".to_string()));
            }
            check_padding(symbol)?;
            if columns::is_reserved(symbol) {
                return Err(ConfigError::Invalid(format!(
                    "{symbol} is a reserved column name"
                )));
            }
            if !seen.insert(symbol.to_ascii_uppercase()) {
                return Err(ConfigError::Invalid(format!(
                    "{symbol} is listed twice in the watch-list"
                )));
            }
        }

        Ok(())
    }

    /// Output column labels: `[Mkt, Portfolio, ...watchlist]`.
    pub fn labels(&self) -> Vec<String> {
        columns::output_labels(&self.watchlist)
    }

    /// Every symbol that needs quotes, holdings first, without repeats.
    pub fn symbols(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.holdings
            .iter()
            .map(|h| h.symbol.clone())
            .chain(self.watchlist.iter().cloned())
            .filter(|s| seen.insert(s.clone()))
            .collect()
    }

    /// Starter configuration written by `fremantle init`.
    pub fn sample() -> Self {
        Self {
            holdings: vec![
                Holding::new("INO", 1.0),
                Holding::new("SPY", 1.0),
                Holding::new("SPYG", 2.0),
                Holding::new("VOO", 1.0),
                Holding::new("SPXL", 2.0),
                Holding::new("UPRO", 2.0),
            ],
            watchlist: ["MTB", "SOXL", "IJR", "SCZ", "IWD", "VOE"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            factors: FactorSources {
                factors_path: PathBuf::from("F-F_Research_Data_5_Factors_2x3_daily.CSV"),
                momentum_path: Some(PathBuf::from("F-F_Momentum_Factor_daily.CSV")),
            },
            output_dir: default_output_dir(),
        }
    }

    fn trim_symbols(&mut self) {
        for holding in &mut self.holdings {
            holding.symbol = holding.symbol.trim().to_string();
        }
        for symbol in &mut self.watchlist {
            *symbol = symbol.trim().to_string();
        }
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &Path| {
            if p.is_relative() {
                base.join(p)
            } else {
                p.to_path_buf()
            }
        };
        self.factors.factors_path = resolve(&self.factors.factors_path);
        self.factors.momentum_path = self.factors.momentum_path.as_deref().map(resolve);
    }
}

fn check_padding(symbol: &str) -> Result<()> {
    if symbol.trim() != symbol {
        return Err(ConfigError::Invalid(format!(
            "symbol {symbol:?} has surrounding whitespace"
        )));
    }
    Ok(())
}

/// `<platform config dir>/fremantle/portfolio.json`
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("fremantle").join("portfolio.json"))
        .ok_or(ConfigError::NoConfigDir)
}
