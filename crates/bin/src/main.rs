//! Fremantle CLI binary.
//!
//! Computes five- and ten-year performance statistics for a portfolio and a
//! watch-list against the Fama-French factors.

mod integration;

use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use fremantle::analytics::{WindowKind, WindowPlan};
use fremantle::data::{FactorTable, YahooQuoteProvider};
use fremantle::output::{ExportFormat, MetricTableExport, WindowSummary, write_window_tables};
use fremantle::{ConfigError, PortfolioConfig, default_config_path};
use indicatif::{ProgressBar, ProgressStyle};
use integration::analysis::{WindowInputs, WindowResult, analyze_window};
use integration::data_pipeline::{factor_series, fetch_run_quotes, request_count};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration as StdDuration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fremantle")]
#[command(about = "Fremantle: portfolio performance against the Fama-French factors", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute five- and ten-year metrics for the portfolio and watch-list
    Analyze {
        /// Portfolio configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory for the result tables (overrides the configuration)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Output format: csv, json (CSV plus pretty JSON copies) or
        /// compact-json
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Print the summaries as Markdown tables
        #[arg(long)]
        markdown: bool,
    },

    /// Print the analysis windows derived from a factor file
    Windows {
        /// Daily Fama-French factor file
        #[arg(long)]
        factors: PathBuf,

        /// Daily momentum factor file
        #[arg(long)]
        momentum: Option<PathBuf>,
    },

    /// Write a starter configuration file
    Init {
        /// Where to write the configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            config,
            output_dir,
            format,
            markdown,
        } => {
            analyze(config, output_dir, format, markdown).await?;
        }
        Commands::Windows { factors, momentum } => {
            show_windows(&factors, momentum.as_deref())?;
        }
        Commands::Init { config, force } => {
            init_config(config, force)?;
        }
    }

    Ok(())
}

async fn analyze(
    config_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    format: ExportFormat,
    markdown: bool,
) -> Result<(), Box<dyn Error>> {
    let config_path = resolve_config_path(config_path)?;
    let config = PortfolioConfig::load(&config_path)?;

    println!("\n{}", "=".repeat(80));
    println!("{:^80}", "FREMANTLE PORTFOLIO ANALYSIS");
    println!("{}\n", "=".repeat(80));
    println!("Configuration: {}", config_path.display());
    println!(
        "Holdings:      {}",
        config
            .holdings
            .iter()
            .map(|h| format!("{} x{}", h.symbol, h.shares))
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Watch-list:    {}", config.watchlist.join(", "));

    let factors = FactorTable::load(
        &config.factors.factors_path,
        config.factors.momentum_path.as_deref(),
    )?;
    let plan = WindowPlan::from_trading_days(&factors.dates())?;
    print_windows(&plan);

    let provider = YahooQuoteProvider::new()?;

    let pb = ProgressBar::new(request_count(&config.holdings, &config.watchlist) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(StdDuration::from_millis(100));
    pb.set_message("Fetching quotes...");

    let quotes = match fetch_run_quotes(
        &provider,
        &config.holdings,
        &config.watchlist,
        &plan,
        Some(&pb),
    )
    .await
    {
        Ok(q) => {
            pb.finish_with_message(format!(
                "Fetched {} symbols",
                config.symbols().len()
            ));
            q
        }
        Err(e) => {
            pb.abandon_with_message("Failed!");
            return Err(format!("Failed to fetch quotes: {}", e).into());
        }
    };

    let factor_columns = factor_series(&factors);
    let labels = config.labels();

    let results = WindowKind::ALL
        .iter()
        .map(|kind| {
            analyze_window(
                &WindowInputs {
                    window: plan.window(*kind),
                    portfolio: &quotes.portfolio,
                    watchlist: quotes.watchlist(*kind),
                    factors: &factor_columns,
                },
                &labels,
            )
        })
        .collect::<Result<Vec<WindowResult>, _>>()?;

    for result in &results {
        let summary = WindowSummary::new(&result.window, &result.table, result.frame.n_rows());
        if markdown {
            println!("{}", summary.to_markdown());
        } else {
            print!("{}", summary.to_ascii_table());
        }
    }

    let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
    let run_date = Local::now().date_naive();
    let exports: Vec<MetricTableExport<'_>> = results
        .iter()
        .map(|r| MetricTableExport::new(run_date, r.window, &r.table))
        .collect();
    let written = write_window_tables(&output_dir, Utc::now().timestamp(), &exports, format)?;

    println!();
    for path in &written {
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn show_windows(factors: &Path, momentum: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let table = FactorTable::load(factors, momentum)?;
    println!(
        "Factor table: {} trading days ({} to {})",
        table.len(),
        table
            .first_date()
            .map_or_else(|| "-".to_string(), |d| d.to_string()),
        table
            .last_date()
            .map_or_else(|| "-".to_string(), |d| d.to_string())
    );
    let plan = WindowPlan::from_trading_days(&table.dates())?;
    print_windows(&plan);
    Ok(())
}

fn print_windows(plan: &WindowPlan) {
    println!("\nAnalysis Windows:");
    println!("{}", "-".repeat(80));
    for kind in WindowKind::ALL {
        let window = plan.window(kind);
        println!(
            "  {:<12} {} to {}",
            kind.to_string(),
            window.start,
            window.end
        );
    }
    println!();
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<(), Box<dyn Error>> {
    let path = resolve_config_path(path)?;
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path).into());
    }

    PortfolioConfig::sample().save(&path)?;
    println!("Wrote starter configuration to {}", path.display());
    println!(
        "Place the daily Fama-French factor and momentum CSV files from the \
         Kenneth R. French data library next to it, or edit the factor paths."
    );
    Ok(())
}

fn resolve_config_path(path: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    path.map_or_else(default_config_path, Ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_defaults_to_csv() {
        let cli = Cli::try_parse_from(["fremantle", "analyze"]).unwrap();
        match cli.command {
            Commands::Analyze {
                config,
                output_dir,
                format,
                markdown,
            } => {
                assert!(config.is_none());
                assert!(output_dir.is_none());
                assert_eq!(format, ExportFormat::Csv);
                assert!(!markdown);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_analyze_format_options() {
        let cli = Cli::try_parse_from([
            "fremantle",
            "analyze",
            "--format",
            "compact-json",
            "--markdown",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Analyze {
                format: ExportFormat::Json,
                markdown: true,
                ..
            }
        ));

        let cli = Cli::try_parse_from(["fremantle", "analyze", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Analyze {
                format: ExportFormat::PrettyJson,
                ..
            }
        ));

        assert!(Cli::try_parse_from(["fremantle", "analyze", "--format", "xlsx"]).is_err());
    }

    #[test]
    fn test_windows_requires_factor_file() {
        assert!(Cli::try_parse_from(["fremantle", "windows"]).is_err());
        let cli = Cli::try_parse_from([
            "fremantle",
            "windows",
            "--factors",
            "ff.csv",
            "--momentum",
            "mom.csv",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Windows { momentum: Some(_), .. }
        ));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fremantle").join("portfolio.json");

        init_config(Some(path.clone()), false).unwrap();
        assert!(init_config(Some(path.clone()), false).is_err());
        init_config(Some(path.clone()), true).unwrap();
        assert!(PortfolioConfig::load(&path).is_ok());
    }
}
