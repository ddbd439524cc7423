//! Command-line parsing for the market indicator tracker.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the pull/merge/analytics code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "mkt", version, about = "Daily EUR/USD, SPY, and 10Y Treasury tracker (Alpha Vantage)")]
pub struct Cli {
    /// Override the store location (defaults to MARKET_STORE_PATH or data/market_data.json).
    #[arg(long, global = true, value_name = "JSON")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch all three series and merge them into the store.
    Pull(PullArgs),
    /// Print the latest snapshot, trailing averages, and year-over-year change.
    Summary(SummaryArgs),
    /// Render ASCII scatter plots of the recent window.
    Plot(PlotArgs),
    /// Export the whole store to CSV.
    Export(ExportArgs),
    /// Launch the interactive TUI.
    Tui,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PullMode {
    /// Today's value for each series.
    Daily,
    /// Full history since the cutoff date.
    History,
}

#[derive(Debug, Parser, Clone)]
pub struct PullArgs {
    #[arg(long, value_enum, default_value_t = PullMode::Daily)]
    pub mode: PullMode,

    /// Inclusive cutoff for history pulls (defaults to MARKET_HISTORY_START or 2001-01-01).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub since: Option<NaiveDate>,

    /// Keep stored values for series the pull did not return, instead of replacing the whole row.
    #[arg(long)]
    pub keep_existing: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct SummaryArgs {
    /// Trailing-average window in calendar days (defaults to 7).
    #[arg(long)]
    pub window: Option<u32>,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct PlotArgs {
    /// Days before the latest observation to include.
    #[arg(long, default_value_t = 90)]
    pub days: u32,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 12)]
    pub height: usize,
}

#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    /// Destination CSV file.
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,
}
