//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and loads configuration
//! - installs logging
//! - pulls feeds into the store
//! - prints summaries/plots and writes exports

use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, ExportArgs, PlotArgs, PullArgs, PullMode, SummaryArgs};
use crate::config::AppConfig;
use crate::data::AlphaVantageClient;
use crate::domain::{FetchMode, MergePolicy};
use crate::error::AppError;
use crate::store::{JsonFileStore, KeyedStore};

pub mod pipeline;

/// Entry point for the `mkt` binary.
pub fn run() -> Result<(), AppError> {
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_logging(matches!(cli.command, Command::Tui));

    let mut config = AppConfig::from_env()?;
    if let Some(path) = cli.store {
        config.store_path = path;
    }

    match cli.command {
        Command::Pull(args) => handle_pull(&config, args),
        Command::Summary(args) => handle_summary(&config, args),
        Command::Plot(args) => handle_plot(&config, args),
        Command::Export(args) => handle_export(&config, args),
        Command::Tui => crate::tui::run(&config),
    }
}

/// `RUST_LOG` wins; otherwise warnings only (errors only under the TUI).
fn init_logging(quiet: bool) {
    let default_level = if quiet { "error" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_pull(config: &AppConfig, args: PullArgs) -> Result<(), AppError> {
    let mode = match args.mode {
        PullMode::Daily => FetchMode::Daily {
            today: Local::now().date_naive(),
        },
        PullMode::History => FetchMode::Historical {
            since: args.since.unwrap_or(config.history_start),
        },
    };
    let policy = if args.keep_existing {
        MergePolicy::KeepExisting
    } else {
        MergePolicy::ReplaceRow
    };

    let client = AlphaVantageClient::new(config)?;
    let mut store = JsonFileStore::new(config.store_path.clone());
    let report = pipeline::run_pull(&client, &mut store, mode, policy)?;

    print!("{}", crate::report::format_merge_report(&report));
    println!("Store: {}", store.path().display());
    Ok(())
}

fn handle_summary(config: &AppConfig, args: SummaryArgs) -> Result<(), AppError> {
    let Some(store) = open_existing_store(config) else {
        return Ok(());
    };
    let window = args.window.unwrap_or(config.window_days);

    let summary = match pipeline::run_summary(&store, window) {
        Ok(summary) => summary,
        Err(e) if e.is_no_data() => {
            println!("No data found. Run `mkt pull --mode history` first.");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if args.json {
        println!("{}", crate::report::summary_json(&summary)?);
    } else {
        print!("{}", crate::report::format_summary(&summary));
    }
    Ok(())
}

fn handle_plot(config: &AppConfig, args: PlotArgs) -> Result<(), AppError> {
    let Some(store) = open_existing_store(config) else {
        return Ok(());
    };
    let records = store.scan_all()?;
    if records.is_empty() {
        println!("No data available.");
        return Ok(());
    }

    let window = crate::analytics::recent_window(&records, args.days);
    println!("Last {} days:", args.days);
    print!("{}", crate::plot::render_all(window, args.width, args.height));
    Ok(())
}

fn handle_export(config: &AppConfig, args: ExportArgs) -> Result<(), AppError> {
    let Some(store) = open_existing_store(config) else {
        return Ok(());
    };
    let records = store.scan_all()?;
    crate::report::write_store_csv(&args.csv, &records)?;
    println!("Exported {} row(s) to {}", records.len(), args.csv.display());
    Ok(())
}

/// The store, or `None` after printing guidance when no pull has created it yet.
fn open_existing_store(config: &AppConfig) -> Option<JsonFileStore> {
    let store = JsonFileStore::new(config.store_path.clone());
    if store.exists() {
        Some(store)
    } else {
        println!(
            "Store not found at {}. Run `mkt pull --mode history` first.",
            store.path().display()
        );
        None
    }
}

/// Rewrite argv so `mkt` defaults to `mkt summary`.
///
/// Rules:
/// - `mkt`                      -> `mkt summary`
/// - `mkt --json ...`           -> `mkt summary --json ...`
/// - `mkt --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("summary".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "pull" | "summary" | "plot" | "export" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "summary flags".
    if arg1.starts_with('-') {
        argv.insert(1, "summary".to_string());
        return argv;
    }

    argv
}
