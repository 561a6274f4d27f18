use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use library_ledger::{CatalogStore, Config, Console, ReportKind, ReportRenderer, SystemClock};

/// Command-line arguments for the library console
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the library JSON document (overrides LIBRARY_DB_PATH)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print one admin report and exit instead of starting the menu
    #[arg(long, value_enum)]
    report: Option<ReportKind>,
}

/// Parse arguments, set up logging, open the store and run the console
fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?.with_overrides(args.db, args.verbose);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| EnvFilter::new(library_ledger::config::DEFAULT_LOG_FILTER)),
        )
        .with_writer(io::stderr)
        .init();

    info!(path = %config.db_path.display(), "opening library");
    let mut store = CatalogStore::open(&config.db_path, SystemClock)
        .with_context(|| format!("failed to open library at {}", config.db_path.display()))?;

    if let Some(kind) = args.report {
        println!("{}", kind.title().bold());
        print!("{}", ReportRenderer::render(kind, store.ledger().entries(), config.top_n));
        return Ok(());
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    Console::new(&mut store, stdin.lock(), stdout.lock(), config.top_n)
        .run()
        .context("console session failed")?;

    info!("library session closed");
    Ok(())
}
