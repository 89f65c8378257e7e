//! listing-notifier
//!
//! Batch job run on a schedule: `ingest` stores newly scraped listings,
//! `notify` announces unsent ones in a Telegram chat.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::db::connection::{init_db, Database};
use crate::db::ingest_runs::{end_ingest_run, get_recent_ingest_runs, start_ingest_run};
use crate::db::listings::outbox_counts;
use crate::errors::{AppError, Result};
use crate::notifier::{Dispatcher, Geoapify, TelegramBot};
use crate::scraper::{CommandSource, JsonFileSource, ListingSource};

mod config;
mod db;
mod domain;
mod errors;
mod geos;
mod ingest;
mod notifier;
mod scraper;

#[cfg(test)]
mod tests;

#[derive(Parser, Debug)]
#[command(name = "listing-notifier", version, about = "Announces new house listings in a chat")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store listings from the scraper that are not known yet
    Ingest {
        /// Read scraped rows from this JSON file instead of the configured source
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Announce unsent listings
    Notify {
        /// Override notify.max_batch
        #[arg(long)]
        max_batch: Option<usize>,
    },

    /// Show outbox size and recent ingest runs
    Status,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load_or_default(&cli.config)?;
    config.apply_env();
    config.validate()?;

    let mut db = Database::open(&config.database_path)?;
    log::debug!("Using database {}", config.database_path.display());

    match cli.command {
        Command::Ingest { input } => run_ingest(&config, &mut db, input),
        Command::Notify { max_batch } => run_notify(&config, &mut db, max_batch),
        Command::Status => run_status(&mut db),
    }
}

fn run_ingest(config: &Config, db: &mut Database, input: Option<PathBuf>) -> Result<()> {
    let input = input.or_else(|| config.ingest.input.clone());
    let source: Box<dyn ListingSource> = match (input, &config.ingest.command) {
        (Some(path), _) => Box::new(JsonFileSource::new(path)),
        (None, Some(argv)) => Box::new(CommandSource::new(argv)?),
        (None, None) => {
            return Err(AppError::config(
                "no listing source: set ingest.input, ingest.command or pass --input",
            ))
        }
    };

    init_db(db)?;
    let run_id = db.with_conn(|conn| start_ingest_run(conn, now_unix()))?;

    let result = match source.fetch() {
        Ok(rows) => ingest::ingest_rows(&mut *db, &rows),
        Err(e) => Err(e),
    };

    let (fetched, inserted, error) = match &result {
        Ok(report) => (report.fetched, report.inserted, None),
        Err(e) => (0, 0, Some(e.to_string())),
    };
    db.with_conn(|conn| end_ingest_run(conn, run_id, now_unix(), fetched, inserted, error))?;

    result.map(|_| ())
}

fn run_notify(config: &Config, db: &mut Database, max_batch: Option<usize>) -> Result<()> {
    config.validate_for_notify()?;
    let max_batch = config.batch_size(max_batch)?;

    let transport_err =
        |e: errors::TransportError| AppError::config(format!("HTTP client setup failed: {e}"));

    let geoapify = Geoapify::new(
        config.geoapify.api_key.clone(),
        config.geoapify.country.clone(),
        config.geoapify.map_style.clone(),
        config.geoapify.geocode_url.clone(),
        config.geoapify.staticmap_url.clone(),
    )
    .map_err(transport_err)?;

    let bot = TelegramBot::new(
        config.telegram.api_base.clone(),
        config.telegram.api_key.clone(),
        config.telegram.chat_id.clone(),
    )
    .map_err(transport_err)?;

    let dispatcher = Dispatcher::new(&geoapify, &geoapify, &bot, config.map.clone());
    let report = dispatcher.dispatch_pending(db, max_batch)?;

    log::info!(
        "Done: {} with map, {} text only, {} failed, {} deferred",
        report.with_map(),
        report.text_only(),
        report.failed(),
        report.deferred
    );
    Ok(())
}

fn run_status(db: &mut Database) -> Result<()> {
    let (pending, total) = outbox_counts(db)?;
    log::info!("{total} listing(s) stored, {pending} waiting to be announced");

    let runs = db.with_conn(|conn| get_recent_ingest_runs(conn, 10))?;
    if runs.is_empty() {
        log::info!("No ingest runs recorded yet.");
    }
    for run in runs {
        let state = match (run.finished_at, run.success) {
            (None, _) => "running".to_string(),
            (Some(_), true) => "ok".to_string(),
            (Some(_), false) => format!("failed: {}", run.error_message.unwrap_or_default()),
        };
        log::info!(
            "#{} started {} fetched {} inserted {} ({state})",
            run.id,
            chrono::DateTime::from_timestamp(run.started_at, 0)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| run.started_at.to_string()),
            run.fetched.unwrap_or(0),
            run.inserted.unwrap_or(0),
        );
    }
    Ok(())
}
