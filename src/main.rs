//! FLIPSCOUT — Marketplace listing scanner and flip-deal tracker
//!
//! Entry point. Loads configuration, initialises structured logging,
//! and runs the fetch→score→store loop until interrupted.

use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

use flipscout::analysis::scorer::DealScorer;
use flipscout::config::{self, AppConfig};
use flipscout::engine::analyzer::MarketAnalyzer;
use flipscout::engine::cycle::{run_cycle, run_loop, CycleReport};
use flipscout::market::csfloat::CsFloatClient;
use flipscout::storage::DealStore;

const BANNER: &str = r#"
  __ _ _                            _
 / _| (_)_ __  ___  ___ ___  _   _| |_
| |_| | | '_ \/ __|/ __/ _ \| | | | __|
|  _| | | |_) \__ \ (_| (_) | |_| | |_
|_| |_|_| .__/|___/\___\___/ \__,_|\__|
        |_|
  Listing scanner & flip-deal tracker v0.1.0
"#;

#[derive(Debug, Parser)]
#[command(name = "flipscout", version, about = "Scan marketplace listings for flip deals")]
struct Args {
    /// Path to the TOML config file (defaults apply if it does not exist).
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Run a single cycle and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let args = Args::parse();
    let cfg = AppConfig::load_or_default(&args.config)?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&cfg.logging);

    println!("{BANNER}");

    let api_key = cfg.api_key();
    if api_key.is_none() {
        info!(env = %cfg.api.api_key_env, "No API key set, requests will be unauthenticated");
    }
    let client = CsFloatClient::new(&cfg.api, api_key)?;

    let store = DealStore::new(&cfg.store.path);
    let mut analyzer = MarketAnalyzer::new(DealScorer::new(cfg.scoring.clone()), store);

    info!(
        base_url = %cfg.api.base_url,
        poll_interval_secs = cfg.bot.poll_interval_secs,
        max_pages = cfg.bot.max_pages,
        min_profit = %cfg.scoring.min_profit,
        max_listing_price = %cfg.scoring.max_listing_price,
        deals_file = %analyzer.store().path().display(),
        "FLIPSCOUT starting up"
    );

    if args.once {
        let report = run_cycle(&client, &mut analyzer, cfg.bot.max_pages, 1).await;
        log_cycle_report(&report);
        return Ok(());
    }

    // -- Main loop -------------------------------------------------------

    info!(
        interval_secs = cfg.bot.poll_interval_secs,
        "Entering main loop. Press Ctrl+C to stop."
    );

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Bot interrupted by user."),
            Err(e) => {
                error!(error = %e, "Failed to listen for Ctrl+C, running until killed");
                std::future::pending::<()>().await;
            }
        }
    };

    let cycles = run_loop(
        &client,
        &mut analyzer,
        cfg.bot.max_pages,
        Duration::from_secs(cfg.bot.poll_interval_secs),
        shutdown,
        log_cycle_report,
    )
    .await;

    info!(
        cycles,
        listings_seen = analyzer.seen_count(),
        "FLIPSCOUT shut down cleanly."
    );
    Ok(())
}

/// Log a human-readable cycle summary.
fn log_cycle_report(report: &CycleReport) {
    info!(
        cycle = report.cycle_number,
        listings = report.listings_fetched,
        deals = report.deals_found,
        skipped = report.skipped,
        store_failures = report.store_failures,
        reasons = ?report.skip_reasons,
        "Cycle complete"
    );
}

/// Initialise the `tracing` subscriber: console plus an optional plain-text
/// log file. Returns the file writer's guard when file logging is active.
fn init_logging(cfg: &config::LoggingConfig) -> Option<WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, EnvFilter, Layer};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.level));

    let console_layer = if std::env::var("FLIPSCOUT_LOG_JSON").is_ok() {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };

    // `tracing_appender::rolling::never` panics if the file cannot be
    // created, so check the directory is writable first.
    let (file_layer, guard) = if cfg.dir.is_empty() {
        (None, None)
    } else {
        match std::fs::create_dir_all(&cfg.dir).and_then(|_| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(std::path::Path::new(&cfg.dir).join(&cfg.file))
        }) {
            Ok(_) => {
                let appender = tracing_appender::rolling::never(&cfg.dir, &cfg.file);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true);
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!(
                    "Warning: could not open log file {}/{} ({e}), file logging disabled",
                    cfg.dir, cfg.file
                );
                (None, None)
            }
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}
