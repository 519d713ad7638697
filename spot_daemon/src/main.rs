//! Spot quote extraction daemon.
//!
//! This binary keeps the latest gold, silver, copper and USD/IDR quotes in an in-memory
//! cache and serves them over a small TCP query endpoint. It wires together:
//!
//! - `Supervisor` — one long-lived `Worker` thread per configured target; each worker
//!   fetches its source page in a fresh session, parses and validates the value and
//!   publishes it, backing off on failure.
//! - `MemoryCache` — the shared latest-value store; the only state workers share.
//! - `QueryReceiver` — answers JSON queries through `QuoteService`, which adds freshness
//!   and gram/IDR conversion on the read side.
//!
//! Shutdown: Ctrl+C stops every worker at the end of its current cycle; the process
//! exits after all workers are done or the grace period has passed.
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use crossbeam_channel::bounded;
use log::{error, info, warn};
use spot_common::QuoteError;
use spot_common::cache::MemoryCache;
use spot_common::clock::SystemClock;
use spot_common::config::{default_targets, load_targets};
use spot_common::service::QuoteService;
use spot_daemon::args::Args;
use spot_daemon::fetch::HttpSessionFactory;
use spot_daemon::receiver::QueryReceiver;
use spot_daemon::supervisor::Supervisor;

fn main() -> Result<(), QuoteError> {
    init_logger();
    let args = Args::parse();
    let settings = args.settings();
    settings.validate()?;

    let targets = match &args.targets {
        Some(path) => load_targets(BufReader::new(File::open(path)?))?,
        None => default_targets(),
    };

    info!("Spot quote daemon");
    info!("  Targets  : {}", targets.len());
    info!("  Interval : {:?}", settings.interval);
    info!("  Timeout  : {:?}", settings.fetch_timeout);
    info!("  Backoff  : {:?} .. {:?}", settings.base_backoff, settings.max_backoff);
    info!("  Freshness: {:?}", settings.freshness_window);

    let cache = Arc::new(MemoryCache::new());
    let clock = Arc::new(SystemClock);

    let service = QuoteService::new(cache.clone(), clock.clone(), settings.freshness_window)
        .with_targets(&targets);
    let receiver = QueryReceiver::new(&args.bind, Arc::new(service))?;
    thread::spawn(move || {
        if let Err(e) = receiver.serve() {
            error!("Query server failed: {}", e);
        }
    });

    let supervisor = Supervisor::start(
        &settings,
        targets,
        cache,
        Arc::new(HttpSessionFactory::new()),
        clock,
    )?;

    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .map_err(|e| QuoteError::Format(format!("Error setting Ctrl+C handler: {}", e)))?;

    let _ = shutdown_rx.recv();
    info!("Ctrl+C received. Shutting down daemon...");

    let report = supervisor.stop(settings.shutdown_grace);
    if !report.abandoned.is_empty() {
        warn!("Workers abandoned at shutdown: {:?}", report.abandoned);
    }
    info!("Daemon shut down");
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
