//! Command-line arguments for the extraction daemon.
//!
//! Every flag can also be set through the environment variable named next to it.
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use spot_common::config::Settings;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about = "Spot quote extraction daemon", long_about = None)]
pub struct Args {
    /// Address of the TCP query endpoint.
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0:8080")]
    pub bind: String,

    /// JSON file with extraction targets; the built-in targets are used when absent.
    #[arg(long, env = "SCRAPE_TARGETS_FILE")]
    pub targets: Option<PathBuf>,

    /// Seconds between successful extractions.
    #[arg(long, env = "SCRAPE_INTERVAL_SECONDS", default_value_t = 3)]
    pub interval_secs: u64,

    /// Navigation timeout in milliseconds.
    #[arg(long, env = "SCRAPE_TIMEOUT_MS", default_value_t = 15_000)]
    pub timeout_ms: u64,

    /// Backoff step in seconds per consecutive failure.
    #[arg(long, env = "RECOVERY_DELAY_SECONDS", default_value_t = 5)]
    pub base_backoff_secs: u64,

    /// Backoff ceiling in seconds.
    #[arg(long, env = "MAX_BACKOFF_SECONDS", default_value_t = 60)]
    pub max_backoff_secs: u64,

    /// Age in seconds after which a quote is reported stale.
    #[arg(long, env = "FRESHNESS_WINDOW_SECONDS", default_value_t = 60)]
    pub freshness_secs: u64,

    /// Seconds shutdown waits for workers to finish their cycle.
    #[arg(long, env = "SHUTDOWN_GRACE_SECONDS", default_value_t = 20)]
    pub grace_secs: u64,
}

impl Args {
    pub fn settings(&self) -> Settings {
        Settings {
            interval: Duration::from_secs(self.interval_secs),
            fetch_timeout: Duration::from_millis(self.timeout_ms),
            base_backoff: Duration::from_secs(self.base_backoff_secs),
            max_backoff: Duration::from_secs(self.max_backoff_secs),
            freshness_window: Duration::from_secs(self.freshness_secs),
            shutdown_grace: Duration::from_secs(self.grace_secs),
        }
    }
}
