//! Spot Client: queries the extraction daemon and prints the answer.
//!
//! Usage example (CLI):
//! ```bash
//! spot_client prices
//! spot_client price gold --grams 10 --currency idr
//! spot_client --server-ip 192.168.0.10 read gold usdidr
//! ```
//!
//! Exits with a non-zero status when the daemon answers with an error.
mod args;
mod sender;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{error, info};
use spot_common::QuoteError;
use spot_common::command::Response;
use spot_common::net::addr;
use spot_common::service::{Availability, Lookup};

use crate::args::Args;
use crate::sender::QuerySender;

fn main() -> Result<ExitCode, QuoteError> {
    init_logger();
    let args = Args::parse();

    let server_ip = args.server_ip.trim().replace('"', "");
    let address = addr(&server_ip, args.port);
    info!("Querying {}", address);

    let response = QuerySender::send(
        &address,
        &args.query.request(),
        Duration::from_millis(args.timeout_ms),
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        for line in render(&response) {
            println!("{}", line);
        }
    }

    Ok(match response {
        Response::Error { kind, message } => {
            error!("Daemon answered {:?}: {}", kind, message);
            ExitCode::FAILURE
        }
        _ => ExitCode::SUCCESS,
    })
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();
}

fn freshness(is_fresh: bool) -> &'static str {
    if is_fresh { "fresh" } else { "STALE" }
}

/// Human-readable summary of a response.
fn render(response: &Response) -> Vec<String> {
    match response {
        Response::Prices(prices) => {
            let mut lines: Vec<String> = prices
                .metals
                .iter()
                .map(|m| {
                    let idr = m
                        .price_per_gram_idr
                        .map(|idr| format!(" | {:.2} IDR/g", idr))
                        .unwrap_or_default();
                    format!(
                        "{:<7} {:>12.4} USD ({}) | {:.4} USD/g{} [{}]",
                        m.metal,
                        m.price_usd,
                        m.unit,
                        m.price_per_gram_usd,
                        idr,
                        freshness(m.is_fresh)
                    )
                })
                .collect();
            if let Some(rate) = &prices.exchange_rate {
                lines.push(format!(
                    "{:<7} {:>12.2} [{}]",
                    rate.pair,
                    rate.rate,
                    freshness(rate.is_fresh)
                ));
            }
            if !prices.missing.is_empty() {
                let missing: Vec<String> = prices.missing.iter().map(|k| k.to_string()).collect();
                lines.push(format!("not available yet: {}", missing.join(", ")));
            }
            lines.push(format!("last updated {}", prices.last_updated.to_rfc3339()));
            lines
        }
        Response::Price(quote) => {
            let mut lines = vec![format!(
                "{} g {} = {:.2} USD ({:.4} USD/g) [{}]",
                quote.grams,
                quote.metal,
                quote.total_usd,
                quote.price_per_gram_usd,
                freshness(quote.is_fresh)
            )];
            if let Some(idr) = &quote.idr {
                lines.push(format!(
                    "= {:.2} IDR at {:.2} IDR/USD [{}]",
                    idr.total_idr,
                    idr.rate,
                    freshness(idr.rate_is_fresh)
                ));
            }
            lines
        }
        Response::ExchangeRate(rate) => vec![format!(
            "{} {:.2} observed {} [{}]",
            rate.pair,
            rate.rate,
            rate.observed_at.to_rfc3339(),
            freshness(rate.is_fresh)
        )],
        Response::Health(health) => {
            let mut lines = vec![format!("status: {:?}", health.status)];
            lines.extend(health.keys.iter().map(|(key, availability)| {
                let label = match availability {
                    Availability::Absent => "absent",
                    Availability::Stale => "stale",
                    Availability::Fresh => "fresh",
                };
                format!("  {:<7} {}", key, label)
            }));
            lines
        }
        Response::Quotes { quotes } => quotes
            .iter()
            .map(|(key, lookup)| match lookup {
                Lookup::Absent => format!("{:<7} absent", key),
                Lookup::Present(view) => format!(
                    "{:<7} {:>12.4} {} from {} at {} [{}]",
                    key,
                    view.value,
                    view.unit,
                    view.source,
                    view.observed_at.to_rfc3339(),
                    freshness(view.is_fresh)
                ),
            })
            .collect(),
        Response::Error { kind, message } => vec![format!("error ({:?}): {}", kind, message)],
    }
}
