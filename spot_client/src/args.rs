//! Command-line arguments for the query client.
use clap::{Parser, Subcommand};
use spot_common::command::Request;
use spot_common::net::QUERY_PORT;
use spot_common::{Currency, QuoteKey};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about = "Query the spot quote daemon", long_about = None)]
pub struct Args {
    /// Daemon IP address or host name.
    #[arg(long, default_value = "127.0.0.1")]
    pub server_ip: String,

    /// Daemon query port.
    #[arg(long, default_value_t = QUERY_PORT)]
    pub port: u16,

    /// Connect and read timeout in milliseconds.
    #[arg(long, default_value_t = 5_000)]
    pub timeout_ms: u64,

    /// Print the raw JSON response instead of a summary.
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub query: Query,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum Query {
    /// All metals and the exchange rate.
    Prices,
    /// Price a weight of one metal.
    Price {
        /// gold, silver or copper.
        metal: String,
        #[arg(long, default_value_t = 1.0)]
        grams: f64,
        #[arg(long, value_enum, default_value_t = Currency::Usd)]
        currency: Currency,
    },
    /// USD/IDR exchange rate.
    Rate,
    /// Per-key availability.
    Health,
    /// Raw cache lookups.
    Read {
        #[arg(required = true, value_enum)]
        keys: Vec<QuoteKey>,
    },
}

impl Query {
    pub fn request(&self) -> Request {
        match self {
            Query::Prices => Request::Prices,
            Query::Price {
                metal,
                grams,
                currency,
            } => Request::Price {
                metal: metal.clone(),
                grams: *grams,
                currency: *currency,
            },
            Query::Rate => Request::ExchangeRate,
            Query::Health => Request::Health,
            Query::Read { keys } => Request::Read { keys: keys.clone() },
        }
    }
}
