//! Shared networking constants and helpers used by daemon and client.

use std::time::Duration;

/// TCP port of the daemon's query endpoint.
pub const QUERY_PORT: u16 = 8080;

/// Largest request the query endpoint reads from one connection.
pub const MAX_REQUEST_BYTES: usize = 4096;

/// How long the query endpoint waits for a request line before dropping the connection.
pub const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Helper to format an address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}
