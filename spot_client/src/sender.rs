//! Sending queries to the daemon's TCP endpoint.
//!
//! One connection per query: the request is written as a single JSON line and the
//! daemon answers with a single JSON line before closing.
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;
use spot_common::QuoteError;
use spot_common::command::{Request, Response};

/// Helper type for sending queries to the daemon.
pub struct QuerySender;

impl QuerySender {
    pub fn send(address: &str, request: &Request, timeout: Duration) -> Result<Response, QuoteError> {
        let target = address
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| QuoteError::Format(format!("cannot resolve {}", address)))?;
        let mut stream = TcpStream::connect_timeout(&target, timeout)
            .map_err(|e| QuoteError::Format(format!("Failed to connect to {}: {}", address, e)))?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;

        let mut payload = serde_json::to_vec(request)?;
        payload.push(b'\n');
        debug!("Sending query: {}", String::from_utf8_lossy(&payload).trim());
        stream.write_all(&payload)?;
        stream.flush()?;

        let mut reply = String::new();
        BufReader::new(stream).read_line(&mut reply)?;
        if reply.trim().is_empty() {
            return Err(QuoteError::Format(format!("{} closed without answering", address)));
        }
        Ok(serde_json::from_str(reply.trim())?)
    }
}
