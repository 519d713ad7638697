use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, info};
use spot_common::command::{Request, Response};
use spot_common::error::ErrorKind;
use spot_common::net::{MAX_REQUEST_BYTES, REQUEST_READ_TIMEOUT};
use spot_common::service::QuoteService;
use spot_common::Result;

/// TCP query endpoint that answers read requests from the quote cache.
///
/// Each connection carries one JSON `Request` (terminated by a newline or by the client
/// closing its write half) and gets one JSON `Response` back. A bad request only
/// affects its own connection; the accept loop keeps serving other clients. A client that
/// sends nothing within the read timeout is disconnected.
pub struct QueryReceiver {
    /// The underlying TCP listening socket.
    pub(crate) socket: TcpListener,
    service: Arc<QuoteService>,
    read_timeout: Duration,
}

impl QueryReceiver {
    /// Bind a new receiver to the provided `bind_addr` (e.g., `0.0.0.0:8080`).
    pub fn new(bind_addr: &str, service: Arc<QuoteService>) -> Result<Self> {
        let socket = TcpListener::bind(bind_addr)?;
        Ok(Self {
            socket,
            service,
            read_timeout: REQUEST_READ_TIMEOUT,
        })
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Blocking accept loop; each connection is served on its own thread.
    pub fn serve(self) -> Result<()> {
        info!("Query server is started on {}", self.socket.local_addr()?);

        for stream in self.socket.incoming() {
            match stream {
                Ok(stream) => {
                    let service = Arc::clone(&self.service);
                    let read_timeout = self.read_timeout;
                    thread::spawn(move || {
                        let peer = stream.peer_addr().ok();
                        if let Err(e) = handle_connection(stream, &service, read_timeout) {
                            error!("Query from {:?} failed: {}", peer, e);
                        }
                    });
                }
                Err(e) => error!("TCP connection error: {}", e),
            }
        }
        Ok(())
    }
}

fn handle_connection(stream: TcpStream, service: &QuoteService, read_timeout: Duration) -> Result<()> {
    stream.set_read_timeout(Some(read_timeout))?;
    let mut reader = BufReader::new(stream.try_clone()?).take(MAX_REQUEST_BYTES as u64);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    debug!("Received query {:?}", line.trim());

    let response = match serde_json::from_str::<Request>(line.trim()) {
        Ok(request) => answer(service, request),
        Err(e) => Response::Error {
            kind: ErrorKind::InvalidRequest,
            message: format!("malformed request: {}", e),
        },
    };

    let mut stream = stream;
    let mut payload = serde_json::to_vec(&response)?;
    payload.push(b'\n');
    stream.write_all(&payload)?;
    stream.flush()?;
    Ok(())
}

/// Dispatch one request to the read service.
pub fn answer(service: &QuoteService, request: Request) -> Response {
    match request {
        Request::Prices => service
            .all_prices()
            .map_or_else(Response::from, Response::Prices),
        Request::Price {
            metal,
            grams,
            currency,
        } => service
            .metal_price(&metal, grams, currency)
            .map_or_else(Response::from, Response::Price),
        Request::ExchangeRate => service
            .exchange_rate()
            .map_or_else(Response::from, Response::ExchangeRate),
        Request::Health => Response::Health(service.health()),
        Request::Read { keys } => Response::Quotes {
            quotes: service.read(&keys),
        },
    }
}
