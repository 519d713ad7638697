//! Fetch sessions: the daemon's only contact with the outside world.
//!
//! A worker opens one `Session` per cycle from its `SessionFactory` and lets it drop at
//! the end of the cycle, whatever the outcome. Nothing survives from one cycle to the
//! next: no connection pool, no cookies, no page state. Sources are pluggable through
//! `SourceDescriptor` (URL plus locators); the worker itself never looks at markup.
//!
//! `HttpSessionFactory` is the production factory. Each session owns a dedicated
//! `reqwest` blocking client with a browser user agent. Only the document itself is
//! requested; images, fonts and media are never fetched, and a response of one of those
//! types is refused.
//!
//! Limitation: `HttpSession` reads the markup as served and runs no JavaScript. Sources
//! whose value node is filled in client-side (the live price on TradingView symbol pages
//! is one) only yield a value when the server-rendered page already carries it;
//! otherwise every cycle ends in `ParseError::ContentMissing` and the key stays absent.
//! A rendering browser plugs in as another `SessionFactory`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use spot_common::source::SourceDescriptor;
use spot_common::{ExtractError, FetchError, ParseError};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Content types that are never loaded.
const BLOCKED_TYPES: [&str; 4] = ["image/", "font/", "audio/", "video/"];

/// A loaded document.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub url: String,
    pub body: String,
}

/// One isolated fetch session. Released when dropped.
pub trait Session: Send {
    /// Load `url`, giving up after `timeout`.
    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<Page, FetchError>;

    /// Load the source page and return the located value text.
    fn fetch_raw_value(
        &mut self,
        source: &SourceDescriptor,
        timeout: Duration,
    ) -> Result<String, ExtractError> {
        let page = self.navigate(&source.url, timeout)?;
        source
            .locate(&page.body)
            .ok_or(ExtractError::Parse(ParseError::ContentMissing))
    }
}

/// Creates sessions; shared by all workers.
pub trait SessionFactory: Send + Sync {
    fn open(&self) -> Result<Box<dyn Session>, FetchError>;
}

/// Sessions backed by a fresh HTTP client each.
#[derive(Debug, Default)]
pub struct HttpSessionFactory {
    opened: AtomicU64,
}

impl HttpSessionFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionFactory for HttpSessionFactory {
    fn open(&self) -> Result<Box<dyn Session>, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9"),
        );
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| FetchError::Session(e.to_string()))?;
        let id = self.opened.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Session #{} opened", id);
        Ok(Box::new(HttpSession { id, client }))
    }
}

struct HttpSession {
    id: u64,
    client: Client,
}

impl Session for HttpSession {
    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if is_blocked(&content_type) {
            return Err(FetchError::BlockedResource {
                url: url.to_string(),
                content_type,
            });
        }

        let body = response.text().map_err(|e| transport_error(url, e))?;
        Ok(Page {
            url: url.to_string(),
            body,
        })
    }
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        debug!("Session #{} released", self.id);
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport(err.to_string())
    }
}

fn is_blocked(content_type: &str) -> bool {
    BLOCKED_TYPES
        .iter()
        .any(|prefix| content_type.starts_with(prefix))
}
