//! Error types shared between the daemon and the client.
//!
//! `QuoteError` is the workspace-wide failure for I/O, serialization and
//! configuration. The extraction pipeline has its own taxonomy:
//! `FetchError`, `ParseError` and `ValidationError`, unified as `ExtractError`. A worker
//! handles all three the same way (log, back off, keep the cached value), so they never
//! surface as `QuoteError`. Read-side failures are `ServiceError`.
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keys::QuoteKey;

/// Unified error type shared by daemon and client.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// I/O error originating from the standard library or sockets/files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// Invalid settings or targets.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

/// Navigation, timeout and transport failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The fetch session itself could not be created.
    #[error("session unavailable: {0}")]
    Session(String),

    /// Navigation did not complete within the configured timeout.
    #[error("navigation to {url} timed out")]
    Timeout { url: String },

    /// The source answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    /// The response was an image, font or media resource.
    #[error("refused non-document resource {content_type} from {url}")]
    BlockedResource { url: String, content_type: String },

    /// Any other transport failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Expected content absent or unreadable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// None of the source's locators matched the page.
    #[error("target content not found on page")]
    ContentMissing,

    /// Content was found but is not a number.
    #[error("malformed value text {0:?}")]
    Malformed(String),
}

/// A parsed value that must not reach the cache.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Zero, negative, NaN or infinite.
    #[error("value {0} is not a positive number")]
    NotPositive(f64),

    /// Outside the key's plausible range.
    #[error("value {value} outside plausible range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },
}

/// Any failure of one extraction cycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// Navigation or transport failure.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Content missing or unreadable.
    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    /// Value rejected before publishing.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Read-side failures reported to the query layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Every requested key is absent from the cache.
    #[error("no quote data available yet")]
    NoData,

    /// The requested key has never been populated.
    #[error("{0} data not available yet")]
    Unavailable(QuoteKey),

    /// An IDR conversion was requested but the USD/IDR rate is absent.
    #[error("USDIDR exchange rate not available yet")]
    RateUnavailable,

    /// The name does not denote a metal.
    #[error("invalid metal {0:?}, available: gold, silver, copper")]
    NotAMetal(String),

    /// Weight must be a positive finite number of grams.
    #[error("invalid weight {0}, grams must be positive")]
    InvalidWeight(f64),
}

/// Coarse classification the outer layer maps to a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Data absent, retry later (503-class).
    Unavailable,
    /// The request itself is wrong (400-class).
    InvalidRequest,
}

impl ServiceError {
    /// Classify the error for the outer layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::NoData | ServiceError::Unavailable(_) | ServiceError::RateUnavailable => {
                ErrorKind::Unavailable
            }
            ServiceError::NotAMetal(_) | ServiceError::InvalidWeight(_) => {
                ErrorKind::InvalidRequest
            }
        }
    }
}
