//! Quote data model and the cache entry layout.
//!
//! A `Quote` is what a worker produces after a successful extraction. Its persisted
//! form is a `CacheEntry`, stored under the quote key as JSON:
//! `{"price": 2935.5, "source": "TradingView", "updated_at": "2025-01-01T00:00:00Z"}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::keys::{QuoteKey, Unit};

/// One tracked value with unit and provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub key: QuoteKey,
    /// Positive value in the native unit.
    pub value: f64,
    pub unit: Unit,
    /// Origin identifier, informational only.
    pub source: String,
    /// When the value was extracted (UTC).
    pub observed_at: DateTime<Utc>,
}

/// Latest known value for one key as held by the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(rename = "price")]
    pub value: f64,
    pub source: String,
    #[serde(rename = "updated_at")]
    pub observed_at: DateTime<Utc>,
}
