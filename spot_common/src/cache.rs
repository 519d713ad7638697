//! Latest-value quote cache.
//!
//! The cache is the only state shared between extraction workers and readers. Each key
//! has exactly one writer (its worker), so writes never contend with each other and
//! readers only ever observe whole entries. There is no persistence: a fresh process
//! starts empty, and an empty slot is reported as absent rather than as a zero value.
//!
//! Reads over several keys are not transactional; every entry carries its own
//! `observed_at` and freshness has to be judged per key.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::keys::QuoteKey;
use crate::quote::CacheEntry;

/// Write/read contract of the quote cache.
pub trait QuoteStore: Send + Sync {
    /// Overwrite the entry for `key`; last writer wins.
    fn write(&self, key: QuoteKey, value: f64, source: &str, observed_at: DateTime<Utc>);

    /// Read several keys in one call. Absent keys map to `None`.
    fn read(&self, keys: &[QuoteKey]) -> BTreeMap<QuoteKey, Option<CacheEntry>>;

    /// Read a single key.
    fn read_one(&self, key: QuoteKey) -> Option<CacheEntry> {
        self.read(&[key]).remove(&key).flatten()
    }
}

/// In-process cache backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<QuoteKey, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True until the first successful write of any key.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl QuoteStore for MemoryCache {
    fn write(&self, key: QuoteKey, value: f64, source: &str, observed_at: DateTime<Utc>) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                source: source.to_string(),
                observed_at,
            },
        );
    }

    fn read(&self, keys: &[QuoteKey]) -> BTreeMap<QuoteKey, Option<CacheEntry>> {
        keys.iter()
            .map(|key| (*key, self.entries.get(key).map(|entry| entry.value().clone())))
            .collect()
    }
}
