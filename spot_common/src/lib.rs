//!
//! Common types and services shared by the extraction daemon and the query client.
//!
//! This crate aggregates:
//! - `error` — `QuoteError`, the extraction taxonomy and read-side `ServiceError`.
//! - `result` — handy `Result<T, QuoteError>` alias.
//! - `keys` — tracked quote keys, units and currencies.
//! - `quote` — `Quote` and its cached form `CacheEntry`.
//! - `cache` — the `QuoteStore` contract and the in-memory cache.
//! - `convert` — gram/IDR conversion and freshness arithmetic.
//! - `service` — read-side views consumed by the query layer.
//! - `source` — locating the value text on a fetched page.
//! - `config` — settings and extraction targets.
//! - `clock` — injectable wall clock.
//! - `command` — query requests/responses exchanged over TCP.
//! - `net` — networking constants and small helpers.
pub mod cache;
pub mod clock;
pub mod command;
pub mod config;
pub mod convert;
pub mod error;
pub mod keys;
pub mod net;
pub mod quote;
pub mod result;
pub mod service;
pub mod source;

pub use cache::{MemoryCache, QuoteStore};
pub use error::{ExtractError, FetchError, ParseError, QuoteError, ServiceError, ValidationError};
pub use keys::{Currency, QuoteKey, Unit};
pub use quote::{CacheEntry, Quote};
pub use result::Result;
