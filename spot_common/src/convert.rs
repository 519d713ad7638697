//! Unit/currency conversion and freshness arithmetic.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

use crate::keys::Unit;

/// Grams in one troy ounce.
pub const TROY_OUNCE_GRAMS: f64 = 31.1034768;
/// Grams in one avoirdupois pound.
pub const POUND_GRAMS: f64 = 453.592;

/// Price of one gram given a price per `unit`; `None` when the unit is not a weight.
pub fn price_per_gram(value: f64, unit: Unit) -> Option<f64> {
    unit.grams().map(|grams| value / grams)
}

/// Convert a USD amount with the USD/IDR rate.
pub fn to_idr(value_usd: f64, usdidr_rate: f64) -> f64 {
    value_usd * usdidr_rate
}

/// Whether an observation is inside the freshness window. The edge is inclusive.
pub fn is_fresh(observed_at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
    now.signed_duration_since(observed_at) <= window
}
