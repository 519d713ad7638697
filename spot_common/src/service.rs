//! Read side of the cache: freshness, unit/currency conversion and response views.
//!
//! The service never writes. Each call performs a single multi-key read against the
//! store and judges freshness per key against one `now`, so a response never mixes two
//! notions of the current time. Staleness only changes reporting: a stale entry is still
//! served, flagged with `is_fresh = false`. An absent key is a separate state and maps to
//! `Lookup::Absent` or to a `ServiceError` the outer layer turns into a 503-class reply.
//!
//! Aggregate views accept partial availability: keys that are missing are listed in
//! `missing`, and the call only fails when every requested key is absent.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::QuoteStore;
use crate::clock::Clock;
use crate::config::TargetConfig;
use crate::convert::{is_fresh, price_per_gram, to_idr};
use crate::error::ServiceError;
use crate::keys::{Currency, QuoteKey, Unit};
use crate::quote::CacheEntry;

/// A cache entry enriched with its unit and freshness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteView {
    pub key: QuoteKey,
    pub value: f64,
    pub unit: Unit,
    pub source: String,
    pub observed_at: DateTime<Utc>,
    pub is_fresh: bool,
}

/// Result of reading one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Lookup {
    /// Never populated since the process started.
    Absent,
    Present(QuoteView),
}

impl Lookup {
    pub fn availability(&self) -> Availability {
        match self {
            Lookup::Absent => Availability::Absent,
            Lookup::Present(view) if view.is_fresh => Availability::Fresh,
            Lookup::Present(_) => Availability::Stale,
        }
    }

    pub fn view(&self) -> Option<&QuoteView> {
        match self {
            Lookup::Absent => None,
            Lookup::Present(view) => Some(view),
        }
    }
}

/// The three states a key can be in from a reader's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Absent,
    Stale,
    Fresh,
}

/// One metal in the aggregate view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetalPrice {
    pub metal: QuoteKey,
    /// Price in USD per native unit.
    pub price_usd: f64,
    pub unit: Unit,
    pub price_per_gram_usd: f64,
    /// Present when the USD/IDR rate is cached.
    pub price_per_gram_idr: Option<f64>,
    pub source: String,
    pub observed_at: DateTime<Utc>,
    pub is_fresh: bool,
}

/// The USD/IDR rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateView {
    pub pair: String,
    pub rate: f64,
    pub source: String,
    pub observed_at: DateTime<Utc>,
    pub is_fresh: bool,
}

/// All metals plus the exchange rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllPrices {
    pub metals: Vec<MetalPrice>,
    pub exchange_rate: Option<RateView>,
    /// Requested keys with no cache entry yet.
    pub missing: Vec<QuoteKey>,
    /// Most recent `observed_at` among the present entries.
    pub last_updated: DateTime<Utc>,
}

/// IDR side of a single-metal quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdrConversion {
    pub rate: f64,
    pub price_per_gram_idr: f64,
    pub total_idr: f64,
    pub rate_is_fresh: bool,
}

/// A single metal priced for a given weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetalQuote {
    pub metal: QuoteKey,
    pub grams: f64,
    pub price_usd: f64,
    pub unit: Unit,
    pub price_per_gram_usd: f64,
    pub total_usd: f64,
    pub currency: Currency,
    pub idr: Option<IdrConversion>,
    pub source: String,
    pub observed_at: DateTime<Utc>,
    pub is_fresh: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Per-key availability and an overall verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: HealthStatus,
    pub keys: BTreeMap<QuoteKey, Availability>,
}

/// Read-only view over a quote store.
pub struct QuoteService {
    store: Arc<dyn QuoteStore>,
    clock: Arc<dyn Clock>,
    freshness_window: Duration,
    units: HashMap<QuoteKey, Unit>,
}

impl QuoteService {
    pub fn new(store: Arc<dyn QuoteStore>, clock: Arc<dyn Clock>, freshness_window: Duration) -> Self {
        Self {
            store,
            clock,
            freshness_window,
            units: HashMap::new(),
        }
    }

    /// Use the units configured on the targets instead of the keys' defaults.
    pub fn with_targets(mut self, targets: &[TargetConfig]) -> Self {
        self.units = targets.iter().map(|t| (t.key, t.unit())).collect();
        self
    }

    fn unit(&self, key: QuoteKey) -> Unit {
        self.units.get(&key).copied().unwrap_or_else(|| key.default_unit())
    }

    fn view(&self, key: QuoteKey, entry: CacheEntry, now: DateTime<Utc>) -> QuoteView {
        QuoteView {
            key,
            value: entry.value,
            unit: self.unit(key),
            is_fresh: is_fresh(entry.observed_at, now, self.freshness_window),
            source: entry.source,
            observed_at: entry.observed_at,
        }
    }

    /// Read `keys` in one round trip. Absent keys are reported, never an error.
    pub fn read(&self, keys: &[QuoteKey]) -> BTreeMap<QuoteKey, Lookup> {
        let now = self.clock.now();
        self.store
            .read(keys)
            .into_iter()
            .map(|(key, entry)| {
                let lookup = match entry {
                    Some(entry) => Lookup::Present(self.view(key, entry, now)),
                    None => Lookup::Absent,
                };
                (key, lookup)
            })
            .collect()
    }

    /// Every metal with gram and IDR conversion, plus the exchange rate.
    pub fn all_prices(&self) -> Result<AllPrices, ServiceError> {
        let lookups = self.read(&QuoteKey::ALL);
        let missing: Vec<QuoteKey> = lookups
            .iter()
            .filter(|(_, lookup)| lookup.view().is_none())
            .map(|(key, _)| *key)
            .collect();
        if missing.len() == lookups.len() {
            return Err(ServiceError::NoData);
        }

        let exchange_rate = lookups
            .get(&QuoteKey::Usdidr)
            .and_then(Lookup::view)
            .map(rate_view);
        let rate = exchange_rate.as_ref().map(|r| r.rate);

        let metals: Vec<MetalPrice> = QuoteKey::METALS
            .iter()
            .filter_map(|key| lookups.get(key).and_then(Lookup::view))
            .filter_map(|view| {
                let per_gram = price_per_gram(view.value, view.unit)?;
                Some(MetalPrice {
                    metal: view.key,
                    price_usd: view.value,
                    unit: view.unit,
                    price_per_gram_usd: per_gram,
                    price_per_gram_idr: rate.map(|rate| to_idr(per_gram, rate)),
                    source: view.source.clone(),
                    observed_at: view.observed_at,
                    is_fresh: view.is_fresh,
                })
            })
            .collect();

        let last_updated = lookups
            .values()
            .filter_map(|lookup| lookup.view().map(|view| view.observed_at))
            .max()
            .unwrap_or_else(|| self.clock.now());

        Ok(AllPrices {
            metals,
            exchange_rate,
            missing,
            last_updated,
        })
    }

    /// Price `grams` of one metal, optionally converted to IDR.
    pub fn metal_price(
        &self,
        metal: &str,
        grams: f64,
        currency: Currency,
    ) -> Result<MetalQuote, ServiceError> {
        let key = QuoteKey::metal(metal).ok_or_else(|| ServiceError::NotAMetal(metal.to_string()))?;
        if !(grams.is_finite() && grams > 0.0) {
            return Err(ServiceError::InvalidWeight(grams));
        }

        let wanted = [key, QuoteKey::Usdidr];
        let keys = match currency {
            Currency::Usd => &wanted[..1],
            Currency::Idr => &wanted[..],
        };
        let lookups = self.read(keys);
        let view = lookups
            .get(&key)
            .and_then(Lookup::view)
            .ok_or(ServiceError::Unavailable(key))?;
        let per_gram = price_per_gram(view.value, view.unit)
            .ok_or_else(|| ServiceError::NotAMetal(metal.to_string()))?;
        let total_usd = per_gram * grams;

        let idr = match currency {
            Currency::Usd => None,
            Currency::Idr => {
                let rate = lookups
                    .get(&QuoteKey::Usdidr)
                    .and_then(Lookup::view)
                    .ok_or(ServiceError::RateUnavailable)?;
                Some(IdrConversion {
                    rate: rate.value,
                    price_per_gram_idr: to_idr(per_gram, rate.value),
                    total_idr: to_idr(total_usd, rate.value),
                    rate_is_fresh: rate.is_fresh,
                })
            }
        };

        Ok(MetalQuote {
            metal: key,
            grams,
            price_usd: view.value,
            unit: view.unit,
            price_per_gram_usd: per_gram,
            total_usd,
            currency,
            idr,
            source: view.source.clone(),
            observed_at: view.observed_at,
            is_fresh: view.is_fresh,
        })
    }

    /// Current USD/IDR rate.
    pub fn exchange_rate(&self) -> Result<RateView, ServiceError> {
        self.read(&[QuoteKey::Usdidr])
            .get(&QuoteKey::Usdidr)
            .and_then(Lookup::view)
            .map(rate_view)
            .ok_or(ServiceError::Unavailable(QuoteKey::Usdidr))
    }

    /// Healthy when at least one metal is cached and nothing cached is stale.
    pub fn health(&self) -> Health {
        let keys: BTreeMap<QuoteKey, Availability> = self
            .read(&QuoteKey::ALL)
            .into_iter()
            .map(|(key, lookup)| (key, lookup.availability()))
            .collect();
        let any_metal = QuoteKey::METALS
            .iter()
            .any(|key| keys.get(key).is_some_and(|a| *a != Availability::Absent));
        let none_stale = keys.values().all(|a| *a != Availability::Stale);
        let status = if any_metal && none_stale {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };
        Health { status, keys }
    }
}

fn rate_view(view: &QuoteView) -> RateView {
    RateView {
        pair: "USDIDR".to_string(),
        rate: view.value,
        source: view.source.clone(),
        observed_at: view.observed_at,
        is_fresh: view.is_fresh,
    }
}
