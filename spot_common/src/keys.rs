//! Tracked quote keys, units and currencies shared between daemon and client.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::convert::{POUND_GRAMS, TROY_OUNCE_GRAMS};

/// Stable identifier of one tracked quote; also its cache key.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lower")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum QuoteKey {
    /// Gold spot, USD per troy ounce.
    Gold,
    /// Silver spot, USD per troy ounce.
    Silver,
    /// Copper, USD per pound.
    Copper,
    /// US dollar to Indonesian rupiah.
    Usdidr,
}

impl QuoteKey {
    /// Every tracked key, metals first.
    pub const ALL: [QuoteKey; 4] = [
        QuoteKey::Gold,
        QuoteKey::Silver,
        QuoteKey::Copper,
        QuoteKey::Usdidr,
    ];

    /// Keys priced per unit of weight.
    pub const METALS: [QuoteKey; 3] = [QuoteKey::Gold, QuoteKey::Silver, QuoteKey::Copper];

    pub fn is_metal(self) -> bool {
        !matches!(self, QuoteKey::Usdidr)
    }

    /// Native unit the source quotes this key in.
    pub fn default_unit(self) -> Unit {
        match self {
            QuoteKey::Gold | QuoteKey::Silver => Unit::PerTroyOunce,
            QuoteKey::Copper => Unit::PerPound,
            QuoteKey::Usdidr => Unit::Rate,
        }
    }

    /// Resolve a metal name coming from a request, rejecting the FX key.
    pub fn metal(name: &str) -> Option<QuoteKey> {
        name.trim()
            .parse::<QuoteKey>()
            .ok()
            .filter(|key| key.is_metal())
    }
}

/// Native unit of a quote value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Unit {
    PerTroyOunce,
    PerPound,
    /// Dimensionless exchange rate.
    Rate,
}

impl Unit {
    /// Grams in one unit, `None` for rates.
    pub fn grams(self) -> Option<f64> {
        match self {
            Unit::PerTroyOunce => Some(TROY_OUNCE_GRAMS),
            Unit::PerPound => Some(POUND_GRAMS),
            Unit::Rate => None,
        }
    }
}

/// Output currency for converted prices.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, Display, EnumString, Eq, PartialEq,
)]
#[serde(rename_all = "UPPERCASE")]
#[clap(rename_all = "lower")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Currency {
    #[default]
    Usd,
    Idr,
}
