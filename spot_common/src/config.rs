//! Runtime settings and extraction targets.
//!
//! Every tuning scalar the pipeline depends on lives in `Settings`; the daemon fills it
//! from command-line flags and environment variables. Targets describe what each worker
//! extracts: the key, where to fetch it, how to find it on the page and which values are
//! plausible. The built-in targets follow the TradingView symbol pages; a JSON file with
//! the same shape as `TargetConfig` can replace them.

use std::collections::HashSet;
use std::io::Read;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::QuoteError;
use crate::keys::{QuoteKey, Unit};
use crate::result::Result;
use crate::source::{Locator, SourceDescriptor};

/// Interval between successful extractions.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);
/// Navigation timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(15_000);
/// Backoff step per consecutive failure.
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_secs(5);
/// Backoff ceiling.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);
/// Age after which a quote is reported stale.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(60);
/// How long shutdown waits for workers to finish their cycle.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(20);

/// Scalars consumed by workers, supervisor and the read service.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub interval: Duration,
    pub fetch_timeout: Duration,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub freshness_window: Duration,
    pub shutdown_grace: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            base_backoff: DEFAULT_BASE_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(QuoteError::Config("interval must be positive".into()));
        }
        if self.fetch_timeout.is_zero() {
            return Err(QuoteError::Config("fetch timeout must be positive".into()));
        }
        if self.base_backoff.is_zero() {
            return Err(QuoteError::Config("base backoff must be positive".into()));
        }
        if self.max_backoff < self.base_backoff {
            return Err(QuoteError::Config(format!(
                "max backoff {:?} is below base backoff {:?}",
                self.max_backoff, self.base_backoff
            )));
        }
        Ok(())
    }
}

/// Inclusive bounds a value must fall in to be published.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlausibleRange {
    pub min: f64,
    pub max: f64,
}

impl PlausibleRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Everything one worker needs to know about its quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub key: QuoteKey,
    /// Defaults to the key's native unit.
    #[serde(default)]
    pub unit: Option<Unit>,
    #[serde(default = "default_source_name")]
    pub source: String,
    pub url: String,
    pub locators: Vec<Locator>,
    pub range: PlausibleRange,
    /// Digits after an implied decimal point when the page drops the dot.
    #[serde(default)]
    pub implied_decimals: Option<u32>,
}

fn default_source_name() -> String {
    "TradingView".to_string()
}

impl TargetConfig {
    pub fn unit(&self) -> Unit {
        self.unit.unwrap_or_else(|| self.key.default_unit())
    }

    pub fn descriptor(&self) -> SourceDescriptor {
        SourceDescriptor {
            url: self.url.clone(),
            locators: self.locators.clone(),
        }
    }

    fn tradingview(key: QuoteKey, symbol: &str, range: PlausibleRange) -> Self {
        Self {
            key,
            unit: None,
            source: default_source_name(),
            url: format!("https://www.tradingview.com/symbols/{symbol}/"),
            locators: vec![
                Locator::new(r#"data-qa-id="symbol-last-value""#, "</span>"),
                Locator::new(r#"class="last-"#, "</span>"),
            ],
            range,
            implied_decimals: key.is_metal().then_some(2),
        }
    }
}

/// The four built-in targets.
pub fn default_targets() -> Vec<TargetConfig> {
    let metals = PlausibleRange::new(0.01, 50_000.0);
    vec![
        TargetConfig::tradingview(QuoteKey::Gold, "XAUUSD", metals),
        TargetConfig::tradingview(QuoteKey::Silver, "XAGUSD", metals),
        TargetConfig::tradingview(QuoteKey::Copper, "XCUUSD", metals),
        TargetConfig::tradingview(QuoteKey::Usdidr, "USDIDR", PlausibleRange::new(10_000.0, 25_000.0)),
    ]
}

/// Parse a JSON array of targets and check it can be supervised.
pub fn load_targets<R: Read>(reader: R) -> Result<Vec<TargetConfig>> {
    let targets: Vec<TargetConfig> = serde_json::from_reader(reader)?;
    validate_targets(&targets)?;
    Ok(targets)
}

/// One target per key, non-empty locators and markers, and a sane range.
pub fn validate_targets(targets: &[TargetConfig]) -> Result<()> {
    if targets.is_empty() {
        return Err(QuoteError::Config("no targets configured".into()));
    }
    let mut seen = HashSet::new();
    for target in targets {
        if !seen.insert(target.key) {
            return Err(QuoteError::Config(format!(
                "duplicate target for {}: each key has a single writer",
                target.key
            )));
        }
        if target.locators.is_empty() {
            return Err(QuoteError::Config(format!("{} has no locators", target.key)));
        }
        if let Some(locator) = target
            .locators
            .iter()
            .find(|l| l.anchor.trim().is_empty() || l.close.trim().is_empty())
        {
            return Err(QuoteError::Config(format!(
                "{} has a locator with an empty marker: {:?}",
                target.key, locator
            )));
        }
        let PlausibleRange { min, max } = target.range;
        if !(min > 0.0 && min <= max && max.is_finite()) {
            return Err(QuoteError::Config(format!(
                "{} has invalid range [{min}, {max}]",
                target.key
            )));
        }
    }
    Ok(())
}
