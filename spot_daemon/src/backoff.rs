//! Linear, capped retry delay.
//!
//! `delay(n) = min(base * n, max)` for `n` consecutive failures. Growth is linear rather
//! than multiplicative so recovery after a long outage is bounded by `max`. A count of
//! zero is treated like one: the first failure after a publish waits exactly `base`.

use std::time::Duration;

use spot_common::config::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    max: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max: max.max(base) }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.base_backoff, settings.max_backoff)
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Delay before the next attempt after `consecutive_failures` failures.
    pub fn delay(&self, consecutive_failures: u32) -> Duration {
        self.base
            .checked_mul(consecutive_failures.max(1))
            .map_or(self.max, |delay| delay.min(self.max))
    }
}
