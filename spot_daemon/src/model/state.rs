//! Per-worker failure bookkeeping and the cycle phases.
//!
//! A `WorkerState` is created when its worker starts, is mutated only by that worker and
//! is dropped at shutdown. It tracks two things:
//!
//! - `consecutive_failures` — failed cycles since the last publish; it drives the backoff.
//! - `backoff_until` — wall-clock end of the current backoff. The wait itself is done
//!   by the worker's sleeper, so clock adjustments never lengthen it.
//!
//! Time is passed in by the caller so the state can be driven by a manual clock.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use strum_macros::Display;

/// Where a worker is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Fetching,
    Parsing,
    Validating,
    Published,
    Idle,
    Error,
    Backoff,
    Stopped,
}

/// Failure counter and fetch embargo of one worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerState {
    consecutive_failures: u32,
    backoff_until: Option<DateTime<Utc>>,
}

impl WorkerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn backoff_until(&self) -> Option<DateTime<Utc>> {
        self.backoff_until
    }

    /// Record a publish: the counter and the embargo are cleared.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.backoff_until = None;
    }

    /// Record a failed cycle and return the new failure count.
    pub fn record_failure(&mut self) -> u32 {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_failures
    }

    /// Record a backoff of `delay` starting at `now`.
    pub fn embargo(&mut self, now: DateTime<Utc>, delay: Duration) {
        let delay = TimeDelta::from_std(delay).unwrap_or(TimeDelta::MAX);
        self.backoff_until = Some(now.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC));
    }
}
