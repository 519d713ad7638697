//! Extraction worker: keeps one quote fresh in the cache.
//!
//! Each cycle walks `FETCHING -> PARSING -> VALIDATING -> PUBLISHED -> IDLE`. A failure
//! in any of the first three phases goes to `ERROR` and then `BACKOFF`, and the next
//! cycle starts from `FETCHING` again once the delay has passed.
//!
//! - FETCHING — open a fresh session, load the source page within the fetch timeout
//!   and locate the value text.
//! - PARSING — read the located value text as a number.
//! - VALIDATING — reject non-positive and implausible values. A rejected value never
//!   reaches the cache; the previous entry stays authoritative.
//! - PUBLISHED — write the quote and clear the failure counter.
//! - IDLE — the session is released (it is dropped on every exit from the cycle,
//!   including panics), then the worker sleeps for the fixed interval.
//! - BACKOFF — count the failure and sleep `min(base * failures, max)`.
//!
//! Errors never leave the worker. Stop requests are honoured before every cycle and
//! interrupt any sleep.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use spot_common::clock::Clock;
use spot_common::config::{Settings, TargetConfig};
use spot_common::source::SourceDescriptor;
use spot_common::{ExtractError, Quote, QuoteKey, QuoteStore};

use crate::backoff::BackoffPolicy;
use crate::fetch::{Session, SessionFactory};
use crate::model::state::{Phase, WorkerState};
use crate::model::value::{parse_value, validate_value};
use crate::sleep::{Sleeper, Wake};

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Published(Quote),
    Failed(ExtractError),
}

/// Result of one cycle and how long to wait before the next.
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle {
    pub outcome: Outcome,
    pub delay: Duration,
}

/// One worker bound to one key. The only writer of that key.
pub struct Worker {
    target: TargetConfig,
    source: SourceDescriptor,
    store: Arc<dyn QuoteStore>,
    sessions: Arc<dyn SessionFactory>,
    clock: Arc<dyn Clock>,
    sleeper: Box<dyn Sleeper>,
    policy: BackoffPolicy,
    interval: Duration,
    fetch_timeout: Duration,
    state: WorkerState,
    phase: Phase,
}

impl Worker {
    pub fn new(
        target: TargetConfig,
        settings: &Settings,
        store: Arc<dyn QuoteStore>,
        sessions: Arc<dyn SessionFactory>,
        clock: Arc<dyn Clock>,
        sleeper: Box<dyn Sleeper>,
    ) -> Self {
        Self {
            source: target.descriptor(),
            target,
            store,
            sessions,
            clock,
            sleeper,
            policy: BackoffPolicy::from_settings(settings),
            interval: settings.interval,
            fetch_timeout: settings.fetch_timeout,
            state: WorkerState::new(),
            phase: Phase::Idle,
        }
    }

    pub fn key(&self) -> QuoteKey {
        self.target.key
    }

    pub fn state(&self) -> &WorkerState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        debug!("[{}] {} -> {}", self.target.key, self.phase, phase);
        self.phase = phase;
    }

    /// Run cycles until stop is requested.
    pub fn run(mut self) {
        info!("[{}] Worker started -> {}", self.target.key, self.source.url);
        loop {
            if self.sleeper.stop_requested() {
                break;
            }
            // Backoff is served by the sleep inside `step`; `backoff_until` is only recorded.
            if self.step() == Wake::Stopped {
                break;
            }
        }
        self.enter(Phase::Stopped);
        info!("[{}] Worker stopped", self.target.key);
    }

    /// One cycle followed by its idle or backoff sleep.
    pub fn step(&mut self) -> Wake {
        let cycle = self.run_cycle();
        self.sleeper.sleep(cycle.delay)
    }

    /// One fetch/parse/validate/publish cycle, without sleeping.
    ///
    /// Leaves the worker in `Idle` after a publish and in `Backoff` after a failure.
    pub fn run_cycle(&mut self) -> Cycle {
        self.enter(Phase::Fetching);
        let result = match self.sessions.open() {
            Ok(mut session) => {
                let result = self.extract(session.as_mut());
                drop(session);
                result
            }
            Err(err) => Err(ExtractError::Fetch(err)),
        };
        match result {
            Ok(quote) => self.publish(quote),
            Err(err) => self.back_off(err),
        }
    }

    fn extract(&mut self, session: &mut dyn Session) -> Result<Quote, ExtractError> {
        let raw = session.fetch_raw_value(&self.source, self.fetch_timeout)?;

        self.enter(Phase::Parsing);
        let value = parse_value(&raw, self.target.implied_decimals)?;

        self.enter(Phase::Validating);
        let value = validate_value(value, &self.target.range).inspect_err(|err| {
            warn!("[{}] Extracted text {:?} rejected: {}", self.target.key, raw, err);
        })?;

        Ok(Quote {
            key: self.target.key,
            value,
            unit: self.target.unit(),
            source: self.target.source.clone(),
            observed_at: self.clock.now(),
        })
    }

    fn publish(&mut self, quote: Quote) -> Cycle {
        self.store
            .write(quote.key, quote.value, &quote.source, quote.observed_at);
        self.state.record_success();
        self.enter(Phase::Published);
        info!("[{}] {:>12.2} -> cache({})", quote.key, quote.value, quote.key);

        self.enter(Phase::Idle);
        Cycle {
            outcome: Outcome::Published(quote),
            delay: self.interval,
        }
    }

    fn back_off(&mut self, err: ExtractError) -> Cycle {
        self.enter(Phase::Error);
        let failures = self.state.record_failure();
        let delay = self.policy.delay(failures);
        self.state.embargo(self.clock.now(), delay);
        self.enter(Phase::Backoff);
        warn!(
            "[{}] Error (attempt #{}): {} - retrying in {:?}",
            self.target.key, failures, err, delay
        );
        Cycle {
            outcome: Outcome::Failed(err),
            delay,
        }
    }
}
