#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use spot_common::FetchError;
use spot_common::clock::Clock;
use spot_common::config::{PlausibleRange, TargetConfig};
use spot_common::source::Locator;
use spot_common::QuoteKey;
use spot_daemon::fetch::{Page, Session, SessionFactory};
use spot_daemon::sleep::{Sleeper, Wake};

pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

pub fn price_page(text: &str) -> String {
    format!(
        r#"<html><body><span class="last-x" data-qa-id="symbol-last-value">{text}</span></body></html>"#
    )
}

pub fn target(key: QuoteKey, url: &str, min: f64, max: f64) -> TargetConfig {
    TargetConfig {
        key,
        unit: None,
        source: "TradingView".to_string(),
        url: url.to_string(),
        locators: vec![Locator::new(r#"data-qa-id="symbol-last-value""#, "</span>")],
        range: PlausibleRange::new(min, max),
        implied_decimals: None,
    }
}

pub fn usdidr_target() -> TargetConfig {
    target(QuoteKey::Usdidr, "https://example.test/USDIDR", 10_000.0, 25_000.0)
}

/// Clock and sleeper in one: sleeping advances the clock instantly.
#[derive(Debug)]
pub struct ManualTime {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
    max_sleeps: Option<usize>,
    jump: Mutex<Option<TimeDelta>>,
}

impl ManualTime {
    pub fn new(start: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
            max_sleeps: None,
            jump: Mutex::new(None),
        })
    }

    /// Report `Stopped` once `max_sleeps` sleeps have happened.
    pub fn stopping_after(start: DateTime<Utc>, max_sleeps: usize) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
            max_sleeps: Some(max_sleeps),
            jump: Mutex::new(None),
        })
    }

    /// Shift the clock by `delta` (instead of advancing it) during the next sleep.
    pub fn jump_on_next_sleep(&self, delta: TimeDelta) {
        *self.jump.lock().unwrap() = Some(delta);
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn sleeper(self: &Arc<Self>) -> Box<dyn Sleeper> {
        Box::new(ManualSleeper(Arc::clone(self)))
    }
}

impl Clock for ManualTime {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

struct ManualSleeper(Arc<ManualTime>);

impl Sleeper for ManualSleeper {
    fn sleep(&self, duration: Duration) -> Wake {
        {
            let mut now = self.0.now.lock().unwrap();
            let delta = self
                .0
                .jump
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| TimeDelta::from_std(duration).unwrap());
            *now = *now + delta;
        }
        let mut sleeps = self.0.sleeps.lock().unwrap();
        sleeps.push(duration);
        match self.0.max_sleeps {
            Some(max) if sleeps.len() >= max => Wake::Stopped,
            _ => Wake::Elapsed,
        }
    }

    fn stop_requested(&self) -> bool {
        self.0
            .max_sleeps
            .is_some_and(|max| self.0.sleeps.lock().unwrap().len() >= max)
    }
}

/// What the next opened session does.
#[derive(Debug, Clone)]
pub enum Step {
    Body(String),
    NavigationFails(FetchError),
    OpenFails(String),
    Panics,
}

/// Hands out sessions following a script and counts the ones still open.
#[derive(Debug, Default)]
pub struct ScriptedSessions {
    script: Mutex<VecDeque<Step>>,
    open: Arc<AtomicUsize>,
    opened: AtomicUsize,
}

impl ScriptedSessions {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into_iter().collect()),
            ..Self::default()
        })
    }

    pub fn open_sessions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn opened_sessions(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl SessionFactory for ScriptedSessions {
    fn open(&self) -> Result<Box<dyn Session>, FetchError> {
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Step::NavigationFails(FetchError::Transport("script exhausted".into())));
        if let Step::OpenFails(reason) = step {
            return Err(FetchError::Session(reason));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountedSession::new(Arc::clone(&self.open), Behaviour::Scripted(step))))
    }
}

/// Serves a fixed body per URL forever; URLs without a body time out.
#[derive(Debug, Default)]
pub struct StaticSessions {
    pages: HashMap<String, String>,
    open: Arc<AtomicUsize>,
    stall: Option<(String, Duration)>,
}

impl StaticSessions {
    pub fn new(pages: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            pages: pages.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Navigation to `url` blocks for `delay` before answering.
    pub fn stalling(mut self, url: &str, delay: Duration) -> Self {
        self.stall = Some((url.to_string(), delay));
        self
    }

    pub fn open_sessions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

impl SessionFactory for StaticSessions {
    fn open(&self) -> Result<Box<dyn Session>, FetchError> {
        Ok(Box::new(CountedSession::new(
            Arc::clone(&self.open),
            Behaviour::Static(self.pages.clone(), self.stall.clone()),
        )))
    }
}

enum Behaviour {
    Scripted(Step),
    Static(HashMap<String, String>, Option<(String, Duration)>),
}

struct CountedSession {
    open: Arc<AtomicUsize>,
    behaviour: Behaviour,
}

impl CountedSession {
    fn new(open: Arc<AtomicUsize>, behaviour: Behaviour) -> Self {
        open.fetch_add(1, Ordering::SeqCst);
        Self { open, behaviour }
    }
}

impl Session for CountedSession {
    fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<Page, FetchError> {
        let body = match &self.behaviour {
            Behaviour::Scripted(Step::Body(body)) => Ok(body.clone()),
            Behaviour::Scripted(Step::NavigationFails(err)) => Err(err.clone()),
            Behaviour::Scripted(Step::OpenFails(reason)) => Err(FetchError::Session(reason.clone())),
            Behaviour::Scripted(Step::Panics) => panic!("renderer crashed"),
            Behaviour::Static(pages, stall) => {
                if let Some((stall_url, delay)) = stall {
                    if stall_url == url {
                        thread::sleep(*delay);
                    }
                }
                pages.get(url).cloned().ok_or_else(|| FetchError::Timeout {
                    url: url.to_string(),
                })
            }
        }?;
        Ok(Page {
            url: url.to_string(),
            body,
        })
    }
}

impl Drop for CountedSession {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}
