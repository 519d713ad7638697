mod common;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use common::{ManualTime, ScriptedSessions, Step, noon, price_page, target, usdidr_target};
use spot_common::config::Settings;
use spot_common::{
    ExtractError, FetchError, MemoryCache, ParseError, QuoteKey, QuoteStore, ValidationError,
};
use spot_daemon::fetch::SessionFactory;
use spot_daemon::model::state::Phase;
use spot_daemon::sleep::Wake;
use spot_daemon::worker::{Outcome, Worker};

fn timeout() -> FetchError {
    FetchError::Timeout {
        url: "https://example.test/USDIDR".to_string(),
    }
}

fn worker_with(
    sessions: &Arc<ScriptedSessions>,
    cache: &Arc<MemoryCache>,
    time: &Arc<ManualTime>,
) -> Worker {
    let sessions: Arc<dyn SessionFactory> = sessions.clone();
    Worker::new(
        usdidr_target(),
        &Settings::default(),
        cache.clone(),
        sessions,
        time.clone(),
        time.sleeper(),
    )
}

#[test]
fn recovers_after_three_failures() {
    let sessions = ScriptedSessions::new([
        Step::NavigationFails(timeout()),
        Step::Body("<html>under maintenance</html>".to_string()),
        Step::Body(price_page("9,500.00")),
        Step::Body(price_page("16,250.00")),
    ]);
    let cache = Arc::new(MemoryCache::new());
    let time = ManualTime::new(noon());
    let mut worker = worker_with(&sessions, &cache, &time);

    let first = worker.run_cycle();
    assert_eq!(first.outcome, Outcome::Failed(ExtractError::Fetch(timeout())));
    assert_eq!(worker.state().consecutive_failures(), 1);
    assert_eq!(first.delay, Duration::from_secs(5));

    let second = worker.run_cycle();
    assert_eq!(
        second.outcome,
        Outcome::Failed(ExtractError::Parse(ParseError::ContentMissing))
    );
    assert_eq!(worker.state().consecutive_failures(), 2);
    assert_eq!(second.delay, Duration::from_secs(10));

    let third = worker.run_cycle();
    assert!(matches!(
        third.outcome,
        Outcome::Failed(ExtractError::Validation(ValidationError::OutOfRange { .. }))
    ));
    assert_eq!(worker.state().consecutive_failures(), 3);
    assert_eq!(third.delay, Duration::from_secs(15));
    assert_eq!(worker.phase(), Phase::Backoff);
    assert!(cache.read_one(QuoteKey::Usdidr).is_none());

    let fourth = worker.run_cycle();
    assert!(matches!(fourth.outcome, Outcome::Published(_)));
    assert_eq!(worker.state().consecutive_failures(), 0);
    assert_eq!(worker.state().backoff_until(), None);
    assert_eq!(fourth.delay, Duration::from_secs(3));
    assert_eq!(worker.phase(), Phase::Idle);

    let entry = cache.read_one(QuoteKey::Usdidr).unwrap();
    assert_eq!(entry.value, 16_250.0);
    assert_eq!(entry.source, "TradingView");
    assert_eq!(entry.observed_at, noon());

    assert_eq!(sessions.opened_sessions(), 4);
    assert_eq!(sessions.open_sessions(), 0);
}

#[test]
fn rejected_values_keep_the_previous_entry() {
    let sessions = ScriptedSessions::new([
        Step::Body(price_page("16,250.00")),
        Step::Body(price_page("0")),
        Step::Body(price_page("-16,250.00")),
        Step::Body(price_page("30,000.00")),
    ]);
    let cache = Arc::new(MemoryCache::new());
    let time = ManualTime::new(noon());
    let mut worker = worker_with(&sessions, &cache, &time);

    assert!(matches!(worker.run_cycle().outcome, Outcome::Published(_)));
    let published = cache.read_one(QuoteKey::Usdidr).unwrap();

    for _ in 0..3 {
        let cycle = worker.run_cycle();
        assert!(matches!(
            cycle.outcome,
            Outcome::Failed(ExtractError::Validation(_))
        ));
        assert_eq!(cache.read_one(QuoteKey::Usdidr), Some(published.clone()));
    }
    assert_eq!(worker.state().consecutive_failures(), 3);
}

#[test]
fn success_resets_backoff_to_base() {
    let sessions = ScriptedSessions::new([
        Step::NavigationFails(timeout()),
        Step::NavigationFails(timeout()),
        Step::Body(price_page("16,250.00")),
        Step::NavigationFails(timeout()),
    ]);
    let cache = Arc::new(MemoryCache::new());
    let time = ManualTime::new(noon());
    let mut worker = worker_with(&sessions, &cache, &time);

    let delays: Vec<_> = (0..4).map(|_| worker.run_cycle().delay).collect();
    assert_eq!(
        delays,
        vec![
            Duration::from_secs(5),
            Duration::from_secs(10),
            Duration::from_secs(3),
            Duration::from_secs(5),
        ]
    );
}

#[test]
fn backoff_is_capped() {
    let sessions = ScriptedSessions::new(std::iter::repeat_n(Step::NavigationFails(timeout()), 15));
    let cache = Arc::new(MemoryCache::new());
    let time = ManualTime::new(noon());
    let mut worker = worker_with(&sessions, &cache, &time);

    let delays: Vec<_> = (0..15).map(|_| worker.run_cycle().delay).collect();
    assert_eq!(delays[11], Duration::from_secs(60));
    assert_eq!(delays[14], Duration::from_secs(60));
    assert_eq!(worker.state().consecutive_failures(), 15);
}

#[test]
fn failure_sets_fetch_embargo() {
    let sessions = ScriptedSessions::new([Step::NavigationFails(timeout())]);
    let cache = Arc::new(MemoryCache::new());
    let time = ManualTime::new(noon());
    let mut worker = worker_with(&sessions, &cache, &time);

    worker.run_cycle();
    assert_eq!(
        worker.state().backoff_until(),
        Some(noon() + TimeDelta::seconds(5))
    );
}

#[test]
fn session_open_failure_backs_off_then_recovers() {
    let sessions = ScriptedSessions::new([
        Step::OpenFails("browser failed to launch".to_string()),
        Step::Body(price_page("16,250.00")),
    ]);
    let cache = Arc::new(MemoryCache::new());
    let time = ManualTime::new(noon());
    let mut worker = worker_with(&sessions, &cache, &time);

    let failed = worker.run_cycle();
    assert_eq!(
        failed.outcome,
        Outcome::Failed(ExtractError::Fetch(FetchError::Session(
            "browser failed to launch".to_string()
        )))
    );
    assert_eq!(worker.state().consecutive_failures(), 1);

    assert!(matches!(worker.run_cycle().outcome, Outcome::Published(_)));
    assert_eq!(sessions.opened_sessions(), 1);
    assert_eq!(sessions.open_sessions(), 0);
}

#[test]
fn session_is_released_when_a_cycle_panics() {
    let sessions = ScriptedSessions::new([Step::Panics]);
    let cache = Arc::new(MemoryCache::new());
    let time = ManualTime::new(noon());
    let mut worker = worker_with(&sessions, &cache, &time);

    let result = panic::catch_unwind(AssertUnwindSafe(|| worker.run_cycle()));
    assert!(result.is_err());
    assert_eq!(sessions.opened_sessions(), 1);
    assert_eq!(sessions.open_sessions(), 0);
    assert!(cache.is_empty());
}

#[test]
fn implied_decimals_are_applied() {
    let sessions = ScriptedSessions::new([Step::Body(price_page("293550"))]);
    let cache = Arc::new(MemoryCache::new());
    let time = ManualTime::new(noon());
    let mut gold = target(QuoteKey::Gold, "https://example.test/XAUUSD", 0.01, 50_000.0);
    gold.implied_decimals = Some(2);
    let factory: Arc<dyn SessionFactory> = sessions.clone();
    let mut worker = Worker::new(
        gold,
        &Settings::default(),
        cache.clone(),
        factory,
        time.clone(),
        time.sleeper(),
    );

    assert!(matches!(worker.run_cycle().outcome, Outcome::Published(_)));
    assert_eq!(cache.read_one(QuoteKey::Gold).unwrap().value, 2_935.5);
}

#[test]
fn step_sleeps_for_the_cycle_delay() {
    let sessions = ScriptedSessions::new([
        Step::NavigationFails(timeout()),
        Step::Body(price_page("16,250.00")),
    ]);
    let cache = Arc::new(MemoryCache::new());
    let time = ManualTime::new(noon());
    let mut worker = worker_with(&sessions, &cache, &time);

    assert_eq!(worker.step(), Wake::Elapsed);
    assert_eq!(worker.step(), Wake::Elapsed);
    assert_eq!(
        time.sleeps(),
        vec![Duration::from_secs(5), Duration::from_secs(3)]
    );
    assert_eq!(
        cache.read_one(QuoteKey::Usdidr).unwrap().observed_at,
        noon() + TimeDelta::seconds(5)
    );
}

#[test]
fn run_loop_stops_on_request() {
    let sessions = ScriptedSessions::new([
        Step::NavigationFails(timeout()),
        Step::NavigationFails(timeout()),
        Step::Body(price_page("16,250.00")),
        Step::Body(price_page("16,300.00")),
    ]);
    let cache = Arc::new(MemoryCache::new());
    let time = ManualTime::stopping_after(noon(), 4);
    let worker = worker_with(&sessions, &cache, &time);

    worker.run();

    assert_eq!(
        time.sleeps(),
        vec![
            Duration::from_secs(5),
            Duration::from_secs(10),
            Duration::from_secs(3),
            Duration::from_secs(3),
        ]
    );
    let entry = cache.read_one(QuoteKey::Usdidr).unwrap();
    assert_eq!(entry.value, 16_300.0);
    assert_eq!(entry.observed_at, noon() + TimeDelta::seconds(18));
    assert_eq!(sessions.opened_sessions(), 4);
    assert_eq!(sessions.open_sessions(), 0);
}

#[test]
fn clock_stepping_back_does_not_stretch_backoff() {
    let sessions = ScriptedSessions::new([
        Step::NavigationFails(timeout()),
        Step::Body(price_page("16,250.00")),
        Step::Body(price_page("16,300.00")),
    ]);
    let cache = Arc::new(MemoryCache::new());
    let time = ManualTime::stopping_after(noon(), 3);
    time.jump_on_next_sleep(TimeDelta::hours(-1));
    let worker = worker_with(&sessions, &cache, &time);

    worker.run();

    assert_eq!(
        time.sleeps(),
        vec![
            Duration::from_secs(5),
            Duration::from_secs(3),
            Duration::from_secs(3),
        ]
    );
    let entry = cache.read_one(QuoteKey::Usdidr).unwrap();
    assert_eq!(entry.value, 16_300.0);
    assert_eq!(entry.observed_at, noon() - TimeDelta::hours(1) + TimeDelta::seconds(3));
}
