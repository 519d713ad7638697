//! Extraction daemon internals.
//!
//! - `worker` — the per-key fetch/parse/validate/publish state machine.
//! - `supervisor` — starts and stops the fixed set of workers.
//! - `backoff` — linear, capped retry delay.
//! - `sleep` — cancellable sleeping and the shared stop signal.
//! - `fetch` — per-cycle fetch sessions.
//! - `model` — worker state and value parsing/validation.
//! - `receiver` — TCP query endpoint over the read service.
pub mod args;
pub mod backoff;
pub mod fetch;
pub mod model;
pub mod receiver;
pub mod sleep;
pub mod supervisor;
pub mod worker;
