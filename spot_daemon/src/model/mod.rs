//! Domain models for the extraction daemon.
//!
//! - `state` — per-worker `WorkerState` and the cycle `Phase`s.
//! - `value` — turning located page text into a validated quote value.

pub mod state;
pub mod value;
