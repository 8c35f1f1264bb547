//! Periodic detection cycle scheduling.
//!
//! [`DetectionEngine`] runs one cycle: fetch unprocessed events, fetch
//! enabled rules, match each rule against the batch, emit alerts for fired
//! rules, then mark the whole batch processed. [`EngineRunner`] drives the
//! engine from a cron schedule on a single background task, so cycles can
//! never overlap and shutdown always lets an in-flight cycle finish.
//!
//! Tests drive [`DetectionEngine::run_cycle`] directly — no real time
//! needs to pass.

mod cron;
mod engine;
mod runner;


pub use self::cron::normalize_cron;
pub use self::engine::{CycleOutcome, DetectionEngine, RuleFailure};
pub use self::runner::EngineRunner;
