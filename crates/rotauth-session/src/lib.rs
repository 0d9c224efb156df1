//! Concurrent credential retry session orchestration
//!
//! Coordinates many independent per-account retry workers over shared
//! rotating pools of credentials and egress points, reporting aggregate
//! progress and stopping early when a pluggable objective is met.
//!
//! Session lifecycle:
//! 1. Build a `SessionOrchestrator` with accounts, credentials, and egress
//!    points
//! 2. Register objectives, result sinks, and listeners
//! 3. `run()` — phase 1 validates every egress point through the shared
//!    pool (skipped when no check URL is configured); failures shrink the
//!    pool
//! 4. Phase 2 spawns one `AccountWorker` per account on the bounded worker
//!    pool, all drawing from one shared looped egress cursor
//! 5. The polling loop ticks at the configured interval (at least one
//!    second): progress estimate, listener update, objective evaluation
//! 6. Objective met, `stop()` called, or all workers done → outstanding
//!    handles are aborted and final counts become authoritative

pub mod config;
pub mod error;
pub mod listener;
pub mod objective;
pub mod orchestrator;
pub mod output;
pub mod tracker;
mod worker;

pub use config::SessionConfig;
pub use error::{Error, Result};
pub use listener::{AccountListener, Phase, SessionListener};
pub use objective::{MaxAttempts, MaxCompleted, MaxDuration, Objective};
pub use orchestrator::SessionOrchestrator;
pub use output::{AccountSink, FileSink};
pub use tracker::{Tracker, TrackerSnapshot};
