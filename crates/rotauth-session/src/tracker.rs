//! Shared session statistics
//!
//! Counters incremented concurrently by all workers and read by the
//! orchestrator's polling loop and objectives. Increments are atomic; the
//! interleaving order across workers is unspecified. Each increment also
//! emits a `metrics` counter, so an embedding process with a recorder
//! installed gets session metrics for free (without one the calls are
//! no-ops).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Monotonic counters for one session, plus the start timestamp.
#[derive(Debug)]
pub struct Tracker {
    attempts: AtomicU64,
    requests: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    total: AtomicU64,
    started_at: Instant,
}

impl Tracker {
    pub fn new() -> Self {
        Self {
            attempts: AtomicU64::new(0),
            requests: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            total: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Set once at session start to the number of accounts.
    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// One credential tried against one account.
    pub fn inc_attempts(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("session_attempts_total").increment(1);
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// One attempt that reached the remote service.
    pub fn inc_requests(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("session_requests_total").increment(1);
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// One account driven to success.
    pub fn inc_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("session_accounts_completed_total").increment(1);
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// One account that ran out of options or hit a classified abort.
    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("session_accounts_failed_total").increment(1);
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Time since the tracker was created.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Point-in-time copy of the counters for logging and listeners.
    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            attempts: self.attempts(),
            requests: self.requests(),
            completed: self.completed(),
            failed: self.failed(),
            total: self.total(),
            elapsed_secs: self.elapsed().as_secs_f64(),
        }
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable view of the counters at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerSnapshot {
    pub attempts: u64,
    pub requests: u64,
    pub completed: u64,
    pub failed: u64,
    pub total: u64,
    pub elapsed_secs: f64,
}
