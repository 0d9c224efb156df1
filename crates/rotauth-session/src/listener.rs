//! Session and account event listeners
//!
//! Explicit capability traits with no-op defaults, passed in at
//! construction (no global event bus). All callbacks are fire-and-forget:
//! implementations must return quickly and must not block the workers.

use rotauth_core::{Account, Credential};

use crate::tracker::Tracker;

/// Session phase reported by `SessionListener::started`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Phase 1: health-checking egress points.
    EgressValidation,
    /// Phase 2: driving accounts through credentials.
    Authentication,
}

/// Observer of session-level progress.
pub trait SessionListener: Send + Sync {
    fn started(&self, _phase: Phase) {}

    /// One status tick: estimated progress in [0, 1], the shared counters,
    /// and the number of egress points still considered usable.
    fn update(&self, _progress: f64, _tracker: &Tracker, _active_egress: usize) {}

    /// The session is over; final counts are authoritative.
    fn completed(&self) {}
}

/// Observer of one account's retry loop.
pub trait AccountListener: Send + Sync {
    fn started(&self, _account: &Account) {}

    /// About to try a credential.
    fn attempting(&self, _account: &Account, _credential: &Credential) {}

    /// A credential was tried and rejected.
    fn tried(&self, _account: &Account, _credential: &Credential) {}

    /// An attempt reached the remote service.
    fn requested(&self, _account: &Account) {}

    /// The account authenticated with this credential.
    fn completed(&self, _account: &Account, _credential: &Credential) {}

    /// The account ran out of options or hit a classified abort.
    fn failed(&self, _account: &Account) {}
}
