//! Account lifecycle state
//!
//! An account is the unit of work a session drives to success or failure.
//! Its state and progress are written only by the worker that owns it and
//! read by the orchestrator's polling loop, so both live behind atomics.
//!
//! State transitions: Waiting → Started → Finished, each at most once.
//! `set_state` is monotonic; a late or repeated set can never move a state
//! backward.

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use crate::credential::Credential;

/// Lifecycle of an account within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccountState {
    /// Worker not yet started.
    Waiting = 0,
    /// Worker running its retry loop.
    Started = 1,
    /// Worker done, successfully or not.
    Finished = 2,
}

impl AccountState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => AccountState::Started,
            2 => AccountState::Finished,
            _ => AccountState::Waiting,
        }
    }

    /// State label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            AccountState::Waiting => "waiting",
            AccountState::Started => "started",
            AccountState::Finished => "finished",
        }
    }
}

/// One logical unit of work: an identity plus its retry bookkeeping.
///
/// Created before the session starts and kept alive for final reporting.
/// `progress` is the last known cursor position through the account's
/// credential sequence, as a fraction in [0, 1].
#[derive(Debug)]
pub struct Account {
    username: String,
    fixed_credential: Option<Credential>,
    state: AtomicU8,
    progress: AtomicU64,
}

impl Account {
    /// An account whose credentials are drawn lazily from a pool.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            fixed_credential: None,
            state: AtomicU8::new(AccountState::Waiting as u8),
            progress: AtomicU64::new(0f64.to_bits()),
        }
    }

    /// Checker mode: exactly one fixed credential, no advancement on failure.
    pub fn checker(username: impl Into<String>, credential: Credential) -> Self {
        Self {
            username: username.into(),
            fixed_credential: Some(credential),
            state: AtomicU8::new(AccountState::Waiting as u8),
            progress: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn fixed_credential(&self) -> Option<&Credential> {
        self.fixed_credential.as_ref()
    }

    pub fn state(&self) -> AccountState {
        AccountState::from_u8(self.state.load(Ordering::Relaxed))
    }

    /// Advance the lifecycle state. Monotonic: an earlier state never
    /// overwrites a later one.
    pub fn set_state(&self, state: AccountState) {
        self.state.fetch_max(state as u8, Ordering::Relaxed);
    }

    /// Last recorded fraction of the credential sequence walked, in [0, 1].
    pub fn progress(&self) -> f64 {
        f64::from_bits(self.progress.load(Ordering::Relaxed))
    }

    pub fn set_progress(&self, fraction: f64) {
        self.progress
            .store(fraction.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }
}

/// A successful authentication result, consumed immediately by result sinks.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub username: String,
    pub credential: Credential,
}
