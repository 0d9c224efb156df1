//! Authentication failure classification
//!
//! Every failed attempt maps to a classification that drives the worker's
//! retry state machine:
//! - incorrect credential → requested, advance to the next credential
//! - account/service unusable → requested, abort the account
//! - egress point unusable → not requested, abort; the shared pool drops
//!   the point
//! - transport failure → unclassified; logged and swallowed, the worker
//!   keeps retrying

use thiserror::Error;

/// What a worker does with its account after a classified failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Give up on the account.
    Abort,
    /// Move on to the next credential.
    Advance,
}

/// Classification of one failed attempt.
///
/// `requested` is true when the attempt reached the remote service and
/// counts toward request statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub requested: bool,
    pub action: FailureAction,
}

/// Failure raised by an authentication or validation attempt.
///
/// `Custom` lets a transport define additional classified kinds beyond the
/// built-in three. `Transport` is unclassified: the worker logs it and
/// continues its loop.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("incorrect credential")]
    IncorrectCredential,

    #[error("account unusable: {0}")]
    AccountUnusable(String),

    #[error("egress point unusable: {0}")]
    EgressUnusable(String),

    #[error("authentication failed: {detail}")]
    Custom {
        requested: bool,
        action: FailureAction,
        detail: String,
    },

    #[error("transport failure: {0}")]
    Transport(String),
}

impl AuthError {
    /// Classification for this failure, or `None` for unclassified kinds.
    pub fn classification(&self) -> Option<Classification> {
        match self {
            AuthError::IncorrectCredential => Some(Classification {
                requested: true,
                action: FailureAction::Advance,
            }),
            AuthError::AccountUnusable(_) => Some(Classification {
                requested: true,
                action: FailureAction::Abort,
            }),
            AuthError::EgressUnusable(_) => Some(Classification {
                requested: false,
                action: FailureAction::Abort,
            }),
            AuthError::Custom {
                requested, action, ..
            } => Some(Classification {
                requested: *requested,
                action: *action,
            }),
            AuthError::Transport(_) => None,
        }
    }

    /// True when the failure points at the egress path rather than the
    /// account or credential; the shared pool drops the point.
    pub fn is_egress_failure(&self) -> bool {
        matches!(self, AuthError::EgressUnusable(_))
    }
}

/// Result alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;
