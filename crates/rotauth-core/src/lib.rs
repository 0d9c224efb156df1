//! Domain types and collaborator contracts for rotauth sessions
//!
//! A session drives each account through a sequence of candidate credentials
//! over rotating egress points until success, exhaustion, or a classified
//! unrecoverable failure. This crate defines those domain types, the failure
//! classification model that drives the retry state machine, and the traits
//! the session core calls across its boundary (authentication transport,
//! egress validation).
//!
//! Failure classification in one line: `requested` says whether the attempt
//! reached the remote service (counts toward request statistics), the action
//! says whether the worker gives up on the account (`Abort`) or moves to the
//! next credential (`Advance`). Unclassified transport failures carry neither
//! and are swallowed by the worker.

pub mod account;
pub mod credential;
pub mod egress;
pub mod error;
pub mod service;

pub use account::{Account, AccountState, AuthenticatedAccount};
pub use credential::Credential;
pub use egress::EgressPoint;
pub use error::{AuthError, Classification, FailureAction, Result};
pub use service::{AuthService, BoxFuture, EgressValidator, HttpEgressValidator};
