//! Per-account retry worker and egress validation worker
//!
//! `AccountWorker` drives one account through candidate credentials over
//! the shared egress cursor until success, a classified abort, exhaustion,
//! or session stop. Resilience rule: one bad attempt never kills the
//! worker — unclassified failures are logged and the loop continues.
//!
//! `EgressValidationWorker` is the throwaway phase 1 task: it checks one
//! egress point and drops it from the shared pool on failure.

use std::sync::Arc;
use std::time::Duration;

use rotauth_core::{
    Account, AccountState, AuthError, AuthService, Credential, EgressPoint, EgressValidator,
    FailureAction,
};
use rotauth_pool::Cursor;
use tracing::{debug, error, warn};

use crate::listener::AccountListener;
use crate::orchestrator::Shared;

/// Retry state machine for one account.
///
/// Runs on the bounded worker pool. The credential cursor is private to
/// this worker; the egress cursor and the shared state are used
/// concurrently by every worker in the session.
pub(crate) struct AccountWorker {
    shared: Arc<Shared>,
    auth: Arc<dyn AuthService>,
    account: Arc<Account>,
    credentials: Cursor<Credential>,
    egress: Arc<Cursor<EgressPoint>>,
    listener: Option<Arc<dyn AccountListener>>,
}

impl AccountWorker {
    pub(crate) fn new(
        shared: Arc<Shared>,
        auth: Arc<dyn AuthService>,
        account: Arc<Account>,
        credentials: Cursor<Credential>,
        egress: Arc<Cursor<EgressPoint>>,
        listener: Option<Arc<dyn AccountListener>>,
    ) -> Self {
        Self {
            shared,
            auth,
            account,
            credentials,
            egress,
            listener,
        }
    }

    pub(crate) async fn run(self) {
        // A session stopped before this worker was scheduled leaves the
        // account in WAITING and fires no callbacks.
        if !self.shared.is_running() {
            return;
        }

        self.account.set_state(AccountState::Started);
        if let Some(listener) = &self.listener {
            listener.started(&self.account);
        }

        // Checker mode holds the account's single fixed credential for the
        // whole loop; otherwise credentials are drawn lazily.
        let checker = self.account.fixed_credential().is_some();
        let mut credential = self.account.fixed_credential().cloned();
        if let (Some(c), Some(listener)) = (&credential, &self.listener) {
            listener.attempting(&self.account, c);
        }

        while self.shared.is_running() {
            let cred = match &credential {
                Some(c) => c.clone(),
                None => match self.credentials.draw().await {
                    Ok(c) => {
                        if let Some(listener) = &self.listener {
                            listener.attempting(&self.account, &c);
                        }
                        credential = Some(c.clone());
                        c
                    }
                    Err(_) => {
                        debug!(
                            username = %self.account.username(),
                            "credential sequence exhausted"
                        );
                        break;
                    }
                },
            };

            let egress = match self.egress.draw().await {
                Ok(e) => e,
                Err(_) => {
                    warn!(
                        username = %self.account.username(),
                        "egress pool exhausted, giving up on account"
                    );
                    break;
                }
            };

            debug!(
                username = %self.account.username(),
                egress = %egress,
                "sending authentication request"
            );

            let failure = match self.auth.authenticate(&self.account, &cred, &egress).await {
                Ok(Some(authenticated)) => {
                    self.shared.tracker.inc_attempts();
                    self.shared.tracker.inc_requests();
                    if let Some(listener) = &self.listener {
                        listener.completed(&self.account, &cred);
                    }
                    self.shared.on_completed(&authenticated);
                    self.account.set_state(AccountState::Finished);
                    return;
                }
                // An answer with no result counts as an incorrect credential.
                Ok(None) => AuthError::IncorrectCredential,
                Err(e) => e,
            };

            let Some(classification) = failure.classification() else {
                error!(
                    username = %self.account.username(),
                    error = %failure,
                    "unexpected failure during attempt"
                );
                continue;
            };

            if classification.requested {
                self.shared.tracker.inc_requests();
                if let Some(listener) = &self.listener {
                    listener.requested(&self.account);
                }
            }

            if failure.is_egress_failure() {
                self.shared.on_egress_failed(&egress).await;
            }

            match classification.action {
                FailureAction::Abort => {
                    self.shared.tracker.inc_attempts();
                    warn!(
                        username = %self.account.username(),
                        error = %failure,
                        "aborting account"
                    );
                    break;
                }
                FailureAction::Advance => {
                    self.account
                        .set_progress(self.credentials.progress().await);
                    if let Some(listener) = &self.listener {
                        listener.tried(&self.account, &cred);
                    }
                    self.shared.tracker.inc_attempts();
                    if checker {
                        // A checker only ever tries its one credential.
                        break;
                    }
                    credential = None;
                }
            }
        }

        if let Some(listener) = &self.listener {
            listener.failed(&self.account);
        }
        self.shared.on_failed(&self.account);
        self.account.set_state(AccountState::Finished);
    }
}

/// One-shot phase 1 task: check a single egress point and drop it from the
/// shared pool on failure.
pub(crate) struct EgressValidationWorker {
    shared: Arc<Shared>,
    validator: Arc<dyn EgressValidator>,
    egress: EgressPoint,
    check_url: String,
    timeout: Duration,
}

impl EgressValidationWorker {
    pub(crate) fn new(
        shared: Arc<Shared>,
        validator: Arc<dyn EgressValidator>,
        egress: EgressPoint,
        check_url: String,
        timeout: Duration,
    ) -> Self {
        Self {
            shared,
            validator,
            egress,
            check_url,
            timeout,
        }
    }

    pub(crate) async fn run(self) {
        if !self.shared.is_running() {
            return;
        }
        match self
            .validator
            .check(&self.egress, &self.check_url, self.timeout)
            .await
        {
            Ok(()) => debug!(egress = %self.egress, "egress point validated"),
            Err(e) => {
                warn!(egress = %self.egress, error = %e, "egress validation failed");
                self.shared.on_egress_failed(&self.egress).await;
            }
        }
    }
}
