//! Two-phase session orchestration
//!
//! Phase 1 validates every egress point through the shared pool; failures
//! shrink the pool before any account work starts. Phase 2 spawns one
//! retry worker per account, all drawing from one shared looped egress
//! cursor. Both phases poll at the configured tick, report to the session
//! listener, and stop cooperatively when an objective is met or `stop()`
//! is called. After the polling loop exits, outstanding task handles are
//! aborted; a worker mid-attempt notices at its next cooperative check or
//! is abandoned.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rotauth_core::{
    Account, AccountState, AuthService, AuthenticatedAccount, Credential, EgressPoint,
    EgressValidator,
};
use rotauth_pool::{Cursor, RotatingPool};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::listener::{AccountListener, Phase, SessionListener};
use crate::objective::Objective;
use crate::output::AccountSink;
use crate::tracker::Tracker;
use crate::worker::{AccountWorker, EgressValidationWorker};

/// Cross-worker shared state: the statistics sink, the shared egress pool,
/// result sinks, and the cooperative running flag. These are the only
/// pieces of mutable state shared between workers.
pub(crate) struct Shared {
    pub(crate) tracker: Arc<Tracker>,
    pub(crate) egress: Arc<RotatingPool<EgressPoint>>,
    pub(crate) sinks: Vec<Arc<dyn AccountSink>>,
    pub(crate) running: Arc<AtomicBool>,
}

impl Shared {
    pub(crate) fn new(
        tracker: Arc<Tracker>,
        egress: Arc<RotatingPool<EgressPoint>>,
        sinks: Vec<Arc<dyn AccountSink>>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            tracker,
            egress,
            sinks,
            running,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Success callback: persist to every sink and count the completion.
    /// Persistence failures are logged and never roll back the success.
    pub(crate) fn on_completed(&self, account: &AuthenticatedAccount) {
        info!(username = %account.username, "account successfully authenticated");
        for sink in &self.sinks {
            if let Err(e) = sink.save(account) {
                warn!(username = %account.username, error = %e, "failed to persist result");
            }
        }
        self.tracker.inc_completed();
    }

    /// Failure callback: the account ran out of credentials or egress
    /// points, or a classified failure aborted it.
    pub(crate) fn on_failed(&self, account: &Account) {
        debug!(username = %account.username(), "account failed");
        self.tracker.inc_failed();
    }

    /// Egress failure callback: drop the point from the shared pool so no
    /// later draw selects it. Attempts already in flight may still finish.
    pub(crate) async fn on_egress_failed(&self, egress: &EgressPoint) {
        if self.egress.remove(egress).await {
            warn!(egress = %egress, "egress point removed from pool");
        }
    }
}

/// Owns the worker pool and runs the two-phase session.
pub struct SessionOrchestrator {
    config: SessionConfig,
    auth: Arc<dyn AuthService>,
    validator: Option<Arc<dyn EgressValidator>>,
    accounts: Vec<Arc<Account>>,
    credentials: Arc<RotatingPool<Credential>>,
    egress: Arc<RotatingPool<EgressPoint>>,
    objectives: Vec<Box<dyn Objective>>,
    sinks: Vec<Arc<dyn AccountSink>>,
    listener: Option<Arc<dyn SessionListener>>,
    account_listener: Option<Arc<dyn AccountListener>>,
    tracker: Arc<Tracker>,
    running: Arc<AtomicBool>,
}

impl SessionOrchestrator {
    pub fn new(
        config: SessionConfig,
        auth: Arc<dyn AuthService>,
        accounts: Vec<Arc<Account>>,
        credentials: Vec<Credential>,
        egress: Vec<EgressPoint>,
    ) -> Self {
        Self {
            config,
            auth,
            validator: None,
            accounts,
            credentials: Arc::new(RotatingPool::new(credentials)),
            egress: Arc::new(RotatingPool::new(egress)),
            objectives: Vec::new(),
            sinks: Vec::new(),
            listener: None,
            account_listener: None,
            tracker: Arc::new(Tracker::new()),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Egress validator for phase 1. Without one (or without a configured
    /// check URL) the validation phase is skipped.
    pub fn set_validator(&mut self, validator: Arc<dyn EgressValidator>) {
        self.validator = Some(validator);
    }

    /// Register a stopping condition; any one satisfied objective ends the
    /// session.
    pub fn add_objective(&mut self, objective: Box<dyn Objective>) {
        self.objectives.push(objective);
    }

    /// Register a persistence target for successful authentications.
    pub fn add_sink(&mut self, sink: Arc<dyn AccountSink>) {
        self.sinks.push(sink);
    }

    pub fn set_listener(&mut self, listener: Arc<dyn SessionListener>) {
        self.listener = Some(listener);
    }

    pub fn set_account_listener(&mut self, listener: Arc<dyn AccountListener>) {
        self.account_listener = Some(listener);
    }

    /// Shared statistics. Counts are authoritative only after `run()`
    /// returns.
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// The shared egress pool (shrinks as points fail validation or
    /// classified connectivity checks).
    pub fn egress(&self) -> &Arc<RotatingPool<EgressPoint>> {
        &self.egress
    }

    /// Request cooperative shutdown. Observed by both phases' polling
    /// loops and by workers between attempts; an in-flight attempt is not
    /// interrupted.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Run the session to completion: validate egress points, drive every
    /// account, poll progress and objectives, then cancel stragglers.
    /// Blocks until the session is finished.
    pub async fn run(&self) {
        self.tracker.set_total(self.accounts.len() as u64);
        let shared = Arc::new(Shared::new(
            self.tracker.clone(),
            self.egress.clone(),
            self.sinks.clone(),
            self.running.clone(),
        ));
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));

        if let (Some(validator), Some(check_url)) =
            (self.validator.clone(), self.config.check_url.clone())
        {
            self.run_validation_phase(&shared, &semaphore, validator, check_url)
                .await;
        }

        self.run_authentication_phase(&shared, &semaphore).await;

        self.running.store(false, Ordering::Relaxed);
        if let Some(listener) = &self.listener {
            listener.completed();
        }

        let snapshot = self.tracker.snapshot();
        info!(
            elapsed_secs = format!("{:.1}", snapshot.elapsed_secs),
            requests = snapshot.requests,
            attempts = snapshot.attempts,
            completed = snapshot.completed,
            failed = snapshot.failed,
            "session complete"
        );
    }

    /// Phase 1: submit one validation worker per egress point and wait,
    /// reporting pool shrinkage on every tick.
    async fn run_validation_phase(
        &self,
        shared: &Arc<Shared>,
        semaphore: &Arc<Semaphore>,
        validator: Arc<dyn EgressValidator>,
        check_url: String,
    ) {
        if let Some(listener) = &self.listener {
            listener.started(Phase::EgressValidation);
        }
        info!(url = %check_url, "validating egress points");
        let phase_start = Instant::now();

        let mut handles = Vec::new();
        for egress in self.egress.snapshot().await {
            let worker = EgressValidationWorker::new(
                shared.clone(),
                validator.clone(),
                egress,
                check_url.clone(),
                self.config.egress_timeout(),
            );
            let semaphore = semaphore.clone();
            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };
                worker.run().await;
            }));
        }

        let original = handles.len().max(1);
        loop {
            handles.retain(|handle: &JoinHandle<()>| !handle.is_finished());
            if !self.is_running() || handles.is_empty() {
                break;
            }
            let progress = 1.0 - handles.len() as f64 / original as f64;
            if let Some(listener) = &self.listener {
                listener.update(progress, &self.tracker, self.egress.len().await);
            }
            info!(
                progress_pct = (progress * 100.0) as u32,
                "egress validation in progress"
            );
            tokio::time::sleep(self.config.poll_interval()).await;
        }
        for handle in handles {
            handle.abort();
        }

        info!(
            elapsed_ms = phase_start.elapsed().as_millis() as u64,
            available = self.egress.len().await,
            "egress validation complete"
        );
    }

    /// Phase 2: one worker per account over the shared egress cursor, then
    /// the polling loop — aggregate progress, listener update, objective
    /// evaluation — until the session finishes or is stopped.
    async fn run_authentication_phase(&self, shared: &Arc<Shared>, semaphore: &Arc<Semaphore>) {
        if let Some(listener) = &self.listener {
            listener.started(Phase::Authentication);
        }
        info!(
            accounts = self.accounts.len(),
            egress = self.egress.len().await,
            "starting authentication phase"
        );

        let egress_cursor = Arc::new(Cursor::looped(self.egress.clone()));
        let mut handles = Vec::new();
        for account in &self.accounts {
            let worker = AccountWorker::new(
                shared.clone(),
                self.auth.clone(),
                account.clone(),
                Cursor::linear(self.credentials.clone()),
                egress_cursor.clone(),
                self.account_listener.clone(),
            );
            let semaphore = semaphore.clone();
            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };
                worker.run().await;
            }));
        }

        loop {
            handles.retain(|handle: &JoinHandle<()>| !handle.is_finished());
            if !self.is_running() {
                break;
            }

            // Aggregate progress: mean over accounts that have started.
            // Accounts still WAITING are excluded, and completed accounts
            // keep their last cursor position, so this is a sampled
            // estimate, not an exact figure.
            let mut sum = 0.0;
            let mut started = 0usize;
            for account in &self.accounts {
                if account.state() == AccountState::Waiting {
                    continue;
                }
                sum += account.progress();
                started += 1;
            }
            let progress = if started > 0 {
                sum / started as f64
            } else {
                0.0
            };

            let active_egress = self
                .egress
                .len()
                .await
                .saturating_sub(self.auth.unavailable_egress());
            if let Some(listener) = &self.listener {
                listener.update(progress, &self.tracker, active_egress);
            }

            let snapshot = self.tracker.snapshot();
            info!(
                progress_pct = (progress * 100.0) as u32,
                attempts = snapshot.attempts,
                requests = snapshot.requests,
                completed = snapshot.completed,
                failed = snapshot.failed,
                active_egress,
                "session progress"
            );

            if let Some(objective) = self
                .objectives
                .iter()
                .find(|objective| objective.check(&self.tracker))
            {
                info!(objective = %objective.describe(), "objective met, ending session");
                break;
            }

            if handles.is_empty() {
                break;
            }
            tokio::time::sleep(self.config.poll_interval()).await;
        }

        for handle in handles {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::MaxAttempts;
    use rotauth_core::{AuthError, BoxFuture};
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("info")
            .with_test_writer()
            .try_init();
    }

    /// Succeeds only for one specific credential value.
    struct PasswordAuth {
        correct: &'static str,
    }

    impl AuthService for PasswordAuth {
        fn authenticate<'a>(
            &'a self,
            account: &'a Account,
            credential: &'a Credential,
            _egress: &'a EgressPoint,
        ) -> BoxFuture<'a, rotauth_core::Result<Option<AuthenticatedAccount>>> {
            let result = if credential.expose() == self.correct {
                Ok(Some(AuthenticatedAccount {
                    username: account.username().to_string(),
                    credential: credential.clone(),
                }))
            } else {
                Err(AuthError::IncorrectCredential)
            };
            Box::pin(async move { result })
        }
    }

    /// Hangs long enough to be cancelled by the orchestrator.
    struct SlowAuth;

    impl AuthService for SlowAuth {
        fn authenticate<'a>(
            &'a self,
            _account: &'a Account,
            _credential: &'a Credential,
            _egress: &'a EgressPoint,
        ) -> BoxFuture<'a, rotauth_core::Result<Option<AuthenticatedAccount>>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(None)
            })
        }
    }

    /// Fails validation for URLs containing "bad".
    struct MarkedValidator;

    impl EgressValidator for MarkedValidator {
        fn check<'a>(
            &'a self,
            egress: &'a EgressPoint,
            _check_url: &'a str,
            _timeout: Duration,
        ) -> BoxFuture<'a, rotauth_core::Result<()>> {
            let bad = egress.url().contains("bad");
            Box::pin(async move {
                if bad {
                    Err(AuthError::EgressUnusable("marked bad".into()))
                } else {
                    Ok(())
                }
            })
        }
    }

    /// Counts session listener callbacks.
    #[derive(Default)]
    struct CountingListener {
        started: AtomicUsize,
        updates: AtomicUsize,
        completed: AtomicUsize,
    }

    impl SessionListener for CountingListener {
        fn started(&self, _phase: Phase) {
            self.started.fetch_add(1, Ordering::Relaxed);
        }
        fn update(&self, _progress: f64, _tracker: &Tracker, _active_egress: usize) {
            self.updates.fetch_add(1, Ordering::Relaxed);
        }
        fn completed(&self) {
            self.completed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Collects saved results in memory.
    #[derive(Default)]
    struct VecSink {
        saved: Mutex<Vec<String>>,
    }

    impl AccountSink for VecSink {
        fn save(&self, account: &AuthenticatedAccount) -> std::io::Result<()> {
            self.saved.lock().unwrap().push(format!(
                "{}:{}",
                account.username,
                account.credential.expose()
            ));
            Ok(())
        }
    }

    fn credentials(values: &[&str]) -> Vec<Credential> {
        values.iter().copied().map(Credential::new).collect()
    }

    fn egress_points(urls: &[&str]) -> Vec<EgressPoint> {
        urls.iter().copied().map(EgressPoint::new).collect()
    }

    #[tokio::test]
    async fn single_account_succeeds_on_third_credential() {
        init_tracing();
        let account = Arc::new(Account::new("alice"));
        let mut orchestrator = SessionOrchestrator::new(
            SessionConfig::default(),
            Arc::new(PasswordAuth { correct: "c3" }),
            vec![account.clone()],
            credentials(&["c1", "c2", "c3"]),
            egress_points(&["http://p1:8080", "http://p2:8080"]),
        );
        let sink = Arc::new(VecSink::default());
        orchestrator.add_sink(sink.clone());
        let listener = Arc::new(CountingListener::default());
        orchestrator.set_listener(listener.clone());

        orchestrator.run().await;

        let tracker = orchestrator.tracker();
        assert_eq!(tracker.attempts(), 3);
        assert_eq!(tracker.requests(), 3);
        assert_eq!(tracker.completed(), 1);
        assert_eq!(tracker.failed(), 0);
        assert_eq!(tracker.total(), 1);
        assert_eq!(account.state(), AccountState::Finished);
        assert_eq!(sink.saved.lock().unwrap().as_slice(), ["alice:c3"]);
        assert_eq!(listener.completed.load(Ordering::Relaxed), 1);
        assert!(!orchestrator.is_running());
    }

    #[tokio::test]
    async fn natural_completion_accounts_for_every_account() {
        let accounts: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|name| Arc::new(Account::new(*name)))
            .collect();
        let orchestrator = SessionOrchestrator::new(
            SessionConfig::default(),
            Arc::new(PasswordAuth { correct: "never" }),
            accounts.clone(),
            credentials(&["c1"]),
            egress_points(&["http://p1:8080"]),
        );

        orchestrator.run().await;

        let tracker = orchestrator.tracker();
        assert_eq!(tracker.completed() + tracker.failed(), tracker.total());
        assert_eq!(tracker.failed(), 3);
        for account in &accounts {
            assert_eq!(account.state(), AccountState::Finished);
        }
    }

    #[tokio::test]
    async fn validation_phase_shrinks_egress_pool() {
        let config = SessionConfig {
            check_url: Some("http://check.example/generate_204".into()),
            ..SessionConfig::default()
        };
        let mut orchestrator = SessionOrchestrator::new(
            config,
            Arc::new(PasswordAuth { correct: "never" }),
            vec![Arc::new(Account::new("alice"))],
            credentials(&["c1"]),
            egress_points(&["http://good:8080", "http://bad:8080"]),
        );
        orchestrator.set_validator(Arc::new(MarkedValidator));

        orchestrator.run().await;

        assert_eq!(orchestrator.egress().len().await, 1);
        assert_eq!(
            orchestrator.egress().snapshot().await,
            [EgressPoint::new("http://good:8080")]
        );
    }

    #[tokio::test]
    async fn without_check_url_validation_is_skipped() {
        let mut orchestrator = SessionOrchestrator::new(
            SessionConfig::default(),
            Arc::new(PasswordAuth { correct: "never" }),
            vec![Arc::new(Account::new("alice"))],
            credentials(&["c1"]),
            egress_points(&["http://bad:8080"]),
        );
        orchestrator.set_validator(Arc::new(MarkedValidator));
        let listener = Arc::new(CountingListener::default());
        orchestrator.set_listener(listener.clone());

        orchestrator.run().await;

        // Only the authentication phase starts; nothing was validated away.
        assert_eq!(listener.started.load(Ordering::Relaxed), 1);
        assert_eq!(orchestrator.egress().len().await, 1);
    }

    #[tokio::test]
    async fn satisfied_objective_cancels_pending_workers() {
        init_tracing();
        let accounts: Vec<_> = ["a", "b"]
            .iter()
            .map(|name| Arc::new(Account::new(*name)))
            .collect();
        let mut orchestrator = SessionOrchestrator::new(
            SessionConfig::default(),
            Arc::new(SlowAuth),
            accounts.clone(),
            credentials(&["c1", "c2"]),
            egress_points(&["http://p1:8080"]),
        );
        orchestrator.add_objective(Box::new(MaxAttempts::new(0)));
        let listener = Arc::new(CountingListener::default());
        orchestrator.set_listener(listener.clone());

        let started = Instant::now();
        orchestrator.run().await;

        // The objective fires on the first tick; cancelled workers never
        // report completion or failure.
        assert!(started.elapsed() < Duration::from_secs(30));
        let tracker = orchestrator.tracker();
        assert_eq!(tracker.completed(), 0);
        assert_eq!(tracker.failed(), 0);
        assert_eq!(listener.completed.load(Ordering::Relaxed), 1);
        assert!(!orchestrator.is_running());
    }

    #[tokio::test]
    async fn stop_before_run_leaves_accounts_waiting() {
        let accounts: Vec<_> = ["a", "b"]
            .iter()
            .map(|name| Arc::new(Account::new(*name)))
            .collect();
        let orchestrator = SessionOrchestrator::new(
            SessionConfig::default(),
            Arc::new(PasswordAuth { correct: "c1" }),
            accounts.clone(),
            credentials(&["c1"]),
            egress_points(&["http://p1:8080"]),
        );

        orchestrator.stop();
        orchestrator.run().await;

        let tracker = orchestrator.tracker();
        assert_eq!(tracker.attempts(), 0);
        assert_eq!(tracker.completed(), 0);
        assert_eq!(tracker.failed(), 0);
        for account in &accounts {
            assert_eq!(account.state(), AccountState::Waiting);
        }
    }

    #[tokio::test]
    async fn bounded_pool_still_finishes_all_accounts() {
        let config = SessionConfig {
            max_workers: 1,
            ..SessionConfig::default()
        };
        let accounts: Vec<_> = ["a", "b", "c", "d"]
            .iter()
            .map(|name| Arc::new(Account::new(*name)))
            .collect();
        let orchestrator = SessionOrchestrator::new(
            config,
            Arc::new(PasswordAuth { correct: "c1" }),
            accounts.clone(),
            credentials(&["c1"]),
            egress_points(&["http://p1:8080"]),
        );

        orchestrator.run().await;

        let tracker = orchestrator.tracker();
        assert_eq!(tracker.completed(), 4);
        assert_eq!(tracker.completed() + tracker.failed(), tracker.total());
    }
}
