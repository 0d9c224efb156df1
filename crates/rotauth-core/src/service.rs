//! Collaborator traits at the session boundary
//!
//! `AuthService` is the concrete authentication transport; `EgressValidator`
//! health-checks egress points before the authentication phase. Both use
//! `Pin<Box<dyn Future>>` return types for dyn-compatibility
//! (`Arc<dyn AuthService>` shared across workers).

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use crate::account::{Account, AuthenticatedAccount};
use crate::credential::Credential;
use crate::egress::EgressPoint;
use crate::error::{AuthError, Result};

/// Boxed future alias for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Concrete authentication transport. Must be thread-safe and support many
/// separate requesting accounts concurrently.
pub trait AuthService: Send + Sync {
    /// Attempt one credential against one account through one egress point.
    ///
    /// `Ok(Some)` is a success. `Ok(None)` means the service answered
    /// without a result; callers treat it as an incorrect credential.
    /// Classified failures come back as `AuthError`.
    fn authenticate<'a>(
        &'a self,
        account: &'a Account,
        credential: &'a Credential,
        egress: &'a EgressPoint,
    ) -> BoxFuture<'a, Result<Option<AuthenticatedAccount>>>;

    /// Number of egress points this transport currently considers unusable,
    /// subtracted from the pool size in progress reports.
    fn unavailable_egress(&self) -> usize {
        0
    }
}

/// Egress point health check run during the validation phase.
pub trait EgressValidator: Send + Sync {
    fn check<'a>(
        &'a self,
        egress: &'a EgressPoint,
        check_url: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Validator that issues a GET for the check URL through the egress point.
///
/// Any connect failure, timeout, or non-success status marks the point
/// unusable.
pub struct HttpEgressValidator;

impl EgressValidator for HttpEgressValidator {
    fn check<'a>(
        &'a self,
        egress: &'a EgressPoint,
        check_url: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            debug!(egress = %egress, url = check_url, "checking egress point");
            let proxy = reqwest::Proxy::all(egress.url())
                .map_err(|e| AuthError::EgressUnusable(e.to_string()))?;
            let client = reqwest::Client::builder()
                .proxy(proxy)
                .timeout(timeout)
                .build()
                .map_err(|e| AuthError::EgressUnusable(e.to_string()))?;
            let response = client
                .get(check_url)
                .send()
                .await
                .map_err(|e| AuthError::EgressUnusable(e.to_string()))?;
            if response.status().is_success() {
                Ok(())
            } else {
                Err(AuthError::EgressUnusable(format!(
                    "check returned {}",
                    response.status()
                )))
            }
        })
    }
}
