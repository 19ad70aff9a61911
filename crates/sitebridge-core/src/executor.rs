//! Resilient request executor.
//!
//! The upstream services never say "session expired": they quietly serve the
//! login page where a machine-readable payload was expected. Operations
//! therefore report [`Outcome::Expired`] when the payload has the wrong shape,
//! and the executor answers with one re-authentication and one retry. The
//! bound is fixed so a server rejecting the credentials outright can never
//! cause a login loop.

use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::error::Error;
use crate::outcome::Outcome;
use crate::traits::{Authenticate, ProtectedOperation};

/// Invocations of an operation per call: the first try plus one retry.
pub const MAX_ATTEMPTS: usize = 2;

/// Log in if needed, then run `operation` under the one-shot retry rule.
///
/// A failed initial login is returned as-is and the operation is never
/// attempted.
#[instrument(skip_all)]
pub async fn execute_authenticated<C, O>(client: &mut C, operation: &mut O) -> Result<O::Output>
where
    C: Authenticate + ?Sized,
    O: ProtectedOperation<C>,
{
    if !client.session().is_authenticated() {
        debug!("Session unauthenticated, logging in first");
        client.login().await?;
    }

    execute(client, operation).await
}

/// Run `operation` and recover from at most one expiration signal.
///
/// On the first attempt, an [`Outcome::Expired`] or a retryable
/// [`Outcome::Failed`] clears the session, logs in again and retries once.
/// A second expiration, or a failed re-login, ends in
/// [`Error::SessionExpired`]. Non-retryable failures are returned immediately.
#[instrument(skip_all)]
pub async fn execute<C, O>(client: &mut C, operation: &mut O) -> Result<O::Output>
where
    C: Authenticate + ?Sized,
    O: ProtectedOperation<C>,
{
    for attempt in 0..MAX_ATTEMPTS {
        let final_attempt = attempt + 1 == MAX_ATTEMPTS;

        let reason = match operation.run(client).await {
            Outcome::Done(value) => {
                if attempt > 0 {
                    info!("Recovered after re-authentication");
                }
                return Ok(value);
            }
            Outcome::Expired(reason) if final_attempt => {
                warn!(%reason, "Session still expired after re-authentication");
                return Err(Error::SessionExpired);
            }
            Outcome::Expired(reason) => reason,
            Outcome::Failed(err) if !final_attempt && err.is_retryable() => err.to_string(),
            Outcome::Failed(err) => return Err(err),
        };

        warn!(attempt, %reason, "Expiration signal, re-authenticating");
        client.session_mut().clear();

        if let Err(err) = client.login().await {
            warn!(error = %err, "Re-authentication failed");
            return Err(Error::SessionExpired);
        }
    }

    Err(Error::SessionExpired)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::{AuthError, TransportError};
    use crate::session::{CookieBag, SessionState};

    #[derive(Default)]
    struct FakeClient {
        session: SessionState,
        logins: usize,
        /// Logins numbered from 1 that should fail.
        failing_logins: Vec<usize>,
    }

    impl FakeClient {
        fn authenticated() -> Self {
            let mut client = Self::default();
            client.session.save(session_cookie(), None).unwrap();
            client
        }
    }

    fn session_cookie() -> CookieBag {
        let mut bag = CookieBag::new();
        bag.insert("sid", "1");
        bag
    }

    #[async_trait]
    impl Authenticate for FakeClient {
        fn session(&self) -> &SessionState {
            &self.session
        }

        fn session_mut(&mut self) -> &mut SessionState {
            &mut self.session
        }

        async fn login(&mut self) -> Result<()> {
            self.logins += 1;
            if self.failing_logins.contains(&self.logins) {
                self.session.clear();
                return Err(AuthError::Rejected {
                    reason: "login page served again".to_string(),
                }
                .into());
            }
            self.session.save(session_cookie(), None)?;
            Ok(())
        }
    }

    /// Replays a scripted list of outcomes, then keeps reporting expiry.
    struct Scripted {
        calls: usize,
        script: Vec<fn() -> Outcome<Vec<u8>>>,
    }

    impl Scripted {
        fn new(script: Vec<fn() -> Outcome<Vec<u8>>>) -> Self {
            Self { calls: 0, script }
        }
    }

    #[async_trait]
    impl ProtectedOperation<FakeClient> for Scripted {
        type Output = Vec<u8>;

        async fn run(&mut self, client: &mut FakeClient) -> Outcome<Vec<u8>> {
            assert!(client.session().is_authenticated());
            let step = self.script.get(self.calls).copied();
            self.calls += 1;
            match step {
                Some(step) => step(),
                None => Outcome::expired("login page"),
            }
        }
    }

    fn expired() -> Outcome<Vec<u8>> {
        Outcome::expired("login page")
    }

    fn rows() -> Outcome<Vec<u8>> {
        Outcome::Done(vec![1, 2])
    }

    fn empty() -> Outcome<Vec<u8>> {
        Outcome::Done(Vec::new())
    }

    fn timeout() -> Outcome<Vec<u8>> {
        Outcome::failed(TransportError::Timeout { duration_ms: 30_000 })
    }

    fn rejected() -> Outcome<Vec<u8>> {
        Outcome::failed(AuthError::InvalidCredentials {
            message: "bad password".to_string(),
        })
    }

    #[tokio::test]
    async fn always_expired_is_bounded() {
        let mut client = FakeClient::authenticated();
        let mut op = Scripted::new(vec![]);

        let result = execute(&mut client, &mut op).await;

        assert!(matches!(result, Err(Error::SessionExpired)));
        assert_eq!(op.calls, 2);
        assert_eq!(client.logins, 1);
    }

    #[tokio::test]
    async fn logs_in_before_first_attempt() {
        let mut client = FakeClient::default();
        let mut op = Scripted::new(vec![rows]);

        let result = execute_authenticated(&mut client, &mut op).await.unwrap();

        assert_eq!(result, vec![1, 2]);
        assert_eq!(client.logins, 1);
        assert_eq!(op.calls, 1);
    }

    #[tokio::test]
    async fn failed_initial_login_skips_operation() {
        let mut client = FakeClient {
            failing_logins: vec![1],
            ..FakeClient::default()
        };
        let mut op = Scripted::new(vec![rows]);

        let result = execute_authenticated(&mut client, &mut op).await;

        assert!(matches!(result, Err(Error::Auth(AuthError::Rejected { .. }))));
        assert_eq!(op.calls, 0);
    }

    #[tokio::test]
    async fn recovers_from_one_expiration() {
        let mut client = FakeClient::authenticated();
        let mut op = Scripted::new(vec![expired, rows]);

        let result = execute(&mut client, &mut op).await.unwrap();

        assert_eq!(result, vec![1, 2]);
        assert_eq!(client.logins, 1);
        assert!(client.session().is_authenticated());
    }

    #[tokio::test]
    async fn transport_failure_retried_once() {
        let mut client = FakeClient::authenticated();
        let mut op = Scripted::new(vec![timeout, rows]);

        assert!(execute(&mut client, &mut op).await.is_ok());
        assert_eq!(op.calls, 2);

        let mut client = FakeClient::authenticated();
        let mut op = Scripted::new(vec![timeout, timeout]);

        let result = execute(&mut client, &mut op).await;
        assert!(matches!(result, Err(Error::Transport(_))));
        assert_eq!(op.calls, 2);
        assert_eq!(client.logins, 1);
    }

    #[tokio::test]
    async fn rejected_credentials_surface_immediately() {
        let mut client = FakeClient::authenticated();
        let mut op = Scripted::new(vec![rejected, rows]);

        let result = execute(&mut client, &mut op).await;

        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::InvalidCredentials { .. }))
        ));
        assert_eq!(op.calls, 1);
        assert_eq!(client.logins, 0);
    }

    #[tokio::test]
    async fn failed_relogin_reports_expired_session() {
        let mut client = FakeClient {
            failing_logins: vec![1],
            ..FakeClient::authenticated()
        };
        let mut op = Scripted::new(vec![expired, rows]);

        let err = execute(&mut client, &mut op).await.unwrap_err();

        assert_eq!(err.to_string(), "expired session, re-authentication failed");
        assert_eq!(op.calls, 1);
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn empty_result_is_success() {
        let mut client = FakeClient::authenticated();
        let mut op = Scripted::new(vec![empty]);

        assert!(execute(&mut client, &mut op).await.unwrap().is_empty());
        assert_eq!(client.logins, 0);
    }
}
