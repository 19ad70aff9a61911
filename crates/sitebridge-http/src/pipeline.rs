//! Export token pipeline: two RPC round-trips per token.

use tracing::{debug, info, instrument, warn};

use sitebridge_core::extract;
use sitebridge_core::rpc::{RpcRequest, RpcResponse, RpcTemplate};
use sitebridge_core::traits::Authenticate;
use sitebridge_core::{ExportToken, Result, SubjectId};

use crate::session::SessionClient;

impl SessionClient {
    /// Mint a fresh, single-use export token.
    ///
    /// Logs in first when the session is unauthenticated. Returns `Ok(None)`
    /// when either RPC answer lacks the expected value or the session carries
    /// no nonce; the reason is logged. Transport failures are errors.
    #[instrument(skip(self))]
    pub async fn mint_export_token(&mut self) -> Result<Option<ExportToken>> {
        if !self.session().is_authenticated() {
            self.login().await?;
        }

        let Some(subject) = self.resolve_subject().await? else {
            return Ok(None);
        };

        let Some(nonce) = self.session().session_nonce() else {
            warn!("Session nonce cookie not found");
            return Ok(None);
        };

        let subject = subject.to_string();
        let request =
            RpcRequest::encode(RpcTemplate::GenerateAuthToken, &[nonce.as_str(), subject.as_str()])?;

        let payload = match self.rpc(request).await? {
            RpcResponse::Ok(payload) => payload,
            RpcResponse::Error(message) => {
                warn!(%message, "Token generation returned an error envelope");
                return Ok(None);
            }
        };

        match extract::quoted_literal(&payload) {
            Some(value) => {
                let token = ExportToken::new(value);
                info!(token = %token.preview(), "Export token minted");
                Ok(Some(token))
            }
            None => {
                warn!("No token literal in generate-token response");
                Ok(None)
            }
        }
    }

    /// First round-trip: resolve the subject id and cache it on the session.
    async fn resolve_subject(&mut self) -> Result<Option<SubjectId>> {
        let request = RpcRequest::encode(RpcTemplate::Authenticate, &[])?;

        let payload = match self.rpc(request).await? {
            RpcResponse::Ok(payload) => payload,
            RpcResponse::Error(message) => {
                warn!(%message, "Authenticate RPC returned an error envelope");
                return Ok(None);
            }
        };

        let Some(raw) = extract::subject_id(&payload) else {
            warn!("No subject id in authenticate response");
            return Ok(None);
        };

        match SubjectId::parse(&raw) {
            Ok(subject) => {
                debug!(%subject, "Subject resolved");
                self.session_mut().set_subject(subject);
                Ok(Some(subject))
            }
            Err(err) => {
                warn!(error = %err, "Subject id out of range");
                Ok(None)
            }
        }
    }
}
