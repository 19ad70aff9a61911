//! Cookie-session client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use reqwest::header::{CONTENT_TYPE, COOKIE, ORIGIN, REFERER};
use tracing::{debug, instrument};

use sitebridge_core::rpc::{
    self, MODULE_BASE, MODULE_BASE_HEADER, PERMUTATION, PERMUTATION_HEADER, RPC_CONTENT_TYPE,
};
use sitebridge_core::session::SessionState;
use sitebridge_core::traits::Authenticate;
use sitebridge_core::{BaseUrl, Credentials, ExpiryHeuristic, Result};

use crate::authenticator::{FormAuthenticator, LoginProfile, LoginState, REQUESTED_WITH};
use crate::http::{HttpClient, PageResponse};

/// Who a request should look like it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    /// A page navigation.
    Browser,
    /// Page script (`X-Requested-With: XMLHttpRequest`).
    Script,
}

/// One authenticated session against one site.
///
/// Every call takes `&mut self`, so a client never has two requests racing
/// on its cookies. Share it behind a `tokio::sync::Mutex` if needed.
#[derive(Debug)]
pub struct SessionClient {
    http: HttpClient,
    base: BaseUrl,
    session: SessionState,
    authenticator: FormAuthenticator,
    heuristic: ExpiryHeuristic,
}

impl SessionClient {
    pub fn new(
        base: BaseUrl,
        profile: LoginProfile,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(timeout)?,
            base,
            session: SessionState::new(),
            authenticator: FormAuthenticator::new(profile, credentials),
            heuristic: ExpiryHeuristic::default(),
        })
    }

    pub fn with_heuristic(mut self, heuristic: ExpiryHeuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn base(&self) -> &BaseUrl {
        &self.base
    }

    pub fn heuristic(&self) -> &ExpiryHeuristic {
        &self.heuristic
    }

    pub fn login_state(&self) -> LoginState {
        self.authenticator.state()
    }

    /// GET `path` with the session cookies.
    #[instrument(skip(self, query), fields(base = %self.base))]
    pub async fn get(
        &mut self,
        path: &str,
        query: &[(&str, String)],
        caller: Caller,
    ) -> Result<PageResponse> {
        let url = self.base.endpoint(path);
        debug!(%url, "GET");
        let request = self.http.get(&url).query(query);
        let request = self.decorate(request, caller);
        self.send(request).await
    }

    /// POST a form to `path` with the session cookies.
    #[instrument(skip(self, form), fields(base = %self.base))]
    pub async fn post_form(
        &mut self,
        path: &str,
        form: &[(&str, String)],
        caller: Caller,
    ) -> Result<PageResponse> {
        let url = self.base.endpoint(path);
        debug!(%url, "POST form");
        let request = self.http.post(&url).form(form);
        let request = self.decorate(request, caller);
        self.send(request).await
    }

    /// Send one RPC envelope and classify the answer.
    ///
    /// A non-2xx status is a transport failure, not an envelope.
    #[instrument(skip(self, request), fields(method = %request.template()))]
    pub async fn rpc(&mut self, request: rpc::RpcRequest) -> Result<rpc::RpcResponse> {
        let url = self.base.endpoint(rpc::RPC_PATH);
        let builder = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, RPC_CONTENT_TYPE)
            .header(PERMUTATION_HEADER, PERMUTATION)
            .header(MODULE_BASE_HEADER, MODULE_BASE)
            .body(request.into_body());
        let builder = self.decorate(builder, Caller::Browser);

        let response = self.send(builder).await?;
        if !response.is_success() {
            return Err(response.status_error());
        }

        let decoded = rpc::RpcResponse::decode(&response.body);
        debug!(ok = decoded.is_ok(), "RPC response");
        Ok(decoded)
    }

    fn decorate(&self, request: RequestBuilder, caller: Caller) -> RequestBuilder {
        let mut request = request
            .header(ORIGIN, self.base.origin())
            .header(REFERER, self.base.root());
        if caller == Caller::Script {
            request = request.header(REQUESTED_WITH.0, REQUESTED_WITH.1);
        }
        if let Some(cookies) = self.session.cookie_header() {
            request = request.header(COOKIE, cookies);
        }
        request
    }

    async fn send(&mut self, request: RequestBuilder) -> Result<PageResponse> {
        let response = self.http.send(request).await?;
        self.session.absorb(response.set_cookies.iter().cloned());
        Ok(response)
    }
}

#[async_trait]
impl Authenticate for SessionClient {
    fn session(&self) -> &SessionState {
        &self.session
    }

    fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    async fn login(&mut self) -> Result<()> {
        self.authenticator
            .login(&self.http, &self.base, &mut self.session)
            .await
    }
}
