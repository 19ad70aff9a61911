//! Delimited data export behind the GWT-RPC token pipeline.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, instrument};

use sitebridge_core::payload::ExportTable;
use sitebridge_core::traits::{Authenticate, ProtectedOperation};
use sitebridge_core::{
    BaseUrl, BridgeConfig, Credentials, ExportRequest, ExportToken, Outcome, Result, Target,
    execute_authenticated,
};

use crate::authenticator::LoginProfile;
use crate::session::{Caller, SessionClient};

/// Production service root.
pub const DEFAULT_BASE_URL: &str = "https://cronometer.com";

const EXPORT_PATH: &str = "export";

/// Client for the export service.
#[derive(Debug)]
pub struct ExportClient {
    inner: SessionClient,
}

impl ExportClient {
    pub fn new(credentials: Credentials, base: Option<BaseUrl>, timeout: Duration) -> Result<Self> {
        let base = match base {
            Some(base) => base,
            None => BaseUrl::new(DEFAULT_BASE_URL)?,
        };
        let inner = SessionClient::new(base, LoginProfile::gwt_export(), credentials, timeout)?;
        Ok(Self { inner })
    }

    /// Build from the `export` section of `config`.
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let credentials = config.credentials(Target::Export)?;
        let client = Self::new(credentials, config.base_url(Target::Export)?, config.timeout())?;
        Ok(Self {
            inner: client.inner.with_heuristic(config.heuristic()),
        })
    }

    pub fn session_client(&mut self) -> &mut SessionClient {
        &mut self.inner
    }

    pub async fn login(&mut self) -> Result<()> {
        self.inner.login().await
    }

    /// Mint one export token outside of an export.
    pub async fn mint_token(&mut self) -> Result<Option<ExportToken>> {
        self.inner.mint_export_token().await
    }

    /// Export one report, re-authenticating once if the session expired.
    #[instrument(skip(self), fields(kind = %request.kind(), start = %request.start(), end = %request.end()))]
    pub async fn export(&mut self, request: &ExportRequest) -> Result<ExportTable> {
        let mut operation = ExportOperation::new(request.clone());
        let table = execute_authenticated(&mut self.inner, &mut operation).await?;
        info!(rows = table.len(), "Export retrieved");
        Ok(table)
    }
}

/// Mint a token and fetch one export with it.
#[derive(Debug, Clone)]
pub struct ExportOperation {
    request: ExportRequest,
}

impl ExportOperation {
    pub fn new(request: ExportRequest) -> Self {
        Self { request }
    }
}

#[async_trait]
impl ProtectedOperation<SessionClient> for ExportOperation {
    type Output = ExportTable;

    async fn run(&mut self, client: &mut SessionClient) -> Outcome<ExportTable> {
        let token = match client.mint_export_token().await {
            Ok(Some(token)) => token,
            Ok(None) => return Outcome::expired("could not mint an export token"),
            Err(err) => return Outcome::Failed(err),
        };

        let query = self.request.query(&token);
        let page = match client.get(EXPORT_PATH, &query, Caller::Browser).await {
            Ok(page) => page,
            Err(err) => return Outcome::Failed(err),
        };

        if page.is_redirect() {
            return Outcome::expired(format!(
                "export redirected to {}",
                page.location.as_deref().unwrap_or("<unknown>")
            ));
        }
        if !page.is_success() {
            return Outcome::Failed(page.status_error());
        }
        if client.heuristic().is_login_document(&page.body) {
            return Outcome::expired("login page served in place of export");
        }

        match ExportTable::parse(&page.body) {
            Ok(table) => Outcome::Done(table),
            Err(err) => Outcome::failed(err),
        }
    }
}
