//! Form-based login.
//!
//! A login is four steps: fetch the form, pull out its anti-forgery token,
//! submit credentials, then decide from the response whether the server
//! accepted them. None of the targets has a documented API, so step four is
//! a priority-ordered set of indicators described by a [`LoginProfile`].

use reqwest::header::{COOKIE, ORIGIN, REFERER};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use sitebridge_core::error::{AuthError, Error};
use sitebridge_core::extract;
use sitebridge_core::session::{CookieBag, SessionState};
use sitebridge_core::{AntiForgeryToken, BaseUrl, Credentials, Result};

use crate::http::{HttpClient, PageResponse};

/// Header marking a request as issued by page script.
pub const REQUESTED_WITH: (&str, &str) = ("X-Requested-With", "XMLHttpRequest");

/// Where the login form keeps its anti-forgery value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AntiForgery {
    /// One input with this name.
    Named(String),
    /// Every hidden input is echoed back.
    HiddenInputs,
}

/// Everything that differs between two form logins.
#[derive(Debug, Clone)]
pub struct LoginProfile {
    pub form_path: String,
    pub submit_path: String,
    pub anti_forgery: AntiForgery,
    pub identifier_field: String,
    pub secret_field: String,
    pub extra_fields: Vec<(String, String)>,
    /// Send `X-Requested-With`, `Origin` and `Referer` on submit.
    pub script_origin: bool,
    /// Text only an authenticated page contains.
    pub account_markers: Vec<String>,
    /// Text only the login page contains.
    pub login_page_markers: Vec<String>,
    /// Substring of the post-login URL.
    pub redirect_marker: Option<String>,
    /// Cookie that must exist after login. `None` accepts any cookie.
    pub session_cookie: Option<String>,
}

impl LoginProfile {
    /// AJAX login in front of the GWT-RPC export service.
    pub fn gwt_export() -> Self {
        Self {
            form_path: "login/".to_string(),
            submit_path: "login".to_string(),
            anti_forgery: AntiForgery::Named("anticsrf".to_string()),
            identifier_field: "username".to_string(),
            secret_field: "password".to_string(),
            extra_fields: vec![("userCode".to_string(), String::new())],
            script_origin: true,
            account_markers: vec!["Display Name".to_string(), "Logout".to_string()],
            login_page_markers: Vec::new(),
            redirect_marker: Some("dashboard".to_string()),
            session_cookie: None,
        }
    }

    /// Plain HTML form login of the order-tracking site.
    pub fn order_tracking() -> Self {
        Self {
            form_path: "fr/login".to_string(),
            submit_path: "fr/login".to_string(),
            anti_forgery: AntiForgery::HiddenInputs,
            identifier_field: "LoginForm[user_email]".to_string(),
            secret_field: "LoginForm[password]".to_string(),
            extra_fields: Vec::new(),
            script_origin: false,
            account_markers: vec!["Mon compte".to_string()],
            login_page_markers: vec!["Connexion".to_string()],
            redirect_marker: None,
            session_cookie: None,
        }
    }
}

/// Progress of one login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Unauthenticated,
    FormFetched,
    Submitted,
    Authenticated,
    Failed,
}

/// Runs the login handshake for one set of credentials.
#[derive(Debug)]
pub struct FormAuthenticator {
    profile: LoginProfile,
    credentials: Credentials,
    state: LoginState,
}

impl FormAuthenticator {
    pub fn new(profile: LoginProfile, credentials: Credentials) -> Self {
        Self {
            profile,
            credentials,
            state: LoginState::Unauthenticated,
        }
    }

    pub fn profile(&self) -> &LoginProfile {
        &self.profile
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    /// Log in and store the resulting cookies in `session`.
    ///
    /// The session is cleared first and stays cleared on failure.
    #[instrument(skip(self, http, base, session), fields(identifier = %self.credentials.masked_identifier(), base = %base))]
    pub async fn login(
        &mut self,
        http: &HttpClient,
        base: &BaseUrl,
        session: &mut SessionState,
    ) -> Result<()> {
        session.clear();
        self.state = LoginState::Unauthenticated;

        let saved = match self.handshake(http, base).await {
            Ok(cookies) => session
                .save(cookies, self.profile.session_cookie.as_deref())
                .map_err(Error::from),
            Err(err) => Err(err),
        };

        match saved {
            Ok(()) => {
                self.state = LoginState::Authenticated;
                info!("Login successful");
                Ok(())
            }
            Err(err) => {
                self.state = LoginState::Failed;
                warn!(error = %err, "Login failed");
                Err(err)
            }
        }
    }

    async fn handshake(&mut self, http: &HttpClient, base: &BaseUrl) -> Result<CookieBag> {
        let mut jar = CookieBag::new();
        let form_url = base.endpoint(&self.profile.form_path);

        debug!(url = %form_url, "Fetching login form");
        let page = http.send(http.get(&form_url)).await?;
        jar.extend(page.set_cookies.iter().cloned());
        if !page.is_success() {
            return Err(page.status_error());
        }
        self.state = LoginState::FormFetched;

        let fields = self.form_fields(&page.body);

        let mut request = http
            .post(&base.endpoint(&self.profile.submit_path))
            .form(&fields);
        if let Some(cookies) = jar.header_value() {
            request = request.header(COOKIE, cookies);
        }
        if self.profile.script_origin {
            request = request
                .header(REQUESTED_WITH.0, REQUESTED_WITH.1)
                .header(ORIGIN, base.origin())
                .header(REFERER, form_url.as_str());
        }

        debug!("Submitting credentials");
        let response = http.send(request).await?;
        jar.extend(response.set_cookies.iter().cloned());
        self.state = LoginState::Submitted;

        classify_login_response(&self.profile, &response)?;
        Ok(jar)
    }

    fn form_fields(&self, html: &str) -> Vec<(String, String)> {
        let profile = &self.profile;
        let mut fields = Vec::new();

        match &profile.anti_forgery {
            AntiForgery::Named(name) => {
                let token = extract::anti_forgery_token(name, html)
                    .map(AntiForgeryToken::new)
                    .unwrap_or_else(|| {
                        warn!(field = %name, "Anti-forgery token not found, submitting empty");
                        AntiForgeryToken::empty()
                    });
                fields.push((name.clone(), token.as_str().to_string()));
            }
            AntiForgery::HiddenInputs => {
                let hidden = extract::hidden_inputs(html);
                if hidden.is_empty() {
                    warn!("No hidden inputs on login form");
                }
                fields.extend(hidden.into_iter().filter(|(name, _)| {
                    name != &profile.identifier_field && name != &profile.secret_field
                }));
            }
        }

        fields.push((
            profile.identifier_field.clone(),
            self.credentials.identifier().to_string(),
        ));
        fields.push((
            profile.secret_field.clone(),
            self.credentials.secret().to_string(),
        ));
        fields.extend(profile.extra_fields.iter().cloned());
        fields
    }
}

/// Decide whether a submit response means the login was accepted.
///
/// Indicators, in order: a JSON `redirect`, a JSON `error`, a redirect away
/// from the form, account markers, absent login-page markers, then the
/// post-login URL marker.
pub fn classify_login_response(profile: &LoginProfile, response: &PageResponse) -> Result<()> {
    if response.status >= 400 {
        return Err(response.status_error());
    }

    if let Some(Value::Object(map)) = response.json::<Value>() {
        if map.contains_key("redirect") {
            debug!("Login accepted (JSON redirect)");
            return Ok(());
        }
        if let Some(error) = map.get("error") {
            let message = match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(AuthError::InvalidCredentials { message }.into());
        }
    }

    if response.is_redirect() {
        if let Some(location) = response.location.as_deref() {
            let form = profile.form_path.trim_matches('/');
            if !location.contains(form) {
                debug!(%location, "Login accepted (redirect)");
                return Ok(());
            }
            if let Some(marker) = profile.redirect_marker.as_deref()
                && location.contains(marker)
            {
                return Ok(());
            }
        }
        return Err(AuthError::Rejected {
            reason: format!("redirected back to the login form from {}", response.url),
        }
        .into());
    }

    let body = response.body.as_str();
    if profile.account_markers.iter().any(|m| body.contains(m.as_str())) {
        debug!("Login accepted (account marker)");
        return Ok(());
    }
    if !profile.login_page_markers.is_empty()
        && !profile
            .login_page_markers
            .iter()
            .any(|m| body.contains(m.as_str()))
    {
        debug!("Login accepted (login page markers absent)");
        return Ok(());
    }
    if let Some(marker) = profile.redirect_marker.as_deref()
        && response.url.contains(marker)
    {
        debug!("Login accepted (post-login URL)");
        return Ok(());
    }

    let snippet: String = body.chars().take(200).collect();
    Err(AuthError::Rejected {
        reason: format!(
            "no success indicator in response from {} (status {}): {}",
            response.url, response.status, snippet
        ),
    }
    .into())
}
