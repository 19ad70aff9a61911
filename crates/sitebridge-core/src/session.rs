//! Session store: the authentication state owned by one client.
//!
//! A [`SessionState`] starts empty, is populated wholesale by a successful
//! login, absorbs cookies the server rotates while it stays authenticated,
//! and is reset in one step when the session is found to be expired.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::error::AuthError;
use crate::tokens::SessionNonce;
use crate::types::SubjectId;

/// Cookie carrying the per-session nonce consumed by the token pipeline.
pub const SESSION_NONCE_COOKIE: &str = "sesnonce";

/// A single `Set-Cookie` instruction from a response.
///
/// `value: None` means the server expired the cookie.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieUpdate {
    pub name: String,
    pub value: Option<String>,
}

impl CookieUpdate {
    pub fn set(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn expire(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// Name→value bag of server-issued cookies.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CookieBag(BTreeMap<String, String>);

impl CookieBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Apply one `Set-Cookie` instruction. Empty values delete the cookie.
    pub fn apply(&mut self, update: CookieUpdate) {
        match update.value {
            Some(value) if !value.is_empty() => {
                trace!(cookie = %update.name, "cookie set");
                self.0.insert(update.name, value);
            }
            _ => {
                trace!(cookie = %update.name, "cookie expired");
                self.0.remove(&update.name);
            }
        }
    }

    pub fn extend(&mut self, updates: impl IntoIterator<Item = CookieUpdate>) {
        for update in updates {
            self.apply(update);
        }
    }

    /// Renders the `Cookie` request header, or `None` for an empty bag.
    pub fn header_value(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .0
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Some(pairs.join("; "))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

// Values are session credentials; only names are shown.
impl fmt::Debug for CookieBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

/// Authentication state for one client instance.
///
/// Invariant: `is_authenticated()` implies the bag holds the server-issued
/// session cookie. [`SessionState::save`] establishes it,
/// [`SessionState::absorb`] keeps it across rotations, and
/// [`SessionState::clear`] drops everything at once.
#[derive(Debug, Default)]
pub struct SessionState {
    cookies: CookieBag,
    authenticated: bool,
    required_cookie: Option<String>,
    last_auth_at: Option<DateTime<Utc>>,
    subject: Option<SubjectId>,
}

impl SessionState {
    /// An empty, unauthenticated session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the session with the cookies of a successful login.
    ///
    /// `required_cookie` names the server's session cookie. With `None`, any
    /// non-empty bag is accepted. On error the session is left cleared.
    pub fn save(
        &mut self,
        cookies: CookieBag,
        required_cookie: Option<&str>,
    ) -> Result<(), AuthError> {
        if !holds_session_cookie(&cookies, required_cookie) {
            self.clear();
            return Err(AuthError::MissingSessionCookie {
                name: required_cookie.unwrap_or("<any>").to_string(),
            });
        }

        debug!(cookies = cookies.len(), "session saved");
        *self = Self {
            cookies,
            authenticated: true,
            required_cookie: required_cookie.map(str::to_string),
            last_auth_at: Some(Utc::now()),
            subject: None,
        };
        Ok(())
    }

    /// Reset to the empty, unauthenticated state.
    pub fn clear(&mut self) {
        if self.authenticated {
            debug!("session cleared");
        }
        *self = Self::default();
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Take in cookies the server rotated on a later response.
    ///
    /// Ignored while unauthenticated: those cookies belong to whatever login
    /// attempt comes next, not to this session. If the server expires the
    /// session cookie the whole session is cleared.
    pub fn absorb(&mut self, updates: impl IntoIterator<Item = CookieUpdate>) {
        if !self.authenticated {
            return;
        }
        self.cookies.extend(updates);
        if !holds_session_cookie(&self.cookies, self.required_cookie.as_deref()) {
            debug!("session cookie expired by server");
            self.clear();
        }
    }

    /// The current session nonce, read straight from the cookie bag.
    pub fn session_nonce(&self) -> Option<SessionNonce> {
        if !self.authenticated {
            return None;
        }
        self.cookies
            .get(SESSION_NONCE_COOKIE)
            .map(SessionNonce::new)
    }

    pub fn cookies(&self) -> &CookieBag {
        &self.cookies
    }

    pub fn cookie_header(&self) -> Option<String> {
        self.cookies.header_value()
    }

    pub fn last_auth_at(&self) -> Option<DateTime<Utc>> {
        self.last_auth_at
    }

    pub fn subject(&self) -> Option<SubjectId> {
        self.subject
    }

    /// Cache the subject resolved for this session. No-op when unauthenticated.
    pub fn set_subject(&mut self, subject: SubjectId) {
        if self.authenticated {
            self.subject = Some(subject);
        }
    }
}

fn holds_session_cookie(cookies: &CookieBag, required_cookie: Option<&str>) -> bool {
    match required_cookie {
        Some(name) => cookies.contains(name),
        None => !cookies.is_empty(),
    }
}
