//! Short-lived credential types.
//!
//! None of these print their value in Debug output.

use std::fmt;

use chrono::{DateTime, Utc};

/// Anti-forgery token pulled from a login page.
///
/// Scoped to a single login attempt. The server rotates it on every page
/// fetch, so it is never stored on the session.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AntiForgeryToken(String);

impl AntiForgeryToken {
    /// Wrap an extracted token value.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token to submit when the page carried none.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AntiForgeryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = if self.0.is_empty() { "" } else { "[REDACTED]" };
        f.debug_tuple("AntiForgeryToken").field(&shown).finish()
    }
}

/// Per-session nonce issued by the server in a cookie.
///
/// It can rotate between RPC calls, so it is read from the cookie bag right
/// before it is used rather than kept around.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionNonce(String);

impl SessionNonce {
    pub fn new(nonce: impl Into<String>) -> Self {
        Self(nonce.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionNonce").field(&"[REDACTED]").finish()
    }
}

/// Token authorizing one data-export request.
///
/// The server ties it to a single export call. Callers mint a fresh one per
/// sync cycle and drop it afterwards.
#[derive(Clone)]
pub struct ExportToken {
    value: String,
    minted_at: DateTime<Utc>,
}

impl ExportToken {
    /// Wrap a freshly minted token, stamped with the current time.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            minted_at: Utc::now(),
        }
    }

    /// Returns the token value for use as the export `nonce` parameter.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn minted_at(&self) -> DateTime<Utc> {
        self.minted_at
    }

    /// First characters of the token, safe for logs.
    pub fn preview(&self) -> String {
        let head: String = self.value.chars().take(4).collect();
        format!("{head}…")
    }
}

impl fmt::Debug for ExportToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportToken")
            .field("value", &"[REDACTED]")
            .field("minted_at", &self.minted_at)
            .finish()
    }
}
