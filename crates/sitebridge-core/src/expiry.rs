//! Session-expiry heuristic.
//!
//! Nothing in the upstream protocols signals an expired session. The best
//! available evidence is a response that does not have the expected shape,
//! usually because the login page came back instead. This module keeps that
//! inference in one overridable place.

use serde::de::DeserializeOwned;

use crate::error::ProtocolError;
use crate::outcome::Outcome;

const DEFAULT_LOGIN_MARKERS: [&str; 3] = ["<html", "<!doctype", "<form"];

/// Decides whether an unexpected payload means the session expired.
#[derive(Debug, Clone)]
pub struct ExpiryHeuristic {
    login_markers: Vec<String>,
    parse_failure_is_expiry: bool,
}

impl Default for ExpiryHeuristic {
    fn default() -> Self {
        Self {
            login_markers: DEFAULT_LOGIN_MARKERS.iter().map(|m| m.to_string()).collect(),
            parse_failure_is_expiry: true,
        }
    }
}

impl ExpiryHeuristic {
    /// Heuristic with custom login-page markers (matched case-insensitively).
    pub fn new(login_markers: Vec<String>, parse_failure_is_expiry: bool) -> Self {
        Self {
            login_markers: login_markers
                .into_iter()
                .map(|m| m.to_ascii_lowercase())
                .collect(),
            parse_failure_is_expiry,
        }
    }

    /// Whether a JSON decode failure on a non-HTML body also counts as expiry.
    ///
    /// When off, such bodies surface as [`ProtocolError::UnexpectedShape`].
    pub fn with_parse_failure_as_expiry(mut self, enabled: bool) -> Self {
        self.parse_failure_is_expiry = enabled;
        self
    }

    /// True when the body carries any login-page marker.
    pub fn looks_like_login_page(&self, body: &str) -> bool {
        let lowered = body.to_ascii_lowercase();
        self.login_markers
            .iter()
            .any(|marker| lowered.contains(marker.as_str()))
    }

    /// True when the body is a markup document carrying a login-page marker.
    ///
    /// Use for payloads that are not themselves markup, such as delimited
    /// exports, where a marker may appear inside a data field.
    pub fn is_login_document(&self, body: &str) -> bool {
        let head = body.trim_start_matches('\u{feff}').trim_start();
        head.starts_with('<') && self.looks_like_login_page(head)
    }

    /// Decode a JSON body into `T`, classifying failures.
    ///
    /// `context` names the call for log and error messages.
    pub fn classify_json<T: DeserializeOwned>(&self, context: &str, body: &str) -> Outcome<T> {
        match serde_json::from_str::<T>(body) {
            Ok(value) => Outcome::Done(value),
            Err(_) if self.looks_like_login_page(body) => {
                Outcome::expired(format!("{context}: login page served in place of JSON"))
            }
            Err(err) if self.parse_failure_is_expiry => {
                Outcome::expired(format!("{context}: {err}"))
            }
            Err(err) => Outcome::failed(ProtocolError::UnexpectedShape {
                context: context.to_string(),
                reason: err.to_string(),
            }),
        }
    }
}
