//! Login credentials type.

use std::fmt;

/// Login credentials for a target service.
///
/// Holds the account identifier (user name or e-mail) and the secret used to
/// submit the login form. Credentials are fixed for the lifetime of a client.
///
/// # Security
///
/// The secret is never exposed in Debug output, and log fields should use
/// [`Credentials::masked_identifier`] rather than the raw identifier.
///
/// # Example
///
/// ```
/// use sitebridge_core::Credentials;
///
/// let creds = Credentials::new("alice@example.com", "hunter2");
/// assert_eq!(creds.identifier(), "alice@example.com");
/// assert_eq!(creds.masked_identifier(), "al***");
/// ```
#[derive(Clone)]
pub struct Credentials {
    identifier: String,
    secret: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    /// Returns the identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the identifier reduced to its first two characters.
    pub fn masked_identifier(&self) -> String {
        let prefix: String = self.identifier.chars().take(2).collect();
        format!("{prefix}***")
    }

    /// Returns the secret.
    ///
    /// # Security
    ///
    /// Use this only when building the login form. Never log it.
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.masked_identifier())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
