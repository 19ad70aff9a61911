//! Service base URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated root URL for a target service.
///
/// Must use HTTPS, or HTTP for localhost (which keeps mock servers usable in
/// tests). Endpoint URLs are built with [`BaseUrl::endpoint`].
///
/// # Example
///
/// ```
/// use sitebridge_core::BaseUrl;
///
/// let base = BaseUrl::new("https://cronometer.com/").unwrap();
/// assert_eq!(base.endpoint("/login/"), "https://cronometer.com/login/");
/// assert_eq!(base.endpoint("cronometer/app"), "https://cronometer.com/cronometer/app");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BaseUrl(Url);

impl BaseUrl {
    /// Create a new base URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not absolute, has no host, or uses
    /// plain HTTP for a non-local host.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::BaseUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        Ok(Self(url))
    }

    /// Joins an endpoint path onto the base, tolerating slashes on either side.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.0.as_str().trim_end_matches('/');
        format!("{}/{}", base, path.trim_start_matches('/'))
    }

    /// The base with a trailing slash, as browsers send it in `Referer`.
    pub fn root(&self) -> String {
        format!("{}/", self.0.as_str().trim_end_matches('/'))
    }

    /// Scheme, host and port, as sent in the `Origin` header.
    pub fn origin(&self) -> String {
        self.0.origin().ascii_serialization()
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    /// Returns true for loopback hosts.
    pub fn is_local(&self) -> bool {
        self.0
            .host_str()
            .is_some_and(|h| h == "localhost" || h == "127.0.0.1" || h == "[::1]")
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        if url.cannot_be_a_base() {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must be an absolute URL".to_string(),
            }
            .into());
        }

        if url.host_str().is_none() {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must have a host".to_string(),
            }
            .into());
        }

        let is_localhost = url
            .host_str()
            .is_some_and(|h| h == "localhost" || h == "127.0.0.1" || h == "[::1]");

        let scheme = url.scheme();
        if scheme != "https" && !(scheme == "http" && is_localhost) {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must use HTTPS (HTTP allowed only for localhost)".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BaseUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for BaseUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for BaseUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BaseUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_https_url() {
        let base = BaseUrl::new("https://montreal.lufa.com").unwrap();
        assert_eq!(base.host(), Some("montreal.lufa.com"));
        assert!(!base.is_local());
    }

    #[test]
    fn valid_localhost_http() {
        let base = BaseUrl::new("http://127.0.0.1:8080").unwrap();
        assert!(base.is_local());
        assert_eq!(base.endpoint("export"), "http://127.0.0.1:8080/export");
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let base = BaseUrl::new("https://cronometer.com/").unwrap();
        assert_eq!(base.endpoint("/export"), "https://cronometer.com/export");
        assert_eq!(base.root(), "https://cronometer.com/");
        assert_eq!(base.origin(), "https://cronometer.com");
    }

    #[test]
    fn invalid_http_non_localhost() {
        assert!(BaseUrl::new("http://cronometer.com").is_err());
    }

    #[test]
    fn invalid_relative_url() {
        assert!(BaseUrl::new("/login").is_err());
    }

    #[test]
    fn deserializes_with_validation() {
        let ok: BaseUrl = serde_json::from_str("\"https://example.com\"").unwrap();
        assert_eq!(ok.host(), Some("example.com"));
        assert!(serde_json::from_str::<BaseUrl>("\"ftp://example.com\"").is_err());
    }
}
