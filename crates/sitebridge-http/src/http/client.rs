//! HTTP client with manual cookie capture.

use std::time::Duration;

use reqwest::header::{HeaderValue, LOCATION};
use reqwest::redirect::Policy;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use sitebridge_core::error::{Error, TransportError};
use sitebridge_core::session::CookieUpdate;

/// User agent sent on every request.
pub const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (X11; Linux x86_64) sitebridge/",
    env!("CARGO_PKG_VERSION")
);

/// A fully-read response.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    pub url: String,
    pub location: Option<String>,
    pub body: String,
    pub set_cookies: Vec<CookieUpdate>,
}

impl PageResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Decode the body as JSON, if it is JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_str(&self.body).ok()
    }

    /// Error for a status the caller did not expect.
    pub fn status_error(&self) -> Error {
        TransportError::Status {
            status: self.status,
            url: self.url.clone(),
        }
        .into()
    }
}

/// Thin wrapper over `reqwest::Client`.
///
/// Redirects are never followed, so cookies set on a 3xx are seen. Cookies
/// are not stored here either; callers own them in a
/// [`CookieBag`](sitebridge_core::session::CookieBag).
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Http {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.request(Method::GET, url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.request(Method::POST, url)
    }

    /// Send `request` and read the whole body.
    pub async fn send(&self, request: RequestBuilder) -> Result<PageResponse, Error> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v: &HeaderValue| v.to_str().ok())
            .map(str::to_string);

        let set_cookies: Vec<CookieUpdate> = response
            .cookies()
            .map(|cookie| {
                let expired = cookie.value().is_empty() || cookie.max_age() == Some(Duration::ZERO);
                if expired {
                    CookieUpdate::expire(cookie.name())
                } else {
                    CookieUpdate::set(cookie.name(), cookie.value())
                }
            })
            .collect();

        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        debug!(status, %url, cookies = set_cookies.len(), "HTTP response");
        trace!(bytes = body.len(), "response body");

        Ok(PageResponse {
            status,
            url,
            location,
            body,
            set_cookies,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        let err = if err.is_timeout() {
            TransportError::Timeout {
                duration_ms: self.timeout.as_millis() as u64,
            }
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        };
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(status: u16) -> PageResponse {
        PageResponse {
            status,
            url: "https://example.com/x".to_string(),
            location: None,
            body: r#"{"ok":true}"#.to_string(),
            set_cookies: Vec::new(),
        }
    }

    #[test]
    fn client_creation() {
        let client = HttpClient::new(Duration::from_secs(3)).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn status_classes() {
        assert!(page(200).is_success());
        assert!(page(302).is_redirect());
        assert!(!page(404).is_success());
        assert!(matches!(
            page(500).status_error(),
            Error::Transport(TransportError::Status { status: 500, .. })
        ));
    }

    #[test]
    fn json_body() {
        let value: serde_json::Value = page(200).json().unwrap();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        let client = HttpClient::new(Duration::from_secs(2)).unwrap();
        let err = client
            .send(client.get("http://127.0.0.1:9/unreachable"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
