//! Error types for sitebridge.
//!
//! One unified error with explicit variants for transport, authentication,
//! protocol, configuration and input validation failures. An expired session
//! is normally not an error at all (see [`crate::Outcome::Expired`]); it only
//! becomes [`Error::SessionExpired`] once recovery has been attempted and
//! failed.

use std::path::PathBuf;

use thiserror::Error;

/// The unified error type for sitebridge operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout, unexpected status).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (credentials rejected, inconsistent session).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// A response body did not match any known shape.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Configuration errors, raised before any network call.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input validation errors (base URL, subject id, dates).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// The session expired and one re-authentication cycle did not recover it.
    #[error("expired session, re-authentication failed")]
    SessionExpired,
}

impl Error {
    /// Whether the executor may spend its single re-authentication on this error.
    ///
    /// Rejected credentials and bad configuration can never succeed on a
    /// second attempt, so they are surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) | Error::Protocol(_) => true,
            Error::Auth(err) => err.is_session_inconsistency(),
            Error::Config(_) | Error::InvalidInput(_) | Error::SessionExpired => false,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Server answered with a status the caller did not expect.
    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The server explicitly rejected the credentials.
    #[error("invalid credentials: {message}")]
    InvalidCredentials { message: String },

    /// Login finished but the response did not look authenticated.
    #[error("login rejected: {reason}")]
    Rejected { reason: String },

    /// Login succeeded without the server-issued session cookie.
    #[error("session cookie '{name}' missing after login")]
    MissingSessionCookie { name: String },

    /// An authenticated session did not carry a session nonce.
    #[error("authenticated session carries no session nonce")]
    MissingSessionNonce,
}

impl AuthError {
    /// True for failures a fresh login can repair.
    pub fn is_session_inconsistency(&self) -> bool {
        matches!(
            self,
            AuthError::MissingSessionCookie { .. } | AuthError::MissingSessionNonce
        )
    }
}

/// Protocol-level errors: bodies that did not decode into the expected shape.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The RPC layer answered with an error envelope.
    #[error("rpc error: {message}")]
    Rpc { message: String },

    /// An RPC template was filled with the wrong number of arguments.
    #[error("rpc template {template} takes {expected} argument(s), got {actual}")]
    ArgumentCount {
        template: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A response body did not decode into the expected shape.
    #[error("unexpected {context} payload: {reason}")]
    UnexpectedShape { context: String, reason: String },

    /// A delimited export could not be parsed.
    #[error("export parse failed: {reason}")]
    Export { reason: String },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A target has no identifier or secret configured.
    #[error("missing credentials for target '{target}'")]
    MissingCredentials { target: String },

    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the expected layout.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A configuration value is out of range or malformed.
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid base URL.
    #[error("invalid base URL '{value}': {reason}")]
    BaseUrl { value: String, reason: String },

    /// Invalid subject identifier.
    #[error("invalid subject id '{value}': {reason}")]
    SubjectId { value: String, reason: String },

    /// Invalid date.
    #[error("invalid date '{value}': {reason}")]
    Date { value: String, reason: String },
}
