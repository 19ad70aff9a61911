//! sitebridge-core - Session, token and envelope types for scraping-style
//! service clients.
//!
//! This crate holds everything that does not touch the network: the session
//! store, token extraction, the RPC envelope codec, payload types, the
//! expiry heuristic and the resilient executor that drives re-authentication.

pub mod config;
pub mod credentials;
pub mod error;
pub mod executor;
pub mod expiry;
pub mod extract;
pub mod outcome;
pub mod payload;
pub mod rpc;
pub mod session;
pub mod tokens;
pub mod traits;
pub mod types;

pub use config::{BridgeConfig, Target, TargetConfig};
pub use credentials::Credentials;
pub use error::Error;
pub use executor::{MAX_ATTEMPTS, execute, execute_authenticated};
pub use expiry::ExpiryHeuristic;
pub use outcome::Outcome;
pub use payload::{ExportKind, ExportRecord, ExportRequest, ExportTable, StatusObject};
pub use session::{CookieBag, CookieUpdate, SessionState};
pub use tokens::{AntiForgeryToken, ExportToken, SessionNonce};
pub use traits::{Authenticate, ProtectedOperation};
pub use types::{BaseUrl, SubjectId};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
