//! sitebridge-http - reqwest-backed clients for sites without an API.
//!
//! Each client owns one [`SessionClient`]: a cookie session, the form login
//! that fills it, and the expiry heuristic. Protected calls go through
//! [`sitebridge_core::execute_authenticated`], so an expired session costs
//! at most one re-login and one retry.

pub mod authenticator;
pub mod export;
pub mod http;
mod pipeline;
pub mod session;
pub mod tracking;

pub use authenticator::{AntiForgery, FormAuthenticator, LoginProfile, LoginState};
pub use export::{ExportClient, ExportOperation};
pub use http::{HttpClient, PageResponse};
pub use session::{Caller, SessionClient};
pub use tracking::{OrderStatus, TrackingClient};
