//! Authenticated client trait.

use async_trait::async_trait;

use crate::Result;
use crate::session::SessionState;

/// A client that owns one session and knows how to log it in.
#[async_trait]
pub trait Authenticate: Send {
    /// Returns the session this client owns.
    fn session(&self) -> &SessionState;

    /// Returns the session for the executor's expiration handler.
    fn session_mut(&mut self) -> &mut SessionState;

    /// Run the full login handshake and populate the session.
    ///
    /// Implementations do not retry internally and leave the session cleared
    /// on failure.
    async fn login(&mut self) -> Result<()>;
}
