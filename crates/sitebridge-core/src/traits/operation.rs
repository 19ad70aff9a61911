//! Protected operation trait.

use async_trait::async_trait;

use crate::outcome::Outcome;

/// A call that needs an authenticated session on client `C`.
///
/// `run` may be invoked twice by the executor (once more after a
/// re-authentication), so it must not consume state it needs for the retry.
#[async_trait]
pub trait ProtectedOperation<C: ?Sized + Send>: Send {
    /// Value produced on success.
    type Output: Send;

    /// Perform the call once and classify what came back.
    async fn run(&mut self, client: &mut C) -> Outcome<Self::Output>;
}
