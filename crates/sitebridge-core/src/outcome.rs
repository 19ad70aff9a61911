//! Tagged result of a protected operation.

use crate::error::Error;

/// What a protected operation produced.
///
/// The executor's retry decision is a pure function of this value.
#[derive(Debug)]
pub enum Outcome<T> {
    /// A genuine value. Empty collections count.
    Done(T),
    /// The response had the shape of an expired session (typically the login
    /// page served in place of the expected payload).
    Expired(String),
    /// A real failure. Whether it earns a retry is decided by
    /// [`Error::is_retryable`].
    Failed(Error),
}

impl<T> Outcome<T> {
    pub fn expired(reason: impl Into<String>) -> Self {
        Outcome::Expired(reason.into())
    }

    pub fn failed(err: impl Into<Error>) -> Self {
        Outcome::Failed(err.into())
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Done(value) => Outcome::Done(f(value)),
            Outcome::Expired(reason) => Outcome::Expired(reason),
            Outcome::Failed(err) => Outcome::Failed(err),
        }
    }
}

impl<T> From<Result<T, Error>> for Outcome<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => Outcome::Done(value),
            Err(err) => Outcome::Failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    #[test]
    fn map_keeps_non_values() {
        let expired: Outcome<u8> = Outcome::expired("login page");
        assert!(matches!(expired.map(|v| v + 1), Outcome::Expired(r) if r == "login page"));

        let done: Outcome<u8> = Outcome::Done(1);
        assert!(matches!(done.map(|v| v + 1), Outcome::Done(2)));
    }

    #[test]
    fn from_result() {
        let ok: Outcome<u8> = Ok(3).into();
        assert!(ok.is_done());

        let err: Outcome<u8> =
            Err(Error::from(TransportError::Timeout { duration_ms: 5 })).into();
        assert!(matches!(err, Outcome::Failed(Error::Transport(_))));
    }
}
