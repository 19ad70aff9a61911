//! Numeric subject identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// Opaque numeric account identifier resolved by the authenticate RPC.
///
/// Cached on the session for the rest of its lifetime and wiped with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(u64);

impl SubjectId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Parse the digits pulled out of an RPC payload.
    pub fn parse(s: &str) -> Result<Self, Error> {
        s.parse::<u64>().map(Self).map_err(|e| {
            InvalidInputError::SubjectId {
                value: s.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
