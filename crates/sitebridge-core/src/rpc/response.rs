//! Inbound RPC response classification.

use crate::error::ProtocolError;
use crate::extract;

/// Success marker of a response value array.
const OK_MARKER: &str = "OK[";

/// Prefix of a serialized server-side exception.
const EXCEPTION_PREFIX: &str = "//EX";

const UNRECOGNIZED: &str = "unrecognized response";

/// A classified RPC response.
///
/// Every body is classified before any value is read. Bodies without a
/// recognizable marker, such as a login page served in place of the RPC
/// answer, are always `Error`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RpcResponse {
    /// The value array, starting at the `OK[` marker.
    Ok(String),
    /// The server's error message, or a description of why the body was not
    /// recognized.
    Error(String),
}

impl RpcResponse {
    /// Classify a raw response body. Never fails.
    pub fn decode(raw: &str) -> Self {
        if raw.trim_start().starts_with(EXCEPTION_PREFIX) {
            let message =
                extract::quoted_literal(raw).unwrap_or_else(|| "remote exception".to_string());
            return RpcResponse::Error(message);
        }

        match raw.find(OK_MARKER) {
            Some(start) => RpcResponse::Ok(raw[start..].to_string()),
            None => RpcResponse::Error(UNRECOGNIZED.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, RpcResponse::Ok(_))
    }

    /// The value array of a successful response.
    pub fn payload(&self) -> Option<&str> {
        match self {
            RpcResponse::Ok(payload) => Some(payload),
            RpcResponse::Error(_) => None,
        }
    }

    pub fn into_result(self) -> Result<String, ProtocolError> {
        match self {
            RpcResponse::Ok(payload) => Ok(payload),
            RpcResponse::Error(message) => Err(ProtocolError::Rpc { message }),
        }
    }
}
