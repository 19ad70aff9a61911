//! Outbound RPC request bodies.

use std::fmt;

use crate::error::ProtocolError;

use super::{MODULE_BASE, POLICY_HASH, SERVICE};

/// Stream version and flags heading every request.
const VERSION: &str = "7";
const FLAGS: &str = "0";

const INTEGER_TYPE: &str = "java.lang.Integer/3438268394";
const STRING_TYPE: &str = "java.lang.String/2004016611";
const INT_TYPE: &str = "I";
const AUTH_SCOPE_TYPE: &str = "com.cronometer.shared.user.AuthScope/2065601159";

/// Fixed integer argument of the authenticate call, as the web client sends it.
const UTC_OFFSET_MINUTES: &str = "-300";

/// Lifetime requested for minted export tokens, in seconds.
const TOKEN_LIFETIME_SECS: &str = "3600";

/// The message kinds the client can send.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RpcTemplate {
    /// Resolves the subject id of the logged-in account. Takes no arguments.
    Authenticate,
    /// Mints an export token. Takes `(session nonce, subject id)`.
    GenerateAuthToken,
}

impl RpcTemplate {
    /// Remote method name.
    pub fn method(&self) -> &'static str {
        match self {
            RpcTemplate::Authenticate => "authenticate",
            RpcTemplate::GenerateAuthToken => "generateAuthorizationToken",
        }
    }

    /// Number of positional arguments the wire format expects.
    pub fn arity(&self) -> usize {
        match self {
            RpcTemplate::Authenticate => 0,
            RpcTemplate::GenerateAuthToken => 2,
        }
    }
}

impl fmt::Display for RpcTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// A filled request envelope, ready to POST.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcRequest {
    template: RpcTemplate,
    body: String,
}

impl RpcRequest {
    /// Fill `template` with positional `args`.
    ///
    /// Argument count and order are part of the wire contract; a mismatch
    /// is rejected here because the server would only answer with a generic
    /// error envelope.
    pub fn encode(template: RpcTemplate, args: &[&str]) -> Result<Self, ProtocolError> {
        if args.len() != template.arity() {
            return Err(ProtocolError::ArgumentCount {
                template: template.method(),
                expected: template.arity(),
                actual: args.len(),
            });
        }

        let escaped: Vec<String> = args.iter().map(|arg| escape(arg)).collect();

        let fields: Vec<&str> = match template {
            RpcTemplate::Authenticate => vec![
                VERSION,
                FLAGS,
                "5",
                MODULE_BASE,
                POLICY_HASH,
                SERVICE,
                template.method(),
                INTEGER_TYPE,
                "1",
                "2",
                "3",
                "4",
                "1",
                "5",
                "5",
                UTC_OFFSET_MINUTES,
            ],
            RpcTemplate::GenerateAuthToken => vec![
                VERSION,
                FLAGS,
                "8",
                MODULE_BASE,
                POLICY_HASH,
                SERVICE,
                template.method(),
                STRING_TYPE,
                INT_TYPE,
                AUTH_SCOPE_TYPE,
                escaped[0].as_str(),
                "1",
                "2",
                "3",
                "4",
                "4",
                "5",
                "6",
                "6",
                "7",
                "8",
                escaped[1].as_str(),
                TOKEN_LIFETIME_SECS,
                "7",
                "2",
            ],
        };

        Ok(Self {
            template,
            body: format!("{}|", fields.join("|")),
        })
    }

    pub fn template(&self) -> RpcTemplate {
        self.template
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }
}

/// GWT string-table escaping: backslash, the field separator and NUL.
fn escape(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len());
    for ch in arg.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '|' => out.push_str("\\!"),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out
}
