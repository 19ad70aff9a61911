//! GWT-RPC envelope codec.
//!
//! The export target's web app talks to its backend over GWT-RPC: a
//! pipe-delimited positional request body and a JavaScript-array response
//! prefixed with `//OK` or `//EX`. Only the two calls the token pipeline needs
//! are modelled, and responses are classified rather than fully parsed.

mod envelope;
mod response;

pub use envelope::{RpcRequest, RpcTemplate};
pub use response::RpcResponse;

/// Path of the RPC servlet, relative to the service base URL.
pub const RPC_PATH: &str = "cronometer/app";

/// Content type every RPC POST must carry.
pub const RPC_CONTENT_TYPE: &str = "text/x-gwt-rpc; charset=UTF-8";

/// Header naming the compiled client permutation.
pub const PERMUTATION_HEADER: &str = "X-GWT-Permutation";

/// Header naming the client module base.
pub const MODULE_BASE_HEADER: &str = "X-GWT-Module-Base";

/// Compiled client permutation the server expects.
pub const PERMUTATION: &str = "7B121DC5483BF272B1BC1916DA9FA963";

/// Module base URL embedded in every request and sent as a header.
pub const MODULE_BASE: &str = "https://cronometer.com/cronometer/";

/// Serialization policy hash of the remote service.
pub const POLICY_HASH: &str = "2D6A926E3729946302DC68073CB0D550";

/// Fully qualified remote service interface.
pub const SERVICE: &str = "com.cronometer.shared.rpc.CronometerService";
