//! Validated value types.
//!
//! These types enforce their invariants at construction time,
//! so invalid values never reach the network layer.

mod base_url;
mod subject_id;

pub use base_url::BaseUrl;
pub use subject_id::SubjectId;
