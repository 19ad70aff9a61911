//! Core traits for authenticated clients and the operations they run.

mod authenticate;
mod operation;

pub use authenticate::Authenticate;
pub use operation::ProtectedOperation;
