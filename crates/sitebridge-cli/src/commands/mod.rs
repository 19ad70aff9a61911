//! Subcommand implementations.

pub mod export;
pub mod login;
pub mod status;
pub mod token;
pub mod watch;
