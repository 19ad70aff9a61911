//! HTTP plumbing shared by every client.

pub mod client;

pub use client::{HttpClient, PageResponse, USER_AGENT};
