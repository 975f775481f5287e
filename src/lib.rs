//! API Harness - data-driven HTTP API testing
//!
//! Resolves logical endpoint names from a YAML configuration into URLs,
//! sends requests to them, and replays declarative YAML test cases against
//! the responses.

pub mod cli;
pub mod client;
pub mod commands;
pub mod common;
pub mod testing;

// Re-export commonly used types for tests
pub use client::{ApiClient, HttpMethod, Params, Response};
pub use common::{Error, Result};
