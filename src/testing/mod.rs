//! Declarative test runner
//!
//! Reads test cases from a YAML data file and replays them through the
//! [`ApiClient`](crate::client::ApiClient), checking status codes and the
//! shape of JSON responses.

mod config;
mod runner;

pub use config::*;
pub use runner::*;
