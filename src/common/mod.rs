//! Common utilities shared by the client, the test runner and the CLI

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;
pub mod template;

pub use error::{Error, Result};
