//! Test case records
//!
//! Defines the data structures for deserializing YAML test data files.

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::client::{Headers, Params};
use crate::common::{Error, Result};

/// A test data file
#[derive(Deserialize, Debug, Default)]
pub struct TestSuite {
    /// Test cases, run in file order
    #[serde(default, deserialize_with = "null_as_default")]
    pub tests: Vec<TestCase>,
}

/// One request plus the assertions on its response
#[derive(Deserialize, Debug, Clone)]
pub struct TestCase {
    /// Human-readable name, prefixed to every failure message
    pub name: String,
    /// HTTP method (get, post, put, delete; any case)
    pub method: String,
    /// Logical endpoint name from the configuration file
    pub endpoint: String,
    /// Path placeholder values
    #[serde(default, deserialize_with = "null_as_default")]
    pub params: Params,
    /// Query string parameters
    #[serde(default)]
    pub query: Option<Params>,
    /// JSON body for POST/PUT
    #[serde(default)]
    pub payload: Option<Value>,
    /// Extra request headers
    #[serde(default)]
    pub headers: Option<Headers>,
    /// Exact expected status code
    pub expected_status: u16,
    /// Top-level keys the JSON object response must contain
    pub expected_keys: Option<Vec<String>>,
    /// Minimum length of a JSON array response
    pub expected_min_length: Option<usize>,
}

// `params:` with no value parses as null
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl TestSuite {
    /// Parse a test data document; an empty document is an empty suite
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let blank = content.lines().all(|line| {
            let line = line.trim();
            line.is_empty() || line.starts_with('#')
        });
        if blank {
            return Ok(Self::default());
        }
        serde_yaml::from_str::<Option<TestSuite>>(content)
            .map(Option::unwrap_or_default)
            .map_err(|e| Error::Config(format!("Failed to parse test data: {}", e)))
    }
}

/// Load test cases from a YAML file, in file order
pub fn load_test_cases(path: &Path) -> Result<Vec<TestCase>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    Ok(TestSuite::from_yaml_str(&content)?.tests)
}
