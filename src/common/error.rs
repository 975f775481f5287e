//! Error types for the API harness
//!
//! Configuration errors are fatal and abort a run before any request is
//! sent. Transport and decode errors only abort the test case that hit them.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the API harness
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Environment '{name}' not defined in configuration. Known environments: {known}")]
    EnvironmentNotFound { name: String, known: String },

    #[error("Invalid path template for endpoint '{endpoint}': {reason}")]
    InvalidTemplate { endpoint: String, reason: String },

    // === Resolution Errors ===
    #[error("Endpoint '{0}' not found in configuration")]
    EndpointNotFound(String),

    #[error("Missing parameter '{param}' for endpoint '{endpoint}'")]
    MissingParameter { endpoint: String, param: String },

    // === Transport Errors ===
    #[error("HTTP {method} {url} failed: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    // === Decode Errors ===
    #[error("Response body is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    // === IO Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },
}

impl Error {
    /// Create an environment not found error listing the known environments
    pub fn environment_not_found<S: AsRef<str>>(name: &str, known: &[S]) -> Self {
        Self::EnvironmentNotFound {
            name: name.to_string(),
            known: known.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", "),
        }
    }

    /// Create a missing parameter error
    pub fn missing_parameter(endpoint: &str, param: &str) -> Self {
        Self::MissingParameter {
            endpoint: endpoint.to_string(),
            param: param.to_string(),
        }
    }

    /// Create an invalid template error
    pub fn invalid_template(endpoint: &str, reason: &str) -> Self {
        Self::InvalidTemplate {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error means the configuration itself is unusable.
    ///
    /// These abort the whole run rather than a single test case.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::ConfigParse(_)
                | Error::EnvironmentNotFound { .. }
                | Error::InvalidTemplate { .. }
                | Error::EndpointNotFound(_)
                | Error::FileRead { .. }
                | Error::ClientBuild(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_names_placeholder() {
        let err = Error::missing_parameter("get_user", "id");
        assert_eq!(
            err.to_string(),
            "Missing parameter 'id' for endpoint 'get_user'"
        );
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_environment_not_found_lists_known() {
        let err = Error::environment_not_found("qa", &["dev", "prod"]);
        assert!(err.to_string().contains("'qa'"));
        assert!(err.to_string().contains("dev, prod"));
        assert!(err.is_configuration());
    }
}
