//! HTTP request dispatch
//!
//! [`ApiClient`] resolves logical endpoint names through the selected
//! [`EnvironmentConfig`] and sends blocking requests with a fixed timeout.
//! Every status code comes back as a [`Response`]; only failures to complete
//! the exchange are errors. Nothing is retried.

mod method;
mod params;
mod response;

pub use method::{HttpMethod, UnsupportedMethod};
pub use params::{ParamValue, Params};
pub use response::Response;

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

use crate::common::config::EnvironmentConfig;
use crate::common::logging::Logger;
use crate::common::{Error, Result};

/// Timeout applied to every request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Extra request headers by name
pub type Headers = BTreeMap<String, String>;

/// Sends requests to the endpoints of one environment
pub struct ApiClient {
    env: EnvironmentConfig,
    http: reqwest::blocking::Client,
    logger: Logger,
}

impl ApiClient {
    /// Create a client for the given environment
    pub fn new(env: EnvironmentConfig, logger: Logger) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("api-harness/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::ClientBuild)?;
        Ok(Self { env, http, logger })
    }

    pub fn environment(&self) -> &EnvironmentConfig {
        &self.env
    }

    /// Send a request to a logical endpoint
    ///
    /// Placeholders are filled from `query` overlaid by `path_params`;
    /// `query` is also sent unchanged as the query string. `payload` is sent
    /// as a JSON body.
    pub fn send(
        &self,
        method: HttpMethod,
        endpoint: &str,
        query: Option<&Params>,
        payload: Option<&Value>,
        headers: Option<&Headers>,
        path_params: &Params,
    ) -> Result<Response> {
        let url = match query {
            Some(query) if !query.is_empty() => self
                .env
                .resolve_endpoint(endpoint, &query.merged(path_params))?,
            _ => self.env.resolve_endpoint(endpoint, path_params)?,
        };

        self.logger.scope(|| {
            tracing::info!("Sending {} request to {}", method, url);
            if let Some(query) = query.filter(|q| !q.is_empty()) {
                tracing::debug!("Query params: {}", query);
            }
            if let Some(payload) = payload.filter(|p| !is_empty_payload(p)) {
                tracing::debug!("Payload: {}", payload);
            }
        });

        let mut builder = self.http.request(method.into(), &url);
        if let Some(query) = query {
            builder = builder.query(query);
        }
        if let Some(payload) = payload {
            builder = builder.json(payload);
        }
        if let Some(headers) = headers {
            for (name, value) in headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }

        let result = builder
            .send()
            .and_then(Response::from_blocking)
            .map_err(|source| Error::Transport {
                method: method.to_string(),
                url: url.clone(),
                source,
            });

        match result {
            Ok(response) => {
                self.logger.scope(|| {
                    tracing::info!("Received response with status {}", response.status())
                });
                Ok(response)
            }
            Err(e) => {
                self.logger
                    .scope(|| tracing::error!("HTTP request failed: {}", e));
                Err(e)
            }
        }
    }

    pub fn get(
        &self,
        endpoint: &str,
        query: Option<&Params>,
        headers: Option<&Headers>,
        path_params: &Params,
    ) -> Result<Response> {
        self.send(HttpMethod::Get, endpoint, query, None, headers, path_params)
    }

    pub fn post(
        &self,
        endpoint: &str,
        payload: Option<&Value>,
        headers: Option<&Headers>,
        path_params: &Params,
    ) -> Result<Response> {
        self.send(HttpMethod::Post, endpoint, None, payload, headers, path_params)
    }

    pub fn put(
        &self,
        endpoint: &str,
        payload: Option<&Value>,
        headers: Option<&Headers>,
        path_params: &Params,
    ) -> Result<Response> {
        self.send(HttpMethod::Put, endpoint, None, payload, headers, path_params)
    }

    pub fn delete(
        &self,
        endpoint: &str,
        headers: Option<&Headers>,
        path_params: &Params,
    ) -> Result<Response> {
        self.send(HttpMethod::Delete, endpoint, None, None, headers, path_params)
    }
}

// Mirrors the truthiness check used for the debug line: null, {} and [] are not logged
fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::{ConfigFile, LoggingConfig};
    use crate::common::logging::LogProvider;

    fn client() -> ApiClient {
        let env = ConfigFile::from_yaml_str(
            "environments:\n  dev:\n    base_url: http://127.0.0.1:9/\nendpoints:\n  get_user: /users/{id}\n",
        )
        .unwrap()
        .select_environment(None)
        .unwrap();
        ApiClient::new(env, Logger::noop()).unwrap()
    }

    #[test]
    fn test_unknown_endpoint_fails_before_sending() {
        let err = client()
            .get("nope", None, None, &Params::new())
            .unwrap_err();
        assert!(matches!(err, Error::EndpointNotFound(_)));
    }

    #[test]
    fn test_missing_path_param_fails_before_sending() {
        let err = client()
            .delete("get_user", None, &Params::new())
            .unwrap_err();
        assert!(matches!(err, Error::MissingParameter { ref param, .. } if param == "id"));
    }

    #[test]
    fn test_query_params_can_fill_placeholders() {
        let client = client();
        let query = Params::new().with("id", 5);
        // Port 9 (discard) is normally closed, so this ends as a transport error,
        // which proves resolution succeeded.
        let err = client
            .get("get_user", Some(&query), None, &Params::new())
            .unwrap_err();
        assert!(matches!(err, Error::Transport { ref url, .. } if url == "http://127.0.0.1:9/users/5"));
    }

    #[test]
    fn test_debug_log_lines_for_query_and_payload() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.log");
        let config = LoggingConfig {
            level: "debug".to_string(),
            file: Some(path.clone()),
            ..LoggingConfig::default()
        };

        {
            let provider = LogProvider::init(&config).unwrap();
            let env = client().environment().clone();
            let client = ApiClient::new(env, provider.logger("api_client")).unwrap();

            let query = Params::new().with("q", 1);
            let _ = client.get("get_user", Some(&query), None, &Params::new().with("id", 1));
            let _ = client.post(
                "get_user",
                Some(&serde_json::json!({"a": 1})),
                None,
                &Params::new().with("id", 2),
            );
            let _ = client.put(
                "get_user",
                Some(&serde_json::json!({})),
                None,
                &Params::new().with("id", 3),
            );
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Sending GET request to http://127.0.0.1:9/users/1"));
        assert!(content.contains("Query params: {q: 1}"), "{content}");
        assert!(content.contains(r#"Payload: {"a":1}"#), "{content}");
        assert_eq!(content.matches("Payload:").count(), 1, "{content}");
        assert!(content.contains("Sending PUT request to http://127.0.0.1:9/users/3"));
        assert!(content.contains("HTTP request failed"));
    }

    #[test]
    fn test_empty_payload_detection() {
        assert!(is_empty_payload(&Value::Null));
        assert!(is_empty_payload(&serde_json::json!({})));
        assert!(!is_empty_payload(&serde_json::json!({"a": 1})));
        assert!(!is_empty_payload(&serde_json::json!(0)));
    }
}
