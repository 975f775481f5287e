//! Configuration file handling
//!
//! The configuration file names the environments (each with a base URL),
//! the default environment, and the logical endpoints with their path
//! templates. The `ENVIRONMENT` variable overrides the default environment.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::paths;
use super::template::PathTemplate;
use super::{Error, Result};
use crate::client::Params;

/// Environment variable that overrides `default_environment`
pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";

/// Configuration file as written on disk
#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    /// Environment used when `ENVIRONMENT` is not set
    #[serde(default = "default_environment")]
    pub default_environment: String,

    /// Environments by name
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentEntry>,

    /// Endpoint path templates by logical name
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,

    /// Log sink settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One entry of the `environments` mapping
#[derive(Debug, Deserialize, Clone)]
pub struct EnvironmentEntry {
    pub base_url: String,
}

fn default_environment() -> String {
    "dev".to_string()
}

/// Log sink settings
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,

    /// Rotating log file; `null` disables file logging
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,

    /// Rotate once the file would grow past this many bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Number of rotated files to keep
    #[serde(default = "default_backup_count")]
    pub backup_count: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: default_log_file(),
            max_bytes: default_max_bytes(),
            backup_count: default_backup_count(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("logs/test.log"))
}
fn default_max_bytes() -> u64 {
    1_000_000
}
fn default_backup_count() -> usize {
    3
}

/// The selected environment with its endpoints, ready for URL resolution
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    name: String,
    base_url: String,
    endpoints: BTreeMap<String, PathTemplate>,
}

impl ConfigFile {
    /// Load the configuration file
    ///
    /// Uses `path` when it is a file, otherwise falls back to `config.yaml`
    /// in the user configuration directory.
    pub fn load(path: &Path) -> Result<Self> {
        let path = if path.is_file() {
            path.to_path_buf()
        } else {
            paths::config_path()
                .filter(|p| p.is_file())
                .ok_or_else(|| Error::FileRead {
                    path: path.display().to_string(),
                    error: "no such file, and no config.yaml in the user config directory"
                        .to_string(),
                })?
        };

        let content = std::fs::read_to_string(&path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Select the environment named by `ENVIRONMENT`, or the default
    pub fn resolve_environment(&self) -> Result<EnvironmentConfig> {
        let from_env = std::env::var(ENVIRONMENT_VAR).ok();
        self.select_environment(from_env.as_deref())
    }

    /// Select the environment named by `override_name`, or the default
    pub fn select_environment(&self, override_name: Option<&str>) -> Result<EnvironmentConfig> {
        let name = override_name.unwrap_or(&self.default_environment);
        let entry = self.environments.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.environments.keys().map(String::as_str).collect();
            Error::environment_not_found(name, &known)
        })?;

        let endpoints = self
            .endpoints
            .iter()
            .map(|(endpoint, raw)| Ok((endpoint.clone(), PathTemplate::parse(endpoint, raw)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(EnvironmentConfig {
            name: name.to_string(),
            base_url: entry.base_url.clone(),
            endpoints,
        })
    }
}

impl EnvironmentConfig {
    /// Name of the selected environment
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base URL exactly as configured
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether `name` is a configured endpoint
    pub fn has_endpoint(&self, name: &str) -> bool {
        self.endpoints.contains_key(name)
    }

    /// Configured endpoints with their templates, ordered by name
    pub fn endpoints(&self) -> impl Iterator<Item = (&str, &PathTemplate)> {
        self.endpoints.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve a logical endpoint name into a full URL
    ///
    /// One trailing `/` is stripped from the base URL; the substituted path
    /// is appended as is.
    pub fn resolve_endpoint(&self, name: &str, params: &Params) -> Result<String> {
        let template = self
            .endpoints
            .get(name)
            .ok_or_else(|| Error::EndpointNotFound(name.to_string()))?;
        let path = template.render(name, params)?;
        let base = self.base_url.strip_suffix('/').unwrap_or(&self.base_url);
        Ok(format!("{base}{path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
default_environment: dev
environments:
  dev:
    base_url: "http://api.test/"
  prod:
    base_url: "https://api.example.com"
endpoints:
  get_user: "/users/{id}"
  list_users: "/users"
  user_post: "/users/{id}/posts/{post_id}"
"#;

    fn dev() -> EnvironmentConfig {
        ConfigFile::from_yaml_str(CONFIG)
            .unwrap()
            .select_environment(None)
            .unwrap()
    }

    #[test]
    fn test_resolve_get_user() {
        let env = dev();
        let url = env
            .resolve_endpoint("get_user", &Params::new().with("id", 42))
            .unwrap();
        assert_eq!(url, "http://api.test/users/42");
    }

    #[test]
    fn test_resolve_missing_id() {
        let err = dev()
            .resolve_endpoint("get_user", &Params::new())
            .unwrap_err();
        assert!(
            matches!(&err, Error::MissingParameter { param, .. } if param == "id"),
            "got {err:?}"
        );
    }

    #[test]
    fn test_unknown_endpoint() {
        let err = dev()
            .resolve_endpoint("delete_everything", &Params::new())
            .unwrap_err();
        assert!(matches!(err, Error::EndpointNotFound(ref n) if n == "delete_everything"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let env = dev();
        let params = Params::new().with("id", 3).with("post_id", "abc");
        let first = env.resolve_endpoint("user_post", &params).unwrap();
        let second = env.resolve_endpoint("user_post", &params).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "http://api.test/users/3/posts/abc");
    }

    #[test]
    fn test_override_selects_other_environment() {
        let config = ConfigFile::from_yaml_str(CONFIG).unwrap();
        let env = config.select_environment(Some("prod")).unwrap();
        assert_eq!(env.name(), "prod");
        assert_eq!(
            env.resolve_endpoint("list_users", &Params::new()).unwrap(),
            "https://api.example.com/users"
        );
    }

    #[test]
    fn test_override_unknown_environment() {
        let config = ConfigFile::from_yaml_str(CONFIG).unwrap();
        let err = config.select_environment(Some("staging")).unwrap_err();
        assert!(matches!(err, Error::EnvironmentNotFound { ref name, .. } if name == "staging"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_only_one_trailing_slash_stripped() {
        let config = ConfigFile::from_yaml_str(
            "environments:\n  dev:\n    base_url: \"http://h//\"\nendpoints:\n  root: /x\n",
        )
        .unwrap();
        let env = config.select_environment(None).unwrap();
        assert_eq!(
            env.resolve_endpoint("root", &Params::new()).unwrap(),
            "http://h//x"
        );
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = ConfigFile::from_yaml_str("environments:\n  dev:\n    base_url: http://h\n")
            .unwrap();
        assert_eq!(config.default_environment, "dev");
        assert!(config.endpoints.is_empty());
        assert_eq!(config.logging.max_bytes, 1_000_000);
        assert_eq!(config.logging.backup_count, 3);
        assert_eq!(config.logging.file, Some(PathBuf::from("logs/test.log")));
    }

    #[test]
    fn test_logging_file_can_be_disabled() {
        let config = ConfigFile::from_yaml_str(
            "environments:\n  dev:\n    base_url: http://h\nlogging:\n  file: null\n  level: debug\n",
        )
        .unwrap();
        assert_eq!(config.logging.file, None);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_malformed_template_is_configuration_error() {
        let config = ConfigFile::from_yaml_str(
            "environments:\n  dev:\n    base_url: http://h\nendpoints:\n  bad: \"/users/{id\"\n",
        )
        .unwrap();
        let err = config.select_environment(None).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        // Only meaningful when the user config dir has no config.yaml either
        if paths::config_path().is_some_and(|p| p.is_file()) {
            return;
        }
        let err = ConfigFile::load(&missing).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
