//! Per-user configuration paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/api-harness/`
//! - macOS: `~/Library/Application Support/api-harness/`
//! - Windows: `%APPDATA%\api-harness\`

use std::path::PathBuf;

const APP_NAME: &str = "api-harness";

/// Default configuration file name, looked up in the working directory first
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Default test data file
pub const TEST_DATA_PATH: &str = "data/test_data.yaml";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the fallback configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_ends_with_file_name() {
        if let Some(path) = config_path() {
            assert!(path.ends_with(CONFIG_FILE_NAME));
        }
    }
}
