//! Test utilities
//!
//! Shared fixtures for unit tests: credential-complete configurations,
//! YAML config files in temporary directories, and error assertions.

use crate::config::Config;
use std::path::PathBuf;
use tempfile::TempDir;

/// Client id used by test fixtures
pub const TEST_CLIENT_ID: &str = "abc";
/// Client secret used by test fixtures
pub const TEST_CLIENT_SECRET: &str = "xyz";
/// Redirect URI used by test fixtures
pub const TEST_REDIRECT_URI: &str = "https://app/cb";

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Write `content` to `name` inside `dir`
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error's message contains `expected`
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: crate::error::Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Create a test configuration with the fixture credentials
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.oauth.client_id = TEST_CLIENT_ID.to_string();
    config.oauth.client_secret = TEST_CLIENT_SECRET.to_string();
    config.oauth.redirect_uri = TEST_REDIRECT_URI.to_string();
    config
}

/// Create a test configuration YAML string
pub fn test_config_yaml() -> String {
    r#"
environment: production
basepath: content.dropboxapi.com
oauth:
  client_id: abc
  client_secret: xyz
  redirect_uri: https://app/cb
  scope: files.metadata.read
http:
  timeout_seconds: 30
  user_agent: my-app/2.0
servers:
  token_auth: http://127.0.0.1:8080/oauth2
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "dropbox.yaml", "basepath: x");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "basepath: x");
    }

    #[test]
    fn test_fixture_config_is_valid() {
        let config = test_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.oauth.client_id, TEST_CLIENT_ID);
    }

    #[test]
    fn test_assert_error_contains_matches() {
        let result: crate::error::Result<()> =
            Err(crate::error::DropboxError::Config("invalid basepath".to_string()).into());
        assert_error_contains(result, "invalid basepath");
    }
}
