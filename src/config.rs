//! Configuration management for the Dropbox client
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! Precedence, lowest first: built-in defaults, the YAML file, the
//! `DROPBOX_STANDARD_*` environment variables, then command-line flags.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::environment::{expand_template, Environment, Server, DEFAULT_BASEPATH};
use crate::error::{DropboxError, Result};

/// Main configuration structure
///
/// # Examples
///
/// ```
/// use dropbox_standard::config::Config;
///
/// let config: Config = serde_yaml::from_str(
///     "oauth:\n  client_id: abc\n  client_secret: xyz\n  redirect_uri: https://app/cb\n",
/// )
/// .unwrap();
/// assert_eq!(config.basepath, "api.dropboxapi.com");
/// assert_eq!(config.http.timeout_seconds, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// API environment
    #[serde(default)]
    pub environment: Environment,

    /// Base path of the Dropbox API server
    #[serde(default = "default_basepath")]
    pub basepath: String,

    /// OAuth 2 client credentials
    #[serde(default)]
    pub oauth: OAuthConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Server URL overrides, mainly for pointing at a local mock
    #[serde(default)]
    pub servers: ServersConfig,
}

fn default_basepath() -> String {
    DEFAULT_BASEPATH.to_string()
}

/// OAuth 2 client credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// OAuth 2 client id (app key)
    #[serde(default)]
    pub client_id: String,

    /// OAuth 2 client secret (app secret)
    #[serde(default)]
    pub client_secret: String,

    /// Redirect URI registered for the app
    #[serde(default)]
    pub redirect_uri: String,

    /// Space-delimited scopes to request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Overrides the default `user-agent`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_timeout_seconds() -> u64 {
    100
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: None,
        }
    }
}

/// Per-alias server URL templates that replace the environment's
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServersConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_auth: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

impl ServersConfig {
    /// Configured overrides as `(alias, template)` pairs.
    pub fn overrides(&self) -> Vec<(Server, String)> {
        [
            (Server::Default, &self.default),
            (Server::TokenAuth, &self.token_auth),
            (Server::Auth, &self.auth),
        ]
        .into_iter()
        .filter_map(|(server, url)| url.clone().map(|u| (server, u)))
        .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            basepath: default_basepath(),
            oauth: OAuthConfig::default(),
            http: HttpConfig::default(),
            servers: ServersConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, environment, and CLI
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns [`DropboxError::Config`] if the file exists but cannot be
    /// read or parsed.
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DropboxError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| DropboxError::Config(format!("Failed to parse config: {}", e)).into())
    }

    /// Applies `DROPBOX_STANDARD_*` environment variables.
    ///
    /// The three OAuth credential variables are applied together, and only
    /// when all three are set. Unparseable values are logged and ignored.
    pub fn apply_env_vars(&mut self) {
        if let Ok(environment) = std::env::var("DROPBOX_STANDARD_ENVIRONMENT") {
            match environment.parse::<Environment>() {
                Ok(value) => self.environment = value,
                Err(_) => tracing::warn!("Invalid DROPBOX_STANDARD_ENVIRONMENT: {}", environment),
            }
        }

        if let Ok(basepath) = std::env::var("DROPBOX_STANDARD_BASEPATH") {
            self.basepath = basepath;
        }

        if let (Ok(client_id), Ok(client_secret), Ok(redirect_uri)) = (
            std::env::var("DROPBOX_STANDARD_O_AUTH_CLIENT_ID"),
            std::env::var("DROPBOX_STANDARD_O_AUTH_CLIENT_SECRET"),
            std::env::var("DROPBOX_STANDARD_O_AUTH_REDIRECT_URI"),
        ) {
            self.oauth.client_id = client_id;
            self.oauth.client_secret = client_secret;
            self.oauth.redirect_uri = redirect_uri;
        }

        if let Ok(timeout) = std::env::var("DROPBOX_STANDARD_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.http.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid DROPBOX_STANDARD_TIMEOUT_SECONDS: {}", timeout);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(basepath) = &cli.basepath {
            self.basepath = basepath.clone();
        }

        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// Checks value ranges and that every configured URL parses. Empty
    /// OAuth credentials are allowed here; building a client rejects them.
    ///
    /// # Errors
    ///
    /// Returns [`DropboxError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.basepath.trim().is_empty() {
            return Err(DropboxError::Config("basepath cannot be empty".to_string()).into());
        }

        if self.http.timeout_seconds == 0 {
            return Err(
                DropboxError::Config("timeout_seconds must be greater than 0".to_string()).into(),
            );
        }

        if self.http.timeout_seconds > 3600 {
            return Err(DropboxError::Config(
                "timeout_seconds must be less than or equal to 3600".to_string(),
            )
            .into());
        }

        if !self.oauth.redirect_uri.is_empty() {
            url::Url::parse(&self.oauth.redirect_uri).map_err(|e| {
                DropboxError::Config(format!(
                    "Invalid redirect_uri '{}': {}",
                    self.oauth.redirect_uri, e
                ))
            })?;
        }

        for (server, template) in self.servers.overrides() {
            let expanded = expand_template(&template, &self.basepath);
            url::Url::parse(&expanded).map_err(|e| {
                DropboxError::Config(format!("Invalid URL for server {:?}: {}", server, e))
            })?;
        }

        Ok(())
    }
}
