//! API environments and server URL table
//!
//! Each [`Environment`] maps every [`Server`] alias to a URL template. The
//! only template parameter is `{basepath}`, substituted from the client
//! configuration when a base URI is resolved.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DropboxError;

/// Base path used when none is configured.
pub const DEFAULT_BASEPATH: &str = "api.dropboxapi.com";

/// Available API environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Dropbox production servers.
    #[default]
    Production,
}

impl Environment {
    /// URL template for `server` in this environment.
    pub fn url_template(&self, server: Server) -> &'static str {
        match (self, server) {
            (Self::Production, Server::Default) => "https://{basepath}/2",
            (Self::Production, Server::TokenAuth) => "https://api.dropbox.com/oauth2",
            (Self::Production, Server::Auth) => "https://www.dropbox.com/oauth2",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
        }
    }
}

impl FromStr for Environment {
    type Err = DropboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            other => Err(DropboxError::Config(format!(
                "Unknown environment '{other}'. Valid environments: production"
            ))),
        }
    }
}

/// Server aliases an endpoint can be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Server {
    /// The API server, `https://{basepath}/2` in production.
    Default,
    /// The OAuth 2 token endpoint host.
    TokenAuth,
    /// The OAuth 2 authorization page host.
    Auth,
}

/// Substitutes `{basepath}` in a server URL template.
///
/// # Examples
///
/// ```
/// use dropbox_standard::environment::expand_template;
///
/// assert_eq!(
///     expand_template("https://{basepath}/2", "api.dropboxapi.com"),
///     "https://api.dropboxapi.com/2"
/// );
/// ```
pub fn expand_template(template: &str, basepath: &str) -> String {
    template.replace("{basepath}", basepath)
}
