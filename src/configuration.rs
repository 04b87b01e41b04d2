//! Resolved client configuration shared with controllers

use std::collections::BTreeMap;
use std::fmt;

use crate::environment::{expand_template, Environment, Server};
use crate::http::HttpClientConfiguration;

/// Read access to the settings a controller needs to build requests.
pub trait Configuration: Send + Sync + fmt::Debug {
    /// Current API environment.
    fn environment(&self) -> Environment;

    /// Base path of the Dropbox API server.
    fn basepath(&self) -> &str;

    /// Settings of the HTTP client in use.
    fn http_client_config(&self) -> &HttpClientConfiguration;

    /// Base URL for `server` with template parameters substituted.
    fn base_uri(&self, server: Server) -> String;
}

/// Immutable configuration captured when a client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfiguration {
    pub(crate) environment: Environment,
    pub(crate) basepath: String,
    pub(crate) http_client_config: HttpClientConfiguration,
    pub(crate) server_overrides: BTreeMap<Server, String>,
}

impl ClientConfiguration {
    /// URL template overrides, keyed by server alias.
    pub fn server_overrides(&self) -> &BTreeMap<Server, String> {
        &self.server_overrides
    }
}

impl Configuration for ClientConfiguration {
    fn environment(&self) -> Environment {
        self.environment
    }

    fn basepath(&self) -> &str {
        &self.basepath
    }

    fn http_client_config(&self) -> &HttpClientConfiguration {
        &self.http_client_config
    }

    fn base_uri(&self, server: Server) -> String {
        let template = self
            .server_overrides
            .get(&server)
            .map(String::as_str)
            .unwrap_or_else(|| self.environment.url_template(server));
        expand_template(template, &self.basepath)
            .trim_end_matches('/')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfiguration {
        ClientConfiguration {
            environment: Environment::Production,
            basepath: "api.dropboxapi.com".to_string(),
            http_client_config: HttpClientConfiguration::default(),
            server_overrides: BTreeMap::new(),
        }
    }

    #[test]
    fn test_base_uri_substitutes_basepath() {
        let mut config = config();
        assert_eq!(
            config.base_uri(Server::Default),
            "https://api.dropboxapi.com/2"
        );
        config.basepath = "content.dropboxapi.com".to_string();
        assert_eq!(
            config.base_uri(Server::Default),
            "https://content.dropboxapi.com/2"
        );
        assert_eq!(
            config.base_uri(Server::TokenAuth),
            "https://api.dropbox.com/oauth2"
        );
    }

    #[test]
    fn test_base_uri_uses_override() {
        let mut config = config();
        config
            .server_overrides
            .insert(Server::TokenAuth, "http://127.0.0.1:9999/oauth2/".to_string());
        assert_eq!(
            config.base_uri(Server::TokenAuth),
            "http://127.0.0.1:9999/oauth2"
        );
        assert_eq!(config.base_uri(Server::Auth), "https://www.dropbox.com/oauth2");
    }
}
