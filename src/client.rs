//! Client facade and builder
//!
//! [`DropboxClient`] ties the resolved configuration, the HTTP client and
//! the auth manager registry together and hands them to controllers.
//!
//! A client is built with [`DropboxClientBuilder`], whose `build()`
//! rejects missing required settings up front. Calling
//! [`DropboxClient::to_builder`] and building again with the same client
//! id, secret and redirect URI reuses the existing credential store, so the
//! live token carries over. A different triple starts a fresh store and the
//! old token is dropped.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use url::Url;

use crate::auth::{
    generate_state, AuthManagers, AuthorizationCodeAuthManager, CredentialStore, OAuthToken,
};
use crate::config::Config;
use crate::configuration::{ClientConfiguration, Configuration};
use crate::controllers::{FilesController, OAuthAuthorizationController};
use crate::environment::{Environment, Server, DEFAULT_BASEPATH};
use crate::error::{DropboxError, Result};
use crate::http::{HttpClient, HttpClientConfiguration, ReqwestHttpClient};

// ---------------------------------------------------------------------------
// DropboxClient
// ---------------------------------------------------------------------------

/// Entry point to the Dropbox API.
///
/// # Examples
///
/// ```
/// use dropbox_standard::{DropboxClient, Environment};
///
/// let client = DropboxClient::builder()
///     .environment(Environment::Production)
///     .authorization_code_auth("abc", "xyz", "https://app/cb")
///     .build()
///     .unwrap();
///
/// assert_eq!(client.basepath(), "api.dropboxapi.com");
/// ```
pub struct DropboxClient {
    config: Arc<ClientConfiguration>,
    http: Arc<dyn HttpClient>,
    auth_managers: AuthManagers,
    scope: Option<String>,
    files: OnceLock<FilesController>,
    oauth_authorization: OnceLock<OAuthAuthorizationController>,
}

impl DropboxClient {
    /// Starts a builder with default settings.
    pub fn builder() -> DropboxClientBuilder {
        DropboxClientBuilder::default()
    }

    /// Builds a client from `DROPBOX_STANDARD_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`DropboxError::Argument`] if the OAuth credentials are not
    /// all set, and [`DropboxError::Config`] if the resulting configuration
    /// fails validation.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env_vars();
        config.validate()?;
        DropboxClientBuilder::from_config(&config).build()
    }

    /// Returns a builder preloaded with this client's settings, credential
    /// store and HTTP client.
    ///
    /// The HTTP client is reused only if the HTTP configuration is left
    /// unchanged. The token is not copied. It carries over only through the reused
    /// credential store, which requires an unchanged credential triple.
    pub fn to_builder(&self) -> DropboxClientBuilder {
        let store = self.authorization_code_auth();
        DropboxClientBuilder {
            environment: self.config.environment,
            basepath: self.config.basepath.clone(),
            client_id: store.client_id().to_string(),
            client_secret: store.client_secret().to_string(),
            redirect_uri: store.redirect_uri().to_string(),
            oauth_token: None,
            token_overridden: false,
            authorization_code: None,
            scope: self.scope.clone(),
            server_overrides: self.config.server_overrides.clone(),
            http_client_config: self.config.http_client_config.clone(),
            http_client: None,
            inherited_http_client: Some((
                self.config.http_client_config.clone(),
                Arc::clone(&self.http),
            )),
            auth_managers: Some(self.auth_managers.clone()),
        }
    }

    pub fn environment(&self) -> Environment {
        self.config.environment
    }

    pub fn basepath(&self) -> &str {
        &self.config.basepath
    }

    pub fn http_client_config(&self) -> &HttpClientConfiguration {
        &self.config.http_client_config
    }

    /// Base URL for `server` in the current environment.
    pub fn base_uri(&self, server: Server) -> String {
        self.config.base_uri(server)
    }

    /// Credentials used by the `global` scheme.
    pub fn authorization_code_auth(&self) -> &Arc<CredentialStore> {
        self.auth_managers.global().credentials()
    }

    /// Manager behind the `global` scheme.
    pub fn authorization_code_auth_manager(&self) -> &Arc<AuthorizationCodeAuthManager> {
        self.auth_managers.global()
    }

    pub fn auth_managers(&self) -> &AuthManagers {
        &self.auth_managers
    }

    /// Authorization URL for this client's credentials.
    ///
    /// A random state is generated when `state` is `None`. The state used
    /// is returned alongside the URL.
    ///
    /// # Errors
    ///
    /// Returns [`DropboxError::Config`] if the `Auth` server URL is invalid.
    pub fn authorization_url(&self, state: Option<&str>) -> Result<(Url, String)> {
        let state = state.map(str::to_string).unwrap_or_else(generate_state);
        let store = self.authorization_code_auth();
        let url = self.oauth_authorization().authorization_url(
            store.client_id(),
            store.redirect_uri(),
            self.scope.as_deref(),
            &state,
        )?;
        Ok((url, state))
    }

    /// Controller for `/file_requests` calls.
    pub fn files(&self) -> &FilesController {
        self.files.get_or_init(|| {
            FilesController::new(
                self.configuration(),
                Arc::clone(&self.http),
                self.auth_managers.clone(),
            )
        })
    }

    /// Controller for the OAuth 2 token endpoint.
    pub fn oauth_authorization(&self) -> &OAuthAuthorizationController {
        self.oauth_authorization.get_or_init(|| {
            OAuthAuthorizationController::new(self.configuration(), Arc::clone(&self.http))
        })
    }

    fn configuration(&self) -> Arc<dyn Configuration> {
        Arc::clone(&self.config) as Arc<dyn Configuration>
    }
}

impl Configuration for DropboxClient {
    fn environment(&self) -> Environment {
        self.config.environment
    }

    fn basepath(&self) -> &str {
        &self.config.basepath
    }

    fn http_client_config(&self) -> &HttpClientConfiguration {
        &self.config.http_client_config
    }

    fn base_uri(&self, server: Server) -> String {
        self.config.base_uri(server)
    }
}

impl fmt::Debug for DropboxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropboxClient")
            .field("config", &self.config)
            .field("http", &self.http)
            .field("auth_managers", &self.auth_managers)
            .finish()
    }
}

impl fmt::Display for DropboxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DropboxClient(environment = {}, basepath = {}, {})",
            self.config.environment, self.config.basepath, self.config.http_client_config
        )
    }
}

// ---------------------------------------------------------------------------
// DropboxClientBuilder
// ---------------------------------------------------------------------------

/// Pending settings for a [`DropboxClient`].
#[derive(Debug, Clone)]
pub struct DropboxClientBuilder {
    environment: Environment,
    basepath: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    oauth_token: Option<OAuthToken>,
    token_overridden: bool,
    authorization_code: Option<String>,
    scope: Option<String>,
    server_overrides: BTreeMap<Server, String>,
    http_client_config: HttpClientConfiguration,
    http_client: Option<Arc<dyn HttpClient>>,
    /// Transport of the client this builder came from, with the config it
    /// was built for. Reused only while `http_client_config` still matches.
    inherited_http_client: Option<(HttpClientConfiguration, Arc<dyn HttpClient>)>,
    auth_managers: Option<AuthManagers>,
}

impl Default for DropboxClientBuilder {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            basepath: DEFAULT_BASEPATH.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            oauth_token: None,
            token_overridden: false,
            authorization_code: None,
            scope: None,
            server_overrides: BTreeMap::new(),
            http_client_config: HttpClientConfiguration::default(),
            http_client: None,
            inherited_http_client: None,
            auth_managers: None,
        }
    }
}

impl DropboxClientBuilder {
    /// Preloads a builder from a loaded [`Config`].
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::default()
            .environment(config.environment)
            .basepath(config.basepath.clone())
            .authorization_code_auth(
                config.oauth.client_id.clone(),
                config.oauth.client_secret.clone(),
                config.oauth.redirect_uri.clone(),
            )
            .scope(config.oauth.scope.clone())
            .http_client_config(HttpClientConfiguration {
                timeout: Duration::from_secs(config.http.timeout_seconds),
                user_agent: config
                    .http
                    .user_agent
                    .clone()
                    .unwrap_or_else(crate::http::client::default_user_agent),
            });

        for (server, url) in config.servers.overrides() {
            builder = builder.server_url(server, url);
        }
        builder
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn basepath(mut self, basepath: impl Into<String>) -> Self {
        self.basepath = basepath.into();
        self
    }

    /// Sets the credential triple for the authorization-code grant.
    pub fn authorization_code_auth(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        self.client_id = client_id.into();
        self.client_secret = client_secret.into();
        self.redirect_uri = redirect_uri.into();
        self
    }

    /// Sets the token the built client starts with.
    ///
    /// This replaces the token of a reused credential store.
    pub fn oauth_token(mut self, token: Option<OAuthToken>) -> Self {
        self.oauth_token = token;
        self.token_overridden = true;
        self
    }

    /// Sets an authorization code to exchange on the first authorized call.
    pub fn authorization_code(mut self, code: impl Into<String>) -> Self {
        self.authorization_code = Some(code.into());
        self
    }

    /// Sets the scope requested on refresh and in authorization URLs.
    pub fn scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    /// Overrides the URL template of one server alias.
    pub fn server_url(mut self, server: Server, url: impl Into<String>) -> Self {
        self.server_overrides.insert(server, url.into());
        self
    }

    pub fn http_client_config(mut self, config: HttpClientConfiguration) -> Self {
        self.http_client_config = config;
        self
    }

    /// Uses `client` instead of building a [`ReqwestHttpClient`].
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`DropboxError::Argument`] if the base path, client id,
    /// client secret or redirect URI is empty, and
    /// [`DropboxError::Http`] if the default HTTP client cannot be created.
    pub fn build(self) -> Result<DropboxClient> {
        self.validate()?;

        let config = Arc::new(ClientConfiguration {
            environment: self.environment,
            basepath: self.basepath,
            http_client_config: self.http_client_config,
            server_overrides: self.server_overrides,
        });

        let inherited = self
            .inherited_http_client
            .filter(|(built_for, _)| *built_for == config.http_client_config)
            .map(|(_, client)| client);
        let http: Arc<dyn HttpClient> = match self.http_client.or(inherited) {
            Some(client) => client,
            None => Arc::new(ReqwestHttpClient::new(config.http_client_config.clone())?),
        };

        let reusable = self
            .auth_managers
            .map(|managers| Arc::clone(managers.global().credentials()))
            .filter(|store| store.equals(&self.client_id, &self.client_secret, &self.redirect_uri));

        let store = match reusable {
            Some(store) => {
                tracing::debug!(client_id = %self.client_id, "Reusing credential store");
                if self.token_overridden {
                    store.set_oauth_token(self.oauth_token);
                }
                store
            }
            None => {
                let store = CredentialStore::new(self.client_id, self.client_secret, self.redirect_uri);
                store.set_oauth_token(self.oauth_token);
                Arc::new(store)
            }
        };

        if let Some(code) = self.authorization_code {
            store.set_authorization_code(code);
        }

        let dyn_config = Arc::clone(&config) as Arc<dyn Configuration>;
        let invoker = OAuthAuthorizationController::new(dyn_config, Arc::clone(&http));
        let manager = AuthorizationCodeAuthManager::new(store, invoker).with_scope(self.scope.clone());

        Ok(DropboxClient {
            config,
            http,
            auth_managers: AuthManagers::new(Arc::new(manager)),
            scope: self.scope,
            files: OnceLock::new(),
            oauth_authorization: OnceLock::new(),
        })
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("basepath", &self.basepath),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("redirect_uri", &self.redirect_uri),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(DropboxError::Argument(format!("{name} cannot be empty")).into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenState;
    use crate::test_utils::{
        assert_error_contains, test_config, TEST_CLIENT_ID, TEST_CLIENT_SECRET, TEST_REDIRECT_URI,
    };

    fn builder() -> DropboxClientBuilder {
        DropboxClient::builder().authorization_code_auth("abc", "xyz", "https://app/cb")
    }

    fn argument_error(result: Result<DropboxClient>) -> String {
        match result {
            Ok(_) => panic!("expected argument error"),
            Err(err) => match err.downcast_ref::<DropboxError>() {
                Some(DropboxError::Argument(msg)) => msg.clone(),
                other => panic!("expected Argument error, got {other:?}"),
            },
        }
    }

    #[test]
    fn test_build_defaults() {
        let client = builder().build().unwrap();
        assert_eq!(client.environment(), Environment::Production);
        assert_eq!(client.basepath(), DEFAULT_BASEPATH);
        assert_eq!(client.base_uri(Server::Default), "https://api.dropboxapi.com/2");
        assert_eq!(
            client.base_uri(Server::TokenAuth),
            "https://api.dropbox.com/oauth2"
        );
        assert_eq!(
            client.authorization_code_auth().token_state(),
            TokenState::NoToken
        );
    }

    #[test]
    fn test_build_rejects_missing_values() {
        assert!(argument_error(DropboxClient::builder().build()).contains("client_id"));
        assert!(argument_error(builder().basepath("").build()).contains("basepath"));
        assert!(argument_error(
            DropboxClient::builder()
                .authorization_code_auth("abc", "", "https://app/cb")
                .build()
        )
        .contains("client_secret"));
        assert!(argument_error(
            DropboxClient::builder()
                .authorization_code_auth("abc", "xyz", " ")
                .build()
        )
        .contains("redirect_uri"));
    }

    #[test]
    fn test_rebuild_with_same_triple_reuses_store() {
        let client = builder()
            .oauth_token(Some(OAuthToken::new("tok1", "bearer")))
            .build()
            .unwrap();
        let rebuilt = client.to_builder().basepath("content.dropboxapi.com").build().unwrap();

        assert!(Arc::ptr_eq(
            client.authorization_code_auth(),
            rebuilt.authorization_code_auth()
        ));
        assert_eq!(rebuilt.basepath(), "content.dropboxapi.com");

        // A later refresh on one client is visible to the other.
        client
            .authorization_code_auth()
            .set_oauth_token(Some(OAuthToken::new("tok2", "bearer")));
        assert_eq!(
            rebuilt.authorization_code_auth().oauth_token().unwrap().access_token,
            "tok2"
        );
    }

    #[test]
    fn test_rebuild_with_different_triple_discards_token() {
        let client = builder()
            .oauth_token(Some(OAuthToken::new("tok1", "bearer")))
            .build()
            .unwrap();
        let rebuilt = client
            .to_builder()
            .authorization_code_auth("abc", "other-secret", "https://app/cb")
            .build()
            .unwrap();

        assert!(!Arc::ptr_eq(
            client.authorization_code_auth(),
            rebuilt.authorization_code_auth()
        ));
        assert!(rebuilt.authorization_code_auth().oauth_token().is_none());
    }

    #[test]
    fn test_rebuild_with_explicit_token_overrides_reused_store() {
        let client = builder()
            .oauth_token(Some(OAuthToken::new("tok1", "bearer")))
            .build()
            .unwrap();
        let rebuilt = client
            .to_builder()
            .oauth_token(Some(OAuthToken::new("explicit", "bearer")))
            .build()
            .unwrap();

        assert!(Arc::ptr_eq(
            client.authorization_code_auth(),
            rebuilt.authorization_code_auth()
        ));
        assert_eq!(
            client.authorization_code_auth().oauth_token().unwrap().access_token,
            "explicit"
        );
    }

    #[test]
    fn test_rebuild_keeps_transport_only_for_same_http_config() {
        let client = builder().build().unwrap();

        let same = client.to_builder().basepath("content.dropboxapi.com").build().unwrap();
        assert!(Arc::ptr_eq(&client.http, &same.http));

        let faster = client
            .to_builder()
            .http_client_config(HttpClientConfiguration {
                timeout: Duration::from_secs(1),
                ..HttpClientConfiguration::default()
            })
            .build()
            .unwrap();
        assert!(!Arc::ptr_eq(&client.http, &faster.http));
        assert_eq!(faster.http_client_config().timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_explicit_http_client_wins_over_inherited_one() {
        let client = builder().build().unwrap();
        let custom: Arc<dyn HttpClient> =
            Arc::new(ReqwestHttpClient::new(HttpClientConfiguration::default()).unwrap());

        let rebuilt = client
            .to_builder()
            .http_client(Arc::clone(&custom))
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(&custom, &rebuilt.http));
    }

    #[test]
    fn test_lazy_controllers_are_cached() {
        let client = builder().build().unwrap();
        assert!(std::ptr::eq(client.files(), client.files()));
        assert!(std::ptr::eq(
            client.oauth_authorization(),
            client.oauth_authorization()
        ));
    }

    #[test]
    fn test_authorization_url_uses_credentials() {
        let client = builder()
            .scope(Some("files.metadata.read".to_string()))
            .build()
            .unwrap();
        let (url, state) = client.authorization_url(None).unwrap();

        assert_eq!(url.host_str(), Some("www.dropbox.com"));
        let query: BTreeMap<String, String> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(query["client_id"], "abc");
        assert_eq!(query["redirect_uri"], "https://app/cb");
        assert_eq!(query["scope"], "files.metadata.read");
        assert_eq!(query["state"], state);
    }

    #[test]
    fn test_from_config() {
        let mut config = test_config();
        config.basepath = "content.dropboxapi.com".to_string();
        config.http.timeout_seconds = 30;
        config.servers.token_auth = Some("http://127.0.0.1:8080/oauth2".to_string());

        let client = DropboxClientBuilder::from_config(&config).build().unwrap();
        assert_eq!(client.basepath(), "content.dropboxapi.com");
        assert_eq!(client.http_client_config().timeout, Duration::from_secs(30));
        assert_eq!(
            client.base_uri(Server::TokenAuth),
            "http://127.0.0.1:8080/oauth2"
        );
        assert!(client
            .authorization_code_auth()
            .equals(TEST_CLIENT_ID, TEST_CLIENT_SECRET, TEST_REDIRECT_URI));
    }

    #[test]
    fn test_from_config_without_credentials_fails() {
        assert_error_contains(
            DropboxClientBuilder::from_config(&Config::default()).build(),
            "client_id cannot be empty",
        );
    }

    #[test]
    fn test_display() {
        let client = builder().build().unwrap();
        let shown = client.to_string();
        assert!(shown.starts_with("DropboxClient(environment = production, basepath = api.dropboxapi.com"));
        assert!(shown.contains("HttpClientConfiguration(timeout = 100s"));
    }
}
