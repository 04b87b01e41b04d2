//! OAuth 2 authorization for outgoing requests
//!
//! Authorized controllers look up an [`AuthManager`] by [`AuthScheme`] and
//! let it decorate each request before it is sent. The only scheme is
//! [`AuthScheme::Global`], backed by the authorization-code grant.
//!
//! # Module layout
//!
//! - [`token`] -- [`OAuthToken`] value and [`TokenState`] classification
//! - [`credentials`] -- [`CredentialStore`] holding the client triple and
//!   the live token
//! - [`manager`] -- [`AuthorizationCodeAuthManager`], the token lifecycle

use std::fmt;
use std::sync::Arc;

use base64::Engine as _;
use rand::RngCore as _;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::http::HttpRequest;

pub mod credentials;
pub mod manager;
pub mod token;

pub use credentials::CredentialStore;
pub use manager::AuthorizationCodeAuthManager;
pub use token::{OAuthToken, TokenState};

/// Decorates outgoing requests with credentials.
#[async_trait::async_trait]
pub trait AuthManager: Send + Sync + fmt::Debug {
    /// Returns `request` with credentials attached, obtaining them first
    /// if needed.
    ///
    /// # Examples
    ///
    /// ```
    /// # tokio_test::block_on(async {
    /// use dropbox_standard::http::HttpRequest;
    /// use dropbox_standard::{AuthManager, AuthScheme, DropboxClient, OAuthToken};
    ///
    /// let client = DropboxClient::builder()
    ///     .authorization_code_auth("abc", "xyz", "https://app/cb")
    ///     .oauth_token(Some(OAuthToken::new("tok1", "bearer")))
    ///     .build()
    ///     .unwrap();
    ///
    /// let request = client
    ///     .auth_managers()
    ///     .get(AuthScheme::Global)
    ///     .apply(HttpRequest::post("https://api.dropboxapi.com/2/file_requests/count"))
    ///     .await
    ///     .unwrap();
    /// assert_eq!(request.header("Authorization"), Some("Bearer tok1"));
    /// # });
    /// ```
    ///
    /// # Errors
    ///
    /// Propagates any failure to obtain credentials.
    async fn apply(&self, request: HttpRequest) -> Result<HttpRequest> {
        self.apply_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Cancellable form of [`AuthManager::apply`].
    async fn apply_with_cancellation(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpRequest>;
}

/// Auth schemes an endpoint can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthScheme {
    /// OAuth 2 authorization-code grant.
    Global,
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
        }
    }
}

/// Registry of auth managers, one per [`AuthScheme`].
#[derive(Debug, Clone)]
pub struct AuthManagers {
    global: Arc<AuthorizationCodeAuthManager>,
}

impl AuthManagers {
    pub fn new(global: Arc<AuthorizationCodeAuthManager>) -> Self {
        Self { global }
    }

    /// Resolves the manager for `scheme`.
    pub fn get(&self, scheme: AuthScheme) -> Arc<dyn AuthManager> {
        match scheme {
            AuthScheme::Global => Arc::clone(&self.global) as Arc<dyn AuthManager>,
        }
    }

    /// The authorization-code manager behind [`AuthScheme::Global`].
    pub fn global(&self) -> &Arc<AuthorizationCodeAuthManager> {
        &self.global
    }
}

/// Generates a random `state` value for the authorization URL.
///
/// 16 random bytes encoded as base64url without padding.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
