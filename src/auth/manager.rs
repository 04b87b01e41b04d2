//! Authorization-code auth manager
//!
//! [`AuthorizationCodeAuthManager`] makes sure a valid token is held before
//! an authorized request leaves the client, then attaches it as a bearer
//! header. The lifecycle is:
//!
//! ```text
//!  NoToken --(exchange code)--> Valid --(now >= expiry)--> Expired
//!                                 ^                           |
//!                                 +-----(refresh grant)-------+
//! ```
//!
//! Grants are serialized per credential store: a caller that finds the
//! token missing or expired takes the store's grant lock and checks the
//! token again before calling the token endpoint. Callers that waited on
//! the lock therefore pick up the token obtained by the first one, so N
//! concurrent callers on an expired token cause exactly one refresh.
//!
//! The store is written only after the token endpoint confirms success.
//! A rejected or cancelled grant leaves whatever token was there before.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::auth::credentials::CredentialStore;
use crate::auth::token::{OAuthToken, TokenState};
use crate::auth::AuthManager;
use crate::controllers::OAuthAuthorizationController;
use crate::error::{DropboxError, Result};
use crate::http::HttpRequest;

/// Auth manager for the `global` scheme.
pub struct AuthorizationCodeAuthManager {
    store: Arc<CredentialStore>,
    invoker: OAuthAuthorizationController,
    scope: Option<String>,
}

impl AuthorizationCodeAuthManager {
    /// Creates a manager over `store` that obtains tokens through
    /// `invoker`.
    pub fn new(store: Arc<CredentialStore>, invoker: OAuthAuthorizationController) -> Self {
        Self {
            store,
            invoker,
            scope: None,
        }
    }

    /// Scope requested on refresh, space-delimited.
    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    /// The credential store this manager writes to.
    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Snapshot of the current token.
    pub fn oauth_token(&self) -> Option<Arc<OAuthToken>> {
        self.store.oauth_token()
    }

    pub fn token_state(&self) -> TokenState {
        self.store.token_state()
    }

    /// Stores an authorization code for the next exchange.
    pub fn set_authorization_code(&self, code: impl Into<String>) {
        self.store.set_authorization_code(code);
    }

    /// Drops the current token.
    pub fn clear_token(&self) {
        self.store.clear_token();
    }

    /// Exchanges `code` for a token right away and stores the result.
    ///
    /// # Errors
    ///
    /// Propagates token endpoint failures; the store is unchanged on error.
    pub async fn fetch_token(&self, code: &str) -> Result<Arc<OAuthToken>> {
        self.fetch_token_with_cancellation(code, &CancellationToken::new())
            .await
    }

    /// Cancellable form of [`Self::fetch_token`].
    ///
    /// # Errors
    ///
    /// Returns [`DropboxError::Cancelled`] if `cancel` fires while waiting
    /// for another grant or during the exchange.
    pub async fn fetch_token_with_cancellation(
        &self,
        code: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<OAuthToken>> {
        let _grant = self.acquire_grant(cancel).await?;
        self.exchange(code, cancel).await
    }

    /// Returns a valid token, running a grant if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DropboxError::Authorization`] when there is no token and
    /// no authorization code, or the token is expired and carries no
    /// refresh token. Token endpoint failures propagate unchanged.
    pub async fn ensure_token(&self, cancel: &CancellationToken) -> Result<Arc<OAuthToken>> {
        if let Some(token) = self.valid_token() {
            return Ok(token);
        }

        let _grant = self.acquire_grant(cancel).await?;

        // Another caller may have finished a grant while we waited.
        match self.store.oauth_token() {
            Some(token) if !token.is_expired_at(Utc::now()) => Ok(token),
            Some(token) => {
                let refresh_token = token.refresh_token.as_deref().ok_or_else(|| {
                    DropboxError::Authorization(
                        "OAuth token expired and no refresh token is available".to_string(),
                    )
                })?;
                self.refresh(refresh_token, cancel).await
            }
            None => {
                let code = self.store.authorization_code().ok_or_else(|| {
                    DropboxError::Authorization(
                        "No OAuth token and no authorization code to exchange".to_string(),
                    )
                })?;
                self.exchange(&code, cancel).await
            }
        }
    }

    async fn acquire_grant(
        &self,
        cancel: &CancellationToken,
    ) -> Result<tokio::sync::MutexGuard<'_, ()>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DropboxError::Cancelled.into()),
            guard = self.store.grant_lock().lock() => Ok(guard),
        }
    }

    fn valid_token(&self) -> Option<Arc<OAuthToken>> {
        self.store
            .oauth_token()
            .filter(|t| !t.is_expired_at(Utc::now()))
    }

    // Callers hold the grant lock.
    async fn exchange(&self, code: &str, cancel: &CancellationToken) -> Result<Arc<OAuthToken>> {
        tracing::debug!(client_id = %self.store.client_id(), "Exchanging authorization code");

        let token = self
            .invoker
            .request_token_with_cancellation(
                &self.store.basic_auth_header(),
                code,
                self.store.redirect_uri(),
                None,
                cancel,
            )
            .await?;

        let token = Arc::new(token);
        self.store.publish(Some(Arc::clone(&token)));
        self.store.consume_authorization_code(code);
        tracing::info!(client_id = %self.store.client_id(), "Obtained OAuth token");
        Ok(token)
    }

    // Callers hold the grant lock.
    async fn refresh(
        &self,
        refresh_token: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<OAuthToken>> {
        tracing::debug!(client_id = %self.store.client_id(), "Refreshing OAuth token");

        let mut token = self
            .invoker
            .refresh_token_with_cancellation(
                &self.store.basic_auth_header(),
                refresh_token,
                self.scope.as_deref(),
                None,
                cancel,
            )
            .await?;

        // Dropbox does not rotate refresh tokens.
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }

        let token = Arc::new(token);
        self.store.publish(Some(Arc::clone(&token)));
        tracing::info!(client_id = %self.store.client_id(), "Refreshed OAuth token");
        Ok(token)
    }
}

#[async_trait::async_trait]
impl AuthManager for AuthorizationCodeAuthManager {
    async fn apply_with_cancellation(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpRequest> {
        let token = self.ensure_token(cancel).await?;
        Ok(request.with_header("Authorization", token.bearer_header()))
    }
}

impl fmt::Debug for AuthorizationCodeAuthManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationCodeAuthManager")
            .field("store", &self.store)
            .field("scope", &self.scope)
            .finish()
    }
}
