//! Credential store for the authorization-code grant
//!
//! A [`CredentialStore`] holds the client credential triple (client id,
//! client secret, redirect URI) together with the single live token for
//! that triple and any pending authorization code.
//!
//! The token lives in an `RwLock<Option<Arc<OAuthToken>>>` and is only ever
//! replaced whole, so readers see either the old token or the new one. A
//! separate async grant lock serializes code exchanges and refreshes; the
//! auth manager acquires it before talking to the token endpoint.

use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;

use crate::auth::token::{OAuthToken, TokenState};

/// Client credentials plus the token issued for them.
pub struct CredentialStore {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token: RwLock<Option<Arc<OAuthToken>>>,
    authorization_code: Mutex<Option<String>>,
    grant_lock: tokio::sync::Mutex<()>,
}

impl CredentialStore {
    /// Creates a store with no token and no pending authorization code.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            token: RwLock::new(None),
            authorization_code: Mutex::new(None),
            grant_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns `true` iff all three values match the stored triple exactly.
    ///
    /// The comparison is case-sensitive and ignores the token entirely.
    ///
    /// # Examples
    ///
    /// ```
    /// use dropbox_standard::auth::CredentialStore;
    ///
    /// let store = CredentialStore::new("abc", "xyz", "https://app/cb");
    /// assert!(store.equals("abc", "xyz", "https://app/cb"));
    /// assert!(!store.equals("ABC", "xyz", "https://app/cb"));
    /// ```
    pub fn equals(&self, client_id: &str, client_secret: &str, redirect_uri: &str) -> bool {
        self.client_id == client_id
            && self.client_secret == client_secret
            && self.redirect_uri == redirect_uri
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Snapshot of the current token.
    pub fn oauth_token(&self) -> Option<Arc<OAuthToken>> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Current lifecycle state of the held token.
    pub fn token_state(&self) -> TokenState {
        TokenState::of(self.oauth_token().as_deref(), Utc::now())
    }

    /// Replaces the held token.
    pub fn set_oauth_token(&self, token: Option<OAuthToken>) {
        self.publish(token.map(Arc::new));
    }

    /// Drops the held token. The next authorized call needs a new
    /// authorization code.
    pub fn clear_token(&self) {
        self.publish(None);
    }

    pub(crate) fn publish(&self, token: Option<Arc<OAuthToken>>) {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }

    /// Stores a one-time authorization code to exchange on the next
    /// authorized call.
    pub fn set_authorization_code(&self, code: impl Into<String>) {
        *self
            .authorization_code
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(code.into());
    }

    /// Returns the pending authorization code, if any.
    pub fn authorization_code(&self) -> Option<String> {
        self.authorization_code
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Removes `code` if it is still the pending one.
    pub(crate) fn consume_authorization_code(&self, code: &str) {
        let mut pending = self
            .authorization_code
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if pending.as_deref() == Some(code) {
            *pending = None;
        }
    }

    /// Lock held for the duration of a code exchange or refresh.
    pub(crate) fn grant_lock(&self) -> &tokio::sync::Mutex<()> {
        &self.grant_lock
    }

    /// `Basic base64(client_id:client_secret)` for the token endpoint.
    pub fn basic_auth_header(&self) -> String {
        basic_auth_header(&self.client_id, &self.client_secret)
    }
}

/// Builds an HTTP Basic `Authorization` header value.
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{client_id}:{client_secret}"))
    )
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("token_state", &self.token_state())
            .finish()
    }
}
