//! OAuth 2 token value and expiry state
//!
//! An [`OAuthToken`] is built once from a token endpoint response and never
//! mutated afterwards. When a refresh succeeds the credential store swaps in
//! a whole new token.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DropboxError, Result};

// ---------------------------------------------------------------------------
// OAuthToken
// ---------------------------------------------------------------------------

/// A token issued by the Dropbox OAuth 2 provider.
///
/// `expiry` is the absolute instant at which the access token stops being
/// usable, computed as issue time plus `expires_in`. It is serialized as
/// Unix seconds so a stored token keeps its expiry across a round-trip.
///
/// # Examples
///
/// ```
/// use dropbox_standard::auth::OAuthToken;
///
/// let token = OAuthToken::new("sl.abc", "bearer");
///
/// // No expiry means the token never expires.
/// assert!(!token.is_expired());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    /// The access token sent as `Authorization: Bearer <access_token>`.
    pub access_token: String,

    /// The token type, `"bearer"` for Dropbox.
    pub token_type: String,

    /// Lifetime in seconds as reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,

    /// Refresh token for the refresh-token grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Space-separated scopes granted by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// UTC instant at which the access token expires.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_seconds_option"
    )]
    pub expiry: Option<DateTime<Utc>>,
}

/// Wire shape of a token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl TokenResponse {
    fn into_oauth_token(self, issued_at: DateTime<Utc>) -> Result<OAuthToken> {
        let expiry = match self.expires_in {
            None => None,
            Some(secs) => Some(expiry_after(issued_at, secs).ok_or_else(|| {
                DropboxError::Authorization(format!(
                    "token endpoint returned out-of-range expires_in: {}",
                    secs
                ))
            })?),
        };

        Ok(OAuthToken {
            access_token: self.access_token,
            token_type: self.token_type,
            expires_in: self.expires_in,
            refresh_token: self.refresh_token,
            scope: self.scope,
            expiry,
        })
    }
}

fn expiry_after(issued_at: DateTime<Utc>, secs: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(secs).ok()?;
    issued_at.checked_add_signed(Duration::try_seconds(secs)?)
}

impl OAuthToken {
    /// Creates a non-expiring token with no refresh token.
    pub fn new(access_token: impl Into<String>, token_type: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            expires_in: None,
            refresh_token: None,
            scope: None,
            expiry: None,
        }
    }

    /// Decodes a token endpoint response body.
    ///
    /// `issued_at` is the instant the response was received; the expiry is
    /// computed from it and `expires_in`.
    ///
    /// # Errors
    ///
    /// Returns [`DropboxError::Serialization`] if the body is not a valid
    /// token response, and [`DropboxError::Authorization`] if `expires_in`
    /// puts the expiry outside the representable range.
    pub fn from_response(body: &str, issued_at: DateTime<Utc>) -> Result<Self> {
        let response: TokenResponse =
            serde_json::from_str(body).map_err(DropboxError::Serialization)?;
        response.into_oauth_token(issued_at)
    }

    /// Returns `true` if the token is expired at `now`.
    ///
    /// A token is expired iff `now >= expiry`. There is no leniency window.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            None => false,
            Some(expiry) => now >= expiry,
        }
    }

    /// Returns `true` if the token is expired now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Value for the `Authorization` header of an authorized request.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

// ---------------------------------------------------------------------------
// TokenState
// ---------------------------------------------------------------------------

/// Lifecycle state of the token held by a credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No token has been obtained yet.
    NoToken,
    /// A token is held and has not reached its expiry.
    Valid,
    /// A token is held but its expiry has passed.
    Expired,
}

impl TokenState {
    /// Classifies an optional token at `now`.
    pub fn of(token: Option<&OAuthToken>, now: DateTime<Utc>) -> Self {
        match token {
            None => Self::NoToken,
            Some(t) if t.is_expired_at(now) => Self::Expired,
            Some(_) => Self::Valid,
        }
    }
}

impl fmt::Display for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoToken => write!(f, "no token"),
            Self::Valid => write!(f, "valid"),
            Self::Expired => write!(f, "expired"),
        }
    }
}
