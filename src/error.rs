//! Error types for the Dropbox client
//!
//! This module defines all error types used throughout the SDK, using
//! `thiserror` for ergonomic error handling.
//!
//! Errors raised by the OAuth 2 token endpoint ([`OAuthProviderError`]) are
//! kept distinct from errors raised by business endpoints
//! ([`DropboxError::Api`]) so that callers can tell "your credentials are
//! wrong" apart from "the requested resource failed".

use std::fmt;

use thiserror::Error;

use crate::http::HttpContext;

/// Why the OAuth 2 provider rejected a token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProviderReason {
    /// `400 Bad Request`: the authorization code or refresh token was
    /// rejected.
    InvalidGrant,
    /// `401 Unauthorized`: client authentication (Basic auth) failed.
    InvalidClient,
}

impl OAuthProviderReason {
    /// Maps a token endpoint status code to a rejection reason.
    ///
    /// Returns `None` for statuses that are not provider rejections; those
    /// go through the generic response validation instead.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            400 => Some(Self::InvalidGrant),
            401 => Some(Self::InvalidClient),
            _ => None,
        }
    }

    /// Human-readable message for this rejection.
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidGrant => "OAuth 2 provider returned an error.",
            Self::InvalidClient => "OAuth 2 provider says client authentication failed.",
        }
    }
}

impl fmt::Display for OAuthProviderReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGrant => write!(f, "invalid grant"),
            Self::InvalidClient => write!(f, "invalid client"),
        }
    }
}

/// A token request rejected by the OAuth 2 provider.
///
/// Carries the full request/response context for diagnostics, plus the
/// `error` / `error_description` fields from the provider's JSON body when
/// it supplied them.
#[derive(Error, Debug, Clone)]
#[error("{} ({reason}){}", .reason.message(), describe(.error, .error_description))]
pub struct OAuthProviderError {
    /// Rejection reason derived from the HTTP status.
    pub reason: OAuthProviderReason,
    /// RFC 6749 `error` code from the response body, if any.
    pub error: Option<String>,
    /// RFC 6749 `error_description` from the response body, if any.
    pub error_description: Option<String>,
    /// Request and response that produced this error.
    pub context: Box<HttpContext>,
}

impl OAuthProviderError {
    /// Builds a provider error from a rejected token endpoint exchange.
    pub fn new(reason: OAuthProviderReason, context: HttpContext) -> Self {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            error: Option<String>,
            error_description: Option<String>,
        }

        let (error, error_description) =
            match serde_json::from_str::<ErrorBody>(&context.response.body) {
                Ok(body) => (body.error, body.error_description),
                Err(_) => (None, None),
            };

        Self {
            reason,
            error,
            error_description,
            context: Box::new(context),
        }
    }

    /// HTTP status code returned by the provider.
    pub fn status(&self) -> u16 {
        self.context.response.status
    }
}

fn describe(error: &Option<String>, description: &Option<String>) -> String {
    match (error, description) {
        (Some(e), Some(d)) => format!(": {e}: {d}"),
        (Some(e), None) => format!(": {e}"),
        (None, Some(d)) => format!(": {d}"),
        (None, None) => String::new(),
    }
}

/// Main error type for Dropbox SDK operations
#[derive(Error, Debug)]
pub enum DropboxError {
    /// Configuration file or environment errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or invalid required argument, raised when a client is built
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// The OAuth 2 provider rejected a token request
    #[error(transparent)]
    OAuthProvider(#[from] OAuthProviderError),

    /// A non-success response from any endpoint not special-cased by the
    /// caller
    #[error("API error: HTTP {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
        /// Request and response that produced this error
        context: Box<HttpContext>,
    },

    /// No usable token and no way to obtain one
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// The operation was cancelled before it completed
    #[error("Request cancelled")]
    Cancelled,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl DropboxError {
    /// Returns the provider error when this is a token endpoint rejection.
    pub fn as_oauth_provider(&self) -> Option<&OAuthProviderError> {
        match self {
            Self::OAuthProvider(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the HTTP context for provider and API errors.
    pub fn context(&self) -> Option<&HttpContext> {
        match self {
            Self::OAuthProvider(e) => Some(&e.context),
            Self::Api { context, .. } => Some(context),
            _ => None,
        }
    }
}

/// Result type alias for Dropbox SDK operations
///
/// Uses `anyhow::Error` so that context can be attached while propagating;
/// SDK failures always carry a [`DropboxError`] that callers can recover
/// with `err.downcast_ref::<DropboxError>()`.
pub type Result<T> = anyhow::Result<T>;
