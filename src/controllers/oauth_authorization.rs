//! OAuth 2 token endpoint calls
//!
//! [`OAuthAuthorizationController`] performs the two token lifecycle calls
//! against `{TokenAuth}/token`:
//!
//! 1. `request_token` -- authorization-code grant.
//! 2. `refresh_token` -- refresh-token grant.
//!
//! Both POST a form-urlencoded body with `Authorization: Basic ...` and
//! decode the JSON response into an [`OAuthToken`]. A `400` is reported as
//! an invalid grant and a `401` as an invalid client, both as
//! [`OAuthProviderError`]. Any other non-2xx status goes through
//! [`validate_response`]. Nothing here retries.
//!
//! The controller also builds the user-facing authorization URL on the
//! `Auth` server, which is where an authorization code comes from.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::auth::token::OAuthToken;
use crate::configuration::Configuration;
use crate::controllers::{append_field_parameters, append_fields, BaseController, FieldParameters};
use crate::environment::Server;
use crate::error::{DropboxError, OAuthProviderError, OAuthProviderReason, Result};
use crate::http::{validate_response, HttpClient, HttpRequest};

/// Invoker for the Dropbox OAuth 2 token endpoint.
#[derive(Debug, Clone)]
pub struct OAuthAuthorizationController {
    base: BaseController,
}

impl OAuthAuthorizationController {
    pub fn new(config: Arc<dyn Configuration>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base: BaseController::new(config, http),
        }
    }

    /// Exchanges an authorization code for a token.
    ///
    /// # Arguments
    ///
    /// * `authorization` - Value of the `Authorization` header, normally
    ///   `Basic base64(client_id:client_secret)`
    /// * `code` - Authorization code returned to the redirect URI
    /// * `redirect_uri` - Redirect URI used when the code was requested
    /// * `field_parameters` - Extra form fields; `None` values are omitted
    ///
    /// # Errors
    ///
    /// Returns [`OAuthProviderError`] on `400`/`401`,
    /// [`DropboxError::Api`] on any other non-2xx status, and
    /// [`DropboxError::Http`] / [`DropboxError::Serialization`] on transport
    /// or decoding failures.
    pub async fn request_token(
        &self,
        authorization: &str,
        code: &str,
        redirect_uri: &str,
        field_parameters: Option<&FieldParameters>,
    ) -> Result<OAuthToken> {
        self.request_token_with_cancellation(
            authorization,
            code,
            redirect_uri,
            field_parameters,
            &CancellationToken::new(),
        )
        .await
    }

    /// Cancellable form of [`Self::request_token`].
    pub async fn request_token_with_cancellation(
        &self,
        authorization: &str,
        code: &str,
        redirect_uri: &str,
        field_parameters: Option<&FieldParameters>,
        cancel: &CancellationToken,
    ) -> Result<OAuthToken> {
        let request = append_fields(
            self.token_request(authorization),
            [
                ("grant_type", Some("authorization_code")),
                ("code", Some(code)),
                ("redirect_uri", Some(redirect_uri)),
            ],
        );
        let request = append_field_parameters(request, field_parameters);

        self.execute_token_request(request, cancel).await
    }

    /// Obtains a new token with a refresh token.
    ///
    /// `scope` is a space-delimited list and is omitted from the body when
    /// `None`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::request_token`].
    pub async fn refresh_token(
        &self,
        authorization: &str,
        refresh_token: &str,
        scope: Option<&str>,
        field_parameters: Option<&FieldParameters>,
    ) -> Result<OAuthToken> {
        self.refresh_token_with_cancellation(
            authorization,
            refresh_token,
            scope,
            field_parameters,
            &CancellationToken::new(),
        )
        .await
    }

    /// Cancellable form of [`Self::refresh_token`].
    pub async fn refresh_token_with_cancellation(
        &self,
        authorization: &str,
        refresh_token: &str,
        scope: Option<&str>,
        field_parameters: Option<&FieldParameters>,
        cancel: &CancellationToken,
    ) -> Result<OAuthToken> {
        let request = append_fields(
            self.token_request(authorization),
            [
                ("grant_type", Some("refresh_token")),
                ("refresh_token", Some(refresh_token)),
                ("scope", scope),
            ],
        );
        let request = append_field_parameters(request, field_parameters);

        self.execute_token_request(request, cancel).await
    }

    /// Builds the URL a user visits to grant access and obtain a code.
    ///
    /// # Examples
    ///
    /// ```
    /// use dropbox_standard::DropboxClient;
    ///
    /// let client = DropboxClient::builder()
    ///     .authorization_code_auth("abc", "xyz", "https://app/cb")
    ///     .build()
    ///     .unwrap();
    ///
    /// let url = client
    ///     .oauth_authorization()
    ///     .authorization_url("abc", "https://app/cb", None, "s1")
    ///     .unwrap();
    /// assert!(url.as_str().starts_with("https://www.dropbox.com/oauth2/authorize?"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`DropboxError::Config`] if the `Auth` server URL is invalid.
    pub fn authorization_url(
        &self,
        client_id: &str,
        redirect_uri: &str,
        scope: Option<&str>,
        state: &str,
    ) -> Result<Url> {
        let endpoint = format!("{}/authorize", self.base.config().base_uri(Server::Auth));
        let mut url = Url::parse(&endpoint)
            .map_err(|e| DropboxError::Config(format!("invalid authorization URL: {e}")))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("response_type", "code");
            query.append_pair("client_id", client_id);
            query.append_pair("redirect_uri", redirect_uri);
            if let Some(s) = scope {
                query.append_pair("scope", s);
            }
            query.append_pair("state", state);
        }

        Ok(url)
    }

    fn token_request(&self, authorization: &str) -> HttpRequest {
        let url = format!("{}/token", self.base.config().base_uri(Server::TokenAuth));
        HttpRequest::post(url)
            .with_header("user-agent", self.base.user_agent())
            .with_header("accept", "application/json")
            .with_header("Authorization", authorization)
    }

    async fn execute_token_request(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<OAuthToken> {
        let grant_type = request.form_field("grant_type").unwrap_or_default().to_string();
        let context = self.base.execute(request, cancel).await?;
        let issued_at = Utc::now();

        if let Some(reason) = OAuthProviderReason::from_status(context.response.status) {
            tracing::warn!(
                status = context.response.status,
                grant_type = %grant_type,
                reason = %reason,
                "Token endpoint rejected the request"
            );
            return Err(DropboxError::from(OAuthProviderError::new(reason, context)).into());
        }

        validate_response(&context)?;

        let token = OAuthToken::from_response(&context.response.body, issued_at)?;
        tracing::debug!(grant_type = %grant_type, expires_in = ?token.expires_in, "Token issued");
        Ok(token)
    }
}
