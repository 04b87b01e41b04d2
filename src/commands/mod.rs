/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes two top-level command modules:

- `auth`  -- Authorization URL, code exchange and token refresh
- `files` -- File request calls

Handlers build a [`DropboxClient`] from the loaded configuration and print
their result to stdout as JSON.
*/

use crate::client::{DropboxClient, DropboxClientBuilder};
use crate::config::Config;
use crate::error::{DropboxError, Result};

/// Builds a client from the loaded configuration.
pub fn build_client(config: &Config) -> Result<DropboxClient> {
    let client = DropboxClientBuilder::from_config(config).build()?;
    tracing::debug!("Built {}", client);
    Ok(client)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(DropboxError::Serialization)?;
    println!("{}", json);
    Ok(())
}

pub mod auth {
    //! OAuth 2 command handlers

    use super::{build_client, print_json};
    use crate::config::Config;
    use crate::error::Result;

    /// Prints the authorization URL and the state it carries.
    ///
    /// `scope` overrides the configured scope for this URL.
    pub fn authorization_url(
        mut config: Config,
        state: Option<String>,
        scope: Option<String>,
    ) -> Result<()> {
        if scope.is_some() {
            config.oauth.scope = scope;
        }
        let client = build_client(&config)?;
        let (url, state) = client.authorization_url(state.as_deref())?;

        print_json(&serde_json::json!({
            "url": url.as_str(),
            "state": state,
        }))
    }

    /// Exchanges `code` and prints the issued token.
    pub async fn exchange(config: Config, code: String) -> Result<()> {
        let client = build_client(&config)?;
        let token = client
            .authorization_code_auth_manager()
            .fetch_token(&code)
            .await?;
        tracing::info!("Authorization code exchanged");
        print_json(token.as_ref())
    }

    /// Runs the refresh-token grant and prints the new token.
    pub async fn refresh(config: Config, refresh_token: String, scope: Option<String>) -> Result<()> {
        let client = build_client(&config)?;
        let store = client.authorization_code_auth();
        let scope = scope.or(config.oauth.scope);

        let token = client
            .oauth_authorization()
            .refresh_token(
                &store.basic_auth_header(),
                &refresh_token,
                scope.as_deref(),
                None,
            )
            .await?;
        tracing::info!("Token refreshed");
        print_json(&token)
    }
}

pub mod files {
    //! File request command handlers

    use super::{build_client, print_json};
    use crate::auth::OAuthToken;
    use crate::config::Config;
    use crate::error::Result;

    /// Prints the number of file requests.
    ///
    /// Uses `access_token` as-is when given; otherwise exchanges `code` on
    /// the first call.
    pub async fn count(
        config: Config,
        access_token: Option<String>,
        code: Option<String>,
    ) -> Result<()> {
        let client = build_client(&config)?;
        let store = client.authorization_code_auth();

        if let Some(token) = access_token {
            store.set_oauth_token(Some(OAuthToken::new(token, "bearer")));
        }
        if let Some(code) = code {
            store.set_authorization_code(code);
        }

        let count = client.files().get_file_count().await?;
        print_json(&count)
    }
}
