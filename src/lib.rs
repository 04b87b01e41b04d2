//! dropbox-standard - Dropbox API client library
//!
//! This library provides a typed client for the Dropbox HTTP API, including
//! the OAuth 2 authorization-code and refresh-token flows and bearer-token
//! injection for every authorized call.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: Token model, credential store and the authorization-code auth manager
//! - `controllers`: Endpoint controllers (OAuth token endpoint, file requests)
//! - `client`: `DropboxClient` facade and its builder
//! - `http`: Request/response model and the `HttpClient` abstraction
//! - `environment` / `configuration`: Server URL table and resolved settings
//! - `config`: YAML/environment configuration for the CLI
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use dropbox_standard::DropboxClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = DropboxClient::builder()
//!         .authorization_code_auth("app-key", "app-secret", "https://app/cb")
//!         .authorization_code("code-from-redirect")
//!         .build()?;
//!
//!     // The first authorized call exchanges the code for a token.
//!     let count = client.files().get_file_count().await?;
//!     println!("{}", count.file_request_count);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod configuration;
pub mod controllers;
pub mod environment;
pub mod error;
pub mod http;
pub mod models;

// Re-export commonly used types
pub use auth::{AuthManager, AuthScheme, CredentialStore, OAuthToken, TokenState};
pub use client::{DropboxClient, DropboxClientBuilder};
pub use config::Config;
pub use configuration::Configuration;
pub use environment::{Environment, Server};
pub use error::{DropboxError, OAuthProviderError, OAuthProviderReason, Result};
pub use models::FileRequestCount;

#[cfg(test)]
pub mod test_utils;
