#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use wiremock::MockServer;

use dropbox_standard::{DropboxClient, DropboxClientBuilder, Server};

pub const CLIENT_ID: &str = "abc";
pub const CLIENT_SECRET: &str = "xyz";
pub const REDIRECT_URI: &str = "https://app/cb";

/// `Basic base64("abc:xyz")`
pub const BASIC_AUTH: &str = "Basic YWJjOnh5eg==";

/// Builder with the fixture credentials and every server pointed at `server`.
pub fn builder_for(server: &MockServer) -> DropboxClientBuilder {
    DropboxClient::builder()
        .authorization_code_auth(CLIENT_ID, CLIENT_SECRET, REDIRECT_URI)
        .server_url(Server::TokenAuth, format!("{}/oauth2", server.uri()))
        .server_url(Server::Default, format!("{}/2", server.uri()))
        .server_url(Server::Auth, format!("{}/oauth2", server.uri()))
}

/// Token endpoint response body.
pub fn token_body(access_token: &str, expires_in: u64) -> serde_json::Value {
    serde_json::json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": expires_in,
    })
}

pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("dropbox.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
