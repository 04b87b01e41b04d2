//! Command-line interface definition for the `dropbox` binary
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for the OAuth 2 flow and file request calls.

use clap::{Parser, Subcommand};

/// dropbox - Dropbox API client
///
/// Obtain and refresh OAuth 2 tokens and call the Dropbox API.
#[derive(Parser, Debug, Clone)]
#[command(name = "dropbox")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/dropbox.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the API base path
    #[arg(long, global = true)]
    pub basepath: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// OAuth 2 token lifecycle
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// File request calls
    Files {
        #[command(subcommand)]
        command: FilesCommand,
    },
}

/// OAuth 2 subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommand {
    /// Print the URL where the user grants access
    Url {
        /// State value to round-trip; random when omitted
        #[arg(long)]
        state: Option<String>,

        /// Space-delimited scopes to request
        #[arg(long)]
        scope: Option<String>,
    },

    /// Exchange an authorization code for a token
    Exchange {
        /// Authorization code returned to the redirect URI
        #[arg(long)]
        code: String,
    },

    /// Obtain a new access token with a refresh token
    Refresh {
        /// Refresh token from an earlier exchange
        #[arg(long)]
        refresh_token: String,

        /// Space-delimited scopes to request
        #[arg(long)]
        scope: Option<String>,
    },
}

/// File request subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum FilesCommand {
    /// Print the number of file requests
    Count {
        /// Use an existing access token
        #[arg(long, conflicts_with = "code")]
        access_token: Option<String>,

        /// Exchange this authorization code first
        #[arg(long)]
        code: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/dropbox.yaml".to_string()),
            verbose: false,
            basepath: None,
            command: Commands::Auth {
                command: AuthCommand::Url {
                    state: None,
                    scope: None,
                },
            },
        }
    }
}
