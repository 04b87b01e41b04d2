//! dropbox - Dropbox API client CLI
//!
#![doc = "Main entry point for the dropbox command-line client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dropbox_standard::cli::{AuthCommand, Cli, Commands, FilesCommand};
use dropbox_standard::commands;
use dropbox_standard::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/dropbox.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Auth { command } => match command {
            AuthCommand::Url { state, scope } => {
                tracing::info!("Building authorization URL");
                commands::auth::authorization_url(config, state, scope)?;
                Ok(())
            }
            AuthCommand::Exchange { code } => {
                tracing::info!("Exchanging authorization code");
                commands::auth::exchange(config, code).await?;
                Ok(())
            }
            AuthCommand::Refresh {
                refresh_token,
                scope,
            } => {
                tracing::info!("Refreshing token");
                commands::auth::refresh(config, refresh_token, scope).await?;
                Ok(())
            }
        },
        Commands::Files { command } => match command {
            FilesCommand::Count { access_token, code } => {
                tracing::info!("Fetching file request count");
                commands::files::count(config, access_token, code).await?;
                Ok(())
            }
        },
    }
}

/// Initialize tracing/logging
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output.
/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "dropbox_standard=debug,dropbox=debug"
    } else {
        "dropbox_standard=info,dropbox=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
