//! Spotter - Main Entry Point
//!
//! Image classification serving engine with a remote-fetched model artifact.

use clap::Parser;
use spotter::cli::{cmd_check, cmd_fetch, cmd_serve, Cli, Commands};
use spotter::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging. RUST_LOG wins, LOG_LEVEL is the deployment knob.
    let settings = Settings::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            cmd_serve(host, port).await?;
        }
        Some(Commands::Fetch) => {
            cmd_fetch().await?;
        }
        Some(Commands::Check { path }) => {
            cmd_check(path.as_deref())?;
        }
        None => {
            // Default: serve (matches the deployed container behavior)
            cmd_serve(None, None).await?;
        }
    }

    Ok(())
}
