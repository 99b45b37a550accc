//! HTTP server binary for aether.

use aether::AetherConfig;
use aether::server::{AetherServer, AppState};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Aether: conversational news and media aggregator.
#[derive(Parser)]
#[command(name = "aether-server", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Serve the chat API (default).
    Serve,

    /// Write the default configuration to a file.
    InitConfig {
        /// Destination (defaults to ~/.config/aether/config.toml).
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("aether=info,aether_sources=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(load_config(cli.config)?).await,
        Command::InitConfig { path } => {
            let path = path.unwrap_or_else(AetherConfig::default_config_path);
            AetherConfig::default().save_to_file(&path)?;
            println!("Wrote default config to {}", path.display());
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<AetherConfig> {
    let default_path = AetherConfig::default_config_path();
    let mut config = match path {
        Some(path) => AetherConfig::from_file(&path)?,
        None if default_path.exists() => AetherConfig::from_file(&default_path)?,
        None => AetherConfig::default(),
    };
    config.apply_env_overrides()?;
    Ok(config)
}

async fn serve(config: AetherConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let mut server = AetherServer::start(state, &config.server).await?;
    info!(port = server.port(), "Aether backend active");

    tokio::select! {
        result = server.wait() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            server.shutdown();
        }
    }
    Ok(())
}
