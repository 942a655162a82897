//! bluefelt CLI
//!
//! Command-line client for bluefelt lobbies: browse games and lobbies, and
//! join a lobby to watch its state live.

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bluefelt_core::Config;

mod api;
mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "bluefelt")]
#[command(about = "bluefelt - Live lobby state for multiplayer games")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join a lobby and follow its state
    Connect {
        /// Lobby ID
        lobby_id: String,
        /// Player ID (defaults to config, then a guest id)
        #[arg(short, long)]
        player: Option<String>,
    },
    /// List available games
    Games,
    /// List open lobbies
    #[command(alias = "ls")]
    Lobbies,
    /// List users in a lobby
    Users {
        /// Lobby ID
        lobby_id: String,
    },
    /// Create a lobby for a game
    Create {
        /// Game ID (see `bluefelt games`)
        game_id: String,
    },
    /// Register a username
    Register {
        /// Username to register
        username: String,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (server_url, api_url, player_id, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands must work even when the file is broken
    if let Commands::Config { command } = &cli.command {
        return match command {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config)?;

    match cli.command {
        Commands::Connect { lobby_id, player } => {
            commands::connect::run(&config, &lobby_id, player, &output).await
        }
        Commands::Games => commands::lobby::games(&config, &output).await,
        Commands::Lobbies => commands::lobby::lobbies(&config, &output).await,
        Commands::Users { lobby_id } => commands::lobby::users(&config, &lobby_id, &output).await,
        Commands::Create { game_id } => commands::lobby::create(&config, &game_id, &output).await,
        Commands::Register { username } => {
            commands::lobby::register(&config, &username, &output).await
        }
        Commands::Config { .. } => Ok(()),
    }
}

/// Initialize tracing from BLUEFELT_LOG (default `warn`)
///
/// Logs go to `log_file` when configured, otherwise stderr.
fn init_logging(config: &Config) -> Result<()> {
    let log_level = std::env::var("BLUEFELT_LOG").unwrap_or_else(|_| "warn".to_string());
    let env_filter = EnvFilter::new(format!(
        "bluefelt_core={},bluefelt_cli={}",
        log_level, log_level
    ));

    // Ignore the error if a subscriber is already installed
    match &config.log_file {
        Some(path) => {
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Could not open log file {:?}", path))?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();
            info!("Logging to {:?}", path);
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr)
                .try_init();
        }
    }

    Ok(())
}
