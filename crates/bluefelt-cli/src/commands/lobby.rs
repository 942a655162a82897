//! Lobby directory command handlers

use anyhow::{bail, Result};

use bluefelt_core::Config;

use crate::api::ApiClient;
use crate::output::Output;

/// List games the server can host
pub async fn games(config: &Config, output: &Output) -> Result<()> {
    let games = ApiClient::new(&config.api_url).games().await?;
    output.print_games(&games);
    Ok(())
}

/// List open lobbies
pub async fn lobbies(config: &Config, output: &Output) -> Result<()> {
    let lobbies = ApiClient::new(&config.api_url).lobbies().await?;
    output.print_lobbies(&lobbies);
    Ok(())
}

/// List users in a lobby
pub async fn users(config: &Config, lobby_id: &str, output: &Output) -> Result<()> {
    let users = ApiClient::new(&config.api_url).lobby_users(lobby_id).await?;
    output.print_users(&users);
    Ok(())
}

/// Create a lobby for a game
pub async fn create(config: &Config, game_id: &str, output: &Output) -> Result<()> {
    if game_id.trim().is_empty() {
        bail!("Game id cannot be empty. List available games with:\n  bluefelt games");
    }
    let lobby = ApiClient::new(&config.api_url).create_lobby(game_id).await?;
    output.print_lobby(&lobby);
    Ok(())
}

/// Register a username
pub async fn register(config: &Config, username: &str, output: &Output) -> Result<()> {
    if username.trim().is_empty() {
        bail!("Username cannot be empty");
    }
    let user = ApiClient::new(&config.api_url).register(username).await?;
    output.print_user(&user);
    if !output.is_quiet() && !output.is_json() && config.player_id.is_none() {
        println!();
        println!("Use it for future sessions with:");
        println!("  bluefelt config set player_id {}", user.name);
    }
    Ok(())
}
