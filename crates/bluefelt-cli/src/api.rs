//! Lobby directory REST client
//!
//! Games, lobbies and users live behind plain HTTP endpoints on the same
//! server that hosts the lobby WebSockets.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use bluefelt_core::connection::encode_component;

/// A game bundle the server can host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub name: String,
}

/// An open lobby
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lobby {
    pub id: String,
    pub game_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub players: Vec<String>,
    #[serde(default)]
    pub started: bool,
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
}

pub struct ApiClient {
    base: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn games(&self) -> Result<Vec<Game>> {
        self.get("/games")
            .await
            .context("Failed to fetch list of games")
    }

    pub async fn lobbies(&self) -> Result<Vec<Lobby>> {
        self.get("/lobbies").await.context("Failed to fetch lobbies")
    }

    pub async fn lobby_users(&self, lobby_id: &str) -> Result<Vec<String>> {
        self.get(&format!("/lobbies/{}/users", encode_component(lobby_id)))
            .await
            .with_context(|| format!("Failed to fetch users for lobby {}", lobby_id))
    }

    pub async fn create_lobby(&self, game_id: &str) -> Result<Lobby> {
        let value = self
            .post("/lobbies", json!({ "gameId": game_id }))
            .await
            .context("Failed to create lobby")?;
        parse_reply(value)
    }

    pub async fn register(&self, username: &str) -> Result<User> {
        let value = self
            .post("/register", json!({ "username": username }))
            .await
            .context("Failed to register")?;
        parse_reply(value)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let url = self.url(path);
        debug!("POST {} {}", url, body);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

/// Decode a POST reply; the server reports some failures as `{"error": ..}`
/// with a success status.
fn parse_reply<T: DeserializeOwned>(value: Value) -> Result<T> {
    if let Some(message) = value.get("error").and_then(Value::as_str) {
        bail!("{}", message);
    }
    serde_json::from_value(value).context("Unexpected response from server")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.url("/games"), "http://localhost:8000/games");
    }

    #[test]
    fn test_parse_created_lobby() {
        let lobby: Lobby =
            parse_reply(json!({"id": "3f2a", "game_id": "tic-tac-toe"})).unwrap();
        assert_eq!(lobby.id, "3f2a");
        assert_eq!(lobby.game_id, "tic-tac-toe");
        assert!(lobby.players.is_empty());
        assert!(!lobby.started);
    }

    #[test]
    fn test_parse_error_reply() {
        let err = parse_reply::<Lobby>(json!({"error": "Unknown game: chess"})).unwrap_err();
        assert_eq!(err.to_string(), "Unknown game: chess");
    }

    #[test]
    fn test_parse_listed_lobby() {
        let lobbies: Vec<Lobby> = serde_json::from_value(json!([{
            "id": "3f2a",
            "game_id": "tic-tac-toe",
            "name": "tic-tac-toe - Lobby 3f2a",
            "players": ["guest_1a2b3c4d"],
            "started": true
        }]))
        .unwrap();
        assert_eq!(lobbies[0].players, vec!["guest_1a2b3c4d"]);
        assert!(lobbies[0].started);
    }
}
