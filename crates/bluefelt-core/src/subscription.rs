//! Identity-keyed lobby subscription
//!
//! Holds at most one [`LobbyConnection`]. Subscribing with a new
//! (lobby id, player id) closes the previous connection and starts from an
//! unset state; the old handle's events never reach the new one.

use tracing::debug;

use crate::connection::{ClientConfig, LobbyConnection};
use crate::error::ConfigError;

pub struct LobbySubscription {
    config: ClientConfig,
    active: Option<LobbyConnection>,
}

impl LobbySubscription {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    /// Subscribe to a lobby as a player
    ///
    /// Reuses the live connection for the same identity; otherwise closes it
    /// and opens a fresh one.
    pub fn subscribe(
        &mut self,
        lobby_id: &str,
        player_id: &str,
    ) -> Result<&mut LobbyConnection, ConfigError> {
        let connection = match self.active.take() {
            Some(existing) if existing.is_for(lobby_id, player_id) && existing.state().is_live() => {
                existing
            }
            previous => {
                if let Some(previous) = previous {
                    debug!(
                        "Switching subscription from {}/{}",
                        previous.lobby_id(),
                        previous.player_id()
                    );
                    previous.close();
                }
                LobbyConnection::open(&self.config, lobby_id, player_id)?
            }
        };
        Ok(self.active.insert(connection))
    }

    /// Close and discard the current connection, if any
    pub fn unsubscribe(&mut self) {
        if let Some(connection) = self.active.take() {
            connection.close();
        }
    }

    pub fn current(&self) -> Option<&LobbyConnection> {
        self.active.as_ref()
    }
}

impl Drop for LobbySubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionState;
    use futures_util::StreamExt;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    /// Server accepting any number of clients and holding them open
    async fn server() -> ClientConfig {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    if let Ok(mut socket) = accept_async(stream).await {
                        while let Some(Ok(_)) = socket.next().await {}
                    }
                });
            }
        });
        ClientConfig {
            server_url: format!("ws://{}", addr),
        }
    }

    #[tokio::test]
    async fn test_same_identity_reuses_connection() {
        let mut sub = LobbySubscription::new(server().await);
        let first_url = sub.subscribe("abc", "p1").unwrap().url().to_string();
        let state = sub.current().unwrap().subscribe_state();

        sub.subscribe("abc", "p1").unwrap();
        assert_eq!(sub.current().unwrap().url(), first_url);
        assert_eq!(*state.borrow(), ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn test_identity_change_closes_previous() {
        let mut sub = LobbySubscription::new(server().await);
        sub.subscribe("abc", "p1").unwrap();
        let old_state = sub.current().unwrap().subscribe_state();

        let conn = sub.subscribe("abc", "p2").unwrap();
        assert!(conn.is_for("abc", "p2"));
        assert!(!conn.lobby().is_initialized());
        assert!(matches!(
            *old_state.borrow(),
            ConnectionState::Closing | ConnectionState::Closed
        ));
    }

    #[tokio::test]
    async fn test_unsubscribe_closes() {
        let mut sub = LobbySubscription::new(server().await);
        sub.subscribe("abc", "p1").unwrap();
        let mut state = sub.current().unwrap().subscribe_state();

        sub.unsubscribe();
        assert!(sub.current().is_none());
        state
            .wait_for(|s| *s == ConnectionState::Closed)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_leaves_no_connection() {
        let mut sub = LobbySubscription::new(ClientConfig {
            server_url: "nope".into(),
        });
        assert!(sub.subscribe("abc", "p1").is_err());
        assert!(sub.current().is_none());
    }
}
