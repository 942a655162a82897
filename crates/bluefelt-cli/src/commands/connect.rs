//! Interactive lobby session
//!
//! Prints every frame the server sends and the mirrored state after each
//! applied envelope. Lines typed on stdin are sent to the server verbatim,
//! except for a few local commands.

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use uuid::Uuid;

use bluefelt_core::{Config, ConnectionEvent, ConnectionState, Envelope, LobbyConnection};

use crate::output::Output;

/// Commands handled locally instead of being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocalCommand {
    State,
    Log,
    Quit,
}

impl LocalCommand {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "/state" => Some(Self::State),
            "/log" => Some(Self::Log),
            "/quit" | "/exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Pick the player id: flag, then config, then a fresh guest id
fn resolve_player_id(flag: Option<String>, config: &Config) -> String {
    flag.filter(|id| !id.trim().is_empty())
        .or_else(|| config.player_id.clone())
        .unwrap_or_else(guest_id)
}

/// Guest id in the server's `guest_xxxxxxxx` format
fn guest_id() -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("guest_{}", suffix)
}

pub async fn run(
    config: &Config,
    lobby_id: &str,
    player: Option<String>,
    output: &Output,
) -> Result<()> {
    let player_id = resolve_player_id(player, config);
    let mut connection = LobbyConnection::open(&config.client_config(), lobby_id, &player_id)
        .context("Failed to open lobby connection")?;
    let Some(mut events) = connection.take_events() else {
        bail!("Connection events already taken");
    };

    output.message(&format!(
        "Connecting to {} as {}...",
        connection.url(),
        player_id
    ));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut watching_ctrl_c = true;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    ConnectionEvent::Opened => {
                        output.success("Connected. Type a message, or /state, /log, /quit");
                    }
                    ConnectionEvent::Message(raw) => {
                        output.print_frame(&raw);
                        if let Some(message) = Envelope::decode(&raw).server_message() {
                            output.message(&format!("Server: {}", message));
                        }
                    }
                    ConnectionEvent::StateChanged(_) => output.print_state(&connection.lobby()),
                    ConnectionEvent::Diagnostic(err) => output.warn(&err.to_string()),
                    ConnectionEvent::Errored(cause) => {
                        output.warn(&format!("Connection error: {}", cause));
                    }
                    ConnectionEvent::Closed => {
                        output.message("Connection closed");
                        break;
                    }
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line.context("Failed to read stdin")? {
                    Some(line) => handle_line(&connection, &line, output),
                    None => {
                        debug!("stdin closed");
                        stdin_open = false;
                    }
                }
            }
            result = &mut ctrl_c, if watching_ctrl_c => {
                watching_ctrl_c = false;
                on_interrupt(&connection, result, output);
            }
        }
    }

    Ok(())
}

fn on_interrupt(connection: &LobbyConnection, result: std::io::Result<()>, output: &Output) {
    match result {
        Ok(()) => connection.close(),
        Err(e) => output.warn(&format!("Ctrl-C handling unavailable: {}", e)),
    }
}

fn handle_line(connection: &LobbyConnection, line: &str, output: &Output) {
    match LocalCommand::parse(line) {
        Some(LocalCommand::State) => output.print_state(&connection.lobby()),
        Some(LocalCommand::Log) => output.print_log(&connection.messages()),
        Some(LocalCommand::Quit) => connection.close(),
        None if line.trim().is_empty() => {}
        None => {
            if connection.state() != ConnectionState::Open {
                output.warn("Not connected; message dropped");
            }
            connection.send(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    #[test]
    fn test_parse_local_commands() {
        assert_eq!(LocalCommand::parse("/state"), Some(LocalCommand::State));
        assert_eq!(LocalCommand::parse("  /log "), Some(LocalCommand::Log));
        assert_eq!(LocalCommand::parse("/exit"), Some(LocalCommand::Quit));
        assert_eq!(LocalCommand::parse(r#"{"type":"move","cell":4}"#), None);
        assert_eq!(LocalCommand::parse("/states"), None);
    }

    #[tokio::test]
    async fn test_interrupt_closes_only_on_signal() {
        let config = Config {
            server_url: "ws://127.0.0.1:9".into(),
            ..Config::default()
        };
        let connection = LobbyConnection::open(&config.client_config(), "abc", "p1").unwrap();
        let output = Output::new(OutputFormat::Quiet);

        let failed = std::io::Error::new(std::io::ErrorKind::Other, "no signal driver");
        on_interrupt(&connection, Err(failed), &output);
        assert!(connection.state().is_live());

        on_interrupt(&connection, Ok(()), &output);
        assert!(!connection.state().is_live());
    }

    #[test]
    fn test_guest_id_format() {
        let id = guest_id();
        assert_eq!(id.len(), "guest_".len() + 8);
        assert!(id.starts_with("guest_"));
        assert!(id["guest_".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_resolve_player_id_precedence() {
        let mut config = Config::default();
        config.player_id = Some("from_config".into());

        assert_eq!(resolve_player_id(Some("flag".into()), &config), "flag");
        assert_eq!(resolve_player_id(Some("  ".into()), &config), "from_config");
        assert_eq!(resolve_player_id(None, &config), "from_config");

        config.player_id = None;
        assert!(resolve_player_id(None, &config).starts_with("guest_"));
    }
}
