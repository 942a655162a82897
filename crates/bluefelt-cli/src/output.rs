//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use bluefelt_core::{Direction, LobbyState, LogEntry};

use crate::api::{Game, Lobby, User};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    pub fn print_games(&self, games: &[Game]) {
        match self.format {
            OutputFormat::Human => {
                if games.is_empty() {
                    println!("No games available.");
                    return;
                }
                for game in games {
                    println!("{} | {}", game.id, game.name);
                }
                println!("\n{} game(s)", games.len());
            }
            OutputFormat::Json => print_json(games),
            OutputFormat::Quiet => {
                for game in games {
                    println!("{}", game.id);
                }
            }
        }
    }

    pub fn print_lobbies(&self, lobbies: &[Lobby]) {
        match self.format {
            OutputFormat::Human => {
                if lobbies.is_empty() {
                    println!("No open lobbies.");
                    return;
                }
                for lobby in lobbies {
                    let status = if lobby.started { "started" } else { "waiting" };
                    println!(
                        "{} | {} | {} player(s) | {}",
                        lobby.id.chars().take(8).collect::<String>(),
                        lobby.game_id,
                        lobby.players.len(),
                        status
                    );
                }
                println!("\n{} lobby(ies)", lobbies.len());
            }
            OutputFormat::Json => print_json(lobbies),
            OutputFormat::Quiet => {
                for lobby in lobbies {
                    println!("{}", lobby.id);
                }
            }
        }
    }

    /// Print a freshly created lobby
    pub fn print_lobby(&self, lobby: &Lobby) {
        match self.format {
            OutputFormat::Human => {
                println!("✓ Created lobby for {}", lobby.game_id);
                println!("  ID: {}", lobby.id);
                println!();
                println!("Join it with: bluefelt connect {}", lobby.id);
            }
            OutputFormat::Json => print_json(lobby),
            OutputFormat::Quiet => println!("{}", lobby.id),
        }
    }

    pub fn print_users(&self, users: &[String]) {
        match self.format {
            OutputFormat::Human => {
                if users.is_empty() {
                    println!("No users in this lobby.");
                    return;
                }
                for user in users {
                    println!("{}", user);
                }
                println!("\n{} user(s)", users.len());
            }
            OutputFormat::Json => print_json(users),
            OutputFormat::Quiet => {
                for user in users {
                    println!("{}", user);
                }
            }
        }
    }

    pub fn print_user(&self, user: &User) {
        match self.format {
            OutputFormat::Human => println!("✓ Registered as {}", user.name),
            OutputFormat::Json => print_json(user),
            OutputFormat::Quiet => println!("{}", user.name),
        }
    }

    /// Print one raw frame from the server
    pub fn print_frame(&self, raw: &str) {
        match self.format {
            OutputFormat::Human => println!("← {}", raw),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"direction": Direction::Received, "content": raw})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print the mirrored lobby state
    pub fn print_state(&self, lobby: &LobbyState) {
        match self.format {
            OutputFormat::Human => match &lobby.state {
                Some(state) => match serde_json::to_string_pretty(state) {
                    Ok(text) => println!("{}", text),
                    Err(e) => eprintln!("Failed to format state: {}", e),
                },
                None => println!("(no snapshot received yet)"),
            },
            OutputFormat::Json => print_json(lobby),
            OutputFormat::Quiet => {
                if let Some(state) = &lobby.state {
                    println!("{}", state);
                }
            }
        }
    }

    /// Print the message log
    pub fn print_log(&self, entries: &[LogEntry]) {
        match self.format {
            OutputFormat::Human => {
                if entries.is_empty() {
                    println!("No messages yet.");
                    return;
                }
                for entry in entries {
                    let arrow = match entry.direction {
                        Direction::Sent => "→",
                        Direction::Received => "←",
                    };
                    println!(
                        "[{}] {} {}",
                        entry.at.format("%H:%M:%S"),
                        arrow,
                        truncate(&entry.content, 100)
                    );
                }
                println!("\n{} message(s)", entries.len());
            }
            OutputFormat::Json => print_json(entries),
            OutputFormat::Quiet => {
                for entry in entries {
                    println!("{}", entry.content);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr (suppressed in quiet mode)
    pub fn warn(&self, message: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", message);
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
