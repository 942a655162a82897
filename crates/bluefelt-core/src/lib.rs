//! bluefelt Core Library
//!
//! Client-side mirror of a server-authoritative lobby state. The server
//! sends one full snapshot followed by a stream of JSON Patch diffs over a
//! WebSocket; this crate rebuilds an always-consistent local copy, records
//! raw traffic, and lets the caller push arbitrary outbound text.
//!
//! # Pipeline
//!
//! ```text
//! socket frame -> Envelope::decode -> Synchronizer::apply -> LobbyState
//!      \-> MessageLog (received)
//! LobbyConnection::send -> socket -> MessageLog (sent)
//! ```
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let mut conn = LobbyConnection::open(&config.client_config(), "abc", "p1")?;
//! let mut events = conn.take_events().unwrap();
//!
//! while let Some(event) = events.recv().await {
//!     println!("{:?} -> {:?}", event, conn.lobby().state);
//! }
//! ```
//!
//! # Modules
//!
//! - `patch`: RFC 6902 patch engine
//! - `envelope`: inbound frame classification
//! - `state`: state synchronizer
//! - `message_log`: sent/received traffic log
//! - `connection`: WebSocket lifecycle and outbound sends
//! - `subscription`: one connection per (lobby id, player id)
//! - `config`: application configuration

pub mod config;
pub mod connection;
pub mod envelope;
pub mod error;
pub mod message_log;
pub mod patch;
pub mod state;
pub mod subscription;

pub use config::Config;
pub use connection::{ClientConfig, ConnectionEvent, ConnectionState, LobbyConnection};
pub use envelope::{DecodeError, Envelope};
pub use error::{ConfigError, SyncError};
pub use message_log::{Direction, LogEntry, MessageLog, SharedLog};
pub use patch::{apply_patch, PatchApplyError, PatchError, PatchOp};
pub use state::{Applied, LobbyState, Synchronizer};
pub use subscription::LobbySubscription;
