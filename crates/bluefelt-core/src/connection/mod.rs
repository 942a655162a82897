//! Connection Manager
//!
//! One WebSocket per (lobby id, player id). [`LobbyConnection::open`] returns
//! immediately and a background task drives the socket. That task is the
//! only writer of the mirrored state and the message log, and it handles
//! inbound frames and outbound sends strictly one at a time.
//!
//! ## Lifecycle
//!
//! `Idle -> Connecting -> Open -> Closing -> Closed`. A transport failure
//! while connecting or open goes straight to `Closed` and is logged as a
//! received `[WebSocket error]: ...` entry. There is no reconnection; open a
//! new connection to resubscribe.
//!
//! ## Usage
//!
//! ```ignore
//! let mut conn = LobbyConnection::open(&ClientConfig::default(), "abc", "p1")?;
//! let mut events = conn.take_events().unwrap();
//! while let Some(event) = events.recv().await {
//!     if let ConnectionEvent::StateChanged(_) = event {
//!         println!("{:?}", conn.lobby().state);
//!     }
//! }
//! ```

mod endpoint;
mod session;

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

pub use endpoint::{encode_component, endpoint_url};
pub use session::ERROR_PREFIX;

use crate::error::{ConfigError, SyncError};
use crate::message_log::{LogEntry, SharedLog};
use crate::state::{Applied, LobbyState};
use session::Session;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created, not started
    Idle,
    /// WebSocket handshake in progress
    Connecting,
    /// Ready; sends are dispatched
    Open,
    /// Close requested
    Closing,
    /// Terminal
    Closed,
}

impl ConnectionState {
    pub fn is_terminal(self) -> bool {
        self == ConnectionState::Closed
    }

    /// Connecting or open
    pub fn is_live(self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Open)
    }
}

/// Events emitted by a connection
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// Handshake completed
    Opened,
    /// Raw inbound text frame
    Message(String),
    /// A Snapshot or Diff changed the mirrored state
    StateChanged(Applied),
    /// A frame could not be applied; state is unchanged
    Diagnostic(SyncError),
    /// Transport failure; a `Closed` event follows
    Errored(String),
    /// Connection is closed
    Closed,
}

/// Client settings for lobby connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base server URL (`ws://host:port`; `http(s)` is accepted and mapped)
    pub server_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://localhost:8000".to_string(),
        }
    }
}

enum Command {
    Send(String),
    Close,
}

/// Handle to one lobby connection
///
/// Dropping the handle requests a close.
pub struct LobbyConnection {
    lobby_id: String,
    player_id: String,
    url: String,
    status: Arc<watch::Sender<ConnectionState>>,
    lobby_rx: watch::Receiver<LobbyState>,
    log: SharedLog,
    command_tx: mpsc::UnboundedSender<Command>,
    event_rx: Option<mpsc::UnboundedReceiver<ConnectionEvent>>,
}

impl LobbyConnection {
    /// Start connecting to a lobby
    ///
    /// Returns immediately; must be called from within a tokio runtime.
    pub fn open(
        config: &ClientConfig,
        lobby_id: &str,
        player_id: &str,
    ) -> Result<Self, ConfigError> {
        let url = endpoint_url(&config.server_url, lobby_id, player_id)?;

        let (status_tx, _status_rx) = watch::channel(ConnectionState::Idle);
        let status = Arc::new(status_tx);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let log = SharedLog::new();
        let session = Session::new(log.clone(), event_tx);
        let lobby_rx = session.subscribe_state();

        info!("Opening lobby connection to {}", url);
        status.send_replace(ConnectionState::Connecting);
        tokio::spawn(run(url.clone(), status.clone(), command_rx, session));

        Ok(Self {
            lobby_id: lobby_id.to_string(),
            player_id: player_id.to_string(),
            url,
            status,
            lobby_rx,
            log,
            command_tx,
            event_rx: Some(event_rx),
        })
    }

    /// Send raw text to the server
    ///
    /// A no-op unless the connection is `Open`: nothing is transmitted and
    /// nothing is logged. The `sent` log entry is appended after the frame is
    /// written.
    pub fn send(&self, content: impl Into<String>) {
        if self.state() != ConnectionState::Open {
            debug!("Dropping send while {:?}", self.state());
            return;
        }
        let _ = self.command_tx.send(Command::Send(content.into()));
    }

    /// Request shutdown without waiting for the peer
    pub fn close(&self) {
        let requested = self.status.send_if_modified(|state| {
            if state.is_live() {
                *state = ConnectionState::Closing;
                true
            } else {
                false
            }
        });
        if requested {
            debug!("Close requested for {}", self.url);
            let _ = self.command_tx.send(Command::Close);
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.status.borrow()
    }

    /// Watch lifecycle state changes
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.status.subscribe()
    }

    /// Current mirrored lobby state
    pub fn lobby(&self) -> LobbyState {
        self.lobby_rx.borrow().clone()
    }

    /// Watch mirrored state changes
    pub fn subscribe_lobby(&self) -> watch::Receiver<LobbyState> {
        self.lobby_rx.clone()
    }

    /// Shared message log
    pub fn log(&self) -> &SharedLog {
        &self.log
    }

    /// Copy of the message log
    pub fn messages(&self) -> Vec<LogEntry> {
        self.log.snapshot()
    }

    /// Take the event receiver (can only be called once)
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<ConnectionEvent>> {
        self.event_rx.take()
    }

    pub fn lobby_id(&self) -> &str {
        &self.lobby_id
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether this handle is subscribed to the given identity
    pub fn is_for(&self, lobby_id: &str, player_id: &str) -> bool {
        self.lobby_id == lobby_id && self.player_id == player_id
    }
}

impl Drop for LobbyConnection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Connection task: handshake, then the event loop
async fn run(
    url: String,
    status: Arc<watch::Sender<ConnectionState>>,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
    mut session: Session,
) {
    let connect = connect_async(url.as_str());
    tokio::pin!(connect);

    let stream = loop {
        tokio::select! {
            result = &mut connect => match result {
                Ok((stream, _response)) => break stream,
                Err(e) => {
                    fail(&status, &session, e.to_string());
                    return;
                }
            },
            cmd = command_rx.recv() => match cmd {
                // send() never queues before Open
                Some(Command::Send(_)) => continue,
                Some(Command::Close) | None => {
                    debug!("Closed before handshake completed: {}", url);
                    finish(&status, &session);
                    return;
                }
            },
        }
    };

    if !mark_open(&status) {
        // close() won the race against the handshake
        let mut stream = stream;
        stream.close(None).await.ok();
        debug!("Closed right after handshake: {}", url);
        finish(&status, &session);
        return;
    }
    info!("Connected to {}", url);
    session.on_opened();

    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            cmd = command_rx.recv() => match cmd {
                // Queued while Open, so still dispatched after a close request
                Some(Command::Send(content)) => {
                    if let Err(e) = write.send(Message::Text(content.clone())).await {
                        fail(&status, &session, e.to_string());
                        return;
                    }
                    session.on_sent(content);
                }
                Some(Command::Close) | None => {
                    status.send_replace(ConnectionState::Closing);
                    write.close().await.ok();
                    info!("Closed lobby connection to {}", url);
                    finish(&status, &session);
                    return;
                }
            },
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => session.on_frame(text),
                Some(Ok(Message::Binary(data))) => {
                    debug!("Ignoring {} byte binary frame", data.len());
                }
                Some(Ok(Message::Close(frame))) => {
                    info!("Server closed lobby connection: {:?}", frame);
                    // Flushes the queued close reply
                    write.close().await.ok();
                    finish(&status, &session);
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    fail(&status, &session, e.to_string());
                    return;
                }
                None => {
                    finish(&status, &session);
                    return;
                }
            },
        }
    }
}

/// `Connecting -> Open`; false if a close was requested meanwhile
fn mark_open(status: &watch::Sender<ConnectionState>) -> bool {
    status.send_if_modified(|state| {
        if *state == ConnectionState::Connecting {
            *state = ConnectionState::Open;
            true
        } else {
            false
        }
    })
}

fn fail(status: &watch::Sender<ConnectionState>, session: &Session, cause: String) {
    session.on_error(cause);
    finish(status, session);
}

fn finish(status: &watch::Sender<ConnectionState>, session: &Session) {
    status.send_replace(ConnectionState::Closed);
    session.on_closed();
}
