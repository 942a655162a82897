//! Per-connection inbound pipeline
//!
//! Raw frame -> log -> decode -> synchronizer -> events. Everything here runs
//! on the connection task, one event at a time.

use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use super::ConnectionEvent;
use crate::envelope::Envelope;
use crate::error::SyncError;
use crate::message_log::SharedLog;
use crate::state::{Applied, LobbyState, Synchronizer};

/// Prefix of the pseudo-message logged for a transport failure
pub const ERROR_PREFIX: &str = "[WebSocket error]: ";

pub(crate) struct Session {
    sync: Synchronizer,
    log: SharedLog,
    events: mpsc::UnboundedSender<ConnectionEvent>,
}

impl Session {
    pub(crate) fn new(log: SharedLog, events: mpsc::UnboundedSender<ConnectionEvent>) -> Self {
        Self {
            sync: Synchronizer::new(),
            log,
            events,
        }
    }

    pub(crate) fn subscribe_state(&self) -> watch::Receiver<LobbyState> {
        self.sync.subscribe()
    }

    pub(crate) fn on_opened(&self) {
        self.emit(ConnectionEvent::Opened);
    }

    /// Handle one inbound text frame
    pub(crate) fn on_frame(&mut self, raw: String) {
        self.log.push_received(raw.as_str());
        self.emit(ConnectionEvent::Message(raw.clone()));

        let envelope = Envelope::decode(&raw);
        match self.sync.apply(&envelope) {
            Ok(Applied::Ignored) => {
                debug!("Ignoring {} frame", envelope.kind());
            }
            Ok(applied) => self.emit(ConnectionEvent::StateChanged(applied)),
            Err(err) => {
                // Rejected diffs are already warned about by the synchronizer
                debug!("{}", err);
                self.emit(ConnectionEvent::Diagnostic(err));
            }
        }
    }

    /// Record a frame that has been written to the socket
    pub(crate) fn on_sent(&self, content: String) {
        self.log.push_sent(content);
    }

    /// Record a terminal transport failure
    pub(crate) fn on_error(&self, cause: String) {
        warn!("Lobby connection failed: {}", cause);
        self.log.push_received(format!("{}{}", ERROR_PREFIX, cause));
        self.emit(ConnectionEvent::Errored(cause));
    }

    pub(crate) fn on_closed(&self) {
        self.emit(ConnectionEvent::Closed);
    }

    fn emit(&self, event: ConnectionEvent) {
        let _ = self.events.send(event);
    }
}
