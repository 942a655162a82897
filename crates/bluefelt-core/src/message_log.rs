//! Message Log
//!
//! Chronological, append-only record of raw traffic on a connection. It is
//! for diagnostics only; state is driven by decoded envelopes, never by
//! reading the log back.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which way a frame travelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

/// One logged frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub direction: Direction,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// Append-only list of log entries
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Vec<LogEntry>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, direction: Direction, content: impl Into<String>) {
        self.entries.push(LogEntry {
            direction,
            content: content.into(),
            at: Utc::now(),
        });
    }

    pub fn push_sent(&mut self, content: impl Into<String>) {
        self.push(Direction::Sent, content);
    }

    pub fn push_received(&mut self, content: impl Into<String>) {
        self.push(Direction::Received, content);
    }

    /// All entries, oldest first
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared handle to a [`MessageLog`]
///
/// The connection task is the only writer; any number of readers may take
/// snapshots.
#[derive(Debug, Clone, Default)]
pub struct SharedLog {
    inner: Arc<Mutex<MessageLog>>,
}

impl SharedLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_sent(&self, content: impl Into<String>) {
        self.lock().push_sent(content);
    }

    pub(crate) fn push_received(&self, content: impl Into<String>) {
        self.lock().push_received(content);
    }

    /// Copy of all entries so far
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.lock().entries().to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, MessageLog> {
        // A panic while holding the lock cannot leave a half-written entry
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_chronological() {
        let mut log = MessageLog::new();
        log.push_received("welcome");
        log.push_sent("place");
        log.push_received("event");

        let contents: Vec<_> = log.entries().iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["welcome", "place", "event"]);
        assert!(log.entries()[0].at <= log.entries()[2].at);
    }

    #[test]
    fn test_shared_log_snapshot() {
        let log = SharedLog::new();
        let reader = log.clone();
        assert!(reader.is_empty());

        log.push_sent("hello");
        log.push_received("welcome");
        let entries = reader.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].direction, Direction::Sent);
        assert_eq!(entries[0].content, "hello");
        assert_eq!(entries[1].direction, Direction::Received);
        assert_eq!(reader.len(), 2);
    }

    #[test]
    fn test_direction_serializes_lowercase() {
        let json = serde_json::to_string(&Direction::Received).unwrap();
        assert_eq!(json, "\"received\"");
    }
}
