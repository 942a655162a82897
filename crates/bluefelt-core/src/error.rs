//! Error types for lobby synchronization

use thiserror::Error;

use crate::patch::PatchApplyError;

/// Errors raised while mirroring lobby state
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Transport failure; terminal for the connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// Inbound frame was not valid JSON; the frame is skipped
    #[error("Failed to parse inbound frame: {0}")]
    Parse(String),

    /// A Diff arrived before any Snapshot; its effect on state is dropped
    #[error("Diff received before initial snapshot")]
    UninitializedState,

    /// A Diff was rejected as a whole; the previous state is kept
    #[error("Diff rejected: {0}")]
    PatchApply(#[from] PatchApplyError),

    /// A `diff` array held entries that are not patch operations
    #[error("Diff rejected: malformed operations: {0}")]
    InvalidDiff(String),
}

impl SyncError {
    /// Whether the error ends the connection
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Connection(_))
    }
}

/// Invalid client configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Server URL is not a `ws`, `wss`, `http` or `https` URL
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Lobby or player id is empty
    #[error("Missing {0}")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::PatchError;

    #[test]
    fn test_only_connection_errors_are_fatal() {
        assert!(SyncError::Connection("reset".into()).is_fatal());
        assert!(!SyncError::Parse("eof".into()).is_fatal());
        assert!(!SyncError::UninitializedState.is_fatal());
        assert!(!SyncError::InvalidDiff("missing field `value`".into()).is_fatal());
    }

    #[test]
    fn test_patch_apply_message() {
        let err = SyncError::from(PatchApplyError {
            index: 0,
            op: "add",
            source: PatchError::PathNotFound {
                path: "/players/-".into(),
            },
        });
        assert_eq!(
            err.to_string(),
            "Diff rejected: Patch operation 0 (add) failed: Path '/players/-' does not exist"
        );
    }
}
