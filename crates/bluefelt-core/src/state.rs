//! State Synchronizer
//!
//! Owns the mirrored lobby state. A Snapshot replaces it wholesale; a Diff is
//! applied atomically on top of it. New values are published through a
//! `watch` channel only after they are fully built, so readers never see a
//! half-applied Diff.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::envelope::{DecodeError, Envelope};
use crate::error::SyncError;
use crate::patch::apply_patch;

/// Mirrored lobby state; both fields are `None` until the first Snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyState {
    /// Opaque metadata from the last Snapshot
    pub bundle_meta: Option<Value>,
    /// Current state document
    pub state: Option<Value>,
}

impl LobbyState {
    /// Whether a Snapshot has been received
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }
}

/// Outcome of applying one envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// State and bundle metadata were replaced
    Snapshot,
    /// A Diff with this many operations was applied
    Diff { operations: usize },
    /// Frame had no effect on state
    Ignored,
}

/// Single-writer cell for [`LobbyState`]
#[derive(Debug)]
pub struct Synchronizer {
    tx: watch::Sender<LobbyState>,
    version: u64,
}

impl Default for Synchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Synchronizer {
    /// Create a synchronizer with unset state
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LobbyState::default());
        Self { tx, version: 0 }
    }

    /// Apply a decoded envelope
    ///
    /// Errors leave the state exactly as it was.
    pub fn apply(&mut self, envelope: &Envelope) -> Result<Applied, SyncError> {
        match envelope {
            Envelope::Snapshot {
                bundle_meta,
                initial_state,
            } => {
                self.publish(LobbyState {
                    bundle_meta: Some(bundle_meta.clone()),
                    state: Some(initial_state.clone()),
                });
                debug!("Snapshot applied (version {})", self.version);
                Ok(Applied::Snapshot)
            }
            Envelope::Diff { operations } => {
                let next = {
                    let current = self.tx.borrow();
                    let Some(doc) = current.state.as_ref() else {
                        debug!("Dropping diff received before snapshot");
                        return Err(SyncError::UninitializedState);
                    };
                    apply_patch(doc, operations).map_err(|e| {
                        warn!("Rejected diff: {}", e);
                        SyncError::from(e)
                    })?
                };

                self.version += 1;
                self.tx.send_modify(|lobby| lobby.state = Some(next));
                Ok(Applied::Diff {
                    operations: operations.len(),
                })
            }
            Envelope::Unrecognized {
                reason: DecodeError::Parse(cause),
                ..
            } => Err(SyncError::Parse(cause.clone())),
            Envelope::Unrecognized {
                reason: DecodeError::InvalidPatch(cause),
                ..
            } => {
                warn!("Rejected diff: {}", cause);
                Err(SyncError::InvalidDiff(cause.clone()))
            }
            Envelope::Unrecognized { .. } => Ok(Applied::Ignored),
        }
    }

    /// Current state (cloned)
    pub fn current(&self) -> LobbyState {
        self.tx.borrow().clone()
    }

    /// Receive every published state
    pub fn subscribe(&self) -> watch::Receiver<LobbyState> {
        self.tx.subscribe()
    }

    /// Number of successful state changes
    pub fn version(&self) -> u64 {
        self.version
    }

    fn publish(&mut self, state: LobbyState) {
        self.version += 1;
        self.tx.send_replace(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> Envelope {
        Envelope::decode(&value.to_string())
    }

    fn welcome(state: Value) -> Envelope {
        decode(json!({"type": "welcome", "bundleMeta": {"v": 1}, "initialState": state}))
    }

    fn diff(ops: Value) -> Envelope {
        decode(json!({ "diff": ops }))
    }

    #[test]
    fn test_new_state_is_unset() {
        let sync = Synchronizer::new();
        assert_eq!(sync.current(), LobbyState::default());
        assert!(!sync.current().is_initialized());
        assert_eq!(sync.version(), 0);
    }

    #[test]
    fn test_diffs_before_snapshot_are_dropped() {
        let mut sync = Synchronizer::new();
        let rx = sync.subscribe();

        for _ in 0..3 {
            let result = sync.apply(&diff(json!([{"op": "add", "path": "/a", "value": 1}])));
            assert_eq!(result, Err(SyncError::UninitializedState));
        }

        assert_eq!(sync.current(), LobbyState::default());
        assert!(!rx.has_changed().unwrap());
        assert_eq!(sync.version(), 0);
    }

    #[test]
    fn test_lobby_scenario() {
        let mut sync = Synchronizer::new();

        assert_eq!(sync.apply(&welcome(json!({"count": 0}))), Ok(Applied::Snapshot));
        assert_eq!(sync.current().state, Some(json!({"count": 0})));
        assert_eq!(sync.current().bundle_meta, Some(json!({"v": 1})));

        let applied = sync.apply(&diff(json!([{"op": "replace", "path": "/count", "value": 5}])));
        assert_eq!(applied, Ok(Applied::Diff { operations: 1 }));
        assert_eq!(sync.current().state, Some(json!({"count": 5})));

        let rejected = sync.apply(&diff(json!([{"op": "add", "path": "/players/-", "value": "p2"}])));
        assert!(matches!(rejected, Err(SyncError::PatchApply(_))));
        assert_eq!(sync.current().state, Some(json!({"count": 5})));
        assert_eq!(sync.version(), 2);
    }

    #[test]
    fn test_snapshot_always_replaces() {
        let mut sync = Synchronizer::new();
        sync.apply(&welcome(json!({"count": 0, "players": []}))).unwrap();
        sync.apply(&diff(json!([{"op": "add", "path": "/players/-", "value": "p1"}])))
            .unwrap();

        let resync = decode(json!({"type": "welcome", "bundleMeta": null, "initialState": {"round": 2}}));
        sync.apply(&resync).unwrap();

        assert_eq!(
            sync.current(),
            LobbyState {
                bundle_meta: Some(Value::Null),
                state: Some(json!({"round": 2})),
            }
        );
    }

    #[test]
    fn test_partial_diff_failure_is_atomic() {
        let mut sync = Synchronizer::new();
        sync.apply(&welcome(json!({"count": 0}))).unwrap();
        let mut rx = sync.subscribe();
        rx.borrow_and_update();

        let result = sync.apply(&diff(json!([
            {"op": "replace", "path": "/count", "value": 9},
            {"op": "test", "path": "/count", "value": 0}
        ])));

        match result {
            Err(SyncError::PatchApply(e)) => assert_eq!(e.index, 1),
            other => panic!("Expected PatchApply, got {:?}", other),
        }
        assert_eq!(sync.current().state, Some(json!({"count": 0})));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_diffs_apply_in_order() {
        let mut sync = Synchronizer::new();
        sync.apply(&welcome(json!({"log": []}))).unwrap();
        for n in 0..4 {
            sync.apply(&diff(json!([{"op": "add", "path": "/log/-", "value": n}])))
                .unwrap();
        }
        assert_eq!(sync.current().state, Some(json!({"log": [0, 1, 2, 3]})));
    }

    #[test]
    fn test_unrecognized_frames() {
        let mut sync = Synchronizer::new();
        assert!(matches!(
            sync.apply(&Envelope::decode("not json")),
            Err(SyncError::Parse(_))
        ));
        assert_eq!(
            sync.apply(&Envelope::decode(r#"{"type":"info","message":"hi"}"#)),
            Ok(Applied::Ignored)
        );
        assert_eq!(sync.current(), LobbyState::default());
    }

    #[test]
    fn test_malformed_diff_entries_are_rejected() {
        let mut sync = Synchronizer::new();
        sync.apply(&welcome(json!({"count": 0}))).unwrap();
        let rx = sync.subscribe();

        let result = sync.apply(&diff(json!([{"op": "replace", "path": "/count"}])));
        assert!(matches!(result, Err(SyncError::InvalidDiff(_))));
        assert_eq!(sync.current().state, Some(json!({"count": 0})));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(sync.version(), 1);
    }

    #[test]
    fn test_diff_keeps_bundle_meta() {
        let mut sync = Synchronizer::new();
        sync.apply(&welcome(json!({"count": 0}))).unwrap();
        let mut rx = sync.subscribe();

        sync.apply(&diff(json!([{"op": "replace", "path": "/count", "value": 3}])))
            .unwrap();
        let published = rx.borrow_and_update().clone();
        assert_eq!(published.bundle_meta, Some(json!({"v": 1})));
        assert_eq!(published.state, Some(json!({"count": 3})));
        assert_eq!(sync.version(), 2);
    }

    #[test]
    fn test_subscriber_sees_published_state() {
        let mut sync = Synchronizer::new();
        let mut rx = sync.subscribe();
        sync.apply(&welcome(json!({"count": 1}))).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().state, Some(json!({"count": 1})));
    }
}
