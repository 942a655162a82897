//! Envelope Decoder
//!
//! Classifies raw inbound text frames. Decoding never fails: anything that
//! is not a Snapshot or a Diff comes back as [`Envelope::Unrecognized`] so a
//! bad frame never aborts the stream.
//!
//! Wire shapes:
//! - Snapshot: `{"type":"welcome","bundleMeta":<any>,"initialState":<any>}`
//! - Diff: `{"diff":[<patch op>, ...]}` (extra fields such as `type`/`verb`
//!   on the server's event broadcast are ignored)

use serde_json::{Map, Value};
use thiserror::Error;

use crate::patch::PatchOp;

/// Value of the `type` field that marks a Snapshot
pub const SNAPSHOT_MARKER: &str = "welcome";

/// Why a frame was not classified as a Snapshot or a Diff
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid JSON: {0}")]
    Parse(String),

    #[error("Unknown message shape")]
    UnknownShape,

    #[error("Invalid patch list: {0}")]
    InvalidPatch(String),

    #[error("Snapshot is missing '{0}'")]
    MissingField(&'static str),
}

/// A classified inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Full authoritative state
    Snapshot {
        bundle_meta: Value,
        initial_state: Value,
    },
    /// Ordered patch operations against the current state
    Diff { operations: Vec<PatchOp> },
    /// Anything else; recorded in the log but never applied
    Unrecognized { raw: String, reason: DecodeError },
}

impl Envelope {
    /// Classify a raw text frame
    pub fn decode(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => return Self::unrecognized(raw, DecodeError::Parse(e.to_string())),
        };

        let Value::Object(mut fields) = value else {
            return Self::unrecognized(raw, DecodeError::UnknownShape);
        };

        if fields.get("type").and_then(Value::as_str) == Some(SNAPSHOT_MARKER) {
            return Self::snapshot(raw, &mut fields);
        }

        match fields.remove("diff") {
            Some(diff @ Value::Array(_)) => match serde_json::from_value(diff) {
                Ok(operations) => Envelope::Diff { operations },
                Err(e) => Self::unrecognized(raw, DecodeError::InvalidPatch(e.to_string())),
            },
            _ => Self::unrecognized(raw, DecodeError::UnknownShape),
        }
    }

    fn snapshot(raw: &str, fields: &mut Map<String, Value>) -> Self {
        let Some(initial_state) = fields.remove("initialState") else {
            return Self::unrecognized(raw, DecodeError::MissingField("initialState"));
        };
        Envelope::Snapshot {
            bundle_meta: fields.remove("bundleMeta").unwrap_or(Value::Null),
            initial_state,
        }
    }

    fn unrecognized(raw: &str, reason: DecodeError) -> Self {
        Envelope::Unrecognized {
            raw: raw.to_string(),
            reason,
        }
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Snapshot { .. } => "snapshot",
            Envelope::Diff { .. } => "diff",
            Envelope::Unrecognized { .. } => "unrecognized",
        }
    }

    /// Human-readable text of a server `info` or `error` notice
    ///
    /// The server sends e.g. `{"type":"info","message":"Waiting for another player..."}`
    /// and `{"type":"error","message":"Lobby does not exist"}`.
    pub fn server_message(&self) -> Option<String> {
        let Envelope::Unrecognized { raw, .. } = self else {
            return None;
        };
        let value: Value = serde_json::from_str(raw).ok()?;
        match value.get("type").and_then(Value::as_str) {
            Some("info") | Some("error") => value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    }
}
