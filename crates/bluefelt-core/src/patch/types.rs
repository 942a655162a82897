//! Patch operation and error types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A single JSON-Pointer addressed mutation
///
/// Deserializes from the RFC 6902 wire shape, e.g.
/// `{"op":"replace","path":"/count","value":5}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

impl PatchOp {
    /// Operation name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            PatchOp::Add { .. } => "add",
            PatchOp::Remove { .. } => "remove",
            PatchOp::Replace { .. } => "replace",
            PatchOp::Move { .. } => "move",
            PatchOp::Copy { .. } => "copy",
            PatchOp::Test { .. } => "test",
        }
    }
}

/// Failure of a single patch operation
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PatchError {
    /// Pointer is not empty and does not start with `/`, or has a bad `~` escape
    #[error("Invalid JSON pointer '{pointer}'")]
    InvalidPointer { pointer: String },

    /// Target (or its parent) does not exist
    #[error("Path '{path}' does not exist")]
    PathNotFound { path: String },

    /// Array index token is not a canonical index or is out of range
    #[error("Invalid array index at '{path}'")]
    InvalidIndex { path: String },

    /// Parent is a scalar, or the operation cannot target the document root
    #[error("Cannot apply operation at '{path}'")]
    InvalidTarget { path: String },

    /// `test` found a different value
    #[error("Test failed at '{path}': expected {expected}, found {actual}")]
    TestFailed {
        path: String,
        expected: Value,
        actual: Value,
    },

    /// `move` destination lies inside its own source
    #[error("Cannot move '{from}' into its own child '{path}'")]
    MoveIntoSelf { from: String, path: String },
}

/// A rejected Diff: which operation failed and why
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Patch operation {index} ({op}) failed: {source}")]
pub struct PatchApplyError {
    /// Position of the failing operation within the Diff
    pub index: usize,
    /// Wire name of the failing operation
    pub op: &'static str,
    #[source]
    pub source: PatchError,
}
