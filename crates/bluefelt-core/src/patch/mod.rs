//! Patch Engine
//!
//! Applies RFC 6902 JSON Patch operations (`add`, `remove`, `replace`,
//! `move`, `copy`, `test`) to a `serde_json::Value`. Paths are RFC 6901
//! JSON Pointers.
//!
//! ```
//! use bluefelt_core::patch::{apply_patch, PatchOp};
//! use serde_json::json;
//!
//! let ops: Vec<PatchOp> =
//!     serde_json::from_value(json!([{"op": "replace", "path": "/count", "value": 5}])).unwrap();
//! let next = apply_patch(&json!({"count": 0}), &ops).unwrap();
//! assert_eq!(next, json!({"count": 5}));
//! ```

mod apply;
pub mod pointer;
mod types;

pub use apply::{apply_op, apply_patch};
pub use types::{PatchApplyError, PatchError, PatchOp};
