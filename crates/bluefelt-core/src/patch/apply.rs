//! Patch application
//!
//! RFC 6902 semantics over `serde_json::Value`. A Diff is applied to a private
//! copy of the document, so a failing operation never leaves a partially
//! patched value behind.

use serde_json::Value;

use super::pointer::{self, array_index};
use super::types::{PatchApplyError, PatchError, PatchOp};

/// Apply an ordered list of operations, all-or-nothing
///
/// Returns the patched document, or the first failing operation. `doc` is
/// never modified.
pub fn apply_patch(doc: &Value, ops: &[PatchOp]) -> Result<Value, PatchApplyError> {
    let mut next = doc.clone();
    for (index, op) in ops.iter().enumerate() {
        apply_op(&mut next, op).map_err(|source| PatchApplyError {
            index,
            op: op.name(),
            source,
        })?;
    }
    Ok(next)
}

/// Apply a single operation in place
///
/// On error `doc` may hold the effects of earlier steps of a `move`; callers
/// needing atomicity should go through [`apply_patch`].
pub fn apply_op(doc: &mut Value, op: &PatchOp) -> Result<(), PatchError> {
    match op {
        PatchOp::Add { path, value } => add(doc, path, value.clone()),
        PatchOp::Remove { path } => remove(doc, path).map(drop),
        PatchOp::Replace { path, value } => replace(doc, path, value.clone()),
        PatchOp::Move { from, path } => move_value(doc, from, path),
        PatchOp::Copy { from, path } => {
            let tokens = pointer::parse(from)?;
            let value = get(doc, &tokens).cloned().ok_or_else(|| not_found(from))?;
            add(doc, path, value)
        }
        PatchOp::Test { path, value } => {
            let tokens = pointer::parse(path)?;
            let actual = get(doc, &tokens).ok_or_else(|| not_found(path))?;
            if json_eq(actual, value) {
                Ok(())
            } else {
                Err(PatchError::TestFailed {
                    path: path.clone(),
                    expected: value.clone(),
                    actual: actual.clone(),
                })
            }
        }
    }
}

// ── Navigation ────────────────────────────────────────────────────────────

fn get<'a>(doc: &'a Value, tokens: &[String]) -> Option<&'a Value> {
    tokens.iter().try_fold(doc, |node, token| match node {
        Value::Object(map) => map.get(token),
        Value::Array(items) => array_index(token).and_then(|i| items.get(i)),
        _ => None,
    })
}

fn get_mut<'a>(doc: &'a mut Value, tokens: &[String]) -> Option<&'a mut Value> {
    tokens.iter().try_fold(doc, |node, token| match node {
        Value::Object(map) => map.get_mut(token),
        Value::Array(items) => array_index(token).and_then(move |i| items.get_mut(i)),
        _ => None,
    })
}

/// Split a non-root pointer into its parent container and final token
fn parent_mut<'a>(
    doc: &'a mut Value,
    tokens: &'a [String],
    path: &str,
) -> Result<(&'a mut Value, &'a str), PatchError> {
    let (last, parent) = tokens.split_last().ok_or_else(|| PatchError::InvalidTarget {
        path: path.to_string(),
    })?;
    let parent = get_mut(doc, parent).ok_or_else(|| not_found(path))?;
    Ok((parent, last.as_str()))
}

// ── Operations ────────────────────────────────────────────────────────────

fn add(doc: &mut Value, path: &str, value: Value) -> Result<(), PatchError> {
    let tokens = pointer::parse(path)?;
    if tokens.is_empty() {
        *doc = value;
        return Ok(());
    }
    let (parent, key) = parent_mut(doc, &tokens, path)?;
    match parent {
        Value::Object(map) => {
            map.insert(key.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            if key == "-" {
                items.push(value);
                return Ok(());
            }
            match array_index(key) {
                Some(index) if index <= items.len() => {
                    items.insert(index, value);
                    Ok(())
                }
                _ => Err(invalid_index(path)),
            }
        }
        _ => Err(PatchError::InvalidTarget {
            path: path.to_string(),
        }),
    }
}

fn remove(doc: &mut Value, path: &str) -> Result<Value, PatchError> {
    let tokens = pointer::parse(path)?;
    let (parent, key) = parent_mut(doc, &tokens, path)?;
    match parent {
        Value::Object(map) => map.remove(key).ok_or_else(|| not_found(path)),
        Value::Array(items) => match array_index(key) {
            Some(index) if index < items.len() => Ok(items.remove(index)),
            Some(_) => Err(not_found(path)),
            None => Err(invalid_index(path)),
        },
        _ => Err(not_found(path)),
    }
}

fn replace(doc: &mut Value, path: &str, value: Value) -> Result<(), PatchError> {
    let tokens = pointer::parse(path)?;
    let target = get_mut(doc, &tokens).ok_or_else(|| not_found(path))?;
    *target = value;
    Ok(())
}

fn move_value(doc: &mut Value, from: &str, path: &str) -> Result<(), PatchError> {
    let from_tokens = pointer::parse(from)?;
    let path_tokens = pointer::parse(path)?;

    if from_tokens == path_tokens {
        return get(doc, &from_tokens).map(drop).ok_or_else(|| not_found(from));
    }
    if path_tokens.starts_with(&from_tokens) {
        return Err(PatchError::MoveIntoSelf {
            from: from.to_string(),
            path: path.to_string(),
        });
    }

    let value = remove(doc, from)?;
    add(doc, path, value)
}

/// JSON equality: numbers compare by value, so `1` equals `1.0`
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x == y || matches!((x.as_f64(), y.as_f64()), (Some(l), Some(r)) if l == r)
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| json_eq(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, l)| y.get(key).is_some_and(|r| json_eq(l, r)))
        }
        _ => a == b,
    }
}

fn not_found(path: &str) -> PatchError {
    PatchError::PathNotFound {
        path: path.to_string(),
    }
}

fn invalid_index(path: &str) -> PatchError {
    PatchError::InvalidIndex {
        path: path.to_string(),
    }
}
