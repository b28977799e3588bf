//! Candidate identity normalization
//!
//! Listing records identify themselves inconsistently: some carry a string
//! `id`, some a string `_id`, some a database object-id wrapper
//! (`{"_id": {"$oid": "..."}}`), and a few carry numbers. `normalize` folds
//! all of these into one string key.

use cq_common::api::RawCandidate;
use serde::Serialize;
use serde_json::Value;

/// Sub-key of the database object-id wrapper
pub const OBJECT_ID_KEY: &str = "$oid";

/// Normalized candidate identity
///
/// An empty identity is the placeholder for records that carry no usable
/// id; such cards render with a positional key and still commit with the
/// (empty) best-effort identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Identity of a record with no usable id
    pub fn placeholder() -> Self {
        Self(String::new())
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key a renderer should use for the card at `position`
    pub fn render_key(&self, position: usize) -> String {
        if self.is_placeholder() {
            synthetic_key(position)
        } else {
            self.0.clone()
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Positional render key for cards without an identity
pub fn synthetic_key(position: usize) -> String {
    format!("card-{}", position)
}

/// Extract the identity of a raw candidate record
///
/// Checked in order:
/// 1. string `id`
/// 2. string `_id`
/// 3. object `_id` with a string `$oid`
/// 4. string coercion of `_id`, then `id`
///
/// Empty strings and `null` count as absent. Pure and deterministic.
pub fn normalize(record: &RawCandidate) -> Identity {
    let id = record.get("id");
    let underscore_id = record.get("_id");

    if let Some(s) = id.and_then(non_empty_str) {
        return Identity::from(s);
    }
    if let Some(s) = underscore_id.and_then(non_empty_str) {
        return Identity::from(s);
    }
    if let Some(s) = underscore_id
        .and_then(|v| v.get(OBJECT_ID_KEY))
        .and_then(non_empty_str)
    {
        return Identity::from(s);
    }

    underscore_id
        .and_then(coerce)
        .or_else(|| id.and_then(coerce))
        .map(Identity::from)
        .unwrap_or_else(Identity::placeholder)
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn coerce(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // Wrappers without a usable $oid: compact JSON is at least stable
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
