//! Store errors
//!
//! Construction errors (duplicate handlers, duplicate keys, invalid slices,
//! seed shape mismatches) surface while the reducer tree or store is being
//! built. Reducer errors surface from `dispatch` and leave the committed
//! state untouched. Effect handler failures never show up here: they are
//! logged by the task that ran them, and so is a missing tokio runtime.

use thiserror::Error;

/// Errors raised by the store and its construction helpers
#[derive(Debug, Error)]
pub enum StoreError {
    /// A leaf already has a reducer handler for this tag.
    #[error("Unable to mount reducer handler '{tag}': Handler already exists")]
    DuplicateHandler { tag: String },

    /// A branch already has a child under this key.
    #[error("Cannot create reducer for same key twice: '{key}'")]
    DuplicateKey { key: String },

    /// A slice, patch or seed value that must be a JSON object was not.
    #[error("Expected a JSON object for {what}, got {found}")]
    NotAnObject { what: String, found: &'static str },

    /// The seed state does not fit the reducer tree.
    #[error("Seed state does not match reducer tree at '{path}': {reason}")]
    SeedShapeMismatch { path: String, reason: String },

    /// A reducer handler failed while computing the next state.
    #[error("Reducer at '{path}' failed on '{tag}': {source}")]
    Reducer {
        path: String,
        tag: String,
        #[source]
        source: anyhow::Error,
    },

    /// A listener or observer tried to dispatch while its own notification was running.
    #[error("Cannot dispatch '{tag}' from inside a state notification")]
    ReentrantDispatch { tag: String },
}

/// Name of a JSON value's kind, for error messages
pub(crate) fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
