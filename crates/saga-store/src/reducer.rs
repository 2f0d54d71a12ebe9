//! Leaf reducers
//!
//! A leaf owns one slice of the state tree: its initial value and a registry
//! mapping action tags to handlers. A handler is either a function of
//! `(slice, action)` returning a partial patch, or a static patch applied
//! whenever its tag is dispatched. Either way the patch is shallow-merged
//! onto the prior slice, so fields the patch does not mention survive.
//!
//! ```
//! use saga_store::Reducer;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), saga_store::StoreError> {
//! let game = Reducer::new(json!({"enabled": false, "score": 0}))?
//!     .set("GAME_ENABLE", json!({"enabled": true}))?
//!     .on("GAME_SCORE_ADD", |slice, action| {
//!         let score = slice["score"].as_i64().unwrap_or(0);
//!         Ok(Some(json!({"score": score + action.get_i64("score").unwrap_or(0)})))
//!     })?;
//! # let _ = game;
//! # Ok(())
//! # }
//! ```

use crate::action::Action;
use crate::error::{kind_of, StoreError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The state owned by one leaf
pub type Slice = Map<String, Value>;

/// A partial slice, shallow-merged onto the prior slice
pub type Patch = Map<String, Value>;

type ReduceFn = dyn Fn(&Slice, &Action) -> anyhow::Result<Option<Value>> + Send + Sync;

/// A reducer handler for one tag
#[derive(Clone)]
pub enum Handler {
    /// Applied unconditionally whenever the tag is dispatched
    Patch(Patch),
    /// Computes a patch from the prior slice and the action.
    /// `Ok(None)` or `Ok(Some(Value::Null))` leaves the slice unchanged.
    Reduce(Arc<ReduceFn>),
}

impl Handler {
    /// Static patch handler; `patch` must be a JSON object
    pub fn patch(patch: Value) -> Result<Self, StoreError> {
        match patch {
            Value::Object(map) => Ok(Self::Patch(map)),
            other => Err(StoreError::NotAnObject {
                what: "static patch".to_string(),
                found: kind_of(&other),
            }),
        }
    }

    /// Function handler
    pub fn reduce<F>(f: F) -> Self
    where
        F: Fn(&Slice, &Action) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        Self::Reduce(Arc::new(f))
    }

    fn apply(&self, slice: &Slice, action: &Action) -> anyhow::Result<Slice> {
        match self {
            Handler::Patch(patch) => Ok(merge(slice, patch)),
            Handler::Reduce(f) => match f(slice, action)? {
                None | Some(Value::Null) => Ok(slice.clone()),
                Some(Value::Object(patch)) => Ok(merge(slice, &patch)),
                Some(other) => anyhow::bail!(
                    "handler returned {} where a patch object was expected",
                    kind_of(&other)
                ),
            },
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Patch(patch) => f.debug_tuple("Patch").field(patch).finish(),
            Handler::Reduce(_) => f.write_str("Reduce(..)"),
        }
    }
}

fn merge(slice: &Slice, patch: &Patch) -> Slice {
    let mut next = slice.clone();
    for (key, value) in patch {
        next.insert(key.clone(), value.clone());
    }
    next
}

/// A leaf reducer: initial slice plus its handler registry
#[derive(Debug, Clone)]
pub struct Reducer {
    initial: Slice,
    handlers: HashMap<String, Handler>,
}

impl Reducer {
    /// Create a leaf with no handlers; `initial` must be a JSON object
    pub fn new(initial: Value) -> Result<Self, StoreError> {
        match initial {
            Value::Object(initial) => Ok(Self {
                initial,
                handlers: HashMap::new(),
            }),
            other => Err(StoreError::NotAnObject {
                what: "initial slice".to_string(),
                found: kind_of(&other),
            }),
        }
    }

    /// Create a leaf from a static body of `tag -> handler` pairs
    ///
    /// Shares the duplicate-tag rule with [`Reducer::handle`].
    pub fn with_body<I, K>(initial: Value, body: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (K, Handler)>,
        K: Into<String>,
    {
        let mut reducer = Self::new(initial)?;
        for (tag, handler) in body {
            reducer.handle(tag, handler)?;
        }
        Ok(reducer)
    }

    /// Register a handler for `tag`
    ///
    /// Fails if the tag already has a handler on this leaf; handlers are
    /// never silently replaced.
    pub fn handle(&mut self, tag: impl Into<String>, handler: Handler) -> Result<(), StoreError> {
        let tag = tag.into();
        if self.handlers.contains_key(&tag) {
            return Err(StoreError::DuplicateHandler { tag });
        }
        log::trace!("Registered reducer handler for '{}'", tag);
        self.handlers.insert(tag, handler);
        Ok(())
    }

    /// Builder form of [`Reducer::handle`] with a function handler
    pub fn on<F>(mut self, tag: impl Into<String>, f: F) -> Result<Self, StoreError>
    where
        F: Fn(&Slice, &Action) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        self.handle(tag, Handler::reduce(f))?;
        Ok(self)
    }

    /// Builder form of [`Reducer::handle`] with a static patch
    pub fn set(mut self, tag: impl Into<String>, patch: Value) -> Result<Self, StoreError> {
        self.handle(tag, Handler::patch(patch)?)?;
        Ok(self)
    }

    pub fn initial(&self) -> &Slice {
        &self.initial
    }

    pub fn handles(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Compute the next slice
    ///
    /// A tag with no handler returns the prior slice unchanged.
    pub fn reduce(&self, slice: &Slice, action: &Action) -> anyhow::Result<Slice> {
        match self.handlers.get(action.tag()) {
            Some(handler) => handler.apply(slice, action),
            None => Ok(slice.clone()),
        }
    }
}
