//! Effect handlers ("sagas")
//!
//! Effect handlers run after an action has been committed. They receive the
//! action and a [`Dispatcher`], and optionally a snapshot of the whole state
//! taken when the handler is invoked. Whether a handler wants the snapshot is
//! declared when it is built, not inferred from its signature.
//!
//! Several handlers may be registered for one tag; all of them run, in
//! registration order, for every dispatch of that tag.

use crate::action::Action;
use crate::dispatcher::Dispatcher;
use crate::State;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// BoxFuture type alias for async effect handlers
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The detached unit of work an effect handler produces
pub type EffectFuture = BoxFuture<'static, anyhow::Result<()>>;

type StatelessFn = dyn Fn(Action, Dispatcher) -> EffectFuture + Send + Sync;
type StatefulFn = dyn Fn(Action, Dispatcher, State) -> EffectFuture + Send + Sync;

/// An effect handler together with its declared capability
#[derive(Clone)]
pub enum EffectHandler {
    /// Needs only the action and a dispatcher
    Stateless(Arc<StatelessFn>),
    /// Also needs a snapshot of the current state
    NeedsState(Arc<StatefulFn>),
}

impl EffectHandler {
    /// Build a handler that does not read state
    ///
    /// Anything `f` does before returning its future runs synchronously on
    /// the dispatching thread, and a panic there unwinds out of `dispatch`;
    /// the future itself runs as a detached task.
    pub fn stateless<F, Fut>(f: F) -> Self
    where
        F: Fn(Action, Dispatcher) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let handler = move |action: Action, dispatcher: Dispatcher| -> EffectFuture {
            Box::pin(f(action, dispatcher))
        };
        Self::Stateless(Arc::new(handler))
    }

    /// Build a handler that receives a state snapshot
    pub fn with_state<F, Fut>(f: F) -> Self
    where
        F: Fn(Action, Dispatcher, State) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let handler = move |action: Action, dispatcher: Dispatcher, state: State| -> EffectFuture {
            Box::pin(f(action, dispatcher, state))
        };
        Self::NeedsState(Arc::new(handler))
    }

    pub fn needs_state(&self) -> bool {
        matches!(self, EffectHandler::NeedsState(_))
    }

    /// Invoke the handler, producing its future
    ///
    /// `snapshot` is only called for handlers that declared they need state.
    pub(crate) fn invoke(
        &self,
        action: Action,
        dispatcher: Dispatcher,
        snapshot: impl FnOnce() -> State,
    ) -> EffectFuture {
        match self {
            EffectHandler::Stateless(f) => f(action, dispatcher),
            EffectHandler::NeedsState(f) => f(action, dispatcher, snapshot()),
        }
    }
}

impl fmt::Debug for EffectHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectHandler::Stateless(_) => f.write_str("Stateless(..)"),
            EffectHandler::NeedsState(_) => f.write_str("NeedsState(..)"),
        }
    }
}

/// Tag -> ordered effect handlers
#[derive(Debug, Clone, Default)]
pub struct EffectRegistry {
    handlers: HashMap<String, Vec<EffectHandler>>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler for `tag`; earlier handlers for the tag are kept
    pub fn register(&mut self, tag: impl Into<String>, handler: EffectHandler) {
        self.handlers.entry(tag.into()).or_default().push(handler);
    }

    /// Handlers for `tag` in registration order
    pub fn handlers_for(&self, tag: &str) -> &[EffectHandler] {
        self.handlers.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, tag: &str) -> usize {
        self.handlers_for(tag).len()
    }
}
