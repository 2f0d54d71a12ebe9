//! Store - holds the state tree and runs the dispatch pipeline
//!
//! ```text
//! dispatch(action)
//!   1. reduce: tree reducer computes the next state from the committed one
//!   2. commit: the next state replaces the committed one
//!   3. notify: listeners, then observers
//!   4. effects: every effect handler for the tag is invoked in registration
//!      order and its future spawned as a detached task
//! ```
//!
//! Steps 1-3 run under a commit lock, so two dispatches never interleave
//! their reducer passes. Step 4 runs after the lock is released, which lets
//! effect handlers dispatch again. `dispatch` never waits for an effect to
//! finish; a failing effect is logged and otherwise unobserved, so handlers
//! are expected to turn their own failures into follow-up actions.

use crate::action::Action;
use crate::config::StoreConfig;
use crate::dispatcher::Dispatcher;
use crate::effect::{EffectHandler, EffectRegistry};
use crate::error::StoreError;
use crate::listener::{Listeners, Subscription};
use crate::observer::{LoggingObserver, Observer};
use crate::projection::Projection;
use crate::tree::ReducerNode;
use crate::State;
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, ThreadId};
use tokio::runtime::Handle;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct Inner {
    config: StoreConfig,
    tree: ReducerNode,
    state: RwLock<State>,
    commit: Mutex<()>,
    committing: Mutex<Option<ThreadId>>,
    listeners: Arc<Mutex<Listeners>>,
    effects: RwLock<EffectRegistry>,
    observers: Mutex<Vec<Box<dyn Observer>>>,
    runtime: Option<Handle>,
}

/// Marks the current thread as committing until dropped
struct CommitMark<'a>(&'a Mutex<Option<ThreadId>>);

impl<'a> CommitMark<'a> {
    fn set(slot: &'a Mutex<Option<ThreadId>>) -> Self {
        *lock(slot) = Some(thread::current().id());
        Self(slot)
    }
}

impl Drop for CommitMark<'_> {
    fn drop(&mut self) {
        *lock(self.0) = None;
    }
}

impl Inner {
    pub(crate) fn snapshot(&self) -> State {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn is_committing_here(&self) -> bool {
        *lock(&self.committing) == Some(thread::current().id())
    }

    pub(crate) fn dispatch(self: &Arc<Self>, action: Action) -> Result<(), StoreError> {
        if self.is_committing_here() {
            return Err(StoreError::ReentrantDispatch {
                tag: action.tag().to_string(),
            });
        }

        {
            let _commit = lock(&self.commit);
            let _mark = CommitMark::set(&self.committing);

            let prior = self.snapshot();
            let next = Arc::new(self.tree.compute_next(&prior, &action)?);
            *self.state.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);

            self.notify(&action, &next);
        }

        self.run_effects(action);
        Ok(())
    }

    fn notify(&self, action: &Action, state: &Value) {
        let listeners = lock(&self.listeners).snapshot();
        for listener in listeners {
            listener(state);
        }

        for observer in lock(&self.observers).iter_mut() {
            observer.on_commit(action, state);
        }
    }

    fn run_effects(self: &Arc<Self>, action: Action) {
        let handlers = self
            .effects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers_for(action.tag())
            .to_vec();
        if handlers.is_empty() {
            return;
        }

        let runtime = match self.runtime.clone().or_else(|| Handle::try_current().ok()) {
            Some(runtime) => runtime,
            None => {
                log::error!(
                    "[{}] No tokio runtime, skipping {} effect handler(s) for '{}'",
                    self.config.name,
                    handlers.len(),
                    action.tag()
                );
                return;
            }
        };

        let dispatcher = Dispatcher::new(self);
        for (index, handler) in handlers.iter().enumerate() {
            let future = handler.invoke(action.clone(), dispatcher.clone(), || self.snapshot());
            let store_name = self.config.name.clone();
            let tag = action.tag().to_string();
            runtime.spawn(async move {
                if let Err(e) = future.await {
                    log::error!(
                        "[{}] Effect handler #{} for '{}' failed: {:#}",
                        store_name,
                        index,
                        tag,
                        e
                    );
                }
            });
        }
    }

    fn subscribe(&self, listener: Arc<dyn Fn(&Value) + Send + Sync>) -> Subscription {
        let id = lock(&self.listeners).add(listener);
        Subscription::new(id, &self.listeners)
    }
}

/// Redux-style store: one state tree, replaced on every dispatch
///
/// Cloning a `Store` yields another handle to the same store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

/// Create a store from a reducer tree and an optional seed state
///
/// Fails if the seed does not fit the tree's shape.
pub fn create_store(
    tree: impl Into<ReducerNode>,
    seed: Option<Value>,
) -> Result<Store, StoreError> {
    let mut builder = Store::builder(tree);
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    builder.build()
}

impl Store {
    pub fn builder(tree: impl Into<ReducerNode>) -> StoreBuilder {
        StoreBuilder {
            tree: tree.into(),
            config: StoreConfig::default(),
            seed: None,
            observers: Vec::new(),
            runtime: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Most recently committed state
    pub fn get_state(&self) -> State {
        self.inner.snapshot()
    }

    /// Process an action: reduce and commit, notify, then start its effects
    ///
    /// Returns once the state is committed and the effect tasks are spawned;
    /// it does not wait for the effects. An `Err` only ever comes from the
    /// reducer pass and means nothing was committed. Without a tokio runtime
    /// the effects for the action are skipped and logged at error level.
    pub fn dispatch(&self, action: Action) -> Result<(), StoreError> {
        self.inner.dispatch(action)
    }

    /// Dispatch capability for code that must not own the store
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(&self.inner)
    }

    /// Register a listener, called once per commit with the new state
    ///
    /// Listeners run before the effects of the same dispatch. They must not
    /// dispatch synchronously; doing so fails with
    /// [`StoreError::ReentrantDispatch`].
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner.subscribe(Arc::new(listener))
    }

    /// Run `f` with no commit able to happen at the same time
    pub(crate) fn with_commit_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        if self.inner.is_committing_here() {
            // Already inside a commit on this thread, nothing can slip in.
            return f();
        }
        let _commit = lock(&self.inner.commit);
        let _mark = CommitMark::set(&self.inner.committing);
        f()
    }

    /// Derive props from the state, kept current on every commit
    ///
    /// `map` runs as a listener, so the [`Dispatcher`] it receives cannot be
    /// used inside `map` itself: such a dispatch fails with
    /// [`StoreError::ReentrantDispatch`]. Hand the dispatcher out through the
    /// props and dispatch from there.
    pub fn project<P, F>(&self, map: F) -> Projection<P>
    where
        P: Send + Sync + 'static,
        F: Fn(&Value, &Dispatcher) -> P + Send + Sync + 'static,
    {
        Projection::new(self, map)
    }

    /// Register an effect handler for `tag`
    ///
    /// Handlers only see dispatches made after they were registered.
    pub fn register_effect(&self, tag: impl Into<String>, handler: EffectHandler) {
        let tag = tag.into();
        log::debug!("[{}] Registered effect handler for '{}'", self.name(), tag);
        self.inner
            .effects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(tag, handler);
    }

    /// Register an effect handler that only needs the action and a dispatcher
    ///
    /// `f` itself is called on the dispatching thread after the commit; only
    /// the future it returns runs as a detached task. A panic in `f` unwinds
    /// out of `dispatch` and skips the handlers registered after it, so keep
    /// `f` to building the future.
    pub fn effect<F, Fut>(&self, tag: impl Into<String>, f: F)
    where
        F: Fn(Action, Dispatcher) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register_effect(tag, EffectHandler::stateless(f));
    }

    /// Register an effect handler that also receives a state snapshot
    ///
    /// Same calling rules as [`Store::effect`].
    pub fn effect_with_state<F, Fut>(&self, tag: impl Into<String>, f: F)
    where
        F: Fn(Action, Dispatcher, State) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register_effect(tag, EffectHandler::with_state(f));
    }

    pub fn effect_count(&self, tag: &str) -> usize {
        self.inner
            .effects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .count(tag)
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner.listeners).len()
    }
}

/// Builder for [`Store`]
pub struct StoreBuilder {
    tree: ReducerNode,
    config: StoreConfig,
    seed: Option<Value>,
    observers: Vec<Box<dyn Observer>>,
    runtime: Option<Handle>,
}

impl StoreBuilder {
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Initial values for part or all of the tree
    pub fn seed(mut self, seed: Value) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Attach an observer; observers run in the order they were added
    pub fn observer(mut self, observer: impl Observer + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Runtime to spawn effect tasks on instead of the ambient one
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<Store, StoreError> {
        let state = self.tree.initial_state(self.seed.as_ref())?;

        let mut observers = Vec::with_capacity(self.observers.len() + 1);
        if self.config.log_actions {
            observers.push(Box::new(
                LoggingObserver::new(self.config.name.clone()).with_state(self.config.log_state),
            ) as Box<dyn Observer>);
        }
        observers.extend(self.observers);

        log::info!(
            "[{}] Store created with {} slice(s)",
            self.config.name,
            self.tree.leaf_paths().len()
        );

        Ok(Store {
            inner: Arc::new(Inner {
                config: self.config,
                tree: self.tree,
                state: RwLock::new(Arc::new(state)),
                commit: Mutex::new(()),
                committing: Mutex::new(None),
                listeners: Arc::new(Mutex::new(Listeners::default())),
                effects: RwLock::new(EffectRegistry::new()),
                observers: Mutex::new(observers),
                runtime: self.runtime,
            }),
        })
    }
}
