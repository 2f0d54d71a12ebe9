//! Dispatcher handed to effect handlers and projections
//!
//! Actions dispatched here re-enter the full pipeline (reduce, commit,
//! notify, effects) exactly like a dispatch on the store itself. This enables
//! patterns like `USER_REQUEST_PROFILE` -> fetch -> `USER_RECEIVE_PROFILE`.
//!
//! The dispatcher only holds a weak reference, so in-flight effect tasks
//! never keep a discarded store alive.

use crate::action::Action;
use crate::error::StoreError;
use crate::store::Inner;
use crate::State;
use std::sync::{Arc, Weak};

/// Dispatch capability bound to one store
#[derive(Clone)]
pub struct Dispatcher {
    store: Weak<Inner>,
}

impl Dispatcher {
    pub(crate) fn new(store: &Arc<Inner>) -> Self {
        Self {
            store: Arc::downgrade(store),
        }
    }

    /// Dispatch an action through the store's pipeline
    ///
    /// If the store has been dropped the action is logged and discarded.
    pub fn dispatch(&self, action: Action) -> Result<(), StoreError> {
        match self.store.upgrade() {
            Some(store) => store.dispatch(action),
            None => {
                log::warn!(
                    "Dispatcher: store is gone, dropping action '{}'",
                    action.tag()
                );
                Ok(())
            }
        }
    }

    /// Latest committed state, if the store is still alive
    pub fn state(&self) -> Option<State> {
        self.store.upgrade().map(|store| store.snapshot())
    }

    pub fn is_connected(&self) -> bool {
        self.store.strong_count() > 0
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{create_store, Action, Branch, Reducer};
    use serde_json::json;

    fn store() -> crate::Store {
        let tree = Branch::new()
            .with(
                "game",
                Reducer::new(json!({"enabled": false}))
                    .unwrap()
                    .set("GAME_ENABLE", json!({"enabled": true}))
                    .unwrap(),
            )
            .unwrap();
        create_store(tree, None).unwrap()
    }

    #[test]
    fn test_dispatcher_reenters_pipeline() {
        let store = store();
        let dispatcher = store.dispatcher();

        dispatcher.dispatch(Action::new("GAME_ENABLE")).unwrap();

        assert_eq!(store.get_state()["game"]["enabled"], json!(true));
        assert_eq!(dispatcher.state().unwrap()["game"]["enabled"], json!(true));
    }

    #[test]
    fn test_dispatcher_after_store_dropped() {
        let dispatcher = store().dispatcher();

        assert!(!dispatcher.is_connected());
        assert!(dispatcher.dispatch(Action::new("GAME_ENABLE")).is_ok());
        assert!(dispatcher.state().is_none());
    }
}
