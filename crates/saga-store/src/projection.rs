//! Projections - derived props for a presentation layer
//!
//! A projection maps `(state, dispatcher)` to whatever a view needs and keeps
//! the result current: it is recomputed once per commit, in commit order.
//! Binding the props to actual widgets is left to the caller.

use crate::dispatcher::Dispatcher;
use crate::listener::Subscription;
use crate::store::Store;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};

/// Props derived from the store, refreshed on every commit
///
/// Dropping the projection stops the updates.
pub struct Projection<P> {
    latest: Arc<RwLock<P>>,
    subscription: Option<Subscription>,
}

impl<P> Projection<P>
where
    P: Send + Sync + 'static,
{
    pub(crate) fn new<F>(store: &Store, map: F) -> Self
    where
        F: Fn(&Value, &Dispatcher) -> P + Send + Sync + 'static,
    {
        let dispatcher = store.dispatcher();

        // The initial props and the subscription must see the same commit.
        store.with_commit_lock(|| {
            let state = store.get_state();
            let latest = Arc::new(RwLock::new(map(state.as_ref(), &dispatcher)));
            let target = Arc::clone(&latest);
            let subscription = store.subscribe(move |state| {
                let props = map(state, &dispatcher);
                *target.write().unwrap_or_else(PoisonError::into_inner) = props;
            });
            Self {
                latest,
                subscription: Some(subscription),
            }
        })
    }

    /// Run `f` against the latest props
    pub fn with<R>(&self, f: impl FnOnce(&P) -> R) -> R {
        f(&self.latest.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Stop following the store; the last props stay readable
    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

impl<P: Clone> Projection<P> {
    /// Copy of the latest props
    pub fn current(&self) -> P {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<P> Drop for Projection<P> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{create_store, Action, Branch, Reducer, Store, StoreError};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct ScoreProps {
        score: i64,
        enabled: bool,
    }

    fn store() -> Store {
        let game = Reducer::new(json!({"enabled": false, "score": 0}))
            .unwrap()
            .set("GAME_ENABLE", json!({"enabled": true}))
            .unwrap()
            .on("GAME_SCORE_ADD", |slice, action| {
                let score = slice["score"].as_i64().unwrap_or(0);
                Ok(Some(json!({"score": score + action.get_i64("score").unwrap_or(0)})))
            })
            .unwrap();
        create_store(Branch::new().with("game", game).unwrap(), None).unwrap()
    }

    fn score_props(state: &serde_json::Value) -> ScoreProps {
        ScoreProps {
            score: state["game"]["score"].as_i64().unwrap_or(0),
            enabled: state["game"]["enabled"].as_bool().unwrap_or(false),
        }
    }

    #[test]
    fn test_projection_follows_commits() {
        let store = store();
        let projection = store.project(|state, _| score_props(state));
        assert_eq!(
            projection.current(),
            ScoreProps {
                score: 0,
                enabled: false
            }
        );

        store.dispatch(Action::new("GAME_ENABLE")).unwrap();
        store
            .dispatch(Action::new("GAME_SCORE_ADD").with("score", 10))
            .unwrap();

        assert_eq!(
            projection.current(),
            ScoreProps {
                score: 10,
                enabled: true
            }
        );
        assert!(projection.is_active());
    }

    #[test]
    fn test_projection_can_dispatch_through_props() {
        let store = store();
        let projection = store.project(|_, dispatcher| dispatcher.clone());

        projection
            .current()
            .dispatch(Action::new("GAME_SCORE_ADD").with("score", 2))
            .unwrap();

        assert_eq!(store.get_state()["game"]["score"], json!(2));
    }

    #[test]
    fn test_dispatch_inside_map_is_rejected() {
        let store = store();
        let projection = store.project(|state, dispatcher| {
            let rejected = dispatcher.dispatch(Action::new("GAME_ENABLE"));
            (
                state["game"]["enabled"].clone(),
                matches!(rejected, Err(StoreError::ReentrantDispatch { .. })),
            )
        });
        assert_eq!(projection.current(), (json!(false), true));

        store
            .dispatch(Action::new("GAME_SCORE_ADD").with("score", 1))
            .unwrap();

        assert_eq!(projection.current(), (json!(false), true));
        assert_eq!(store.get_state()["game"]["enabled"], json!(false));
    }

    #[test]
    fn test_dropping_projection_unsubscribes() {
        let store = store();
        let projection = store.project(|state, _| score_props(state));
        assert_eq!(store.listener_count(), 1);

        drop(projection);

        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_detached_projection_keeps_last_props() {
        let store = store();
        let mut projection = store.project(|state, _| score_props(state));
        store
            .dispatch(Action::new("GAME_SCORE_ADD").with("score", 1))
            .unwrap();

        projection.detach();
        store
            .dispatch(Action::new("GAME_SCORE_ADD").with("score", 1))
            .unwrap();

        assert!(!projection.is_active());
        assert_eq!(projection.with(|props| props.score), 1);
    }
}
