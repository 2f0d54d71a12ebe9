//! Commit observers
//!
//! An observer sees every committed action together with the state it
//! produced. Observers sit outside the dispatch pipeline's contract: they
//! cannot change the action or the state, and they run after listeners.
//! This is where devtools-style inspection hooks in.

use crate::action::Action;
use serde_json::Value;

/// Observer trait - sees each action after it has been committed
pub trait Observer: Send {
    /// Called once per commit, after the state has been replaced
    fn on_commit(&mut self, action: &Action, state: &Value);
}

impl<F> Observer for F
where
    F: FnMut(&Action, &Value) + Send,
{
    fn on_commit(&mut self, action: &Action, state: &Value) {
        self(action, state)
    }
}

/// LoggingObserver - logs all actions that pass through the store
pub struct LoggingObserver {
    store_name: String,
    log_state: bool,
}

impl LoggingObserver {
    pub fn new(store_name: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
            log_state: false,
        }
    }

    /// Also trace the full state after each commit
    pub fn with_state(mut self, log_state: bool) -> Self {
        self.log_state = log_state;
        self
    }
}

impl Observer for LoggingObserver {
    fn on_commit(&mut self, action: &Action, state: &Value) {
        if action.payload().is_empty() {
            log::debug!("[{}] Action: {}", self.store_name, action.tag());
        } else {
            log::debug!(
                "[{}] Action: {} {}",
                self.store_name,
                action.tag(),
                Value::Object(action.payload().clone())
            );
        }
        if self.log_state {
            log::trace!("[{}] State: {}", self.store_name, state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_closure_observer() {
        let mut seen = Vec::new();
        {
            let mut observer = |action: &Action, _state: &Value| seen.push(action.tag().to_string());
            observer.on_commit(&Action::new("GAME_ENABLE"), &json!({}));
            observer.on_commit(&Action::new("GAME_DISABLE"), &json!({}));
        }
        assert_eq!(seen, vec!["GAME_ENABLE", "GAME_DISABLE"]);
    }

    #[test]
    fn test_logging_observer_accepts_any_action() {
        let mut observer = LoggingObserver::new("main").with_state(true);
        observer.on_commit(&Action::new("GAME_SCORE_ADD").with("score", 1), &json!({"game": {}}));
        observer.on_commit(&Action::new("GAME_ENABLE"), &json!({"game": {}}));
    }
}
