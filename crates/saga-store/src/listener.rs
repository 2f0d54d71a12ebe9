//! State change listeners

use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError, Weak};

pub(crate) type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Registered listeners, in subscription order
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: Listener) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Copy of the current listeners, so they can run without holding the lock
    pub(crate) fn snapshot(&self) -> Vec<Listener> {
        self.entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Handle returned by `Store::subscribe`
///
/// The listener stays registered until [`Subscription::unsubscribe`] is
/// called; dropping the handle does not remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub(crate) fn new(id: u64, listeners: &Arc<Mutex<Listeners>>) -> Self {
        Self {
            id,
            listeners: Arc::downgrade(listeners),
        }
    }

    /// Remove the listener. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        match self.listeners.upgrade() {
            Some(listeners) => listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(self.id),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_add_and_unsubscribe() {
        let listeners = Arc::new(Mutex::new(Listeners::default()));
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let id = listeners.lock().unwrap().add(Arc::new(move |_: &Value| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let subscription = Subscription::new(id, &listeners);

        for listener in listeners.lock().unwrap().snapshot() {
            listener(&Value::Null);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(subscription.unsubscribe());
        assert_eq!(listeners.lock().unwrap().len(), 0);
    }

    #[test]
    fn test_unsubscribe_twice_is_harmless() {
        let listeners = Arc::new(Mutex::new(Listeners::default()));
        let id = listeners.lock().unwrap().add(Arc::new(|_: &Value| {}));

        assert!(Subscription::new(id, &listeners).unsubscribe());
        assert!(!Subscription::new(id, &listeners).unsubscribe());
    }
}
