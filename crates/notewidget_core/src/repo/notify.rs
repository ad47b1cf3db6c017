//! Store-level change notification.
//!
//! # Responsibility
//! - Keep the set of observers registered against the notes store.
//! - Fan out one "data changed" signal per store mutation.
//!
//! # Invariants
//! - Notifications are not scoped to any query predicate.
//! - Observers are invoked without the registry lock held, so an observer
//!   may subscribe or unsubscribe from inside `on_change`.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Listener for notes store mutations.
pub trait ChangeObserver: Send + Sync {
    /// Called after any note row was inserted, updated or deleted.
    fn on_change(&self);
}

/// Handle returned by [`ChangeNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Observer registry owned by a store.
#[derive(Default)]
pub struct ChangeNotifier {
    observers: Mutex<BTreeMap<SubscriptionId, Arc<dyn ChangeObserver>>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn ChangeObserver>) -> SubscriptionId {
        let id = SubscriptionId::generate();
        self.observers().insert(id, observer);
        debug!("event=store_subscribe module=notify status=ok subscription={id}");
        id
    }

    /// Returns `false` when `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.observers().remove(&id).is_some();
        debug!("event=store_unsubscribe module=notify status=ok subscription={id} removed={removed}");
        removed
    }

    pub fn len(&self) -> usize {
        self.observers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers().is_empty()
    }

    /// Invokes every registered observer once.
    pub fn notify_all(&self) {
        let targets = self.observers().values().cloned().collect::<Vec<_>>();
        debug!(
            "event=store_notify module=notify status=ok observers={}",
            targets.len()
        );
        for observer in targets {
            observer.on_change();
        }
    }

    fn observers(&self) -> MutexGuard<'_, BTreeMap<SubscriptionId, Arc<dyn ChangeObserver>>> {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeNotifier, ChangeObserver};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingObserver {
        calls: AtomicUsize,
    }

    impl ChangeObserver for CountingObserver {
        fn on_change(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn notifies_every_subscriber_once() {
        let notifier = ChangeNotifier::new();
        let first = Arc::new(CountingObserver::default());
        let second = Arc::new(CountingObserver::default());
        notifier.subscribe(first.clone());
        notifier.subscribe(second.clone());

        notifier.notify_all();

        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribed_observer_is_not_called() {
        let notifier = ChangeNotifier::new();
        let observer = Arc::new(CountingObserver::default());
        let id = notifier.subscribe(observer.clone());

        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.notify_all();

        assert_eq!(observer.calls.load(Ordering::SeqCst), 0);
        assert!(notifier.is_empty());
    }

    struct SelfRemovingObserver {
        notifier: Arc<ChangeNotifier>,
        id: std::sync::Mutex<Option<super::SubscriptionId>>,
    }

    impl ChangeObserver for SelfRemovingObserver {
        fn on_change(&self) {
            if let Some(id) = self.id.lock().unwrap().take() {
                self.notifier.unsubscribe(id);
            }
        }
    }

    #[test]
    fn observer_can_unsubscribe_from_callback() {
        let notifier = Arc::new(ChangeNotifier::new());
        let observer = Arc::new(SelfRemovingObserver {
            notifier: notifier.clone(),
            id: std::sync::Mutex::new(None),
        });
        let id = notifier.subscribe(observer.clone());
        *observer.id.lock().unwrap() = Some(id);

        notifier.notify_all();
        assert_eq!(notifier.len(), 0);
    }
}
