//! Subscriber registry and change fan-out.
//!
//! [`BroadcastHub`] tracks the set of event-driven subscribers and delivers
//! change notifications to each of them over its own channel. Polling-style
//! transports never register here; they read the store directly.
//!
//! Delivery is at-least-once, best-effort: a subscriber whose channel is
//! gone is dropped from the registry, and a failure to reach one subscriber
//! never affects delivery to another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::state::{FileState, FileStateStore};

/// Identifier of a registered subscriber, unique for the process lifetime.
pub type SubscriberId = Uuid;

/// Event delivered to subscribers.
#[derive(Debug, Clone)]
pub enum HubEvent {
    /// The watched file changed; carries the exact published state.
    FileChanged(Arc<FileState>),
    /// Manual fan-out to every subscriber.
    Broadcast {
        /// Message to relay
        message: String,
    },
}

/// Bookkeeping for one registered subscriber. Owned exclusively by the hub;
/// transports only ever hold the id and the receiving end of the channel.
struct Subscriber {
    registered_at: DateTime<Utc>,
    last_delivered_version: u64,
    tx: mpsc::UnboundedSender<HubEvent>,
}

/// Handle returned by [`BroadcastHub::subscribe`].
pub struct Subscription {
    /// Assigned subscriber id
    pub id: SubscriberId,
    /// Current state at registration time, delivered out-of-band so a new
    /// observer is never left without an initial value
    pub initial: Arc<FileState>,
    /// Receiving end of the subscriber's event channel
    pub events: mpsc::UnboundedReceiver<HubEvent>,
}

/// Tracks active subscribers and fans change events out to them.
pub struct BroadcastHub {
    store: Arc<FileStateStore>,
    subscribers: Mutex<HashMap<SubscriberId, Subscriber>>,
}

impl BroadcastHub {
    /// Create a hub that hands out snapshots from the given store.
    #[must_use]
    pub fn new(store: Arc<FileStateStore>) -> Self {
        Self {
            store,
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new subscriber.
    ///
    /// Returns the assigned id, the current snapshot, and the event channel.
    pub fn subscribe(&self) -> Subscription {
        let id = Uuid::new_v4();
        let initial = self.store.read();
        let (tx, events) = mpsc::unbounded_channel();

        let mut subscribers = self.lock();
        subscribers.insert(
            id,
            Subscriber {
                registered_at: Utc::now(),
                last_delivered_version: initial.version,
                tx,
            },
        );
        tracing::debug!("subscriber {id} registered ({} total)", subscribers.len());

        Subscription { id, initial, events }
    }

    /// Remove a subscriber by id.
    ///
    /// Idempotent: removing an already-removed or unknown id is a no-op.
    pub fn unsubscribe(&self, id: SubscriberId) {
        let mut subscribers = self.lock();
        if subscribers.remove(&id).is_some() {
            tracing::debug!(
                "subscriber {id} removed ({} remaining)",
                subscribers.len()
            );
        }
    }

    /// Deliver a new file state to every registered subscriber.
    ///
    /// Never blocks; a subscriber whose receiving end is gone is dropped
    /// from the registry without affecting the others.
    pub fn notify(&self, state: &Arc<FileState>) {
        let mut subscribers = self.lock();
        let mut stale = Vec::new();

        for (id, sub) in subscribers.iter_mut() {
            if sub.tx.send(HubEvent::FileChanged(Arc::clone(state))).is_ok() {
                sub.last_delivered_version = state.version;
            } else {
                stale.push(*id);
            }
        }

        for id in stale {
            subscribers.remove(&id);
            tracing::debug!("subscriber {id} dropped (channel closed)");
        }
    }

    /// Relay a message to every registered subscriber.
    pub fn broadcast(&self, message: &str) {
        let subscribers = self.lock();
        for sub in subscribers.values() {
            let _ = sub.tx.send(HubEvent::Broadcast {
                message: message.to_string(),
            });
        }
    }

    /// Point-in-time subscriber count.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// When the given subscriber registered, if it is still present.
    #[must_use]
    pub fn registered_at(&self, id: SubscriberId) -> Option<DateTime<Utc>> {
        self.lock().get(&id).map(|s| s.registered_at)
    }

    /// Version last delivered to the given subscriber, if it is still present.
    #[must_use]
    pub fn last_delivered_version(&self, id: SubscriberId) -> Option<u64> {
        self.lock().get(&id).map(|s| s.last_delivered_version)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriberId, Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub_with_store() -> (Arc<FileStateStore>, BroadcastHub) {
        let store = Arc::new(FileStateStore::new(FileState::uninitialized()));
        let hub = BroadcastHub::new(Arc::clone(&store));
        (store, hub)
    }

    #[test]
    fn test_subscribe_returns_current_state() {
        let (store, hub) = hub_with_store();
        store.write("one".into(), Utc::now());
        store.write("two".into(), Utc::now());

        let sub = hub.subscribe();
        assert_eq!(sub.initial.content, "two");
        assert_eq!(sub.initial.version, 1);
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[test]
    fn test_subscribe_before_first_write_gets_sentinel() {
        let (_store, hub) = hub_with_store();
        let sub = hub.subscribe();

        assert_eq!(sub.initial.content, "");
        assert!(sub.initial.modified_at.is_none());
    }

    #[tokio::test]
    async fn test_notify_delivers_exact_state() {
        let (store, hub) = hub_with_store();
        let mut sub = hub.subscribe();

        let state = store.write("changed".into(), Utc::now());
        hub.notify(&state);

        match sub.events.recv().await {
            Some(HubEvent::FileChanged(delivered)) => {
                assert_eq!(delivered.content, "changed");
                assert_eq!(delivered.version, state.version);
            }
            other => panic!("expected FileChanged, got {other:?}"),
        }
        assert_eq!(hub.last_delivered_version(sub.id), Some(state.version));
    }

    #[tokio::test]
    async fn test_notify_reaches_all_subscribers() {
        let (store, hub) = hub_with_store();
        let mut subs: Vec<_> = (0..5).map(|_| hub.subscribe()).collect();

        let state = store.write("fanout".into(), Utc::now());
        hub.notify(&state);

        for sub in &mut subs {
            match sub.events.recv().await {
                Some(HubEvent::FileChanged(s)) => assert_eq!(s.content, "fanout"),
                other => panic!("expected FileChanged, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_unsubscribe_removes_by_id() {
        let (_store, hub) = hub_with_store();
        let a = hub.subscribe();
        let b = hub.subscribe();

        hub.unsubscribe(a.id);

        assert_eq!(hub.subscriber_count(), 1);
        assert!(hub.registered_at(b.id).is_some());
        assert!(hub.registered_at(a.id).is_none());
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let (_store, hub) = hub_with_store();
        let sub = hub.subscribe();

        hub.unsubscribe(sub.id);
        hub.unsubscribe(sub.id);
        hub.unsubscribe(Uuid::new_v4());

        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_affect_others() {
        let (store, hub) = hub_with_store();
        let dead = hub.subscribe();
        let mut alive = hub.subscribe();

        drop(dead.events);

        let state = store.write("still delivered".into(), Utc::now());
        hub.notify(&state);

        match alive.events.recv().await {
            Some(HubEvent::FileChanged(s)) => assert_eq!(s.content, "still delivered"),
            other => panic!("expected FileChanged, got {other:?}"),
        }
        // The dead subscriber was pruned during notify.
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_message() {
        let (_store, hub) = hub_with_store();
        let mut sub = hub.subscribe();

        hub.broadcast("test broadcast");

        match sub.events.recv().await {
            Some(HubEvent::Broadcast { message }) => assert_eq!(message, "test broadcast"),
            other => panic!("expected Broadcast, got {other:?}"),
        }
    }
}
