//! Change Notification
//!
//! Observers subscribe to the bus and get called after every write to the
//! store. Local writes and changes picked up from another process are
//! published the same way, tagged with their origin.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Where a change came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// Written through this process
    Local,
    /// Detected on reload of a shared backend
    External,
}

/// Change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Storage key that changed
    pub key: String,
    /// Origin
    pub origin: ChangeOrigin,
}

impl ChangeEvent {
    /// Local change to `key`
    pub fn local(key: &str) -> Self {
        Self {
            key: key.to_string(),
            origin: ChangeOrigin::Local,
        }
    }

    /// External change to `key`
    pub fn external(key: &str) -> Self {
        Self {
            key: key.to_string(),
            origin: ChangeOrigin::External,
        }
    }
}

type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

struct BusInner {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(u64, Listener)>>,
}

/// Change bus (cheap to clone, clones share subscribers)
#[derive(Clone)]
pub struct ChangeBus {
    inner: Arc<BusInner>,
}

impl ChangeBus {
    /// Create bus with no subscribers
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                next_id: AtomicU64::new(1),
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Register a listener; it stays registered until the returned
    /// subscription is dropped
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.write().push((id, Arc::new(listener)));
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Notify every listener
    pub fn publish(&self, event: &ChangeEvent) {
        // Listeners may publish or subscribe themselves
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .read()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        tracing::debug!("Change on '{}' ({:?}) -> {} listeners", event.key, event.origin, listeners.len());
        for listener in listeners {
            listener(event);
        }
    }

    /// Number of live subscriptions
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscription guard
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.listeners.write().retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_publish_reaches_subscribers() {
        let bus = ChangeBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let _sub = bus.subscribe(move |e| sink.lock().push(e.clone()));

        bus.publish(&ChangeEvent::local("riskTreatments"));
        bus.publish(&ChangeEvent::external("isms-scope-data"));

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].origin, ChangeOrigin::Local);
        assert_eq!(seen[1].key, "isms-scope-data");
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = ChangeBus::new();
        let hits = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&hits);
        let sub = bus.subscribe(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(bus.listener_count(), 1);

        bus.publish(&ChangeEvent::local("k"));
        drop(sub);
        bus.publish(&ChangeEvent::local("k"));

        assert_eq!(hits.load(Ordering::Relaxed), 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_listener_may_subscribe_during_publish() {
        let bus = ChangeBus::new();
        let nested = Arc::new(Mutex::new(Vec::new()));

        let inner_bus = bus.clone();
        let holder = Arc::clone(&nested);
        let _sub = bus.subscribe(move |_| {
            holder.lock().push(inner_bus.subscribe(|_| {}));
        });

        bus.publish(&ChangeEvent::local("k"));
        assert_eq!(bus.listener_count(), 2);
    }
}
