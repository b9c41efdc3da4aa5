//! Interaction tracking.
//!
//! Each [`InteractionChannel`] maps to one persisted counter. Tracking
//! registers a listener per channel on an [`InteractionSource`]; the
//! returned [`TrackingSubscription`] removes them again when it is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use crate::storage::read_u64;
use crate::KeyValueStore;

/// Storage key holding the session start (Unix millis).
pub const SESSION_START_KEY: &str = "sessionStart";

/// A kind of user interaction the collector counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InteractionChannel {
    PointerMove,
    Click,
    KeyPress,
    Scroll,
    Focus,
}

impl InteractionChannel {
    pub const ALL: [InteractionChannel; 5] = [
        Self::PointerMove,
        Self::Click,
        Self::KeyPress,
        Self::Scroll,
        Self::Focus,
    ];

    /// Storage key of the counter fed by this channel.
    pub fn storage_key(&self) -> &'static str {
        match self {
            Self::PointerMove => "mouseMovements",
            Self::Click => "clicks",
            Self::KeyPress => "keystrokes",
            Self::Scroll => "scrollEvents",
            Self::Focus => "focusEvents",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Something that delivers interaction events to registered listeners.
pub trait InteractionSource: Send + Sync {
    fn add_listener(&self, channel: InteractionChannel, listener: Listener) -> ListenerId;

    /// Returns `false` if the id was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}

/// In-process event source. Hosts call [`InteractionBus::dispatch`] when an
/// interaction happens.
#[derive(Default)]
pub struct InteractionBus {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, InteractionChannel, Listener)>>,
}

impl InteractionBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke every listener registered on `channel`, returning how many ran.
    ///
    /// Listeners run outside the registry lock, so a listener may itself
    /// register or remove listeners.
    pub fn dispatch(&self, channel: InteractionChannel) -> usize {
        let matching: Vec<Listener> = match self.listeners.lock() {
            Ok(listeners) => listeners
                .iter()
                .filter(|(_, c, _)| *c == channel)
                .map(|(_, _, l)| Arc::clone(l))
                .collect(),
            Err(_) => return 0,
        };
        for listener in &matching {
            listener();
        }
        matching.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

impl InteractionSource for InteractionBus {
    fn add_listener(&self, channel: InteractionChannel, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, channel, listener));
        }
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        match self.listeners.lock() {
            Ok(mut listeners) => {
                let before = listeners.len();
                listeners.retain(|(lid, _, _)| *lid != id);
                listeners.len() != before
            }
            Err(_) => false,
        }
    }
}

/// One persisted interaction counter.
///
/// Seeded from storage when tracking starts; every event bumps the
/// in-memory value and writes it back. A failed write leaves the in-memory
/// count intact, so later successful writes still carry every event.
pub(crate) struct InteractionCounter {
    key: &'static str,
    count: Mutex<u64>,
    store: Arc<dyn KeyValueStore>,
}

impl InteractionCounter {
    pub(crate) fn seeded(channel: InteractionChannel, store: Arc<dyn KeyValueStore>) -> Self {
        let key = channel.storage_key();
        let initial = read_u64(store.as_ref(), key, 0);
        Self {
            key,
            count: Mutex::new(initial),
            store,
        }
    }

    pub(crate) fn record(&self) {
        let Ok(mut count) = self.count.lock() else {
            return;
        };
        *count += 1;
        trace!(key = self.key, count = *count, "interaction recorded");
        if let Err(e) = self.store.set(self.key, &count.to_string()) {
            debug!(key = self.key, "counter not persisted: {e}");
        }
    }
}

/// Listeners registered by [`crate::FingerprintCollector::init_tracking`].
///
/// Dropping the subscription unregisters every listener.
#[must_use = "dropping the subscription stops tracking"]
pub struct TrackingSubscription {
    source: Arc<dyn InteractionSource>,
    ids: Vec<ListenerId>,
}

impl TrackingSubscription {
    pub(crate) fn new(source: Arc<dyn InteractionSource>, ids: Vec<ListenerId>) -> Self {
        Self { source, ids }
    }

    pub fn listener_ids(&self) -> &[ListenerId] {
        &self.ids
    }

    /// Unregister all listeners now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        for id in self.ids.drain(..) {
            self.source.remove_listener(id);
        }
    }
}

impl Drop for TrackingSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn dispatch_reaches_only_matching_channel() {
        let bus = InteractionBus::new();
        let clicks = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&clicks);
        bus.add_listener(
            InteractionChannel::Click,
            Arc::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(bus.dispatch(InteractionChannel::Scroll), 0);
        assert_eq!(bus.dispatch(InteractionChannel::Click), 1);
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn remove_listener_reports_unknown_ids() {
        let bus = InteractionBus::new();
        let id = bus.add_listener(InteractionChannel::Focus, Arc::new(|| {}));
        assert!(bus.remove_listener(id));
        assert!(!bus.remove_listener(id));
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn dropping_subscription_unregisters() {
        let bus = Arc::new(InteractionBus::new());
        let ids: Vec<_> = InteractionChannel::ALL
            .iter()
            .map(|ch| bus.add_listener(*ch, Arc::new(|| {})))
            .collect();
        let sub = TrackingSubscription::new(bus.clone(), ids);
        assert_eq!(bus.listener_count(), 5);
        drop(sub);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn storage_keys_are_distinct() {
        let mut keys: Vec<_> = InteractionChannel::ALL
            .iter()
            .map(|c| c.storage_key())
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 5);
    }
}
