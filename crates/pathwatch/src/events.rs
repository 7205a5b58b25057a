#![forbid(unsafe_code)]

//! Thread-safe multicast event sources.
//!
//! # Design
//!
//! [`EventSource<T>`] keeps its handlers behind an `Arc<Mutex<..>>`. Raising
//! an event snapshots the live handlers under the lock and invokes them after
//! the lock is released, so a handler may subscribe, unsubscribe, or raise
//! further events without deadlocking.
//!
//! [`PropertyEvents`] is the name-carrying flavour used by notifying objects:
//! each raise carries the name of the property that is changing or changed.
//!
//! # Invariants
//!
//! 1. Handlers are invoked in registration order.
//! 2. A handler whose [`Subscription`] was disposed is never invoked again,
//!    even if the dispose happens in the middle of a raise.
//! 3. Disposing a subscription after the source is dropped is a no-op.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::lock;
use crate::subscription::Subscription;

type Callback<T> = dyn Fn(&T) + Send + Sync;

struct HandlerEntry<T: ?Sized> {
    id: u64,
    active: AtomicBool,
    callback: Box<Callback<T>>,
}

struct Registry<T: ?Sized> {
    next_id: u64,
    handlers: Vec<Arc<HandlerEntry<T>>>,
}

/// A multicast source of `&T` events.
pub struct EventSource<T: ?Sized> {
    registry: Arc<Mutex<Registry<T>>>,
}

/// Property-name notifications ("changing" or "changed").
pub type PropertyEvents = EventSource<str>;

impl<T: ?Sized + 'static> EventSource<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    /// Register `callback` for every subsequent raise.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let entry = {
            let mut registry = lock(&self.registry);
            let entry = Arc::new(HandlerEntry {
                id: registry.next_id,
                active: AtomicBool::new(true),
                callback: Box::new(callback),
            });
            registry.next_id += 1;
            registry.handlers.push(Arc::clone(&entry));
            entry
        };
        let registry = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            entry.active.store(false, Ordering::Release);
            if let Some(registry) = registry.upgrade() {
                lock(&registry).handlers.retain(|h| h.id != entry.id);
            }
        })
    }

    /// Deliver `value` to every live handler. Returns how many were invoked.
    pub fn raise(&self, value: &T) -> usize {
        let handlers: Vec<Arc<HandlerEntry<T>>> = lock(&self.registry).handlers.clone();
        let mut invoked = 0;
        for handler in &handlers {
            if handler.active.load(Ordering::Acquire) {
                (handler.callback)(value);
                invoked += 1;
            }
        }
        invoked
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        lock(&self.registry).handlers.len()
    }
}

impl EventSource<str> {
    /// Register `callback` for raises naming `property` only.
    pub fn subscribe_property(
        &self,
        property: &str,
        callback: impl Fn(&str) + Send + Sync + 'static,
    ) -> Subscription {
        let property = property.to_owned();
        self.subscribe(move |name| {
            if name == property {
                callback(name);
            }
        })
    }
}

impl<T: ?Sized + 'static> Default for EventSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> fmt::Debug for EventSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSource")
            .field("handler_count", &self.handler_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn raise_reaches_every_handler_in_order() {
        let source = EventSource::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let log1 = Arc::clone(&log);
        let _s1 = source.subscribe(move |v| log1.lock().expect("log lock").push(('A', *v)));
        let log2 = Arc::clone(&log);
        let _s2 = source.subscribe(move |v| log2.lock().expect("log lock").push(('B', *v)));

        assert_eq!(source.raise(&7), 2);
        assert_eq!(*log.lock().expect("log lock"), vec![('A', 7), ('B', 7)]);
    }

    #[test]
    fn disposed_handler_is_removed() {
        let source = EventSource::<u32>::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let sub = source.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(source.handler_count(), 1);

        source.raise(&1);
        drop(sub);
        assert_eq!(source.handler_count(), 0);

        source.raise(&2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_disposed_mid_raise_is_skipped() {
        let source = Arc::new(EventSource::<u32>::new());
        let victim_calls = Arc::new(AtomicUsize::new(0));
        let victim_slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&victim_slot);
        let _killer = source.subscribe(move |_| {
            if let Some(mut victim) = slot.lock().expect("slot lock").take() {
                victim.dispose();
            }
        });
        let calls = Arc::clone(&victim_calls);
        let victim = source.subscribe(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        *victim_slot.lock().expect("slot lock") = Some(victim);

        assert_eq!(source.raise(&1), 1);
        assert_eq!(victim_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handler_may_subscribe_reentrantly() {
        let source = Arc::new(EventSource::<u32>::new());
        let held = Arc::new(Mutex::new(Vec::new()));

        let inner_source = Arc::clone(&source);
        let inner_held = Arc::clone(&held);
        let _outer = source.subscribe(move |_| {
            let sub = inner_source.subscribe(|_| {});
            inner_held.lock().expect("held lock").push(sub);
        });

        source.raise(&1);
        assert_eq!(source.handler_count(), 2);
    }

    #[test]
    fn property_filter_matches_name_only() {
        let events = PropertyEvents::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let _sub = events.subscribe_property("Name", move |name| {
            s.lock().expect("seen lock").push(name.to_owned())
        });

        events.raise("Age");
        events.raise("Name");
        events.raise("NameSuffix");
        assert_eq!(*seen.lock().expect("seen lock"), vec!["Name".to_owned()]);
    }

    #[test]
    fn dispose_after_source_dropped_is_noop() {
        let source = EventSource::<u32>::new();
        let mut sub = source.subscribe(|_| {});
        drop(source);
        sub.dispose();
        assert!(sub.is_disposed());
    }
}
