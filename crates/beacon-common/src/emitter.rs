//! Ordered multi-listener broadcaster.
//!
//! [`Emitter`] is the owning side: it fires values and is disposed by its
//! owner. [`Event`] is the public side handed to observers: it can only
//! register listeners, and it does not keep the emitter alive.
//!
//! ## Rules
//! - Listeners run synchronously inside [`Emitter::fire`], in registration
//!   order.
//! - `fire` snapshots the listener list first, so a listener may subscribe,
//!   unsubscribe, or fire again without deadlocking. Listeners added during a
//!   fire see only later values.
//! - After [`Disposable::dispose`], `fire` is a no-op and new registrations
//!   return an inert [`Subscription`].

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use crate::dispose::{Disposable, Subscription};

/// Shared callback invoked for every fired value.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
    disposed: bool,
}

impl<T> Registry<T> {
    fn new() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
            disposed: false,
        }
    }
}

fn add_listener<T: 'static>(
    registry: &Arc<Mutex<Registry<T>>>,
    listener: Listener<T>,
) -> Subscription {
    let id = {
        let mut reg = registry.lock().unwrap_or_else(|e| e.into_inner());
        if reg.disposed {
            return Subscription::noop();
        }
        let id = reg.next_id;
        reg.next_id += 1;
        reg.listeners.push((id, listener));
        id
    };

    let weak = Arc::downgrade(registry);
    Subscription::new(move || {
        if let Some(registry) = weak.upgrade() {
            let mut reg = registry.lock().unwrap_or_else(|e| e.into_inner());
            reg.listeners.retain(|(lid, _)| *lid != id);
        }
    })
}

/// Broadcasts values of type `T` to every registered listener.
///
/// Cloning an `Emitter` yields another handle to the same listener list.
pub struct Emitter<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> Emitter<T> {
    /// Creates an emitter with no listeners.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::new())),
        }
    }

    /// Returns the observer-facing handle for this emitter.
    pub fn event(&self) -> Event<T> {
        Event {
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Registers a listener. See [`Event::subscribe`].
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        add_listener(&self.registry, Arc::new(listener))
    }

    /// Delivers `value` to every current listener, in registration order.
    pub fn fire(&self, value: &T) {
        let listeners: Vec<Listener<T>> = {
            let reg = self.registry.lock().unwrap_or_else(|e| e.into_inner());
            if reg.disposed {
                return;
            }
            reg.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            listener(value);
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .listeners
            .len()
    }

    /// Returns `true` once the emitter has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .disposed
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T: 'static> Disposable for Emitter<T> {
    fn dispose(&self) {
        let dropped = {
            let mut reg = self.registry.lock().unwrap_or_else(|e| e.into_inner());
            reg.disposed = true;
            std::mem::take(&mut reg.listeners)
        };
        // Listener closures may own other handles; drop them unlocked.
        drop(dropped);
    }
}

impl<T: 'static> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listener_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Subscribe-only view of an [`Emitter`].
///
/// Holds a weak reference: once every `Emitter` handle is gone, subscribing
/// returns an inert subscription.
pub struct Event<T> {
    registry: Weak<Mutex<Registry<T>>>,
}

impl<T: 'static> Event<T> {
    /// Registers `listener` for every subsequently fired value.
    ///
    /// The returned [`Subscription`] removes the listener when disposed.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.subscribe_arc(Arc::new(listener))
    }

    /// Same as [`Event::subscribe`] for an already shared listener.
    pub fn subscribe_arc(&self, listener: Listener<T>) -> Subscription {
        match self.registry.upgrade() {
            Some(registry) => add_listener(&registry, listener),
            None => Subscription::noop(),
        }
    }
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Weak::clone(&self.registry),
        }
    }
}

impl<T> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("live", &(self.registry.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&'static str) -> Listener<u32>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_for = Arc::clone(&log);
        let make = move |tag: &'static str| -> Listener<u32> {
            let log = Arc::clone(&log_for);
            Arc::new(move |v: &u32| log.lock().unwrap().push(format!("{tag}:{v}")))
        };
        (log, make)
    }

    #[test]
    fn fires_in_registration_order() {
        let emitter: Emitter<u32> = Emitter::new();
        let (log, make) = recorder();
        let _a = emitter.event().subscribe_arc(make("a"));
        let _b = emitter.event().subscribe_arc(make("b"));

        emitter.fire(&7);

        assert_eq!(*log.lock().unwrap(), vec!["a:7", "b:7"]);
    }

    #[test]
    fn disposed_subscription_stops_delivery() {
        let emitter: Emitter<u32> = Emitter::new();
        let (log, make) = recorder();
        let a = emitter.event().subscribe_arc(make("a"));
        let _b = emitter.event().subscribe_arc(make("b"));

        a.dispose();
        emitter.fire(&1);

        assert_eq!(*log.lock().unwrap(), vec!["b:1"]);
        assert_eq!(emitter.listener_count(), 1);
    }

    #[test]
    fn dispose_drops_listeners_and_silences_fire() {
        let emitter: Emitter<u32> = Emitter::new();
        let (log, make) = recorder();
        let _a = emitter.event().subscribe_arc(make("a"));

        emitter.dispose();
        emitter.fire(&1);
        let late = emitter.subscribe(|_: &u32| panic!("must not be called"));
        emitter.fire(&2);

        assert!(log.lock().unwrap().is_empty());
        assert!(late.is_disposed());
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn listener_may_reenter_the_emitter() {
        let emitter: Emitter<u32> = Emitter::new();
        let (log, make) = recorder();
        let inner = emitter.clone();
        let _relay = emitter.subscribe(move |v: &u32| {
            if *v == 0 {
                inner.fire(&1);
            }
        });
        let _rec = emitter.event().subscribe_arc(make("rec"));

        emitter.fire(&0);

        assert_eq!(*log.lock().unwrap(), vec!["rec:1", "rec:0"]);
    }

    #[test]
    fn event_handle_outliving_emitter_is_inert() {
        let event = {
            let emitter: Emitter<u32> = Emitter::new();
            emitter.event()
        };
        let sub = event.subscribe(|_| {});
        assert!(sub.is_disposed());
    }
}
