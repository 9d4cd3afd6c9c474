//! Disposal primitives: the [`Disposable`] trait, one-shot [`Subscription`]
//! handles, and the [`Disposables`] scoped-lifetime container.

use std::fmt;
use std::sync::Mutex;

/// A resource that can be released.
///
/// Implementations must tolerate repeated calls; only the first one has an
/// effect.
pub trait Disposable: Send + Sync {
    /// Releases the resource.
    fn dispose(&self);
}

type Teardown = Box<dyn FnOnce() + Send>;

/// Handle to a registration that can be undone once.
///
/// Dropping a `Subscription` does **not** release it; call
/// [`Disposable::dispose`] or hand it to a [`Disposables`] container.
pub struct Subscription {
    teardown: Mutex<Option<Teardown>>,
}

impl Subscription {
    /// Wraps a teardown closure that runs on the first `dispose()`.
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            teardown: Mutex::new(Some(Box::new(teardown))),
        }
    }

    /// A subscription with nothing to release.
    ///
    /// Returned when registering against an already-disposed source.
    pub fn noop() -> Self {
        Self {
            teardown: Mutex::new(None),
        }
    }

    /// Returns `true` once the teardown has run (or if there never was one).
    pub fn is_disposed(&self) -> bool {
        self.teardown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }
}

impl Disposable for Subscription {
    fn dispose(&self) {
        let teardown = self
            .teardown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(teardown) = teardown {
            teardown();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[derive(Default)]
struct State {
    items: Vec<Box<dyn Disposable>>,
    disposed: bool,
}

/// Records resources acquired during an owner's lifetime and releases all of
/// them exactly once.
///
/// Items are released in insertion order. Anything pushed after the
/// container was disposed is released immediately.
#[derive(Default)]
pub struct Disposables {
    state: Mutex<State>,
}

impl Disposables {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource for release on [`Disposable::dispose`].
    pub fn push(&self, item: impl Disposable + 'static) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.disposed {
            drop(state);
            tracing::debug!("resource registered after disposal, releasing immediately");
            item.dispose();
            return;
        }
        state.items.push(Box::new(item));
    }

    /// Number of resources still held.
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .items
            .len()
    }

    /// Returns `true` if no resources are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` once [`Disposable::dispose`] has been called.
    pub fn is_disposed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .disposed
    }
}

impl Disposable for Disposables {
    fn dispose(&self) {
        // Items are released outside the lock; a teardown may touch this
        // container again.
        let items = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.disposed {
                return;
            }
            state.disposed = true;
            std::mem::take(&mut state.items)
        };
        tracing::trace!(count = items.len(), "releasing disposables");
        for item in items {
            item.dispose();
        }
    }
}

impl fmt::Debug for Disposables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposables")
            .field("len", &self.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(counter: &Arc<AtomicUsize>) -> Subscription {
        let counter = Arc::clone(counter);
        Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn subscription_runs_teardown_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let sub = counting(&counter);

        assert!(!sub.is_disposed());
        sub.dispose();
        sub.dispose();

        assert!(sub.is_disposed());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn noop_subscription_is_already_disposed() {
        let sub = Subscription::noop();
        assert!(sub.is_disposed());
        sub.dispose();
    }

    #[test]
    fn disposables_release_everything_exactly_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let scope = Disposables::new();
        scope.push(counting(&counter));
        scope.push(counting(&counter));
        assert_eq!(scope.len(), 2);

        scope.dispose();
        scope.dispose();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(scope.is_disposed());
        assert!(scope.is_empty());
    }

    #[test]
    fn push_after_disposal_releases_immediately() {
        let counter = Arc::new(AtomicUsize::new(0));
        let scope = Disposables::new();
        scope.dispose();

        scope.push(counting(&counter));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(scope.is_empty());
    }

    #[test]
    fn release_order_follows_insertion() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let scope = Disposables::new();
        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            scope.push(Subscription::new(move || order.lock().unwrap().push(label)));
        }

        scope.dispose();

        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }
}
