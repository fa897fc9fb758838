//! # Stream Subscriber
//!
//! Defines the subscription side of the bus: observable streams, the
//! `filter` combinator, and the detach handles that undo a subscription.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::trace;

/// Callback invoked for every item a stream emits.
pub type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Anything that can be subscribed to.
pub trait Source<T>: Send + Sync {
    /// Register an observer. The observer stays registered until the
    /// returned handle is released or dropped.
    fn subscribe(&self, observer: Observer<T>) -> DetachHandle;
}

/// Handle that removes a subscription.
///
/// Releasing is idempotent, and dropping the handle releases it.
pub struct DetachHandle {
    release: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl DetachHandle {
    /// Create a handle that runs `release` exactly once.
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            release: Mutex::new(Some(Box::new(release))),
        }
    }

    /// Run the release action if it has not run yet.
    pub fn release(&self) {
        // Take under the lock, run outside it.
        let release = self.release.lock().take();
        if let Some(release) = release {
            release();
        }
    }

    /// Whether the release action has already run.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.release.lock().is_none()
    }
}

impl Drop for DetachHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for DetachHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetachHandle")
            .field("released", &self.is_released())
            .finish()
    }
}

/// Observers keyed by a monotonically increasing id, so iteration follows
/// subscription order and removal is a single map lookup.
struct ObserverList<T> {
    next_id: u64,
    entries: BTreeMap<u64, Observer<T>>,
}

struct StreamInner<T> {
    name: String,
    observers: Mutex<ObserverList<T>>,
}

/// A hot stream with an explicit observer list.
///
/// Emission snapshots the observer list and invokes callbacks outside the
/// lock, so a callback may subscribe or detach re-entrantly.
pub struct EventStream<T> {
    inner: Arc<StreamInner<T>>,
}

impl<T> Clone for EventStream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("name", &self.inner.name)
            .field("observers", &self.inner.observers.lock().entries.len())
            .finish()
    }
}

impl<T: Send + Sync + 'static> EventStream<T> {
    /// Create a stream with no observers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(StreamInner {
                name: name.into(),
                observers: Mutex::new(ObserverList {
                    next_id: 0,
                    entries: BTreeMap::new(),
                }),
            }),
        }
    }

    /// Name of the stream (the key, for key streams).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Deliver `item` to every current observer, in subscription order.
    ///
    /// Returns the number of observers notified.
    pub fn emit(&self, item: &T) -> usize {
        let observers: Vec<Observer<T>> = self
            .inner
            .observers
            .lock()
            .entries
            .values()
            .map(Arc::clone)
            .collect();

        for observer in &observers {
            observer(item);
        }
        observers.len()
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.observers.lock().entries.len()
    }

    /// A view of this stream that only passes items matching `predicate`.
    pub fn filter<P>(&self, predicate: P) -> Filtered<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Filtered::new(Arc::new(self.clone()), Arc::new(predicate))
    }
}

impl<T: Send + Sync + 'static> Source<T> for EventStream<T> {
    fn subscribe(&self, observer: Observer<T>) -> DetachHandle {
        let id = {
            let mut list = self.inner.observers.lock();
            let id = list.next_id;
            list.next_id += 1;
            list.entries.insert(id, observer);
            id
        };

        let weak: Weak<StreamInner<T>> = Arc::downgrade(&self.inner);
        DetachHandle::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.observers.lock().entries.remove(&id);
            trace!(stream = %inner.name, observer = id, "Observer detached");
        })
    }
}

/// Shared predicate used by [`Filtered`].
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A source that forwards only items matching a predicate.
pub struct Filtered<T> {
    upstream: Arc<dyn Source<T>>,
    predicate: Predicate<T>,
}

impl<T: Send + Sync + 'static> Filtered<T> {
    /// Wrap `upstream`, keeping items for which `predicate` is true.
    pub fn new(upstream: Arc<dyn Source<T>>, predicate: Predicate<T>) -> Self {
        Self {
            upstream,
            predicate,
        }
    }
}

impl<T: Send + Sync + 'static> Source<T> for Filtered<T> {
    fn subscribe(&self, observer: Observer<T>) -> DetachHandle {
        let predicate = Arc::clone(&self.predicate);
        self.upstream.subscribe(Arc::new(move |item: &T| {
            if predicate(item) {
                observer(item);
            }
        }))
    }
}
