//! Subscriber types for the observation engine.
//!
//! A subscriber is any computation that reads reactive state and wants to
//! hear about changes: a render function, a derived value, a watch
//! expression. The engine only needs the small [`Subscriber`] trait; the
//! richer scheduling machinery (queues, lazy re-evaluation, teardown on
//! re-run) lives in the computation layer on top.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use super::context::TrackingScope;
use super::dep::Dep;

/// Unique identifier for a subscriber.
///
/// Used by dependency sets to suppress duplicate registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// The boundary between the engine and the computation layer.
///
/// Dependency sets call [`Subscriber::add_dependency`] when the subscriber
/// is registered during a read, and [`Subscriber::update`] when a value the
/// subscriber read has changed.
pub trait Subscriber: Send + Sync {
    /// The subscriber's unique ID.
    fn id(&self) -> SubscriberId;

    /// Record that this subscriber was added to `dep`.
    ///
    /// Gives the subscriber a handle to every registry it sits in, so it
    /// can unsubscribe from the stale ones after re-evaluating.
    fn add_dependency(&self, dep: &Arc<Dep>);

    /// React to a change in one of the recorded dependencies.
    fn update(&self);
}

/// A minimal ready-made subscriber: a callback plus a dependency list.
///
/// Enough for tests and for embedders that do their own scheduling. The
/// dependency list is held weakly so a dropped slot does not keep its
/// registry alive through its subscribers.
///
/// # Example
///
/// ```rust,ignore
/// let subscriber = CallbackSubscriber::new(|| println!("changed"));
///
/// // reads performed inside run() register dependencies
/// subscriber.run(|| {
///     state.get("count");
/// });
///
/// state.set("count", 5.0); // prints "changed"
/// ```
pub struct CallbackSubscriber {
    id: SubscriberId,

    /// Invoked once per notification.
    update: Box<dyn Fn() + Send + Sync>,

    /// Every dependency set this subscriber is currently registered with.
    deps: RwLock<Vec<Weak<Dep>>>,

    /// Self-handle, needed to push this subscriber onto the tracking stack.
    this: Weak<CallbackSubscriber>,
}

impl CallbackSubscriber {
    /// Create a subscriber with the given update callback.
    pub fn new<F>(update: F) -> Arc<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        Arc::new_cyclic(|this| CallbackSubscriber {
            id: SubscriberId::new(),
            update: Box::new(update),
            deps: RwLock::new(Vec::new()),
            this: this.clone(),
        })
    }

    /// Evaluate `body` with this subscriber active on the tracking stack.
    ///
    /// Every reactive slot read during `body` registers this subscriber.
    pub fn run<R>(&self, body: impl FnOnce() -> R) -> R {
        let this = self.this.upgrade().expect("subscriber alive during run");
        let _scope = TrackingScope::enter(this);
        body()
    }

    /// Number of dependency sets this subscriber is registered with.
    pub fn dep_count(&self) -> usize {
        self.deps
            .read()
            .expect("dependency lock poisoned")
            .iter()
            .filter(|dep| dep.upgrade().is_some())
            .count()
    }

    /// Unsubscribe from every recorded dependency set.
    pub fn clear_dependencies(&self) {
        let deps = std::mem::take(&mut *self.deps.write().expect("dependency lock poisoned"));
        for dep in deps {
            if let Some(dep) = dep.upgrade() {
                dep.remove_sub(self.id);
            }
        }
    }
}

impl Subscriber for CallbackSubscriber {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn add_dependency(&self, dep: &Arc<Dep>) {
        let mut deps = self.deps.write().expect("dependency lock poisoned");
        let already_known = deps
            .iter()
            .any(|known| known.upgrade().is_some_and(|known| known.id() == dep.id()));
        if !already_known {
            deps.push(Arc::downgrade(dep));
        }
    }

    fn update(&self) {
        (self.update)();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn subscriber_ids_are_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        let id3 = SubscriberId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn update_invokes_the_callback() {
        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let subscriber = CallbackSubscriber::new(move || {
            called_clone.store(true, Ordering::SeqCst);
        });

        assert!(!called.load(Ordering::SeqCst));
        subscriber.update();
        assert!(called.load(Ordering::SeqCst));
    }

    #[test]
    fn clear_dependencies_unsubscribes_everywhere() {
        let subscriber = CallbackSubscriber::new(|| {});
        let first = Dep::new();
        let second = Dep::new();

        subscriber.run(|| {
            first.depend();
            second.depend();
        });
        assert_eq!(subscriber.dep_count(), 2);
        assert_eq!(first.sub_count(), 1);
        assert_eq!(second.sub_count(), 1);

        subscriber.clear_dependencies();
        assert_eq!(subscriber.dep_count(), 0);
        assert_eq!(first.sub_count(), 0);
        assert_eq!(second.sub_count(), 0);
    }

    #[test]
    fn dropped_deps_do_not_count() {
        let subscriber = CallbackSubscriber::new(|| {});
        {
            let short_lived = Dep::new();
            subscriber.run(|| short_lived.depend());
            assert_eq!(subscriber.dep_count(), 1);
        }
        assert_eq!(subscriber.dep_count(), 0);
    }
}
