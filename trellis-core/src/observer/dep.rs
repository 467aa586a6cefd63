//! Dependency Sets
//!
//! A [`Dep`] is the subscriber registry owned by one reactive slot or one
//! observed value. Reads register the currently evaluating subscriber
//! through [`Dep::depend`]; writes walk the registry through
//! [`Dep::notify`].
//!
//! # Ordering and Duplicates
//!
//! Subscribers are held in registration order and notified in that order.
//! A subscriber appears at most once per dependency set, no matter how many
//! times it reads the same slot during one evaluation.
//!
//! # Notification Discipline
//!
//! `notify` iterates a snapshot of the member list with no lock held, so a
//! subscriber's update may freely read or write reactive state — including
//! mutating this very registry — without deadlocking. Isolating a failing
//! subscriber is the calling layer's job; the registry only guarantees it
//! attempts every member.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use smallvec::SmallVec;

use super::context::TrackingScope;
use super::subscriber::{Subscriber, SubscriberId};

/// Unique identifier for a dependency set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepId(u64);

impl DepId {
    /// Generate a new unique dependency-set ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for DepId {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscriber registry with synchronous, ordered notification.
///
/// Most dependency sets have zero, one, or two subscribers, so the member
/// list is a small-vector that only spills to the heap under real fan-out.
pub struct Dep {
    id: DepId,
    subs: RwLock<SmallVec<[Arc<dyn Subscriber>; 2]>>,
    this: Weak<Dep>,
}

impl Dep {
    /// Create a new, empty dependency set.
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this| Dep {
            id: DepId::new(),
            subs: RwLock::new(SmallVec::new()),
            this: this.clone(),
        })
    }

    /// This dependency set's unique ID.
    pub fn id(&self) -> DepId {
        self.id
    }

    /// Register the currently evaluating subscriber, if there is one.
    ///
    /// The registration is symmetric: the subscriber is added to this
    /// registry, and the subscriber is told about the edge so it can remove
    /// itself later when its dependencies go stale (that cleanup belongs to
    /// the subscriber implementation).
    pub fn depend(&self) {
        if let Some(subscriber) = TrackingScope::current() {
            self.add_sub(Arc::clone(&subscriber));
            if let Some(this) = self.this.upgrade() {
                subscriber.add_dependency(&this);
            }
        }
    }

    /// Add a subscriber. Duplicate IDs are suppressed.
    pub fn add_sub(&self, subscriber: Arc<dyn Subscriber>) {
        let mut subs = self.subs.write().expect("subscriber lock poisoned");
        if !subs.iter().any(|existing| existing.id() == subscriber.id()) {
            subs.push(subscriber);
        }
    }

    /// Remove a subscriber by ID.
    pub fn remove_sub(&self, subscriber_id: SubscriberId) {
        let mut subs = self.subs.write().expect("subscriber lock poisoned");
        subs.retain(|existing| existing.id() != subscriber_id);
    }

    /// Invoke every subscriber's update entry point, in registration order.
    pub fn notify(&self) {
        let snapshot: SmallVec<[Arc<dyn Subscriber>; 2]> = {
            let subs = self.subs.read().expect("subscriber lock poisoned");
            subs.clone()
        };
        for subscriber in snapshot {
            subscriber.update();
        }
    }

    /// Number of registered subscribers.
    pub fn sub_count(&self) -> usize {
        self.subs.read().expect("subscriber lock poisoned").len()
    }
}
