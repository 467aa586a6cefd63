//! Array Nodes
//!
//! An [`ArrayValue`] is a shared, growable sequence of values. Unlike object
//! slots, array indices have no per-index interception: the node itself is
//! the interception boundary. Every mutating operation — `push`, `pop`,
//! `shift`, `unshift`, `splice`, `sort_by`, `reverse` — performs the native
//! mutation, observes any newly inserted elements, and notifies the array's
//! observer-level dependency set. This substitute method set is the only way
//! structural array changes become observable.
//!
//! On an array that has never been observed, the same methods degrade to the
//! plain mutation: nothing to observe with, nobody to notify.
//!
//! Reads (`get`, `len`, `to_vec`) register no dependencies of their own;
//! subscribers pick up array dependencies through the property slot that
//! holds the array. [`ArrayValue::set_raw`] is a deliberately untracked
//! index write — per-index interception does not exist, which is exactly
//! the gap the dynamic mutation API covers.

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, RwLock, Weak};

use crate::observer::Observer;
use crate::value::Value;

struct ArrayInner {
    elements: RwLock<Vec<Value>>,
    observer: OnceLock<Arc<Observer>>,
    extensible: AtomicBool,
}

/// A shared handle to an array node.
///
/// Clones are cheap and alias the same node; equality is node identity.
#[derive(Clone)]
pub struct ArrayValue {
    inner: Arc<ArrayInner>,
}

impl ArrayValue {
    /// Create an empty array node.
    pub fn new() -> Self {
        Self::from_values(Vec::new())
    }

    /// Create an array node holding the given values.
    pub fn from_values(values: Vec<Value>) -> Self {
        ArrayValue {
            inner: Arc::new(ArrayInner {
                elements: RwLock::new(values),
                observer: OnceLock::new(),
                extensible: AtomicBool::new(true),
            }),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.inner.elements.read().expect("elements lock poisoned").len()
    }

    /// True when the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element at `index`, if in bounds. Untracked.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.inner
            .elements
            .read()
            .expect("elements lock poisoned")
            .get(index)
            .cloned()
    }

    /// A snapshot of the current elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.inner.elements.read().expect("elements lock poisoned").clone()
    }

    /// Forbid further mutation and observation. Irreversible.
    pub fn freeze(&self) {
        self.inner.extensible.store(false, Ordering::SeqCst);
    }

    /// Whether the array may still be mutated and observed.
    pub fn is_extensible(&self) -> bool {
        self.inner.extensible.load(Ordering::SeqCst)
    }

    /// The node's observer, if it has been observed.
    pub fn observer(&self) -> Option<Arc<Observer>> {
        self.inner.observer.get().cloned()
    }

    /// Attach an observer. Returns false if one was already attached.
    pub(crate) fn install_observer(&self, observer: Arc<Observer>) -> bool {
        self.inner.observer.set(observer).is_ok()
    }

    pub(crate) fn downgrade(&self) -> WeakArray {
        WeakArray(Arc::downgrade(&self.inner))
    }

    /// Untracked index write. Extends the array with nulls when `index` is
    /// past the end. Invisible to subscribers; reactive index writes go
    /// through [`crate::observer::set`].
    pub fn set_raw(&self, index: usize, value: Value) {
        if !self.is_extensible() {
            return;
        }
        let mut elements = self.inner.elements.write().expect("elements lock poisoned");
        if index >= elements.len() {
            elements.resize(index + 1, Value::Null);
        }
        elements[index] = value;
    }

    /// Untracked length extension, padding with nulls. Never shrinks.
    pub(crate) fn pad_to(&self, length: usize) {
        if !self.is_extensible() {
            return;
        }
        let mut elements = self.inner.elements.write().expect("elements lock poisoned");
        if elements.len() < length {
            elements.resize(length, Value::Null);
        }
    }

    /// Append an element. Returns the new length.
    pub fn push(&self, value: Value) -> usize {
        if !self.is_extensible() {
            return self.len();
        }
        let length = {
            let mut elements = self.inner.elements.write().expect("elements lock poisoned");
            elements.push(value.clone());
            elements.len()
        };
        self.mutated(std::slice::from_ref(&value));
        length
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Option<Value> {
        if !self.is_extensible() {
            return None;
        }
        let removed = {
            let mut elements = self.inner.elements.write().expect("elements lock poisoned");
            elements.pop()
        };
        self.mutated(&[]);
        removed
    }

    /// Remove and return the first element.
    pub fn shift(&self) -> Option<Value> {
        if !self.is_extensible() {
            return None;
        }
        let removed = {
            let mut elements = self.inner.elements.write().expect("elements lock poisoned");
            if elements.is_empty() {
                None
            } else {
                Some(elements.remove(0))
            }
        };
        self.mutated(&[]);
        removed
    }

    /// Prepend an element. Returns the new length.
    pub fn unshift(&self, value: Value) -> usize {
        if !self.is_extensible() {
            return self.len();
        }
        let length = {
            let mut elements = self.inner.elements.write().expect("elements lock poisoned");
            elements.insert(0, value.clone());
            elements.len()
        };
        self.mutated(std::slice::from_ref(&value));
        length
    }

    /// Remove `delete_count` elements starting at `start` (both clamped to
    /// the current length) and insert `items` in their place. Returns the
    /// removed elements.
    pub fn splice(&self, start: usize, delete_count: usize, items: Vec<Value>) -> Vec<Value> {
        if !self.is_extensible() {
            return Vec::new();
        }
        let removed: Vec<Value> = {
            let mut elements = self.inner.elements.write().expect("elements lock poisoned");
            let len = elements.len();
            let start = start.min(len);
            let end = start.saturating_add(delete_count).min(len);
            elements.splice(start..end, items.iter().cloned()).collect()
        };
        self.mutated(&items);
        removed
    }

    /// Sort in place with the given comparator.
    ///
    /// The comparator runs against a snapshot, never under the element lock,
    /// so it may freely read other reactive state.
    pub fn sort_by<F>(&self, compare: F)
    where
        F: FnMut(&Value, &Value) -> CmpOrdering,
    {
        if !self.is_extensible() {
            return;
        }
        let mut snapshot = self.to_vec();
        snapshot.sort_by(compare);
        {
            let mut elements = self.inner.elements.write().expect("elements lock poisoned");
            *elements = snapshot;
        }
        self.mutated(&[]);
    }

    /// Reverse in place.
    pub fn reverse(&self) {
        if !self.is_extensible() {
            return;
        }
        {
            let mut elements = self.inner.elements.write().expect("elements lock poisoned");
            elements.reverse();
        }
        self.mutated(&[]);
    }

    /// Post-mutation hook shared by every intercepted method: observe what
    /// came in, then tell everyone who read this array that it changed.
    fn mutated(&self, inserted: &[Value]) {
        if let Some(observer) = self.observer() {
            observer.observe_items(inserted);
            observer.dep().notify();
        }
    }
}

impl Default for ArrayValue {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ArrayValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ArrayValue {}

impl fmt::Debug for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayValue").field("len", &self.len()).finish()
    }
}

impl From<Vec<Value>> for ArrayValue {
    fn from(values: Vec<Value>) -> Self {
        Self::from_values(values)
    }
}

impl<V: Into<Value>> FromIterator<V> for ArrayValue {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from_values(iter.into_iter().map(Into::into).collect())
    }
}

/// Non-owning handle used for observer back-references.
#[derive(Clone)]
pub(crate) struct WeakArray(Weak<ArrayInner>);

impl WeakArray {
    pub(crate) fn upgrade(&self) -> Option<ArrayValue> {
        self.0.upgrade().map(|inner| ArrayValue { inner })
    }
}
