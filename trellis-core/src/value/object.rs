//! Object Nodes
//!
//! An [`ObjectValue`] is a shared, mutable map of named property slots. It
//! is the piece of the value model the accessor-interception layer hooks
//! into: once a slot has been installed reactively, every read and write of
//! that key flows through [`ObjectValue::get`] and [`ObjectValue::set`],
//! which register dependencies and dispatch notifications.
//!
//! # Slots
//!
//! Each slot is a small descriptor: a private current value, an optional
//! pre-existing getter/setter pair (computed properties defined by the
//! embedder), `enumerable`/`configurable` flags, and — once installed — the
//! reactive instrumentation (its own dependency set, the child observer of
//! the current value, and the shallow flag).
//!
//! # The Hidden Observer Cell
//!
//! An observed node carries its observer in a write-once cell. The cell is
//! invisible to iteration and to equality: equality is node identity, and
//! `keys()` never reports it. The observer holds only a weak reference back
//! to the node, so the pair never forms an ownership cycle.
//!
//! # Locking
//!
//! The slot map sits behind an `RwLock`. Every operation snapshots what it
//! needs and releases the lock before running accessor closures, observing
//! values, or notifying subscribers; re-entrant reads and writes from inside
//! a subscriber callback are part of the supported execution model.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, RwLock, Weak};

use indexmap::IndexMap;

use crate::observer::{depend_array, observe, Dep, MutationHook, Observer, TrackingScope};
use crate::value::Value;

/// A computed-property read hook defined by the embedder.
///
/// Receives the node the property lives on, mirroring how a method would.
pub type PropertyGetter = Arc<dyn Fn(&ObjectValue) -> Value + Send + Sync>;

/// A computed-property write hook defined by the embedder.
pub type PropertySetter = Arc<dyn Fn(&ObjectValue, Value) + Send + Sync>;

/// What role an object node plays in the host framework.
///
/// Only plain data nodes ever become observed. Render-output nodes are
/// produced and diffed by the render layer, and component roots manage their
/// own reactive state; wrapping either would be wasted work at best.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Ordinary data. Eligible for observation.
    Plain,

    /// Framework-internal render output. Never observed.
    RenderNode,

    /// A live component instance root. Never observed directly, and
    /// protected from ad hoc key addition/removal.
    ComponentRoot,
}

/// One property slot of an object node.
pub(crate) struct Slot {
    /// The private current value. Ignored on reads when a getter is present.
    pub(crate) value: Value,

    /// Pre-existing getter, preserved and called by the instrumented read.
    pub(crate) getter: Option<PropertyGetter>,

    /// Pre-existing setter, preserved and called by the instrumented write.
    pub(crate) setter: Option<PropertySetter>,

    /// Whether `keys()` reports this slot.
    pub(crate) enumerable: bool,

    /// Whether the slot may be redefined. Non-configurable slots are
    /// intentionally fixed and are skipped by reactive installation.
    pub(crate) configurable: bool,

    /// Reactive instrumentation, present once installed.
    pub(crate) reactive: Option<ReactiveSlot>,
}

impl Slot {
    /// A plain data slot: enumerable, configurable, uninstrumented.
    pub(crate) fn data(value: Value) -> Self {
        Slot {
            value,
            getter: None,
            setter: None,
            enumerable: true,
            configurable: true,
            reactive: None,
        }
    }
}

/// The per-slot reactive state installed by the interception layer.
pub(crate) struct ReactiveSlot {
    /// The slot's own dependency set.
    pub(crate) dep: Arc<Dep>,

    /// Observer of the current value, refreshed on every structured write.
    pub(crate) child: Option<Arc<Observer>>,

    /// Suppresses recursive observation of stored values.
    pub(crate) shallow: bool,

    /// Debug-build diagnostic hook fired on accepted writes.
    pub(crate) hook: Option<MutationHook>,
}

struct ObjectInner {
    slots: RwLock<IndexMap<String, Slot>>,
    observer: OnceLock<Arc<Observer>>,
    extensible: AtomicBool,
    kind: ObjectKind,
}

/// A shared handle to an object node.
///
/// Clones are cheap and alias the same node; equality is node identity.
#[derive(Clone)]
pub struct ObjectValue {
    inner: Arc<ObjectInner>,
}

impl ObjectValue {
    /// Create an empty plain object node.
    pub fn new() -> Self {
        Self::with_kind(ObjectKind::Plain)
    }

    /// Create an empty node with an explicit role marker.
    pub fn with_kind(kind: ObjectKind) -> Self {
        ObjectValue {
            inner: Arc::new(ObjectInner {
                slots: RwLock::new(IndexMap::new()),
                observer: OnceLock::new(),
                extensible: AtomicBool::new(true),
                kind,
            }),
        }
    }

    /// The node's role marker.
    pub fn kind(&self) -> ObjectKind {
        self.inner.kind
    }

    /// True when this node is framework render output.
    pub fn is_render_node(&self) -> bool {
        self.inner.kind == ObjectKind::RenderNode
    }

    /// True when this node is a live component instance root.
    pub fn is_component_root(&self) -> bool {
        self.inner.kind == ObjectKind::ComponentRoot
    }

    /// Forbid adding new keys to this node. Irreversible.
    ///
    /// Frozen nodes are also ineligible for observation.
    pub fn freeze(&self) {
        self.inner.extensible.store(false, Ordering::SeqCst);
    }

    /// Whether new keys may still be added.
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

    pub(crate) fn downgrade(&self) -> WeakObject {
        WeakObject(Arc::downgrade(&self.inner))
    }

    pub(crate) fn slots(&self) -> &RwLock<IndexMap<String, Slot>> {
        &self.inner.slots
    }

    /// Enumerable own keys, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        let slots = self.inner.slots.read().expect("slots lock poisoned");
        slots
            .iter()
            .filter(|(_, slot)| slot.enumerable)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Whether the node has an own slot for `key`, enumerable or not.
    pub fn has(&self, key: &str) -> bool {
        self.inner.slots.read().expect("slots lock poisoned").contains_key(key)
    }

    /// Define a plain data slot, replacing any configurable slot already
    /// under the key. A raw structural operation: it never registers
    /// dependencies and never notifies.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        if !self.is_extensible() {
            return;
        }
        let key = key.into();
        let mut slots = self.inner.slots.write().expect("slots lock poisoned");
        if let Some(existing) = slots.get(&key) {
            if !existing.configurable {
                return;
            }
        }
        slots.insert(key, Slot::data(value.into()));
    }

    /// Define a computed slot with a getter and/or setter.
    pub fn define_accessor(
        &self,
        key: impl Into<String>,
        getter: Option<PropertyGetter>,
        setter: Option<PropertySetter>,
    ) {
        if !self.is_extensible() {
            return;
        }
        let key = key.into();
        let mut slots = self.inner.slots.write().expect("slots lock poisoned");
        if let Some(existing) = slots.get(&key) {
            if !existing.configurable {
                return;
            }
        }
        slots.insert(
            key,
            Slot {
                value: Value::Null,
                getter,
                setter,
                enumerable: true,
                configurable: true,
                reactive: None,
            },
        );
    }

    /// Define a fixed data slot: enumerable, but not reconfigurable.
    ///
    /// Reactive installation skips fixed slots silently; they stay plain.
    pub fn define_fixed(&self, key: impl Into<String>, value: impl Into<Value>) {
        if !self.is_extensible() {
            return;
        }
        let key = key.into();
        let mut slots = self.inner.slots.write().expect("slots lock poisoned");
        if let Some(existing) = slots.get(&key) {
            if !existing.configurable {
                return;
            }
        }
        slots.insert(
            key,
            Slot {
                value: value.into(),
                getter: None,
                setter: None,
                enumerable: true,
                configurable: false,
                reactive: None,
            },
        );
    }

    /// Remove a slot without notifying. Returns true if a slot was removed.
    ///
    /// Non-configurable slots stay put.
    pub(crate) fn remove_raw(&self, key: &str) -> bool {
        let mut slots = self.inner.slots.write().expect("slots lock poisoned");
        let removable = slots.get(key).map_or(false, |slot| slot.configurable);
        removable && slots.shift_remove(key).is_some()
    }

    /// Read a slot without registering any dependency.
    ///
    /// Still routes through a pre-existing getter, like any read.
    pub fn get_raw(&self, key: &str) -> Option<Value> {
        let (raw, getter) = {
            let slots = self.inner.slots.read().expect("slots lock poisoned");
            let slot = slots.get(key)?;
            (slot.value.clone(), slot.getter.clone())
        };
        Some(match getter {
            Some(get) => get(self),
            None => raw,
        })
    }

    /// Read a slot.
    ///
    /// For an instrumented slot with a subscriber currently evaluating, this
    /// registers the subscriber with the slot's dependency set; if the value
    /// is itself observed, also with the child observer's dependency set (so
    /// structural changes are observable); and if the value is an array,
    /// recursively with every observed element's dependency set — array
    /// elements have no per-index slots, so their dependencies are collected
    /// eagerly at read time.
    pub fn get(&self, key: &str) -> Option<Value> {
        let (raw, getter, tracking) = {
            let slots = self.inner.slots.read().expect("slots lock poisoned");
            let slot = slots.get(key)?;
            (
                slot.value.clone(),
                slot.getter.clone(),
                slot.reactive
                    .as_ref()
                    .map(|reactive| (Arc::clone(&reactive.dep), reactive.child.clone())),
            )
        };

        let value = match getter {
            Some(get) => get(self),
            None => raw,
        };

        if let Some((dep, child)) = tracking {
            if TrackingScope::is_active() {
                dep.depend();
                if let Some(child) = child {
                    child.dep().depend();
                    if let Value::Array(items) = &value {
                        depend_array(items);
                    }
                }
            }
        }

        Some(value)
    }

    /// Write a slot.
    ///
    /// For an instrumented slot this is the notification source: the write
    /// is a silent no-op when the new value is identical to the old one (or
    /// both are the NaN sentinel), writes to getter-only slots are refused,
    /// and an accepted write re-observes the stored value (unless shallow)
    /// and notifies the slot's dependency set.
    ///
    /// Uninstrumented slots get raw assignment semantics: the setter runs if
    /// one exists, getter-only slots swallow the write, and nobody is
    /// notified. Assigning to a missing key creates a plain, uninstrumented
    /// slot — making such additions reactive is what [`crate::observer::set`]
    /// is for.
    pub fn set(&self, key: &str, new_value: impl Into<Value>) {
        let new_value = new_value.into();
        let snapshot = {
            let slots = self.inner.slots.read().expect("slots lock poisoned");
            slots.get(key).map(|slot| {
                (
                    slot.value.clone(),
                    slot.getter.clone(),
                    slot.setter.clone(),
                    slot.reactive.as_ref().map(|reactive| {
                        (
                            Arc::clone(&reactive.dep),
                            reactive.shallow,
                            reactive.hook.clone(),
                        )
                    }),
                )
            })
        };

        let Some((raw, getter, setter, reactive)) = snapshot else {
            // new key: plain, never reactive on its own
            if self.is_extensible() {
                let mut slots = self.inner.slots.write().expect("slots lock poisoned");
                match slots.get_mut(key) {
                    Some(slot) => slot.value = new_value,
                    None => {
                        slots.insert(key.to_string(), Slot::data(new_value));
                    }
                }
            }
            return;
        };

        let Some((dep, shallow, hook)) = reactive else {
            if let Some(set) = setter {
                set(self, new_value);
            } else if getter.is_none() {
                let mut slots = self.inner.slots.write().expect("slots lock poisoned");
                if let Some(slot) = slots.get_mut(key) {
                    slot.value = new_value;
                }
            }
            return;
        };

        let old_value = match &getter {
            Some(get) => get(self),
            None => raw,
        };
        if new_value == old_value || (new_value.is_nan() && old_value.is_nan()) {
            return;
        }
        if cfg!(debug_assertions) {
            if let Some(hook) = &hook {
                hook();
            }
        }
        // a getter without a setter marks a derived, read-only slot
        if getter.is_some() && setter.is_none() {
            return;
        }
        if let Some(set) = &setter {
            set(self, new_value.clone());
        } else {
            let mut slots = self.inner.slots.write().expect("slots lock poisoned");
            if let Some(slot) = slots.get_mut(key) {
                slot.value = new_value.clone();
            }
        }
        let child = if shallow {
            None
        } else {
            observe(&new_value, false)
        };
        {
            let mut slots = self.inner.slots.write().expect("slots lock poisoned");
            if let Some(reactive) = slots.get_mut(key).and_then(|slot| slot.reactive.as_mut()) {
                reactive.child = child;
            }
        }
        dep.notify();
    }
}

impl Default for ObjectValue {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ObjectValue {}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectValue")
            .field("kind", &self.inner.kind)
            .field("keys", &self.keys())
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for ObjectValue
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let object = ObjectValue::new();
        for (key, value) in iter {
            object.insert(key, value);
        }
        object
    }
}

/// Non-owning handle used for observer back-references.
#[derive(Clone)]
pub(crate) struct WeakObject(Weak<ObjectInner>);

impl WeakObject {
    pub(crate) fn upgrade(&self) -> Option<ObjectValue> {
        self.0.upgrade().map(|inner| ObjectValue { inner })
    }
}
