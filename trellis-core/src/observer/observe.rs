//! Value Wrapping
//!
//! [`observe`] turns a plain object or array into an observed value: the
//! node gets an [`Observer`] attached in its hidden cell, every enumerable
//! key of an object is installed as a reactive slot, and every element of
//! an array is observed recursively.
//!
//! # Idempotence
//!
//! At most one observer ever exists per node. Observing an already-observed
//! value returns the existing observer, which also makes revisiting shared
//! or cyclic structures cheap: the second visit stops at the hidden cell.
//!
//! # Lifetime
//!
//! The node owns its observer; the observer holds only a weak reference
//! back. Observers are never destroyed explicitly — they go away with the
//! node they annotate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::value::{ArrayValue, ObjectKind, ObjectValue, Value, WeakArray, WeakObject};

use super::context;
use super::dep::Dep;
use super::reactive::define_reactive;

enum ObservedTarget {
    Object(WeakObject),
    Array(WeakArray),
}

/// The per-node reactive state attached to every observed value.
///
/// Carries the value-scoped dependency set — the one used for array element
/// dependency propagation and for making key addition/removal observable —
/// and the root-usage counter that gates ad hoc root mutation.
pub struct Observer {
    target: ObservedTarget,
    dep: Arc<Dep>,
    root_count: AtomicUsize,
}

impl Observer {
    /// The value-scoped dependency set.
    pub fn dep(&self) -> &Arc<Dep> {
        &self.dep
    }

    /// How many top-level bindings use this value as their root state.
    pub fn root_count(&self) -> usize {
        self.root_count.load(Ordering::SeqCst)
    }

    /// The wrapped value, if the node is still alive.
    pub fn value(&self) -> Option<Value> {
        match &self.target {
            ObservedTarget::Object(weak) => weak.upgrade().map(Value::Object),
            ObservedTarget::Array(weak) => weak.upgrade().map(Value::Array),
        }
    }

    /// Observe a batch of array elements.
    ///
    /// Used when an array is first wrapped and by the mutation interceptor
    /// for newly inserted elements. Primitives pass through untouched.
    pub fn observe_items(&self, items: &[Value]) {
        for item in items {
            observe(item, false);
        }
    }
}

/// Attempt to wrap a value, returning its observer on success.
///
/// Returns the existing observer when the value is already wrapped. Returns
/// `None` for values that do not qualify: primitives, render-output nodes,
/// component instance roots, frozen values, and anything encountered while
/// the observation switch is off.
///
/// With `as_root_state`, the produced or reused observer's root-usage
/// counter is incremented; the dynamic mutation API refuses ad hoc key
/// addition and removal on values with a non-zero counter.
pub fn observe(value: &Value, as_root_state: bool) -> Option<Arc<Observer>> {
    let observer = match value {
        Value::Object(object) => observe_object(object),
        Value::Array(items) => observe_array(items),
        _ => None,
    };
    if as_root_state {
        if let Some(observer) = &observer {
            observer.root_count.fetch_add(1, Ordering::SeqCst);
        }
    }
    observer
}

/// Observe a value and hand it back, for expression-style call sites.
pub fn observable(value: Value) -> Value {
    observe(&value, false);
    value
}

fn observe_object(object: &ObjectValue) -> Option<Arc<Observer>> {
    if let Some(existing) = object.observer() {
        return Some(existing);
    }
    if !context::should_observe() || object.kind() != ObjectKind::Plain || !object.is_extensible()
    {
        return None;
    }
    let observer = Arc::new(Observer {
        target: ObservedTarget::Object(object.downgrade()),
        dep: Dep::new(),
        root_count: AtomicUsize::new(0),
    });
    if object.install_observer(Arc::clone(&observer)) {
        // attach before walking, so re-entrant observe calls on cyclic
        // structures find the cell occupied and stop
        walk(object);
        Some(observer)
    } else {
        object.observer()
    }
}

fn observe_array(items: &ArrayValue) -> Option<Arc<Observer>> {
    if let Some(existing) = items.observer() {
        return Some(existing);
    }
    if !context::should_observe() || !items.is_extensible() {
        return None;
    }
    let observer = Arc::new(Observer {
        target: ObservedTarget::Array(items.downgrade()),
        dep: Dep::new(),
        root_count: AtomicUsize::new(0),
    });
    if items.install_observer(Arc::clone(&observer)) {
        let elements = items.to_vec();
        observer.observe_items(&elements);
        Some(observer)
    } else {
        items.observer()
    }
}

/// Install a reactive slot for every enumerable own key.
fn walk(object: &ObjectValue) {
    for key in object.keys() {
        define_reactive(object, &key, None, None, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observing_twice_returns_the_same_observer() {
        let object = ObjectValue::new();
        object.insert("a", 1.0);
        let value = Value::Object(object);

        let first = observe(&value, false).expect("observed");
        let second = observe(&value, false).expect("observed");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn primitives_are_not_observed() {
        assert!(observe(&Value::Null, false).is_none());
        assert!(observe(&Value::from(1.0), false).is_none());
        assert!(observe(&Value::from("text"), false).is_none());
    }

    #[test]
    fn special_nodes_are_not_observed() {
        let render_node = ObjectValue::with_kind(ObjectKind::RenderNode);
        assert!(observe(&Value::Object(render_node), false).is_none());

        let component = ObjectValue::with_kind(ObjectKind::ComponentRoot);
        assert!(observe(&Value::Object(component), false).is_none());

        let frozen = ObjectValue::new();
        frozen.freeze();
        assert!(observe(&Value::Object(frozen), false).is_none());
    }

    #[test]
    fn observation_switch_suppresses_wrapping() {
        let object = ObjectValue::new();
        let value = Value::Object(object.clone());

        {
            let _off = context::ObservationScope::disable();
            assert!(observe(&value, false).is_none());
        }

        // back on: the same value can be wrapped now
        assert!(observe(&value, false).is_some());
        assert!(object.observer().is_some());
    }

    #[test]
    fn root_usage_counts_accumulate() {
        let object = ObjectValue::new();
        let value = Value::Object(object);

        let observer = observe(&value, true).expect("observed");
        assert_eq!(observer.root_count(), 1);

        observe(&value, true);
        assert_eq!(observer.root_count(), 2);

        observe(&value, false);
        assert_eq!(observer.root_count(), 2);
    }

    #[test]
    fn observer_points_back_at_its_value() {
        let object = ObjectValue::new();
        let value = Value::Object(object.clone());

        let observer = observe(&value, false).expect("observed");
        let round_trip = observer.value().expect("node alive");
        assert_eq!(round_trip, Value::Object(object));
    }

    #[test]
    fn array_elements_are_observed_recursively() {
        let nested = ObjectValue::new();
        nested.insert("x", 1.0);

        let items = ArrayValue::from_values(vec![Value::from(1.0), Value::Object(nested.clone())]);
        observe(&Value::Array(items), false).expect("observed");

        assert!(nested.observer().is_some());
    }

    #[test]
    fn cyclic_structures_terminate() {
        let parent = ObjectValue::new();
        let child = ObjectValue::new();
        child.insert("parent", Value::Object(parent.clone()));
        parent.insert("child", Value::Object(child.clone()));

        observe(&Value::Object(parent.clone()), false).expect("observed");
        assert!(parent.observer().is_some());
        assert!(child.observer().is_some());
    }
}
