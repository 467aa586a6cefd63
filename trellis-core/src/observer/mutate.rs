//! Dynamic Mutation API
//!
//! Accessor interception only covers keys that existed when a value was
//! observed, and array indices are never intercepted at all. [`set`] and
//! [`del`] are the escape hatches for everything else: adding a key to an
//! observed object, writing an array index reactively, and removing keys or
//! elements with notification.
//!
//! Both functions degrade instead of failing: unsupported targets get a
//! diagnostic and a plain (or no-op) mutation, and additions/removals on
//! root state are refused with a diagnostic because undeclared root-level
//! reactive keys are unsupported.

use std::fmt;

use crate::util::warn;
use crate::value::Value;

use super::reactive::define_reactive;

/// A property key: an array index or an object key name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// A non-negative array index.
    Index(usize),

    /// A named object key.
    Name(String),
}

impl Key {
    /// The key as an object key name. Indices become their decimal form.
    fn into_name(self) -> String {
        match self {
            Key::Index(index) => index.to_string(),
            Key::Name(name) => name,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(index) => write!(f, "{index}"),
            Key::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

/// Set a property on a target value, reactively when possible.
///
/// - Array targets with an index key: the array's length is extended when
///   needed and the value is spliced in, which routes through the mutation
///   interceptor and notifies.
/// - Keys that already exist assign through the accessor pair already in
///   place.
/// - New keys on a component root or on root state are refused with a
///   diagnostic.
/// - New keys on an unobserved target get a plain, non-reactive assignment.
/// - Otherwise the key is installed as a new reactive slot and the target's
///   observer-level dependency set is notified — the only way an addition
///   can reach subscribers, since no per-key dependency set existed before.
///
/// Returns the value either way.
pub fn set(target: &Value, key: impl Into<Key>, value: impl Into<Value>) -> Value {
    let key = key.into();
    let value = value.into();
    match target {
        Value::Null | Value::Bool(_) | Value::Num(_) | Value::Str(_) => {
            warn(&format!(
                "cannot set reactive key `{key}` on a {} target",
                target.type_name()
            ));
            value
        }
        Value::Array(items) => match key {
            Key::Index(index) => {
                items.pad_to(index);
                items.splice(index, 1, vec![value.clone()]);
                value
            }
            Key::Name(name) => {
                warn(&format!(
                    "array targets take index keys; key `{name}` was ignored"
                ));
                value
            }
        },
        Value::Object(object) => {
            let name = key.into_name();
            if object.has(&name) {
                object.set(&name, value.clone());
                return value;
            }
            let observer = object.observer();
            let root_count = observer.as_ref().map_or(0, |ob| ob.root_count());
            if object.is_component_root() || root_count > 0 {
                warn(
                    "avoid adding reactive keys to a component instance or its root state \
                     at runtime; declare them in the initial state instead",
                );
                return value;
            }
            let Some(observer) = observer else {
                object.set(&name, value.clone());
                return value;
            };
            define_reactive(object, &name, Some(value.clone()), None, false);
            observer.dep().notify();
            value
        }
    }
}

/// Delete a property from a target value, notifying when it was reactive.
///
/// Array index removal routes through `splice`. Deleting from a component
/// root or from root state is refused with a diagnostic. Deleting an absent
/// key is a silent no-op; otherwise the raw slot is removed and, when the
/// target is observed, its observer-level dependency set is notified.
pub fn del(target: &Value, key: impl Into<Key>) {
    let key = key.into();
    match target {
        Value::Null | Value::Bool(_) | Value::Num(_) | Value::Str(_) => {
            warn(&format!(
                "cannot delete reactive key `{key}` on a {} target",
                target.type_name()
            ));
        }
        Value::Array(items) => {
            if let Key::Index(index) = key {
                items.splice(index, 1, Vec::new());
            }
        }
        Value::Object(object) => {
            let name = key.into_name();
            let observer = object.observer();
            let root_count = observer.as_ref().map_or(0, |ob| ob.root_count());
            if object.is_component_root() || root_count > 0 {
                warn(
                    "avoid deleting keys from a component instance or its root state; \
                     set the value to null instead",
                );
                return;
            }
            if !object.has(&name) {
                return;
            }
            if !object.remove_raw(&name) {
                return;
            }
            if let Some(observer) = observer {
                observer.dep().notify();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::observe::observe;
    use crate::observer::subscriber::CallbackSubscriber;
    use crate::value::{ArrayValue, ObjectValue};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_subscriber() -> (Arc<CallbackSubscriber>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let subscriber = CallbackSubscriber::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        (subscriber, calls)
    }

    #[test]
    fn set_on_a_primitive_target_returns_the_value() {
        let result = set(&Value::from(1.0), "key", 2.0);
        assert_eq!(result, Value::from(2.0));
    }

    #[test]
    fn set_assigns_existing_keys_through_interception() {
        let object = ObjectValue::new();
        object.insert("count", 1.0);
        let target = Value::Object(object.clone());
        observe(&target, false);

        let (subscriber, calls) = counting_subscriber();
        subscriber.run(|| {
            object.get("count");
        });

        set(&target, "count", 2.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(object.get("count"), Some(Value::from(2.0)));
    }

    #[test]
    fn set_on_an_unobserved_object_stays_plain() {
        let object = ObjectValue::new();
        let target = Value::Object(object.clone());

        set(&target, "fresh", 1.0);
        assert_eq!(object.get("fresh"), Some(Value::from(1.0)));
        assert!(object.observer().is_none());
    }

    #[test]
    fn set_installs_new_reactive_keys_on_observed_objects() {
        let object = ObjectValue::new();
        object.insert("existing", 0.0);
        let target = Value::Object(object.clone());
        observe(&target, false);

        set(&target, "added", 1.0);

        let (subscriber, calls) = counting_subscriber();
        subscriber.run(|| {
            object.get("added");
        });
        object.set("added", 2.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn set_notifies_structural_readers_of_the_addition() {
        let object = ObjectValue::new();
        let target = Value::Object(object.clone());
        let observer = observe(&target, false).expect("observed");

        let (subscriber, calls) = counting_subscriber();
        subscriber.run(|| {
            observer.dep().depend();
        });

        set(&target, "added", 1.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn set_splices_array_indices() {
        let items: ArrayValue = [1.0, 2.0].into_iter().collect();
        let target = Value::Array(items.clone());
        observe(&target, false);

        set(&target, 0usize, 9.0);
        assert_eq!(items.get(0), Some(Value::from(9.0)));
        assert_eq!(items.len(), 2);

        // past the end: the array grows, nulls fill the gap
        set(&target, 4usize, 7.0);
        assert_eq!(items.len(), 5);
        assert_eq!(items.get(3), Some(Value::Null));
        assert_eq!(items.get(4), Some(Value::from(7.0)));
    }

    #[test]
    fn root_state_additions_are_refused() {
        let object = ObjectValue::new();
        object.insert("declared", 1.0);
        let target = Value::Object(object.clone());
        observe(&target, true);

        set(&target, "undeclared", 2.0);
        assert_eq!(object.keys(), vec!["declared"]);

        del(&target, "declared");
        assert_eq!(object.keys(), vec!["declared"]);
    }

    #[test]
    fn del_removes_and_notifies() {
        let object = ObjectValue::new();
        object.insert("doomed", 1.0);
        let target = Value::Object(object.clone());
        let observer = observe(&target, false).expect("observed");

        let (subscriber, calls) = counting_subscriber();
        subscriber.run(|| {
            observer.dep().depend();
        });

        del(&target, "doomed");
        assert!(!object.has("doomed"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // absent keys are a silent no-op
        del(&target, "doomed");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn del_splices_array_indices() {
        let items: ArrayValue = [1.0, 2.0, 3.0].into_iter().collect();
        let target = Value::Array(items.clone());

        del(&target, 1usize);
        assert_eq!(items.to_vec(), vec![1.0.into(), 3.0.into()]);
    }
}
