//! Reactive Slot Installation
//!
//! [`define_reactive`] turns one (object, key) pair into a reactive slot:
//! it gives the slot its own dependency set, observes the current value so
//! nested structures are reactive too, and from then on every read and
//! write of the key flows through the instrumented accessor pair on
//! [`ObjectValue`].
//!
//! # Pre-existing Accessors
//!
//! A slot may already carry a getter/setter pair defined by the embedder.
//! Instrumentation composes with them instead of replacing them: the
//! instrumented read calls the old getter to produce the value, and the
//! instrumented write delegates to the old setter to perform it. A slot
//! with a getter but no setter is derived and read-only — writes to it are
//! refused, it is never read eagerly at install time, and it is never
//! deep-observed. A slot with both accessors is read through its getter at
//! install time and deep-observed like a data slot.

use std::sync::Arc;

use crate::value::{ArrayValue, ObjectValue, ReactiveSlot, Slot, Value};

use super::dep::Dep;
use super::observe::observe;

/// A diagnostic hook fired when an instrumented write is accepted.
///
/// Only invoked in debug builds; never part of production control flow.
pub type MutationHook = Arc<dyn Fn() + Send + Sync>;

/// Install an intercepted accessor pair on `object` for `key`.
///
/// When `initial_value` is `None` the current value is used. `hook` is a
/// debug-only diagnostic callback fired on accepted writes. With `shallow`,
/// the stored value is not recursively observed.
///
/// Installation is skipped silently when the existing slot is
/// non-configurable (an intentionally fixed property), and when `key` does
/// not exist on a non-extensible node.
pub fn define_reactive(
    object: &ObjectValue,
    key: &str,
    initial_value: Option<Value>,
    hook: Option<MutationHook>,
    shallow: bool,
) {
    let descriptor = {
        let slots = object.slots().read().expect("slots lock poisoned");
        slots.get(key).map(|slot| {
            (
                slot.configurable,
                slot.getter.clone(),
                slot.setter.clone(),
                slot.value.clone(),
            )
        })
    };

    let (exists, getter, setter, raw) = match descriptor {
        Some((false, _, _, _)) => return,
        Some((true, getter, setter, raw)) => (true, getter, setter, raw),
        None => (false, None, None, Value::Null),
    };
    if !exists && !object.is_extensible() {
        return;
    }

    let mut value = initial_value;
    if value.is_none() && (getter.is_none() || setter.is_some()) {
        value = Some(match &getter {
            Some(get) => get(object),
            None => raw,
        });
    }

    let child = if shallow {
        None
    } else {
        value.as_ref().and_then(|value| observe(value, false))
    };

    let mut slots = object.slots().write().expect("slots lock poisoned");
    let slot = slots
        .entry(key.to_string())
        .or_insert_with(|| Slot::data(Value::Null));
    if let Some(value) = value {
        slot.value = value;
    }
    slot.reactive = Some(ReactiveSlot {
        dep: Dep::new(),
        child,
        shallow,
        hook,
    });
}

/// Register the active subscriber with every observed element of an array,
/// recursively.
///
/// Array elements have no per-index slots to intercept, so their
/// dependencies are collected eagerly whenever the array itself is read.
pub(crate) fn depend_array(items: &ArrayValue) {
    for element in items.to_vec() {
        match &element {
            Value::Object(object) => {
                if let Some(observer) = object.observer() {
                    observer.dep().depend();
                }
            }
            Value::Array(nested) => {
                if let Some(observer) = nested.observer() {
                    observer.dep().depend();
                }
                depend_array(nested);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::subscriber::CallbackSubscriber;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_subscriber() -> (Arc<CallbackSubscriber>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let subscriber = CallbackSubscriber::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        (subscriber, calls)
    }

    #[test]
    fn installed_slots_notify_on_change() {
        let object = ObjectValue::new();
        object.insert("count", 1.0);
        define_reactive(&object, "count", None, None, false);

        let (subscriber, calls) = counting_subscriber();
        subscriber.run(|| {
            object.get("count");
        });

        object.set("count", 2.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(object.get("count"), Some(Value::from(2.0)));
    }

    #[test]
    fn identical_writes_are_silent() {
        let object = ObjectValue::new();
        object.insert("count", 1.0);
        object.insert("weird", f64::NAN);
        define_reactive(&object, "count", None, None, false);
        define_reactive(&object, "weird", None, None, false);

        let (subscriber, calls) = counting_subscriber();
        subscriber.run(|| {
            object.get("count");
            object.get("weird");
        });

        object.set("count", 1.0);
        object.set("weird", f64::NAN);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn fixed_slots_are_skipped() {
        let object = ObjectValue::new();
        object.define_fixed("locked", 1.0);
        define_reactive(&object, "locked", None, None, false);

        let (subscriber, calls) = counting_subscriber();
        subscriber.run(|| {
            object.get("locked");
        });

        // the slot stayed plain: the write lands but nobody is notified
        object.set("locked", 2.0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(object.get("locked"), Some(Value::from(2.0)));
    }

    #[test]
    fn preserved_setter_performs_the_write() {
        use std::sync::atomic::AtomicU64;

        let backing = Arc::new(AtomicU64::new(1));
        let object = ObjectValue::new();
        let read_from = backing.clone();
        let write_to = backing.clone();
        object.define_accessor(
            "stored",
            Some(Arc::new(move |_: &ObjectValue| {
                Value::from(read_from.load(Ordering::SeqCst) as f64)
            })),
            Some(Arc::new(move |_: &ObjectValue, value: Value| {
                if let Some(n) = value.as_num() {
                    write_to.store(n as u64, Ordering::SeqCst);
                }
            })),
        );
        define_reactive(&object, "stored", None, None, false);

        let (subscriber, calls) = counting_subscriber();
        subscriber.run(|| {
            object.get("stored");
        });

        object.set("stored", 8.0);
        assert_eq!(backing.load(Ordering::SeqCst), 8);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn getter_only_slots_refuse_instrumented_writes() {
        let object = ObjectValue::new();
        object.define_accessor(
            "derived",
            Some(Arc::new(|_: &ObjectValue| Value::from(3.0))),
            None,
        );
        define_reactive(&object, "derived", None, None, false);

        let (subscriber, calls) = counting_subscriber();
        subscriber.run(|| {
            object.get("derived");
        });

        object.set("derived", 4.0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(object.get("derived"), Some(Value::from(3.0)));
    }

    #[test]
    fn debug_hook_fires_on_accepted_writes_only() {
        let fires = Arc::new(AtomicUsize::new(0));
        let fires_clone = fires.clone();

        let object = ObjectValue::new();
        object.insert("count", 1.0);
        define_reactive(
            &object,
            "count",
            None,
            Some(Arc::new(move || {
                fires_clone.fetch_add(1, Ordering::SeqCst);
            })),
            false,
        );

        object.set("count", 1.0);
        assert_eq!(fires.load(Ordering::SeqCst), 0);

        object.set("count", 2.0);
        let expected = if cfg!(debug_assertions) { 1 } else { 0 };
        assert_eq!(fires.load(Ordering::SeqCst), expected);
    }

    #[test]
    fn shallow_slots_do_not_observe_nested_values() {
        let nested = ObjectValue::new();
        nested.insert("x", 1.0);

        let object = ObjectValue::new();
        object.insert("config", Value::Object(nested.clone()));
        define_reactive(&object, "config", None, None, true);

        assert!(nested.observer().is_none());
    }

    #[test]
    fn deep_slots_observe_nested_values() {
        let nested = ObjectValue::new();
        nested.insert("x", 1.0);

        let object = ObjectValue::new();
        object.insert("config", Value::Object(nested.clone()));
        define_reactive(&object, "config", None, None, false);

        assert!(nested.observer().is_some());
    }

    #[test]
    fn replacing_a_structured_value_observes_the_replacement() {
        let object = ObjectValue::new();
        object.insert("config", Value::Null);
        define_reactive(&object, "config", None, None, false);

        let replacement = ObjectValue::new();
        replacement.insert("x", 2.0);
        object.set("config", Value::Object(replacement.clone()));

        assert!(replacement.observer().is_some());
    }
}
