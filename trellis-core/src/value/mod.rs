//! Dynamic Value Model
//!
//! The observation engine works on arbitrarily shaped state, so it carries
//! its own value representation instead of tracking fields of user structs.
//! A [`Value`] is either a primitive or a shared handle to a mutable node:
//!
//! - [`ObjectValue`]: an insertion-ordered map of named property slots.
//! - [`ArrayValue`]: a growable sequence whose mutating operations route
//!   through the engine's interception layer.
//!
//! # Reference Semantics
//!
//! Cloning a `Value` clones primitives by value and structured values by
//! handle: two clones of an object value point at the same node, and a write
//! through one is visible through the other. Equality follows the same rule.
//! Primitives compare by value; objects and arrays compare by node identity,
//! never by contents.
//!
//! # The Not-a-Number Sentinel
//!
//! Numbers are `f64`, so a slot can hold NaN. NaN is never equal to itself,
//! which would make every write of NaN over NaN look like a change. The
//! write path uses [`Value::is_nan`] to detect that case and suppress the
//! spurious notification.

mod array;
mod object;

pub use array::ArrayValue;
pub use object::{ObjectKind, ObjectValue, PropertyGetter, PropertySetter};

pub(crate) use array::WeakArray;
pub(crate) use object::{ReactiveSlot, Slot, WeakObject};

use std::fmt;

use thiserror::Error;

/// A dynamically typed value.
///
/// This is the currency of the whole engine: property slots hold `Value`s,
/// arrays hold `Value`s, and every read or write moves `Value`s across the
/// interception boundary.
#[derive(Clone)]
pub enum Value {
    /// The absent/empty value.
    Null,

    /// A boolean.
    Bool(bool),

    /// A double-precision number.
    Num(f64),

    /// A string.
    Str(String),

    /// A shared handle to an object node.
    Object(ObjectValue),

    /// A shared handle to an array node.
    Array(ArrayValue),
}

impl Value {
    /// A short name for the value's type, used in diagnostics and errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
        }
    }

    /// True only for the not-a-number sentinel.
    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Num(n) if n.is_nan())
    }

    /// True for object and array values, the shapes that can be observed.
    pub fn is_structured(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_))
    }

    /// The number, if this is a number value.
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The string, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The object handle, if this is an object value.
    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The array handle, if this is an array value.
    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// Identity equality.
///
/// Primitives compare by value (NaN is unequal to itself, as usual for
/// floats). Objects and arrays compare by node identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Num(n) => write!(f, "Num({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Object(object) => fmt::Debug::fmt(object, f),
            Value::Array(items) => fmt::Debug::fmt(items, f),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Num(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Num(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Num(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<ObjectValue> for Value {
    fn from(value: ObjectValue) -> Self {
        Value::Object(value)
    }
}

impl From<ArrayValue> for Value {
    fn from(value: ArrayValue) -> Self {
        Value::Array(value)
    }
}

/// Errors produced when extracting typed data out of a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The value held a different type than the caller asked for.
    #[error("expected a {expected} value, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl TryFrom<Value> for f64 {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        value.as_num().ok_or(ValueError::TypeMismatch {
            expected: "number",
            found: value.type_name(),
        })
    }
}

impl TryFrom<Value> for bool {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        value.as_bool().ok_or(ValueError::TypeMismatch {
            expected: "bool",
            found: value.type_name(),
        })
    }
}

impl TryFrom<Value> for String {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(ValueError::TypeMismatch {
                expected: "string",
                found: other.type_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_compare_by_value() {
        assert_eq!(Value::from(1.5), Value::from(1.5));
        assert_eq!(Value::from("a"), Value::from("a"));
        assert_ne!(Value::from(1.5), Value::from(2.5));
        assert_ne!(Value::from(true), Value::Null);
    }

    #[test]
    fn structured_values_compare_by_identity() {
        let object = ObjectValue::new();
        object.insert("a", 1.0);

        let same = Value::Object(object.clone());
        let also_same = Value::Object(object);
        assert_eq!(same, also_same);

        let twin = ObjectValue::new();
        twin.insert("a", 1.0);
        assert_ne!(same, Value::Object(twin));
    }

    #[test]
    fn nan_is_unequal_to_itself_but_detectable() {
        let nan = Value::from(f64::NAN);
        assert_ne!(nan, nan.clone());
        assert!(nan.is_nan());
        assert!(!Value::from(0.0).is_nan());
    }

    #[test]
    fn typed_extraction_reports_mismatches() {
        let value = Value::from("text");
        assert_eq!(String::try_from(value.clone()), Ok("text".to_string()));
        assert_eq!(
            f64::try_from(value),
            Err(ValueError::TypeMismatch {
                expected: "number",
                found: "string",
            })
        );
    }
}
