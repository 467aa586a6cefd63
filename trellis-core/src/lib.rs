//! Trellis Core
//!
//! This crate provides the observation engine at the heart of the Trellis
//! reactive UI framework. It implements:
//!
//! - A dynamic value model (objects, arrays, primitives) with reference
//!   semantics
//! - Property-level dependency tracking (which computation read which key)
//! - Synchronous, ordered change notification
//! - Escape hatches for dynamic key addition/removal and array mutation
//!
//! The engine is deliberately small: scheduling, batching, rendering, and
//! component lifecycles are separate layers that consume its notifications.
//!
//! # Architecture
//!
//! The crate is organized into a few modules:
//!
//! - `value`: the dynamic value model ([`value::Value`],
//!   [`value::ObjectValue`], [`value::ArrayValue`])
//! - `observer`: observation, dependency sets, tracking scopes, and the
//!   dynamic mutation API
//! - `config`: process-wide diagnostic settings
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_core::observer::{observe, set, CallbackSubscriber};
//! use trellis_core::value::{ObjectValue, Value};
//!
//! // Build some state and observe it
//! let state = ObjectValue::new();
//! state.insert("count", 0.0);
//! let root = Value::Object(state.clone());
//! observe(&root, false);
//!
//! // A subscriber that re-runs when its dependencies change
//! let subscriber = CallbackSubscriber::new(|| println!("count changed"));
//! subscriber.run(|| {
//!     state.get("count");
//! });
//!
//! // Writes notify synchronously
//! state.set("count", 1.0); // prints "count changed"
//!
//! // Keys added after observation need the escape hatch
//! set(&root, "label", "ready");
//! ```

pub mod config;
pub mod observer;
pub mod value;

mod util;
