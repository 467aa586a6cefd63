//! Observation Engine
//!
//! This module implements property-level reactivity over the dynamic value
//! model: wrapping values, tracking which subscriber read which property,
//! and notifying subscribers when a value they read has changed.
//!
//! # Concepts
//!
//! ## Observed Values
//!
//! [`observe`] attaches an [`Observer`] to an object or array node. For
//! objects, every enumerable key becomes a reactive slot with its own
//! dependency set; for arrays, mutation flows through the intercepted
//! method set on the node and every element is observed recursively.
//!
//! ## Dependency Tracking
//!
//! While a [`Subscriber`] evaluates inside a [`TrackingScope`], every
//! reactive slot it reads registers it in that slot's [`Dep`]. A later
//! write to the slot notifies every registered subscriber, synchronously
//! and in registration order.
//!
//! ## Dynamic Mutation
//!
//! Interception cannot see keys that did not exist at observation time, nor
//! array index writes. [`set`] and [`del`] cover those cases and synthesize
//! the notification that interception alone cannot deliver.
//!
//! # Implementation Notes
//!
//! The "currently evaluating subscriber" is a thread-local stack manipulated
//! through RAII guards, so nested evaluations and panic unwinds keep strict
//! push/pop pairing. The whole engine is synchronous and re-entrant:
//! notification runs in the call stack of the write that caused it, and a
//! notified subscriber may itself read and write reactive state.
//!
//! This style of transparent, read-based dependency collection is the same
//! family of design used by SolidJS, MobX, and Vue.

mod context;
mod dep;
mod mutate;
mod observe;
mod reactive;
mod subscriber;

pub use context::{should_observe, toggle_observing, ObservationScope, TrackingScope};
pub use dep::{Dep, DepId};
pub use mutate::{del, set, Key};
pub use observe::{observable, observe, Observer};
pub use reactive::{define_reactive, MutationHook};
pub use subscriber::{CallbackSubscriber, Subscriber, SubscriberId};

pub(crate) use reactive::depend_array;
