//! Ambient Reactive Context
//!
//! Two pieces of per-thread ambient state drive the engine:
//!
//! 1. The **tracking stack**: which subscriber is currently evaluating, if
//!    any. When a reactive slot is read, the top of this stack is registered
//!    as a dependent. It is a stack, not a single slot, because evaluating
//!    one subscriber can synchronously trigger the evaluation of another
//!    (a computation reading a value produced by a second computation).
//!
//! 2. The **observation switch**: whether `observe` may create new
//!    observers. Callers turn it off around data that must be stored as-is
//!    (for example values passed through unmodified) and restore it after.
//!
//! Both are manipulated through RAII guards so every push is paired with a
//! pop and every override with a restore, on all exit paths including
//! panics.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use super::subscriber::{Subscriber, SubscriberId};

thread_local! {
    static TARGET_STACK: RefCell<Vec<Arc<dyn Subscriber>>> = RefCell::new(Vec::new());
    static SHOULD_OBSERVE: Cell<bool> = Cell::new(true);
}

/// Guard representing one active subscriber evaluation.
///
/// While the guard lives, reactive reads register the subscriber as a
/// dependent. Dropping the guard pops the subscriber, restoring whatever
/// evaluation (if any) was active before.
pub struct TrackingScope {
    subscriber_id: SubscriberId,
}

impl TrackingScope {
    /// Enter an evaluation for the given subscriber.
    #[must_use]
    pub fn enter(subscriber: Arc<dyn Subscriber>) -> Self {
        let subscriber_id = subscriber.id();
        TARGET_STACK.with(|stack| {
            stack.borrow_mut().push(subscriber);
        });
        TrackingScope { subscriber_id }
    }

    /// Whether any subscriber is currently evaluating on this thread.
    pub fn is_active() -> bool {
        TARGET_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// The currently evaluating subscriber, if any.
    pub fn current() -> Option<Arc<dyn Subscriber>> {
        TARGET_STACK.with(|stack| stack.borrow().last().cloned())
    }
}

impl Drop for TrackingScope {
    fn drop(&mut self) {
        TARGET_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            // catch mismatched push/pop pairs early
            if let Some(subscriber) = popped {
                debug_assert_eq!(
                    subscriber.id(),
                    self.subscriber_id,
                    "TrackingScope mismatch: expected {:?}, got {:?}",
                    self.subscriber_id,
                    subscriber.id()
                );
            }
        });
    }
}

/// Whether `observe` may currently create new observers on this thread.
pub fn should_observe() -> bool {
    SHOULD_OBSERVE.with(Cell::get)
}

/// Flip the observation switch.
///
/// Prefer [`ObservationScope`] anywhere the previous state must come back;
/// this raw toggle exists for callers that manage the pairing themselves.
pub fn toggle_observing(enabled: bool) {
    SHOULD_OBSERVE.with(|flag| flag.set(enabled));
}

/// Guard that overrides the observation switch and restores the previous
/// state on drop, making nested overrides compose.
pub struct ObservationScope {
    previous: bool,
}

impl ObservationScope {
    /// Override the observation switch for the lifetime of the guard.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        let previous = should_observe();
        toggle_observing(enabled);
        ObservationScope { previous }
    }

    /// Suppress observer creation for the lifetime of the guard.
    #[must_use]
    pub fn disable() -> Self {
        Self::new(false)
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        toggle_observing(self.previous);
    }
}
