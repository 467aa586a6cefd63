//! Runtime Configuration
//!
//! Process-wide settings that tune how the observation engine reports
//! diagnostics. Configuration never changes reactive behavior, only what
//! gets logged and where.
//!
//! Settings live behind a global lock so embedders can adjust them at any
//! point, including after values have been observed.

use std::sync::{Arc, OnceLock, RwLock};

/// A custom sink for diagnostic messages.
///
/// Handlers are held behind `Arc` so they can be invoked without keeping
/// the configuration lock held.
pub type WarnHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// The mutable configuration state.
#[derive(Default)]
struct Config {
    /// Suppress all diagnostics when true.
    silent: bool,

    /// Custom diagnostic sink. When unset, diagnostics go through `tracing`.
    warn_handler: Option<WarnHandler>,
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

fn config() -> &'static RwLock<Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default()))
}

/// Enable or disable all diagnostic output.
pub fn set_silent(silent: bool) {
    config().write().expect("config lock poisoned").silent = silent;
}

/// Whether diagnostics are currently suppressed.
pub fn silent() -> bool {
    config().read().expect("config lock poisoned").silent
}

/// Install a custom handler for diagnostic messages.
///
/// Replaces any previously installed handler.
pub fn set_warn_handler<F>(handler: F)
where
    F: Fn(&str) + Send + Sync + 'static,
{
    config().write().expect("config lock poisoned").warn_handler = Some(Arc::new(handler));
}

/// Remove the custom diagnostic handler, falling back to `tracing`.
pub fn clear_warn_handler() {
    config().write().expect("config lock poisoned").warn_handler = None;
}

/// Get a clone of the current handler, if any.
///
/// Cloned out so the caller can invoke it with no lock held.
pub(crate) fn warn_handler() -> Option<WarnHandler> {
    config().read().expect("config lock poisoned").warn_handler.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn warn_handler_receives_diagnostics() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();

        set_warn_handler(move |message| {
            if message.contains("config-test-probe") {
                seen_clone.fetch_add(1, Ordering::SeqCst);
            }
        });

        crate::util::warn("config-test-probe fired");
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        clear_warn_handler();
        crate::util::warn("config-test-probe fired again");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
