//! Diagnostics facade.
//!
//! All non-fatal problems in the observation engine are reported here and
//! nowhere else. Diagnostics never alter control flow: every caller that
//! warns also degrades to a well-defined fallback behavior.

use crate::config;

/// Emit a diagnostic message.
///
/// Honors the `silent` configuration flag, dispatches to the custom warn
/// handler when one is installed, and otherwise logs through `tracing`.
pub(crate) fn warn(message: &str) {
    if config::silent() {
        return;
    }
    match config::warn_handler() {
        Some(handler) => handler(message),
        None => tracing::warn!("{}", message),
    }
}
