//! Run-once-per-process guard for schema initialization.

use std::sync::atomic::{AtomicBool, Ordering};

/// Marks whether the schema pass has been attempted in this process.
///
/// The flag records "attempted", not "succeeded": it is set once the guarded
/// action ends, whatever it reported and even if it panicked. The check and the set are
/// not a single atomic step, so callers that race on an unset flag may each
/// run the action. The guarded action must therefore be idempotent.
#[derive(Debug, Default)]
pub struct InitGuard {
    initialized: AtomicBool,
}

impl InitGuard {
    /// Creates an unset guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the guarded action has been attempted at least once.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Runs `action` if the flag is unset, then sets the flag.
    ///
    /// Returns `Some` with the action's result if it ran, `None` if the flag
    /// was already set. The flag is set on unwind too.
    pub fn run_once<T>(&self, action: impl FnOnce() -> T) -> Option<T> {
        if self.is_initialized() {
            return None;
        }

        let _mark = MarkAttempted(&self.initialized);
        Some(action())
    }
}

/// Sets the flag when dropped, on return or unwind.
struct MarkAttempted<'a>(&'a AtomicBool);

impl Drop for MarkAttempted<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}
