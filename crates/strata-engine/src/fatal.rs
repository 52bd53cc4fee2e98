//! Process-fatal escalation.
//!
//! Reserved for states the runtime refuses to continue from: the backend's
//! current context no longer matches the stored one, or a mandatory backend
//! entry point could not be resolved. Everything else is a [`CoreError`].
//!
//! [`CoreError`]: crate::error::CoreError

use std::fmt;

/// Description of an unrecoverable failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalError {
    /// Component that detected the failure.
    pub target: &'static str,
    pub reason: String,
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.target, self.reason)
    }
}

/// Handler invoked on fatal escalation.
///
/// With a custom callback the callback runs and control returns to the
/// caller, which then fails the current operation. Without one the process
/// halts: a panic in debug builds, `abort` in release builds.
pub struct FatalHandler {
    callback: Option<Box<dyn FnMut(&FatalError)>>,
}

impl FatalHandler {
    /// Halts the process on escalation.
    pub fn halt() -> Self {
        Self { callback: None }
    }

    /// Routes escalations to `callback`.
    pub fn new(callback: impl FnMut(&FatalError) + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    pub fn escalate(&mut self, target: &'static str, reason: impl Into<String>) -> FatalError {
        let err = FatalError {
            target,
            reason: reason.into(),
        };

        log::error!(target: "fatal", "{err}");

        match self.callback.as_mut() {
            Some(cb) => cb(&err),
            None => halt(&err),
        }

        err
    }
}

impl Default for FatalHandler {
    fn default() -> Self {
        Self::halt()
    }
}

impl fmt::Debug for FatalHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FatalHandler")
            .field("custom", &self.callback.is_some())
            .finish()
    }
}

#[cfg(debug_assertions)]
fn halt(err: &FatalError) {
    panic!("fatal graphics error: {err}");
}

#[cfg(not(debug_assertions))]
fn halt(_err: &FatalError) {
    std::process::abort();
}
