#![allow(clippy::arc_with_non_send_sync)]

pub const ERROR_GUARANTEED_CODE: &str = "FINAL_ERROR";

pub extern crate error_snippet_derive;

use std::sync::{Arc, Mutex, MutexGuard};

pub use error_snippet::{Diagnostic, Error, IntoDiagnostic, Result, SimpleDiagnostic};
use error_snippet::Severity;
pub use error_snippet_derive::Diagnostic;

/// Holding block for all diagnostics reported to a [`DiagCtx`].
#[derive(Default)]
struct DiagCtxInner {
    /// All the reported diagnostics, in the order they were emitted.
    emitted: Vec<Error>,

    /// Treat all errors as bugs, causing a `panic!`.
    panic_on_error: bool,
}

impl DiagCtxInner {
    /// Pushes the given diagnostic to the context.
    #[track_caller]
    fn push(&mut self, diag: Error) {
        if diag.message().as_str() == ERROR_GUARANTEED_CODE {
            return;
        }

        assert!(!self.panic_on_error, "error emitted with `panic_on_error` enabled: {}", diag.message());

        self.emitted.push(diag);
    }

    /// Determines whether the diagnostic context has been tainted with
    /// one-or-more errors.
    fn is_tainted(&self) -> bool {
        self.emitted.iter().any(|diag| diag.severity() == Severity::Error)
    }
}

/// A context to deal with diagnostics raised while transforming a module.
///
/// Optimizer passes recover from most malformed input by skipping the
/// offending call site, but the reason is reported here so the driver can
/// decide whether to continue.
#[derive(Clone, Default)]
pub struct DiagCtx {
    inner: Arc<Mutex<DiagCtxInner>>,
}

impl DiagCtx {
    /// Creates a new, empty [`DiagCtx`] instance.
    pub fn new() -> Self {
        DiagCtx::default()
    }

    /// Locks the state shared between all clones of the context.
    ///
    /// # Panics
    ///
    /// Panics if a thread panicked while holding the lock.
    fn inner(&self) -> MutexGuard<'_, DiagCtxInner> {
        self.inner.lock().unwrap()
    }

    /// Turns every later [`DiagCtx::emit`] into a panic, so a failing pass
    /// can be traced back to where it reported the problem.
    pub fn panic_on_error(&self) {
        self.inner().panic_on_error = true;
    }

    /// Records the given diagnostic, unless it only marks an error which was
    /// already reported.
    ///
    /// # Panics
    ///
    /// Panics if [`DiagCtx::panic_on_error`] has been enabled.
    #[track_caller]
    pub fn emit(&self, diag: Error) {
        self.inner().push(diag);
    }

    /// Invokes the given closure with an iterator over all recorded
    /// diagnostics, in the order they were emitted.
    pub fn with_iter<F, R>(&self, f: F) -> R
    where
        F: for<'a> FnOnce(std::slice::Iter<'a, Error>) -> R,
    {
        let guard = self.inner();

        f(guard.emitted.iter())
    }

    /// Gets the number of diagnostics reported to the context.
    pub fn count(&self) -> usize {
        self.inner().emitted.len()
    }

    /// Determines whether the diagnostic context has been tainted with
    /// one-or-more errors.
    pub fn is_tainted(&self) -> bool {
        self.inner().is_tainted()
    }

    /// Ensure that the context is untainted.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the context is tainted with one-or-more errors.
    pub fn ensure_untainted(&self) -> Result<()> {
        if self.is_tainted() {
            Err(TaintedError(()).into())
        } else {
            Ok(())
        }
    }

    /// Clears all the diagnostics from the context.
    pub fn clear(&self) {
        self.inner().emitted.clear();
    }
}

unsafe impl Send for DiagCtx {}
unsafe impl Sync for DiagCtx {}

#[derive(Debug, Clone)]
struct TaintedError(());

impl error_snippet::Diagnostic for TaintedError {
    fn message(&self) -> String {
        String::from(ERROR_GUARANTEED_CODE)
    }
}
