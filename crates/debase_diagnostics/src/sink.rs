//! Collects diagnostics from pipeline stages, including concurrent lowering
//! workers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::diagnostic::Diagnostic;

/// Shared, append-only diagnostic buffer.
///
/// Errors are also counted in an atomic so the count stays readable after
/// the buffer has been drained for rendering.
#[derive(Default)]
pub struct DiagnosticSink {
    entries: Mutex<Vec<Diagnostic>>,
    errors: AtomicUsize,
}

impl DiagnosticSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `diag`.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity.is_error() {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        self.entries().push(diag);
    }

    /// `true` once any error has been recorded.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Errors recorded so far, including drained ones.
    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Drains the buffer in emission order.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries())
    }

    /// Copies the buffer without draining it.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.entries().clone()
    }

    // Pushes are atomic with respect to panics; poisoning is ignored.
    fn entries(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
