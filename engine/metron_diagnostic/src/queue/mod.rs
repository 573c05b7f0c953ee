//! Diagnostic queue for collecting and deduplicating diagnostics.
//!
//! Resolution visits related declarations repeatedly (a group is walked
//! once per member, a shared ancestor once per descendant), so the same
//! anomaly can surface more than once. The queue keeps the first record
//! of each distinct diagnostic and preserves emission order, which is
//! deterministic because population iteration order is.

use rustc_hash::FxHashSet;

use crate::Diagnostic;

/// Queue for collecting and deduplicating diagnostics.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    seen: FxHashSet<Diagnostic>,
    error_count: usize,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic to the queue.
    ///
    /// Returns `true` if the diagnostic was added, `false` if an
    /// identical record was already queued.
    pub fn push(&mut self, diag: Diagnostic) -> bool {
        if !self.seen.insert(diag.clone()) {
            return false;
        }
        if diag.is_error() {
            self.error_count += 1;
        }
        self.diagnostics.push(diag);
        true
    }

    /// Move every diagnostic out of another queue into this one.
    pub fn absorb(&mut self, other: DiagnosticQueue) {
        for diag in other.diagnostics {
            self.push(diag);
        }
    }

    /// Number of distinct errors collected.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Get diagnostics without clearing the queue.
    pub fn peek(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Return the collected diagnostics in emission order, clearing
    /// the queue.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        self.seen.clear();
        self.error_count = 0;
        std::mem::take(&mut self.diagnostics)
    }
}
