//! Deletion-confirmation bookkeeping for one reconciliation pass
//!
//! Teardown records every path it removes; the host's deletion listener
//! records every path the host reports gone. Linking waits until teardown is
//! complete and the two sets are equal.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Paths removed by the engine and paths the host has confirmed removed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeletionTrace {
    deleted: HashSet<String>,
    confirmed: HashSet<String>,
    removal_complete: bool,
}

impl DeletionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a workspace-relative path removed from the live filesystem.
    pub fn record_deleted(&mut self, path: &str) {
        self.deleted.insert(path.to_string());
    }

    /// Record a workspace-relative path the host reports as gone.
    pub fn record_confirmed(&mut self, path: &str) {
        self.confirmed.insert(path.to_string());
    }

    pub fn mark_removal_complete(&mut self) {
        self.removal_complete = true;
    }

    pub fn removal_complete(&self) -> bool {
        self.removal_complete
    }

    pub fn deleted(&self) -> &HashSet<String> {
        &self.deleted
    }

    pub fn confirmed(&self) -> &HashSet<String> {
        &self.confirmed
    }

    /// Whether both collections hold exactly the same paths.
    pub fn in_parity(&self) -> bool {
        paths_equal(&self.deleted, &self.confirmed)
    }

    /// Teardown finished and the host has caught up with it.
    pub fn is_settled(&self) -> bool {
        self.removal_complete && self.in_parity()
    }
}

/// Set equality: same size and every element of one present in the other.
pub fn paths_equal(a: &HashSet<String>, b: &HashSet<String>) -> bool {
    a.len() == b.len() && a.iter().all(|path| b.contains(path))
}

/// A [`DeletionTrace`] shared between a pass and its host listener.
#[derive(Debug, Clone, Default)]
pub struct SharedTrace(Arc<Mutex<DeletionTrace>>);

impl SharedTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the trace. A panic in another holder does not invalidate the sets.
    pub fn lock(&self) -> MutexGuard<'_, DeletionTrace> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy out the current state.
    pub fn snapshot(&self) -> DeletionTrace {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn equality_ignores_order() {
        assert!(paths_equal(&set(&["a", "b"]), &set(&["b", "a"])));
    }

    #[test]
    fn equality_requires_same_size() {
        assert!(!paths_equal(&set(&["a", "b"]), &set(&["a"])));
        assert!(!paths_equal(&set(&["a"]), &set(&["a", "b"])));
    }

    #[test]
    fn empty_sets_are_equal() {
        assert!(paths_equal(&set(&[]), &set(&[])));
    }

    #[test]
    fn settled_needs_completion_and_parity() {
        let mut trace = DeletionTrace::new();
        trace.record_deleted("alpha/docs");
        trace.record_deleted("alpha");
        assert!(!trace.is_settled());

        trace.record_confirmed("alpha");
        trace.record_confirmed("alpha/docs");
        assert!(trace.in_parity());
        assert!(!trace.is_settled());

        trace.mark_removal_complete();
        assert!(trace.is_settled());
    }

    #[test]
    fn confirmations_are_deduplicated() {
        let mut trace = DeletionTrace::new();
        trace.record_deleted("alpha");
        trace.record_confirmed("alpha");
        trace.record_confirmed("alpha");
        trace.mark_removal_complete();
        assert!(trace.is_settled());
    }

    #[test]
    fn extra_confirmation_breaks_parity() {
        let mut trace = DeletionTrace::new();
        trace.record_deleted("alpha");
        trace.record_confirmed("alpha");
        trace.record_confirmed("unrelated");
        trace.mark_removal_complete();
        assert!(!trace.is_settled());
    }
}
