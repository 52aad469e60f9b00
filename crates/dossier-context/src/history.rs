//! Undo/redo history of context snapshots.
//!
//! [`History`] is an append-only sequence of contexts plus a current-index
//! pointer. Undo and redo only move the pointer; nothing is deleted until
//! a forward action is applied while the pointer sits before the end, at
//! which point the redo tail is truncated and gone for good. Stored
//! contexts are never mutated.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::Context;

/// Append-only context sequence with an undo/redo pointer.
///
/// Invariant: `index == len - 1` except transiently inside a pointer move,
/// and `0 <= index < len` always.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct History {
    entries: Vec<Arc<Context>>,
    index: usize,
}

impl History {
    /// Start history from an initial context.
    #[must_use]
    pub fn new(initial: Context) -> Self {
        Self {
            entries: vec![Arc::new(initial)],
            index: 0,
        }
    }

    /// Apply a forward action: truncate the redo tail, append, and move
    /// the pointer to the new entry. Returns the new index.
    pub fn apply(&mut self, context: Context) -> usize {
        let discarded = self.entries.len() - (self.index + 1);
        if discarded > 0 {
            debug!(discarded, "discarding redo tail");
        }
        self.entries.truncate(self.index + 1);
        self.entries.push(Arc::new(context));
        self.index = self.entries.len() - 1;
        self.index
    }

    /// Move the pointer back `n` steps, clamped at the first entry.
    /// Returns the new index.
    pub fn undo(&mut self, n: usize) -> usize {
        self.index = self.index.saturating_sub(n);
        self.index
    }

    /// Move the pointer forward `n` steps, clamped at the last entry.
    /// Returns the new index.
    pub fn redo(&mut self, n: usize) -> usize {
        self.index = (self.index + n).min(self.entries.len() - 1);
        self.index
    }

    /// Undo back to an exact earlier index; no-op when `target` is not
    /// strictly before the pointer. The multi-step "undo to here" entry
    /// point.
    pub fn undo_to_index(&mut self, target: usize) -> usize {
        if target < self.index {
            let steps = self.index - target;
            return self.undo(steps);
        }
        self.index
    }

    /// The context at the pointer.
    #[must_use]
    pub fn current(&self) -> &Arc<Context> {
        &self.entries[self.index]
    }

    /// Current pointer position.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: history holds at least the initial context.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All stored entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[Arc<Context>] {
        &self.entries
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(Context::initial())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ctx(label: &str) -> Context {
        Context::initial().adding(std::iter::empty(), label)
    }

    fn history_of(labels: &[&str]) -> History {
        let mut h = History::default();
        for label in labels {
            let _ = h.apply(ctx(label));
        }
        h
    }

    #[test]
    fn apply_moves_pointer_to_end() {
        let mut h = history_of(&["C1", "C2"]);
        assert_eq!(h.len(), 3);
        assert_eq!(h.index(), 2);
        assert_eq!(h.current().action(), "C2");
    }

    #[test]
    fn undo_and_redo_clamp() {
        let mut h = history_of(&["C1", "C2"]);
        assert_eq!(h.undo(10), 0);
        assert_eq!(h.redo(1), 1);
        assert_eq!(h.redo(10), 2);
    }

    #[test]
    fn apply_after_undo_truncates_redo_tail() {
        // [C0, C1, C2] idx=2 → undo → idx=1 → apply C3 → [C0, C1, C3] idx=2
        let mut h = history_of(&["C1", "C2"]);
        assert_eq!(h.undo(1), 1);

        let _ = h.apply(ctx("C3"));
        assert_eq!(h.len(), 3);
        assert_eq!(h.index(), 2);
        assert_eq!(h.current().action(), "C3");

        // The discarded branch is gone: redo is a no-op.
        assert_eq!(h.redo(1), 2);
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn undo_to_index_is_multi_step_undo() {
        let mut h = history_of(&["C1", "C2", "C3", "C4"]);
        assert_eq!(h.undo_to_index(1), 1);
        assert_eq!(h.current().action(), "C1");

        // Not strictly earlier: no-op.
        assert_eq!(h.undo_to_index(1), 1);
        assert_eq!(h.undo_to_index(3), 1);
    }

    #[test]
    fn undo_never_deletes_entries() {
        let mut h = history_of(&["C1", "C2", "C3"]);
        let _ = h.undo(3);
        assert_eq!(h.len(), 4);
        assert_eq!(h.redo(3), 3);
        assert_eq!(h.current().action(), "C3");
    }

    #[test]
    fn history_round_trips_through_serde() {
        let mut h = history_of(&["C1", "C2"]);
        let _ = h.undo(1);

        let json = serde_json::to_string(&h).unwrap();
        let back: History = serde_json::from_str(&json).unwrap();

        assert_eq!(back.len(), 3);
        assert_eq!(back.index(), 1);
        assert_eq!(back.current().action(), "C1");
    }

    proptest! {
        #[test]
        fn undo_law(len in 1usize..20, n in 0usize..40) {
            let labels: Vec<String> = (1..len).map(|i| format!("C{i}")).collect();
            let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
            let mut h = history_of(&refs);

            let before = h.index();
            let after = h.undo(n);
            prop_assert_eq!(after, before.saturating_sub(n));
            prop_assert_eq!(h.len(), len);
        }

        #[test]
        fn redo_law(len in 1usize..20, k in 0usize..40, n in 0usize..40) {
            let labels: Vec<String> = (1..len).map(|i| format!("C{i}")).collect();
            let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
            let mut h = history_of(&refs);

            let _ = h.undo(k);
            let before = h.index();
            let after = h.redo(n);
            prop_assert_eq!(after, (before + n).min(len - 1));
        }

        #[test]
        fn pointer_always_in_bounds(ops in proptest::collection::vec(0u8..3, 0..30)) {
            let mut h = history_of(&["C1", "C2", "C3"]);
            for (i, op) in ops.iter().enumerate() {
                match op {
                    0 => { let _ = h.apply(ctx(&format!("A{i}"))); }
                    1 => { let _ = h.undo(1); }
                    _ => { let _ = h.redo(1); }
                }
                prop_assert!(h.index() < h.len());
            }
        }
    }
}
