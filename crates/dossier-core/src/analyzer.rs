//! Analyzer and repository oracle traits, plus the non-blocking cell that
//! holds the latest completed analyzer snapshot.
//!
//! The static-analysis engine is an external collaborator: the core only
//! consumes its results. [`Analyzer`] is the single seam through which
//! code-relationship knowledge enters; [`Repository`] supplies the tracked
//! file list. Both are read-mostly snapshots the core never mutates.
//!
//! Rebuilds happen in the background: a rebuild computes a fresh snapshot
//! off to the side and [`AnalyzerCell::install`]s it under a short write
//! lock. Readers always get the last complete snapshot (or an explicit
//! not-ready signal) without waiting on reindexing.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::errors::AnalyzerError;
use crate::files::RepoFile;
use crate::units::CodeUnit;

/// Static-analysis oracle consumed by the core.
///
/// Implementations must be safe to query from any thread and must not be
/// mutated by queries.
pub trait Analyzer: Send + Sync {
    /// Classes declared in the given tracked file. Empty when unknown.
    fn classes_in_file(&self, file: &RepoFile) -> BTreeSet<CodeUnit>;

    /// Relevance ranking seeded by the given units: a bounded top-`k`
    /// list of `(unit, rendered skeleton text)`, most relevant first.
    fn relevance_ranking(&self, seed: &BTreeSet<CodeUnit>, k: usize) -> Vec<(CodeUnit, String)>;

    /// Rendered skeleton for a single unit, if the analyzer knows it.
    fn skeleton(&self, unit: &CodeUnit) -> Option<String>;
}

/// Version-control oracle consumed by the core.
pub trait Repository: Send + Sync {
    /// The set of files tracked by the project.
    fn tracked_files(&self) -> BTreeSet<RepoFile>;
}

/// Readiness of the analyzer cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalyzerStatus {
    /// A completed snapshot is installed and current.
    Ready,
    /// A snapshot is installed but a rebuild is in progress.
    Rebuilding,
    /// No snapshot has ever been installed.
    Unavailable,
}

struct CellState {
    snapshot: Option<Arc<dyn Analyzer>>,
    rebuilding: bool,
}

/// Holder of the latest completed analyzer snapshot.
///
/// Readers never wait on a rebuild: [`AnalyzerCell::current`] returns the
/// last installed snapshot or [`AnalyzerError::Unavailable`]. The lock is
/// held only for pointer swaps, never across analysis work.
pub struct AnalyzerCell {
    state: RwLock<CellState>,
}

impl AnalyzerCell {
    /// Create an empty cell (status `Unavailable`).
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CellState {
                snapshot: None,
                rebuilding: false,
            }),
        }
    }

    /// Create a cell pre-loaded with a snapshot (status `Ready`).
    #[must_use]
    pub fn with_snapshot(snapshot: Arc<dyn Analyzer>) -> Self {
        Self {
            state: RwLock::new(CellState {
                snapshot: Some(snapshot),
                rebuilding: false,
            }),
        }
    }

    /// Current readiness.
    #[must_use]
    pub fn status(&self) -> AnalyzerStatus {
        let state = self.state.read();
        match (&state.snapshot, state.rebuilding) {
            (None, _) => AnalyzerStatus::Unavailable,
            (Some(_), true) => AnalyzerStatus::Rebuilding,
            (Some(_), false) => AnalyzerStatus::Ready,
        }
    }

    /// The latest completed snapshot, without waiting on any rebuild.
    pub fn current(&self) -> Result<Arc<dyn Analyzer>, AnalyzerError> {
        self.state
            .read()
            .snapshot
            .clone()
            .ok_or(AnalyzerError::Unavailable)
    }

    /// Mark a background rebuild as started. The previous snapshot (if
    /// any) stays readable throughout.
    pub fn begin_rebuild(&self) {
        self.state.write().rebuilding = true;
    }

    /// Install a freshly completed snapshot and clear the rebuild flag.
    pub fn install(&self, snapshot: Arc<dyn Analyzer>) {
        let mut state = self.state.write();
        state.snapshot = Some(snapshot);
        state.rebuilding = false;
    }
}

impl Default for AnalyzerCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    impl std::fmt::Debug for dyn Analyzer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("dyn Analyzer")
        }
    }

    struct FixedAnalyzer;

    impl Analyzer for FixedAnalyzer {
        fn classes_in_file(&self, _file: &RepoFile) -> BTreeSet<CodeUnit> {
            BTreeSet::new()
        }
        fn relevance_ranking(
            &self,
            _seed: &BTreeSet<CodeUnit>,
            _k: usize,
        ) -> Vec<(CodeUnit, String)> {
            Vec::new()
        }
        fn skeleton(&self, _unit: &CodeUnit) -> Option<String> {
            None
        }
    }

    #[test]
    fn empty_cell_is_unavailable() {
        let cell = AnalyzerCell::new();
        assert_eq!(cell.status(), AnalyzerStatus::Unavailable);
        assert_matches!(cell.current(), Err(AnalyzerError::Unavailable));
    }

    #[test]
    fn rebuild_keeps_previous_snapshot_readable() {
        let cell = AnalyzerCell::with_snapshot(Arc::new(FixedAnalyzer));
        assert_eq!(cell.status(), AnalyzerStatus::Ready);

        cell.begin_rebuild();
        assert_eq!(cell.status(), AnalyzerStatus::Rebuilding);
        assert!(cell.current().is_ok(), "stale snapshot must stay readable");

        cell.install(Arc::new(FixedAnalyzer));
        assert_eq!(cell.status(), AnalyzerStatus::Ready);
    }

    #[test]
    fn rebuild_before_first_install_is_still_unavailable() {
        let cell = AnalyzerCell::new();
        cell.begin_rebuild();
        assert_eq!(cell.status(), AnalyzerStatus::Unavailable);
        assert_matches!(cell.current(), Err(AnalyzerError::Unavailable));
    }
}
