//! Auto-context derivation.
//!
//! Recomputed from scratch whenever the seed fragment set changes: collect
//! the sources of every auto-eligible fragment, ask the relevance oracle
//! for a bounded top-K ranking seeded by those units, and wrap the result.
//! No incremental maintenance, so there is no stale cache to invalidate.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use dossier_core::analyzer::{AnalyzerCell, Repository};
use dossier_fragments::{AutoContext, Fragment};

/// Derive the auto-context for the given fragment set.
///
/// Sentinel fallbacks, in order: `disabled` when the feature is off,
/// `unavailable` when the cell holds no completed analyzer snapshot,
/// `empty` when the ranking comes back with nothing.
#[must_use]
pub fn derive(
    cell: &AnalyzerCell,
    repo: &dyn Repository,
    fragments: &[Arc<Fragment>],
    enabled: bool,
    top_k: usize,
) -> AutoContext {
    if !enabled {
        return AutoContext::disabled().clone();
    }

    let Ok(analyzer) = cell.current() else {
        return AutoContext::unavailable().clone();
    };

    let seed: BTreeSet<_> = fragments
        .iter()
        .filter(|f| f.is_eligible_for_auto_context())
        .flat_map(|f| f.sources(analyzer.as_ref(), repo))
        .collect();

    let ranked = analyzer.relevance_ranking(&seed, top_k);
    debug!(seed = seed.len(), ranked = ranked.len(), "derived auto-context");

    if ranked.is_empty() {
        return AutoContext::empty().clone();
    }

    AutoContext::new(ranked.into_iter().collect::<BTreeMap<_, _>>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_core::analyzer::Analyzer;
    use dossier_core::files::RepoFile;
    use dossier_core::units::CodeUnit;

    struct RankingAnalyzer;

    impl Analyzer for RankingAnalyzer {
        fn classes_in_file(&self, _file: &RepoFile) -> BTreeSet<CodeUnit> {
            BTreeSet::from([CodeUnit::new("auth.Login")])
        }
        fn relevance_ranking(&self, seed: &BTreeSet<CodeUnit>, k: usize) -> Vec<(CodeUnit, String)> {
            seed.iter()
                .take(k)
                .map(|u| (CodeUnit::new(format!("{u}.Caller")), "skeleton".to_owned()))
                .collect()
        }
        fn skeleton(&self, _unit: &CodeUnit) -> Option<String> {
            None
        }
    }

    struct EmptyRepo;

    impl Repository for EmptyRepo {
        fn tracked_files(&self) -> BTreeSet<RepoFile> {
            BTreeSet::new()
        }
    }

    fn eligible_fragment() -> Arc<Fragment> {
        Arc::new(Fragment::repo_path(RepoFile::new("/p", "src/auth.rs")))
    }

    #[test]
    fn disabled_wins_over_everything() {
        let cell = AnalyzerCell::with_snapshot(Arc::new(RankingAnalyzer));
        let auto = derive(&cell, &EmptyRepo, &[eligible_fragment()], false, 10);
        assert_eq!(&auto, AutoContext::disabled());
    }

    #[test]
    fn unavailable_when_cell_is_empty() {
        let cell = AnalyzerCell::new();
        let auto = derive(&cell, &EmptyRepo, &[eligible_fragment()], true, 10);
        assert_eq!(&auto, AutoContext::unavailable());
    }

    #[test]
    fn empty_when_ranking_finds_nothing() {
        let cell = AnalyzerCell::with_snapshot(Arc::new(RankingAnalyzer));
        // No fragments → empty seed → empty ranking.
        let auto = derive(&cell, &EmptyRepo, &[], true, 10);
        assert_eq!(&auto, AutoContext::empty());
    }

    #[test]
    fn ranking_populates_the_summary() {
        let cell = AnalyzerCell::with_snapshot(Arc::new(RankingAnalyzer));
        let auto = derive(&cell, &EmptyRepo, &[eligible_fragment()], true, 10);
        assert_eq!(auto.skeletons().len(), 1);
        assert!(auto
            .skeletons()
            .contains_key(&CodeUnit::new("auth.Login.Caller")));
    }

    #[test]
    fn ineligible_fragments_do_not_seed() {
        let cell = AnalyzerCell::with_snapshot(Arc::new(RankingAnalyzer));
        let skeleton = Arc::new(Fragment::Skeleton {
            skeletons: BTreeMap::from([(CodeUnit::new("db.Pool"), String::new())]),
        });
        let auto = derive(&cell, &EmptyRepo, &[skeleton], true, 10);
        assert_eq!(&auto, AutoContext::empty());
    }
}
