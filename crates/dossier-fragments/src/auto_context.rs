//! The derived auto-context summary.
//!
//! [`AutoContext`] wraps a skeleton map computed from the current fragment
//! set by the relevance oracle. It has three process-wide sentinel states
//! represented as ordinary single-entry skeletons rather than `None` or an
//! error, so every consumer treats it uniformly:
//!
//! - [`AutoContext::empty`]: feature enabled, oracle found nothing
//! - [`AutoContext::disabled`]: feature turned off
//! - [`AutoContext::unavailable`]: oracle not ready yet
//!
//! Auto-context is never itself eligible to seed the next derivation;
//! that would make the summary recursively include itself.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use dossier_core::units::CodeUnit;

use crate::fragment::render_skeletons;

static EMPTY: LazyLock<AutoContext> =
    LazyLock::new(|| AutoContext::sentinel("Enabled, but no references found"));
static DISABLED: LazyLock<AutoContext> = LazyLock::new(|| AutoContext::sentinel("Disabled"));
static UNAVAILABLE: LazyLock<AutoContext> = LazyLock::new(|| AutoContext::sentinel("Unavailable"));

/// Relevance summary derived from the current fragment set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoContext {
    skeletons: BTreeMap<CodeUnit, String>,
}

impl AutoContext {
    /// Wrap a computed skeleton map.
    #[must_use]
    pub fn new(skeletons: BTreeMap<CodeUnit, String>) -> Self {
        Self { skeletons }
    }

    fn sentinel(label: &str) -> Self {
        Self {
            skeletons: BTreeMap::from([(CodeUnit::new(label), String::new())]),
        }
    }

    /// Sentinel: enabled, but the ranking came back empty.
    #[must_use]
    pub fn empty() -> &'static Self {
        &EMPTY
    }

    /// Sentinel: the feature is turned off.
    #[must_use]
    pub fn disabled() -> &'static Self {
        &DISABLED
    }

    /// Sentinel: the oracle has no completed snapshot yet.
    #[must_use]
    pub fn unavailable() -> &'static Self {
        &UNAVAILABLE
    }

    /// The wrapped skeleton map.
    #[must_use]
    pub fn skeletons(&self) -> &BTreeMap<CodeUnit, String> {
        &self.skeletons
    }

    fn joined_names(&self) -> String {
        let mut names: Vec<&str> = self.skeletons.keys().map(CodeUnit::name).collect();
        names.sort_unstable();
        names.join(", ")
    }

    /// Comma-separated short names, sorted, prefixed for the context table.
    #[must_use]
    pub fn description(&self) -> String {
        format!("[Auto] {}", self.joined_names())
    }

    /// Short description for history rows.
    #[must_use]
    pub fn short_description(&self) -> String {
        format!("Autosummary of {}", self.joined_names())
    }

    /// Rendered summary text, grouped by package.
    #[must_use]
    pub fn text(&self) -> String {
        render_skeletons(&self.skeletons)
    }

    /// Summary wrapped in the LLM-facing envelope.
    #[must_use]
    pub fn format(&self) -> String {
        let classes: Vec<&str> = self.skeletons.keys().map(CodeUnit::fq_name).collect();
        format!(
            "<summary classes=\"{}\">\n{}\n</summary>\n",
            classes.join(", "),
            self.text()
        )
    }

    /// The units summarized here.
    #[must_use]
    pub fn sources(&self) -> BTreeSet<CodeUnit> {
        self.skeletons.keys().cloned().collect()
    }

    /// Auto-context never seeds itself.
    #[must_use]
    pub const fn is_eligible_for_auto_context(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_are_stable_and_distinct() {
        assert_eq!(AutoContext::empty(), AutoContext::empty());
        assert_ne!(AutoContext::empty(), AutoContext::disabled());
        assert_ne!(AutoContext::disabled(), AutoContext::unavailable());
        // Stable identity: the same allocation every call.
        assert!(std::ptr::eq(AutoContext::empty(), AutoContext::empty()));
    }

    #[test]
    fn sentinels_are_never_eligible() {
        assert!(!AutoContext::empty().is_eligible_for_auto_context());
        assert!(!AutoContext::disabled().is_eligible_for_auto_context());
        assert!(!AutoContext::unavailable().is_eligible_for_auto_context());
    }

    #[test]
    fn description_lists_short_names() {
        let auto = AutoContext::new(BTreeMap::from([
            (CodeUnit::new("auth.Login"), "class Login".to_owned()),
            (CodeUnit::new("db.Pool"), "class Pool".to_owned()),
        ]));
        assert_eq!(auto.description(), "[Auto] Login, Pool");
        assert_eq!(auto.short_description(), "Autosummary of Login, Pool");
    }

    #[test]
    fn description_sorts_short_names() {
        let auto = AutoContext::new(BTreeMap::from([
            (CodeUnit::new("a.Zeta"), "class Zeta".to_owned()),
            (CodeUnit::new("b.Alpha"), "class Alpha".to_owned()),
        ]));
        assert_eq!(auto.description(), "[Auto] Alpha, Zeta");
        assert_eq!(auto.short_description(), "Autosummary of Alpha, Zeta");
    }

    #[test]
    fn disabled_sentinel_reads_uniformly() {
        let auto = AutoContext::disabled();
        assert_eq!(auto.description(), "[Auto] Disabled");
        assert_eq!(auto.sources().len(), 1);
    }
}
