//! The fragment taxonomy.
//!
//! [`Fragment`] is a closed tagged union, one case per kind of content the
//! assistant can hold in its working context. Every case is immutable after
//! construction; content updates always build a new fragment.
//!
//! Capability surface:
//!
//! - `short_description` / `description`: pure display strings
//! - `text`: raw content, fallible only for file-backed cases
//! - `format`: `text` wrapped in the fixed LLM-facing envelope
//! - `sources`: code units this fragment refers to, resolved through the
//!   analyzer/repository oracles (pure, never errors, empty when unknown)
//! - `is_eligible_for_auto_context`: static per-variant

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use dossier_core::analyzer::{Analyzer, Repository};
use dossier_core::errors::ContentError;
use dossier_core::files::{ExternalFile, RepoFile};
use dossier_core::units::CodeUnit;

use crate::paste::PasteDescription;

// ─────────────────────────────────────────────────────────────────────────────
// Chat messages (for ConversationFragment)
// ─────────────────────────────────────────────────────────────────────────────

/// Role of a prior chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Message written by the user.
    User,
    /// Message produced by the model.
    Assistant,
    /// System instruction.
    System,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
            Self::System => f.write_str("system"),
        }
    }
}

/// One prior chat message carried by a conversation fragment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who said it.
    pub role: ChatRole,
    /// What was said.
    pub content: String,
}

impl ChatMessage {
    /// Convenience constructor.
    #[must_use]
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fragment
// ─────────────────────────────────────────────────────────────────────────────

/// One unit of content in a working context.
///
/// The discriminant tag and per-variant fields are the persisted fragment
/// schema; see each variant for its wire shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fragment {
    /// A tracked project file.
    RepoPath {
        /// Backing file.
        file: RepoFile,
    },

    /// A file outside the project.
    ExternalPath {
        /// Backing file.
        file: ExternalFile,
    },

    /// A literal string with a caller-supplied description.
    Text {
        /// The content.
        text: String,
        /// Display description.
        description: String,
    },

    /// The explained result of a codebase search.
    Search {
        /// The query that produced it.
        query: String,
        /// Explanation text returned by the search.
        explanation: String,
        /// Source units named by the search, fixed at creation.
        sources: BTreeSet<CodeUnit>,
    },

    /// Externally pasted text with a deferred summary.
    Paste {
        /// The pasted content.
        text: String,
        /// Two-phase description; see [`PasteDescription`].
        description: PasteDescription,
    },

    /// A parsed stack trace plus the project method bodies it crosses.
    Stacktrace {
        /// Units extracted from the trace, fixed at creation.
        sources: BTreeSet<CodeUnit>,
        /// The original trace text.
        original: String,
        /// The exception name, for display.
        exception: String,
        /// Extracted method bodies.
        code: String,
    },

    /// The result of a usage search for one identifier.
    Usage {
        /// The identifier that was searched.
        target: String,
        /// Units containing the usages, fixed at creation.
        sources: BTreeSet<CodeUnit>,
        /// Concatenated usage code.
        code: String,
    },

    /// Summaries of code units, keyed by unit.
    Skeleton {
        /// Unit → rendered summary text.
        skeletons: BTreeMap<CodeUnit, String>,
    },

    /// Prior chat messages captured as context.
    Conversation {
        /// The messages, oldest first.
        messages: Vec<ChatMessage>,
    },
}

impl Fragment {
    /// Build the appropriate path fragment for a file reference.
    #[must_use]
    pub fn repo_path(file: RepoFile) -> Self {
        Self::RepoPath { file }
    }

    /// Build an external path fragment.
    #[must_use]
    pub fn external_path(file: ExternalFile) -> Self {
        Self::ExternalPath { file }
    }

    /// Longer description shown in the context table.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::RepoPath { file } => {
                let parent = file.parent();
                if parent.is_empty() {
                    file.file_name()
                } else {
                    format!("{} [{parent}]", file.file_name())
                }
            }
            Self::ExternalPath { file } => file.to_string(),
            Self::Text { description, .. } => description.clone(),
            Self::Search { query, .. } => format!("Search: {query}"),
            Self::Paste { description, .. } => description.display(),
            Self::Stacktrace { exception, .. } => format!("stacktrace of {exception}"),
            Self::Usage { target, .. } => format!("Uses of {target}"),
            Self::Skeleton { skeletons } => {
                let mut names: Vec<&str> = skeletons.keys().map(CodeUnit::name).collect();
                names.sort_unstable();
                format!("Summary of {}", names.join(", "))
            }
            Self::Conversation { messages } => {
                format!("Conversation history ({} messages)", messages.len())
            }
        }
    }

    /// Short description shown in history rows.
    ///
    /// Path fragments use the bare file name; virtual fragments lowercase
    /// the first character of their description.
    #[must_use]
    pub fn short_description(&self) -> String {
        match self {
            Self::RepoPath { file } => file.file_name(),
            Self::ExternalPath { .. } => self.description(),
            _ => decapitalize(&self.description()),
        }
    }

    /// Raw content.
    ///
    /// Fails with [`ContentError::Unavailable`] when a backing file cannot
    /// be read; callers recover per-fragment without aborting the whole
    /// context.
    pub fn text(&self) -> Result<String, ContentError> {
        match self {
            Self::RepoPath { file } => file.read(),
            Self::ExternalPath { file } => file.read(),
            Self::Text { text, .. } | Self::Paste { text, .. } => Ok(text.clone()),
            Self::Search { explanation, .. } => Ok(explanation.clone()),
            Self::Stacktrace { original, code, .. } => Ok(format!(
                "{original}\n\nStacktrace methods in this project:\n\n{code}"
            )),
            Self::Usage { code, .. } => Ok(code.clone()),
            Self::Skeleton { skeletons } => Ok(render_skeletons(skeletons)),
            Self::Conversation { messages } => Ok(messages
                .iter()
                .map(|m| format!("{}: {}", m.role, m.content))
                .collect::<Vec<_>>()
                .join("\n\n")),
        }
    }

    /// Content wrapped in the fixed LLM-facing envelope, carrying the
    /// description as metadata. A pure string-template operation.
    pub fn format(&self) -> Result<String, ContentError> {
        let body = self.text()?;
        Ok(match self {
            Self::RepoPath { file } => format!("<file path=\"{file}\">\n{body}\n</file>\n"),
            Self::ExternalPath { file } => {
                format!("<file path=\"{file}\">\n{body}\n</file>\n")
            }
            Self::Skeleton { skeletons } => {
                let classes: Vec<&str> = skeletons.keys().map(CodeUnit::fq_name).collect();
                format!(
                    "<summary classes=\"{}\">\n{body}\n</summary>\n",
                    classes.join(", ")
                )
            }
            Self::Conversation { .. } => format!("<conversation>\n{body}\n</conversation>\n"),
            _ => format!(
                "<fragment description=\"{}\">\n{body}\n</fragment>\n",
                self.description()
            ),
        })
    }

    /// Code units this fragment refers to.
    ///
    /// File-backed fragments delegate to the analyzer; text-bearing virtual
    /// fragments recompute by matching tracked-file paths against their
    /// content; the rest carry an explicit set fixed at construction.
    /// Pure with respect to both oracles; never errors, empty when unknown.
    #[must_use]
    pub fn sources(&self, analyzer: &dyn Analyzer, repo: &dyn Repository) -> BTreeSet<CodeUnit> {
        match self {
            Self::RepoPath { file } => analyzer.classes_in_file(file),
            Self::ExternalPath { .. } | Self::Conversation { .. } => BTreeSet::new(),
            Self::Text { text, .. } | Self::Paste { text, .. } => {
                units_mentioned_in(text, analyzer, repo)
            }
            Self::Search { sources, .. }
            | Self::Stacktrace { sources, .. }
            | Self::Usage { sources, .. } => sources.clone(),
            Self::Skeleton { skeletons } => skeletons.keys().cloned().collect(),
        }
    }

    /// Whether units found in this fragment seed the auto-context.
    /// Static per variant, never computed from content.
    #[must_use]
    pub const fn is_eligible_for_auto_context(&self) -> bool {
        match self {
            Self::RepoPath { .. }
            | Self::Text { .. }
            | Self::Search { .. }
            | Self::Paste { .. }
            | Self::Stacktrace { .. }
            | Self::Usage { .. } => true,
            Self::ExternalPath { .. } | Self::Skeleton { .. } | Self::Conversation { .. } => false,
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RepoPath { .. } => "RepoPathFragment",
            Self::ExternalPath { .. } => "ExternalPathFragment",
            Self::Text { .. } => "TextFragment",
            Self::Search { .. } => "SearchFragment",
            Self::Paste { .. } => "PasteFragment",
            Self::Stacktrace { .. } => "StacktraceFragment",
            Self::Usage { .. } => "UsageFragment",
            Self::Skeleton { .. } => "SkeletonFragment",
            Self::Conversation { .. } => "ConversationFragment",
        };
        write!(f, "{name}('{}')", self.description())
    }
}

/// Tracked files whose path appears verbatim in `text`, expanded to the
/// classes the analyzer declares in them. This is how text-bearing virtual
/// fragments (and search results) resolve their sources.
pub fn units_mentioned_in(
    text: &str,
    analyzer: &dyn Analyzer,
    repo: &dyn Repository,
) -> BTreeSet<CodeUnit> {
    repo.tracked_files()
        .iter()
        .filter(|f| text.contains(&f.to_string()))
        .flat_map(|f| analyzer.classes_in_file(f))
        .collect()
}

/// Render a skeleton map grouped by package, packages sorted, preserving
/// unit order within each package.
pub(crate) fn render_skeletons(skeletons: &BTreeMap<CodeUnit, String>) -> String {
    let mut by_package: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for (unit, skeleton) in skeletons {
        let package = unit
            .package()
            .map_or_else(|| "(default package)".to_owned(), str::to_owned);
        by_package.entry(package).or_default().push(skeleton);
    }

    by_package
        .iter()
        .map(|(package, entries)| format!("package {package};\n\n{}", entries.join("\n\n")))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    struct MapAnalyzer {
        by_file: BTreeMap<String, BTreeSet<CodeUnit>>,
    }

    impl Analyzer for MapAnalyzer {
        fn classes_in_file(&self, file: &RepoFile) -> BTreeSet<CodeUnit> {
            self.by_file
                .get(&file.to_string())
                .cloned()
                .unwrap_or_default()
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

    struct FixedRepo {
        files: BTreeSet<RepoFile>,
    }

    impl Repository for FixedRepo {
        fn tracked_files(&self) -> BTreeSet<RepoFile> {
            self.files.clone()
        }
    }

    fn oracles() -> (MapAnalyzer, FixedRepo) {
        let auth = RepoFile::new("/proj", "src/auth.rs");
        let db = RepoFile::new("/proj", "src/db.rs");
        let mut by_file = BTreeMap::new();
        let _ = by_file.insert(
            "src/auth.rs".to_owned(),
            BTreeSet::from([CodeUnit::new("auth.Login"), CodeUnit::new("auth.Token")]),
        );
        let _ = by_file.insert(
            "src/db.rs".to_owned(),
            BTreeSet::from([CodeUnit::new("db.Pool")]),
        );
        (
            MapAnalyzer { by_file },
            FixedRepo {
                files: BTreeSet::from([auth, db]),
            },
        )
    }

    #[test]
    fn repo_path_descriptions() {
        let frag = Fragment::repo_path(RepoFile::new("/proj", "src/auth.rs"));
        assert_eq!(frag.description(), "auth.rs [src]");
        assert_eq!(frag.short_description(), "auth.rs");

        let top = Fragment::repo_path(RepoFile::new("/proj", "README.md"));
        assert_eq!(top.description(), "README.md");
    }

    #[test]
    fn repo_path_sources_come_from_analyzer() {
        let (analyzer, repo) = oracles();
        let frag = Fragment::repo_path(RepoFile::new("/proj", "src/auth.rs"));
        let sources = frag.sources(&analyzer, &repo);
        assert_eq!(sources.len(), 2);
        assert!(sources.contains(&CodeUnit::new("auth.Login")));
    }

    #[test]
    fn external_path_has_no_sources_and_is_not_eligible() {
        let (analyzer, repo) = oracles();
        let frag = Fragment::external_path(ExternalFile::new("/var/log/app.log"));
        assert!(frag.sources(&analyzer, &repo).is_empty());
        assert!(!frag.is_eligible_for_auto_context());
    }

    #[test]
    fn text_fragment_resolves_mentioned_paths() {
        let (analyzer, repo) = oracles();
        let frag = Fragment::Text {
            text: "the bug is in src/auth.rs near the token check".to_owned(),
            description: "Bug report".to_owned(),
        };
        let sources = frag.sources(&analyzer, &repo);
        assert_eq!(sources.len(), 2);
        assert!(sources.contains(&CodeUnit::new("auth.Token")));
    }

    #[test]
    fn sources_are_pure_given_fixed_oracles() {
        let (analyzer, repo) = oracles();
        let frag = Fragment::Text {
            text: "see src/auth.rs and src/db.rs".to_owned(),
            description: "Note".to_owned(),
        };
        let first = frag.sources(&analyzer, &repo);
        let second = frag.sources(&analyzer, &repo);
        assert_eq!(first, second);
    }

    #[test]
    fn virtual_short_description_is_decapitalized() {
        let frag = Fragment::Search {
            query: "retry logic".to_owned(),
            explanation: "...".to_owned(),
            sources: BTreeSet::new(),
        };
        assert_eq!(frag.description(), "Search: retry logic");
        assert_eq!(frag.short_description(), "search: retry logic");
    }

    #[test]
    fn stacktrace_text_appends_extracted_methods() {
        let frag = Fragment::Stacktrace {
            sources: BTreeSet::new(),
            original: "NullPointerException\n  at auth.Login.check".to_owned(),
            exception: "NullPointerException".to_owned(),
            code: "fn check() { ... }".to_owned(),
        };
        let text = frag.text().unwrap();
        assert!(text.starts_with("NullPointerException"));
        assert!(text.contains("Stacktrace methods in this project:"));
        assert!(text.ends_with("fn check() { ... }"));
        assert_eq!(frag.description(), "stacktrace of NullPointerException");
    }

    #[test]
    fn skeleton_text_groups_by_package() {
        let skeletons = BTreeMap::from([
            (CodeUnit::new("auth.Login"), "class Login".to_owned()),
            (CodeUnit::new("auth.Token"), "class Token".to_owned()),
            (CodeUnit::new("db.Pool"), "class Pool".to_owned()),
        ]);
        let frag = Fragment::Skeleton { skeletons };
        let text = frag.text().unwrap();
        assert_eq!(
            text,
            "package auth;\n\nclass Login\n\nclass Token\n\npackage db;\n\nclass Pool"
        );
        assert_eq!(frag.description(), "Summary of Login, Pool, Token");
        assert!(!frag.is_eligible_for_auto_context());
    }

    #[test]
    fn skeleton_description_sorts_short_names() {
        // Map order is by fq name (a.Zeta before b.Alpha); the display
        // string orders by short name.
        let skeletons = BTreeMap::from([
            (CodeUnit::new("a.Zeta"), "class Zeta".to_owned()),
            (CodeUnit::new("b.Alpha"), "class Alpha".to_owned()),
        ]);
        let frag = Fragment::Skeleton { skeletons };
        assert_eq!(frag.description(), "Summary of Alpha, Zeta");
    }

    #[test]
    fn conversation_text_is_role_prefixed() {
        let frag = Fragment::Conversation {
            messages: vec![
                ChatMessage::new(ChatRole::User, "why does login fail?"),
                ChatMessage::new(ChatRole::Assistant, "the token expired"),
            ],
        };
        assert_eq!(
            frag.text().unwrap(),
            "user: why does login fail?\n\nassistant: the token expired"
        );
        assert_eq!(frag.description(), "Conversation history (2 messages)");
        assert!(!frag.is_eligible_for_auto_context());
    }

    #[test]
    fn format_wraps_file_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        let frag = Fragment::repo_path(RepoFile::new(dir.path(), "main.rs"));
        assert_eq!(
            frag.format().unwrap(),
            "<file path=\"main.rs\">\nfn main() {}\n</file>\n"
        );
    }

    #[test]
    fn format_wraps_virtual_content_with_description() {
        let frag = Fragment::Text {
            text: "body".to_owned(),
            description: "A note".to_owned(),
        };
        assert_eq!(
            frag.format().unwrap(),
            "<fragment description=\"A note\">\nbody\n</fragment>\n"
        );
    }

    #[test]
    fn unreadable_file_text_fails_with_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let frag = Fragment::repo_path(RepoFile::new(dir.path(), "deleted.rs"));
        assert_matches!(frag.text(), Err(ContentError::Unavailable { .. }));
        assert_matches!(frag.format(), Err(ContentError::Unavailable { .. }));
    }

    #[test]
    fn persisted_schema_round_trips() {
        let frag = Fragment::Usage {
            target: "Pool.get".to_owned(),
            sources: BTreeSet::from([CodeUnit::new("db.Pool")]),
            code: "let conn = pool.get();".to_owned(),
        };
        let json = serde_json::to_value(&frag).unwrap();
        assert_eq!(json["type"], "usage");
        let back: Fragment = serde_json::from_value(json).unwrap();
        assert_eq!(back, frag);
    }
}
