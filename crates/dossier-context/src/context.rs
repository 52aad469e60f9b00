//! Immutable context snapshots.
//!
//! A [`Context`] is one entry in history: the ordered fragment list, the
//! derived auto-context, optional parsed LLM output, and the label of the
//! action that produced it. A context is never mutated after construction;
//! every transition builds a new context from the prior one's fragment
//! list plus or minus deltas. Fragments are shared by reference across
//! snapshots, so a long history stays cheap.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dossier_fragments::{AutoContext, Fragment};

// ─────────────────────────────────────────────────────────────────────────────
// ParsedOutput
// ─────────────────────────────────────────────────────────────────────────────

/// Rendering style for parsed LLM output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStyle {
    /// Source code (edit actions).
    Code,
    /// Markdown prose (ask/search actions).
    Markdown,
    /// Unstyled text (command output, failures).
    Plain,
}

/// Parsed output attached to a context by an LLM or command action.
///
/// Carries the response text, its rendering style, a derived fragment that
/// lets a later action capture the output into the working set, and
/// whether the producing action failed. Failures are recorded here rather
/// than swallowed, so they stay visible and undoable like any other step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedOutput {
    /// Response or command output text.
    pub text: String,
    /// How to render it.
    pub style: OutputStyle,
    /// The output captured as a reusable fragment.
    pub fragment: Arc<Fragment>,
    /// Whether the producing action signalled failure.
    pub failed: bool,
}

impl ParsedOutput {
    /// Successful output, captured under the given description.
    #[must_use]
    pub fn new(description: impl Into<String>, text: impl Into<String>, style: OutputStyle) -> Self {
        let text = text.into();
        Self {
            fragment: Arc::new(Fragment::Text {
                text: text.clone(),
                description: description.into(),
            }),
            text,
            style,
            failed: false,
        }
    }

    /// Failed output: the error message becomes the recorded text.
    #[must_use]
    pub fn failed(description: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            fragment: Arc::new(Fragment::Text {
                text: error.clone(),
                description: description.into(),
            }),
            text: error,
            style: OutputStyle::Plain,
            failed: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// An immutable snapshot of the working context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Context {
    id: Uuid,
    created_at: DateTime<Utc>,
    fragments: Vec<Arc<Fragment>>,
    auto_context: AutoContext,
    parsed_output: Option<ParsedOutput>,
    action: String,
}

impl Context {
    /// The empty starting context for a fresh session.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            id: Uuid::now_v7(),
            created_at: Utc::now(),
            fragments: Vec::new(),
            auto_context: AutoContext::unavailable().clone(),
            parsed_output: None,
            action: "Session start".to_owned(),
        }
    }

    fn successor(&self, action: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            created_at: Utc::now(),
            fragments: self.fragments.clone(),
            auto_context: self.auto_context.clone(),
            parsed_output: None,
            action,
        }
    }

    /// New context with fragments appended, in the given order.
    #[must_use]
    pub fn adding(
        &self,
        fragments: impl IntoIterator<Item = Arc<Fragment>>,
        action: impl Into<String>,
    ) -> Self {
        let mut next = self.successor(action.into());
        next.fragments.extend(fragments);
        next
    }

    /// New context with the fragments at the given positions removed.
    #[must_use]
    pub fn removing(&self, indices: &BTreeSet<usize>, action: impl Into<String>) -> Self {
        let mut next = self.successor(action.into());
        next.fragments = self
            .fragments
            .iter()
            .enumerate()
            .filter(|(i, _)| !indices.contains(i))
            .map(|(_, f)| Arc::clone(f))
            .collect();
        next
    }

    /// New context carrying parsed LLM/command output.
    #[must_use]
    pub fn with_parsed_output(&self, output: ParsedOutput, action: impl Into<String>) -> Self {
        let mut next = self.successor(action.into());
        next.parsed_output = Some(output);
        next
    }

    /// Same snapshot with a freshly derived auto-context.
    #[must_use]
    pub fn with_auto_context(mut self, auto_context: AutoContext) -> Self {
        self.auto_context = auto_context;
        self
    }

    /// Split off fragments whose text can no longer be produced.
    ///
    /// Returns the surviving context (identical when nothing was dropped)
    /// and the dropped fragments so the caller can surface each removal as
    /// a recoverable event.
    #[must_use]
    pub fn pruning_unreadable(&self) -> (Self, Vec<Arc<Fragment>>) {
        let (readable, dropped): (Vec<_>, Vec<_>) = self
            .fragments
            .iter()
            .cloned()
            .partition(|f| f.text().is_ok());

        if dropped.is_empty() {
            return (self.clone(), dropped);
        }

        let mut next = self.clone();
        next.fragments = readable;
        (next, dropped)
    }

    /// Unique id of this snapshot.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When this snapshot was produced.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The ordered fragment list.
    #[must_use]
    pub fn fragments(&self) -> &[Arc<Fragment>] {
        &self.fragments
    }

    /// The derived relevance summary.
    #[must_use]
    pub fn auto_context(&self) -> &AutoContext {
        &self.auto_context
    }

    /// Parsed output, when an LLM or command action produced this entry.
    #[must_use]
    pub fn parsed_output(&self) -> Option<&ParsedOutput> {
        self.parsed_output.as_ref()
    }

    /// Label of the action that produced this entry.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }
}
