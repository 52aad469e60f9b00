//! Orchestrator request and view types.

use std::collections::BTreeSet;
use std::sync::Arc;

use dossier_context::Context;
use dossier_core::files::{ExternalFile, RepoFile};

/// Configuration for the orchestrator.
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Whether auto-context derivation is enabled.
    pub auto_context_enabled: bool,
    /// Bound on the relevance ranking size.
    pub auto_context_top_k: usize,
    /// Broadcast buffer size for workspace events.
    pub event_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            auto_context_enabled: true,
            auto_context_top_k: 10,
            event_capacity: 256,
        }
    }
}

/// A context operation applied to specific fragments without the LLM.
#[derive(Clone, Debug, PartialEq)]
pub enum ContextOp {
    /// Add tracked files for editing.
    Edit {
        /// Files to add.
        files: Vec<RepoFile>,
    },
    /// Add files read-only, tracked or external.
    Read {
        /// Tracked files to add.
        repo: Vec<RepoFile>,
        /// External files to add.
        external: Vec<ExternalFile>,
    },
    /// Replace full file content with analyzer skeletons.
    Summarize {
        /// Files whose classes to summarize.
        files: Vec<RepoFile>,
    },
    /// Remove the fragments at the given positions.
    Drop {
        /// Positions in the current fragment list.
        positions: BTreeSet<usize>,
    },
    /// Format the fragments at the given positions for export;
    /// empty means all. Produces no history entry.
    Copy {
        /// Positions in the current fragment list.
        positions: BTreeSet<usize>,
    },
    /// Add pasted text with a deferred background summary.
    Paste {
        /// The pasted content.
        text: String,
    },
}

/// A user-driven action accepted by the orchestrator.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Ask the model to edit code.
    Code {
        /// Edit instructions.
        instructions: String,
    },
    /// Ask the model a question about the context.
    Ask {
        /// The question.
        question: String,
    },
    /// Search the codebase; the answer becomes a search fragment.
    Search {
        /// The query.
        query: String,
    },
    /// Run an external command and capture its output.
    RunCommand {
        /// Shell command line.
        command: String,
    },
    /// Capture the previous entry's parsed output as a fragment.
    CaptureOutput,
    /// Move the history pointer back.
    Undo {
        /// Steps, clamped at the first entry.
        steps: usize,
    },
    /// Move the history pointer forward.
    Redo {
        /// Steps, clamped at the last entry.
        steps: usize,
    },
    /// Undo to an exact earlier entry ("undo to here").
    UndoTo {
        /// Target index.
        index: usize,
    },
    /// Apply a context operation to specific fragments.
    ContextOp(ContextOp),
}

impl Action {
    /// Human-readable label, used for history entries and events.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Code { instructions } => format!("Code: {instructions}"),
            Self::Ask { question } => format!("Ask: {question}"),
            Self::Search { query } => format!("Search: {query}"),
            Self::RunCommand { command } => format!("Run: {command}"),
            Self::CaptureOutput => "Capture output".to_owned(),
            Self::Undo { steps } => {
                if *steps == 1 {
                    "Undo".to_owned()
                } else {
                    format!("Undo {steps} steps")
                }
            }
            Self::Redo { steps } => {
                if *steps == 1 {
                    "Redo".to_owned()
                } else {
                    format!("Redo {steps} steps")
                }
            }
            Self::UndoTo { index } => format!("Undo to entry {index}"),
            Self::ContextOp(op) => match op {
                ContextOp::Edit { files } => format!("Edit {}", join_files(files)),
                ContextOp::Read { repo, external } => {
                    let mut names: Vec<String> = repo.iter().map(ToString::to_string).collect();
                    names.extend(external.iter().map(ToString::to_string));
                    format!("Read {}", names.join(", "))
                }
                ContextOp::Summarize { files } => format!("Summarize {}", join_files(files)),
                ContextOp::Drop { positions } => format!("Dropped {} fragments", positions.len()),
                ContextOp::Copy { .. } => "Copy".to_owned(),
                ContextOp::Paste { .. } => "Paste".to_owned(),
            },
        }
    }

    /// Whether this action only moves the history pointer.
    #[must_use]
    pub const fn is_pointer_move(&self) -> bool {
        matches!(
            self,
            Self::Undo { .. } | Self::Redo { .. } | Self::UndoTo { .. }
        )
    }
}

fn join_files(files: &[RepoFile]) -> String {
    files
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read-only view of history published after every mutation.
#[derive(Clone, Debug)]
pub struct HistoryView {
    /// All entries, oldest first.
    pub entries: Vec<Arc<Context>>,
    /// Current pointer position.
    pub index: usize,
}

impl HistoryView {
    /// The context at the pointer.
    #[must_use]
    pub fn current(&self) -> &Arc<Context> {
        &self.entries[self.index]
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; history holds at least the initial context.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_action_kind() {
        assert_eq!(
            Action::Code {
                instructions: "fix the test".into()
            }
            .label(),
            "Code: fix the test"
        );
        assert_eq!(Action::Undo { steps: 1 }.label(), "Undo");
        assert_eq!(Action::Undo { steps: 3 }.label(), "Undo 3 steps");
        assert_eq!(
            Action::ContextOp(ContextOp::Drop {
                positions: BTreeSet::from([0, 2])
            })
            .label(),
            "Dropped 2 fragments"
        );
    }

    #[test]
    fn pointer_moves_are_classified() {
        assert!(Action::Undo { steps: 1 }.is_pointer_move());
        assert!(Action::UndoTo { index: 0 }.is_pointer_move());
        assert!(!Action::CaptureOutput.is_pointer_move());
    }
}
