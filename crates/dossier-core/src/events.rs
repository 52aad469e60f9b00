//! Workspace events broadcast to observers.
//!
//! [`WorkspaceEvent`] is the single notification surface the core exposes
//! to its presentation layer: history changes (new entry, pointer move),
//! streamed output tokens, recoverable fragment removals, and orchestrator
//! busy/idle transitions. Events are fire-and-forget; a lagging or absent
//! observer never blocks the core.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// BaseEvent
// ─────────────────────────────────────────────────────────────────────────────

/// Fields common to every event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseEvent {
    /// ISO 8601 timestamp.
    pub timestamp: String,
}

impl BaseEvent {
    /// Create a base event stamped with the current UTC time.
    #[must_use]
    pub fn now() -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WorkspaceEvent
// ─────────────────────────────────────────────────────────────────────────────

/// How a finished action left the workspace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionDisposition {
    /// The action appended a new history entry.
    Applied,
    /// The action completed without producing a history entry.
    NoChange,
    /// The action was cancelled; history is untouched.
    Cancelled,
    /// The action failed and the failure was recorded as a history entry.
    Failed,
}

/// Events emitted by the orchestrator and history coordinator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkspaceEvent {
    /// An action was accepted and is now running (busy transition).
    ActionStarted {
        /// Common fields.
        base: BaseEvent,
        /// Human-readable action label.
        label: String,
    },

    /// The running action finished (idle transition).
    ActionFinished {
        /// Common fields.
        base: BaseEvent,
        /// Human-readable action label.
        label: String,
        /// How the action ended.
        disposition: ActionDisposition,
    },

    /// An incremental chunk of streamed LLM or command output.
    OutputToken {
        /// Common fields.
        base: BaseEvent,
        /// Output fragment.
        delta: String,
    },

    /// A new context was appended to history.
    HistoryAppended {
        /// Common fields.
        base: BaseEvent,
        /// Index of the new entry.
        index: usize,
        /// Action label of the new entry.
        label: String,
    },

    /// The history pointer moved without appending (undo/redo).
    HistoryMoved {
        /// Common fields.
        base: BaseEvent,
        /// New current index.
        index: usize,
    },

    /// A fragment whose content could not be read was removed from the
    /// produced context. Recoverable; the owning action still completes.
    FragmentDropped {
        /// Common fields.
        base: BaseEvent,
        /// Description of the removed fragment.
        description: String,
        /// Why it was removed.
        reason: String,
    },
}

impl WorkspaceEvent {
    /// Stable event-type string, matching the serde tag.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ActionStarted { .. } => "action_started",
            Self::ActionFinished { .. } => "action_finished",
            Self::OutputToken { .. } => "output_token",
            Self::HistoryAppended { .. } => "history_appended",
            Self::HistoryMoved { .. } => "history_moved",
            Self::FragmentDropped { .. } => "fragment_dropped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_matches_serde_tag() {
        let event = WorkspaceEvent::HistoryMoved {
            base: BaseEvent::now(),
            index: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.event_type());
        assert_eq!(json["index"], 3);
    }

    #[test]
    fn disposition_serializes_snake_case() {
        let json = serde_json::to_value(ActionDisposition::NoChange).unwrap();
        assert_eq!(json, "no_change");
    }
}
