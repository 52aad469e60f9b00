//! Two-phase deferred description for pasted content.
//!
//! Summarizing a pasted blob is an LLM call that must never block the
//! caller. [`PasteDescription`] models that as an explicit two-phase
//! state: `Pending` wraps a write-once cell a background summarizer fills
//! in; `Resolved` carries the final text. Reads always return immediately.
//!
//! Persistence freezes the state: serialization emits the resolved summary
//! (or a fixed "incomplete" placeholder when the summarizer has not
//! finished), and deserialization only ever produces `Resolved`; the
//! summarization is never re-run after a save/load boundary.

use std::sync::{Arc, OnceLock};

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Placeholder shown while the summary is still being computed.
pub const SUMMARIZING_PLACEHOLDER: &str = "(Summarizing. This does not block LLM requests)";

/// Frozen value persisted when the summarizer had not finished at save time.
pub const INCOMPLETE_PLACEHOLDER: &str = "(Paste summary incomplete)";

/// Write-once slot handed to the background summarizer task.
#[derive(Clone, Debug)]
pub struct SummarySlot {
    cell: Arc<OnceLock<String>>,
}

impl SummarySlot {
    /// Fill the slot. A second fill is ignored; the first value wins.
    pub fn fill(&self, summary: impl Into<String>) {
        let _ = self.cell.set(summary.into());
    }
}

/// Deferred description of a pasted blob.
#[derive(Clone, Debug)]
pub enum PasteDescription {
    /// Summary computation is (or was) in flight.
    Pending(Arc<OnceLock<String>>),
    /// Summary is final.
    Resolved(String),
}

impl PasteDescription {
    /// Create a pending description plus the slot its summarizer fills.
    #[must_use]
    pub fn pending() -> (Self, SummarySlot) {
        let cell = Arc::new(OnceLock::new());
        (Self::Pending(Arc::clone(&cell)), SummarySlot { cell })
    }

    /// Create an already-resolved description.
    #[must_use]
    pub fn resolved(summary: impl Into<String>) -> Self {
        Self::Resolved(summary.into())
    }

    /// The raw summary, if resolution has completed.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        match self {
            Self::Pending(cell) => cell.get().map(String::as_str),
            Self::Resolved(summary) => Some(summary),
        }
    }

    /// Human-readable description. Never blocks: returns the fixed
    /// placeholder until the summary lands.
    #[must_use]
    pub fn display(&self) -> String {
        match self.summary() {
            Some(summary) => format!("Paste of {summary}"),
            None => SUMMARIZING_PLACEHOLDER.to_owned(),
        }
    }

    /// Force the state to a final string for persistence: the resolved
    /// summary, or the fixed incomplete placeholder.
    #[must_use]
    pub fn freeze(&self) -> String {
        self.summary()
            .map_or_else(|| INCOMPLETE_PLACEHOLDER.to_owned(), str::to_owned)
    }
}

/// Equality on the frozen value; a pending and a resolved description with
/// the same summary compare equal.
impl PartialEq for PasteDescription {
    fn eq(&self, other: &Self) -> bool {
        self.freeze() == other.freeze()
    }
}

impl Serialize for PasteDescription {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.freeze())
    }
}

impl<'de> Deserialize<'de> for PasteDescription {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::Resolved(String::deserialize(deserializer)?))
    }
}
