//! # dossier-context
//!
//! Context snapshots and their history.
//!
//! - [`context::Context`]: an immutable snapshot of the working fragment
//!   set plus optional parsed LLM output and an action label. Transitions
//!   always build a new snapshot; fragments are structurally shared.
//! - [`history::History`]: the append-only context sequence with a
//!   current-position pointer and multi-step undo/redo.
//! - [`auto`]: from-scratch derivation of the auto-context summary via the
//!   relevance oracle.

#![deny(unsafe_code)]

pub mod auto;
pub mod context;
pub mod history;

pub use context::{Context, OutputStyle, ParsedOutput};
pub use history::History;
