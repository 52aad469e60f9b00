//! # dossier-fragments
//!
//! The fragment content model: one addressable unit of content the
//! assistant reasons over, file-backed or virtual.
//!
//! - [`fragment::Fragment`]: the closed variant taxonomy with the full
//!   capability surface (descriptions, text, LLM formatting, code sources,
//!   auto-context eligibility)
//! - [`paste::PasteDescription`]: two-phase deferred description for pasted
//!   blobs, with freeze-on-serialize semantics
//! - [`auto_context::AutoContext`]: the derived relevance summary and its
//!   `EMPTY` / `DISABLED` / `UNAVAILABLE` sentinels

#![deny(unsafe_code)]

pub mod auto_context;
pub mod fragment;
pub mod paste;

pub use auto_context::AutoContext;
pub use fragment::{units_mentioned_in, ChatMessage, ChatRole, Fragment};
pub use paste::PasteDescription;
