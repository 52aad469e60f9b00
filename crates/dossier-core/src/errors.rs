//! Error types shared across the workspace.
//!
//! Built on [`thiserror`]:
//!
//! - [`ContentError`]: a fragment's backing content cannot be produced.
//!   Recovered per-fragment by dropping the fragment, never by failing the
//!   surrounding context operation.
//! - [`AnalyzerError`]: the relevance oracle is not in a usable state.
//!   Consumers fall back to sentinel values instead of propagating.

use thiserror::Error;

/// A fragment's raw content cannot be read.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The backing file is missing or unreadable.
    #[error("content unavailable: {path}")]
    Unavailable {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    /// The path whose read failed.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Unavailable { path, .. } => path,
        }
    }
}

/// The analyzer oracle cannot serve a query.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyzerError {
    /// No completed analyzer snapshot exists yet.
    #[error("analyzer unavailable")]
    Unavailable,
}
