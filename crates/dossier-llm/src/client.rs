//! The [`LlmClient`] trait.
//!
//! Clients expose a unified streaming interface: a boxed [`Stream`] of
//! [`StreamChunk`]s, so the orchestrator can process tokens incrementally
//! and observe its cancellation token between chunks regardless of the
//! underlying transport.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for client operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Boxed stream of chunks returned by [`LlmClient::stream`].
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, LlmError>> + Send>>;

/// Errors surfaced by an LLM client.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No client is configured (missing API keys, no endpoint).
    #[error("no LLM available")]
    Unavailable,

    /// The transport failed mid-request.
    #[error("transport error: {message}")]
    Transport {
        /// Error description.
        message: String,
    },

    /// The model produced output the caller could not parse.
    #[error("malformed response: {message}")]
    Malformed {
        /// Error description.
        message: String,
    },
}

/// One request to the model: the serialized working context plus the
/// user's instructions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// LLM-facing rendering of the working context fragments.
    pub context: String,
    /// The instructions or question driving this request.
    pub instructions: String,
}

impl CompletionRequest {
    /// Convenience constructor.
    #[must_use]
    pub fn new(context: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            instructions: instructions.into(),
        }
    }
}

/// Incremental streaming output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamChunk {
    /// A fragment of response text.
    Delta {
        /// The text fragment.
        delta: String,
    },
    /// The stream finished; carries the full accumulated text.
    Done {
        /// Complete response text.
        text: String,
    },
}

/// Streaming LLM client.
///
/// Implementations must be safe to share across tasks. Cancellation is the
/// caller's concern: the orchestrator drops the stream when its token
/// fires, so implementations must tolerate mid-stream drops.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Whether a model can be reached at all (keys present, endpoint up).
    fn is_available(&self) -> bool;

    /// Open a token stream for the request.
    async fn stream(&self, request: &CompletionRequest) -> LlmResult<TokenStream>;
}
