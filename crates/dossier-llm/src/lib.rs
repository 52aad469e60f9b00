//! # dossier-llm
//!
//! The LLM transport abstraction consumed by the orchestrator. The real
//! client (HTTP, streaming protocol, auth) lives outside this workspace;
//! here there is only the seam: a cancellation-friendly token stream and
//! an availability probe.

#![deny(unsafe_code)]

pub mod client;

pub use client::{CompletionRequest, LlmClient, LlmError, LlmResult, StreamChunk, TokenStream};
