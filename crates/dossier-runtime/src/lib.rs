//! # dossier-runtime
//!
//! The single-flight task orchestrator.
//!
//! At most one user-driven action runs at a time. A coordinator task
//! exclusively owns history mutation; action bodies run as spawned workers
//! over a read-only context snapshot and report zero or one new context
//! back over a channel. Cancellation is cooperative: every worker observes
//! a [`tokio_util::sync::CancellationToken`] at its suspension points
//! (before each streamed chunk, before each analyzer call) and unwinds
//! without touching history.

#![deny(unsafe_code)]

pub mod actions;
pub mod coordinator;
pub mod emitter;
pub mod errors;
pub mod orchestrator;
pub mod types;

pub use emitter::EventEmitter;
pub use errors::{ActionError, OrchestratorError};
pub use orchestrator::TaskOrchestrator;
pub use types::{Action, ContextOp, HistoryView, OrchestratorConfig};
