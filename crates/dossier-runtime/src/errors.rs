//! Orchestrator and action error types.

use thiserror::Error;

use dossier_llm::LlmError;

/// Why an action body did not produce a context normally.
///
/// `Cancelled` is the only variant that suppresses a history entry by
/// contract; other failures are recorded as failed parsed output whenever
/// the action got far enough to build one.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The cancellation token fired; history must be left untouched.
    #[error("action cancelled")]
    Cancelled,

    /// The action body failed before any context could be built.
    #[error("action failed: {message}")]
    Failed {
        /// Failure description.
        message: String,
    },

    /// LLM transport failure surfaced before streaming began.
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Errors returned at the orchestrator boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    /// An action is already running; the request is rejected.
    #[error("an action is already running")]
    Busy,

    /// The coordinator has shut down.
    #[error("orchestrator is shut down")]
    Shutdown,
}
