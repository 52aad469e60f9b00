//! The public orchestrator handle.
//!
//! [`TaskOrchestrator`] is the boundary the presentation layer talks to:
//! submit an action, cancel the running one, watch history, subscribe to
//! events. The single-flight invariant is enforced here with an atomic
//! compare-exchange, so a request arriving while another action runs is
//! rejected even if the UI forgot to disable its triggers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use dossier_context::History;
use dossier_core::analyzer::{AnalyzerCell, Repository};
use dossier_core::events::WorkspaceEvent;
use dossier_llm::LlmClient;

use crate::actions::ActionDeps;
use crate::coordinator::{Command, Coordinator};
use crate::emitter::EventEmitter;
use crate::errors::OrchestratorError;
use crate::types::{Action, HistoryView, OrchestratorConfig};

/// Single-flight orchestrator over context history.
pub struct TaskOrchestrator {
    cmd_tx: mpsc::UnboundedSender<Command>,
    running: Arc<AtomicBool>,
    cancel_slot: Arc<Mutex<Option<CancellationToken>>>,
    view_rx: watch::Receiver<HistoryView>,
    emitter: EventEmitter,
}

impl TaskOrchestrator {
    /// Create an orchestrator with a fresh session history and spawn its
    /// coordinator task. Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(
        config: OrchestratorConfig,
        cell: Arc<AnalyzerCell>,
        repo: Arc<dyn Repository>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self::with_history(config, cell, repo, llm, History::default())
    }

    /// Create an orchestrator resuming from an existing history.
    #[must_use]
    pub fn with_history(
        config: OrchestratorConfig,
        cell: Arc<AnalyzerCell>,
        repo: Arc<dyn Repository>,
        llm: Arc<dyn LlmClient>,
        history: History,
    ) -> Self {
        let emitter = EventEmitter::with_capacity(config.event_capacity);
        let deps = Arc::new(ActionDeps {
            cell,
            repo,
            llm,
            config,
            emitter: emitter.clone(),
        });

        let running = Arc::new(AtomicBool::new(false));
        let cancel_slot = Arc::new(Mutex::new(None));
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(HistoryView {
            entries: history.entries().to_vec(),
            index: history.index(),
        });

        let coordinator = Coordinator::new(
            history,
            deps,
            emitter.clone(),
            Arc::clone(&running),
            Arc::clone(&cancel_slot),
            view_tx,
            cmd_tx.clone(),
        );
        drop(tokio::spawn(coordinator.run(cmd_rx)));

        Self {
            cmd_tx,
            running,
            cancel_slot,
            view_rx,
            emitter,
        }
    }

    /// Submit an action.
    ///
    /// Rejected with [`OrchestratorError::Busy`] while another action is
    /// running; the gate is released when the coordinator finishes
    /// processing the action's outcome.
    #[instrument(skip(self), fields(label = %action.label()))]
    pub fn submit(&self, action: Action) -> Result<(), OrchestratorError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("rejecting action: already running");
            return Err(OrchestratorError::Busy);
        }

        let cancel = CancellationToken::new();
        *self.cancel_slot.lock() = Some(cancel.clone());

        if self.cmd_tx.send(Command::Run { action, cancel }).is_err() {
            *self.cancel_slot.lock() = None;
            self.running.store(false, Ordering::SeqCst);
            return Err(OrchestratorError::Shutdown);
        }
        Ok(())
    }

    /// Cancel the running action, if any. Cooperative: the worker unwinds
    /// at its next suspension point and no history entry is appended.
    pub fn cancel(&self) {
        if let Some(token) = self.cancel_slot.lock().as_ref() {
            token.cancel();
        }
    }

    /// Whether an action is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Snapshot of the current history view.
    #[must_use]
    pub fn history(&self) -> HistoryView {
        self.view_rx.borrow().clone()
    }

    /// Watch channel that yields a fresh view after every history change.
    #[must_use]
    pub fn watch_history(&self) -> watch::Receiver<HistoryView> {
        self.view_rx.clone()
    }

    /// Subscribe to workspace events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.emitter.subscribe()
    }
}
