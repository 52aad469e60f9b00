//! The history coordinator.
//!
//! A single task owns the [`History`] value outright; every mutation
//! (applying an action's context, moving the pointer) happens here, which
//! removes concurrent-append races by construction. Workers communicate
//! results over the same command channel the orchestrator submits on, so
//! entries are appended in completion order, not request order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use dossier_context::{Context, History};
use dossier_core::events::{ActionDisposition, BaseEvent, WorkspaceEvent};

use crate::actions::{self, ActionDeps};
use crate::emitter::EventEmitter;
use crate::errors::ActionError;
use crate::types::{Action, HistoryView};

/// Commands processed by the coordinator loop.
pub(crate) enum Command {
    /// Start an action (single-flight gate already passed).
    Run {
        /// The action to run.
        action: Action,
        /// Cooperative cancellation signal for its worker.
        cancel: CancellationToken,
    },
    /// A worker finished.
    Finished {
        /// Label of the finished action.
        label: String,
        /// Zero or one context to apply, or the failure.
        result: Result<Option<Context>, ActionError>,
    },
}

pub(crate) struct Coordinator {
    history: History,
    deps: Arc<ActionDeps>,
    emitter: EventEmitter,
    running: Arc<AtomicBool>,
    cancel_slot: Arc<Mutex<Option<CancellationToken>>>,
    view_tx: watch::Sender<HistoryView>,
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl Coordinator {
    pub(crate) fn new(
        history: History,
        deps: Arc<ActionDeps>,
        emitter: EventEmitter,
        running: Arc<AtomicBool>,
        cancel_slot: Arc<Mutex<Option<CancellationToken>>>,
        view_tx: watch::Sender<HistoryView>,
        cmd_tx: mpsc::UnboundedSender<Command>,
    ) -> Self {
        Self {
            history,
            deps,
            emitter,
            running,
            cancel_slot,
            view_tx,
            cmd_tx,
        }
    }

    /// Process commands until every sender is gone.
    pub(crate) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Run { action, cancel } => self.start(action, cancel),
                Command::Finished { label, result } => self.complete(&label, result),
            }
        }
        debug!("coordinator shutting down");
    }

    fn start(&mut self, action: Action, cancel: CancellationToken) {
        let label = action.label();
        self.emitter.emit(WorkspaceEvent::ActionStarted {
            base: BaseEvent::now(),
            label: label.clone(),
        });

        if action.is_pointer_move() {
            self.pointer_move(&action, &label);
            return;
        }

        let snapshot = Arc::clone(self.history.current());
        let deps = Arc::clone(&self.deps);
        let cmd_tx = self.cmd_tx.clone();
        drop(tokio::spawn(async move {
            // A panicking body must not wedge the single-flight gate.
            let result = std::panic::AssertUnwindSafe(actions::execute(
                action, snapshot, deps, cancel,
            ))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                error!("action body panicked");
                Err(ActionError::Failed {
                    message: "action body panicked".to_owned(),
                })
            });
            let _ = cmd_tx.send(Command::Finished { label, result });
        }));
    }

    fn pointer_move(&mut self, action: &Action, label: &str) {
        let index = match action {
            Action::Undo { steps } => self.history.undo(*steps),
            Action::Redo { steps } => self.history.redo(*steps),
            Action::UndoTo { index } => self.history.undo_to_index(*index),
            _ => unreachable!("not a pointer move"),
        };
        info!(label, index, "history pointer moved");
        self.publish_view();
        self.emitter.emit(WorkspaceEvent::HistoryMoved {
            base: BaseEvent::now(),
            index,
        });
        self.go_idle(label, ActionDisposition::NoChange);
    }

    fn complete(&mut self, label: &str, result: Result<Option<Context>, ActionError>) {
        let disposition = match result {
            Ok(Some(context)) => {
                let failed = context.parsed_output().is_some_and(|p| p.failed);
                let index = self.history.apply(context);
                self.publish_view();
                self.emitter.emit(WorkspaceEvent::HistoryAppended {
                    base: BaseEvent::now(),
                    index,
                    label: label.to_owned(),
                });
                if failed {
                    ActionDisposition::Failed
                } else {
                    ActionDisposition::Applied
                }
            }
            Ok(None) => ActionDisposition::NoChange,
            Err(ActionError::Cancelled) => {
                info!(label, "action cancelled; history untouched");
                ActionDisposition::Cancelled
            }
            Err(e) => {
                error!(label, error = %e, "action failed before producing a context");
                ActionDisposition::Failed
            }
        };
        self.go_idle(label, disposition);
    }

    fn publish_view(&self) {
        let _ = self.view_tx.send(HistoryView {
            entries: self.history.entries().to_vec(),
            index: self.history.index(),
        });
    }

    fn go_idle(&self, label: &str, disposition: ActionDisposition) {
        *self.cancel_slot.lock() = None;
        self.running.store(false, Ordering::SeqCst);
        self.emitter.emit(WorkspaceEvent::ActionFinished {
            base: BaseEvent::now(),
            label: label.to_owned(),
            disposition,
        });
    }
}
