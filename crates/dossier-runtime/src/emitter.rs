//! Broadcast event emitter.
//!
//! Fans [`WorkspaceEvent`]s out to any number of observers over a tokio
//! broadcast channel. Emission is fire-and-forget: no subscribers, or a
//! lagging subscriber, never blocks or fails the emitting task.

use tokio::sync::broadcast;

use dossier_core::events::WorkspaceEvent;

const DEFAULT_CAPACITY: usize = 256;

/// Cloneable handle for emitting and subscribing to workspace events.
#[derive(Clone, Debug)]
pub struct EventEmitter {
    tx: broadcast::Sender<WorkspaceEvent>,
}

impl EventEmitter {
    /// Create an emitter with the default buffer capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an emitter with an explicit buffer capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all current subscribers.
    pub fn emit(&self, event: WorkspaceEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_core::events::BaseEvent;

    #[test]
    fn emit_without_subscribers_is_fine() {
        let emitter = EventEmitter::new();
        emitter.emit(WorkspaceEvent::HistoryMoved {
            base: BaseEvent::now(),
            index: 0,
        });
    }

    #[tokio::test]
    async fn subscribers_see_events_in_order() {
        let emitter = EventEmitter::new();
        let mut rx = emitter.subscribe();

        for index in 0..3 {
            emitter.emit(WorkspaceEvent::HistoryMoved {
                base: BaseEvent::now(),
                index,
            });
        }

        for expected in 0..3 {
            let event = rx.recv().await.unwrap();
            let WorkspaceEvent::HistoryMoved { index, .. } = event else {
                panic!("unexpected event");
            };
            assert_eq!(index, expected);
        }
    }
}
