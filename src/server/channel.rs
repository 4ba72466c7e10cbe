//! Per-task event channel between an executor and the request handler

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    protocol::{event::TaskUpdateEvent, A2AError, A2AResult},
    server::store::TaskStore,
};

/// Create a bounded channel for one task run
///
/// `cancellation` fires when the receiver goes away before the final update.
pub fn event_channel(
    capacity: usize,
    cancellation: CancellationToken,
) -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let disconnected = Arc::new(AtomicBool::new(false));

    let sender = EventSender {
        tx: Some(tx),
        disconnected: disconnected.clone(),
        store: None,
    };
    let receiver = EventReceiver {
        rx,
        cancellation,
        disconnected,
        drained: false,
    };
    (sender, receiver)
}

/// Producing half, owned by exactly one executor
#[derive(Debug)]
pub struct EventSender {
    tx: Option<mpsc::Sender<TaskUpdateEvent>>,
    disconnected: Arc<AtomicBool>,
    store: Option<TaskStore>,
}

impl EventSender {
    /// Apply every update to `store` before it is queued
    ///
    /// The store then holds the whole run even when the consumer stops
    /// reading with updates still buffered.
    pub fn recording(mut self, store: TaskStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Deliver an update, waiting while the channel is full
    ///
    /// The channel closes after a final update.
    ///
    /// # Errors
    ///
    /// - `A2AError::TerminalTask` when a final update was already sent
    /// - any error of [`TaskStore::apply`] when recording
    /// - `A2AError::Transport` when the consumer is gone
    pub async fn send(&mut self, event: TaskUpdateEvent) -> A2AResult<()> {
        let Some(tx) = self.tx.as_ref() else {
            return Err(A2AError::TerminalTask {
                task_id: event.task_id().to_string(),
            });
        };

        if let Some(store) = &self.store {
            store.apply(event.task_id(), &event)?;
        }

        let is_final = event.is_final();
        if tx.send(event).await.is_err() {
            self.tx = None;
            return Err(A2AError::Transport("update consumer disconnected".into()));
        }

        if is_final {
            self.tx = None;
        }
        Ok(())
    }

    /// Whether the consumer went away before seeing the end of the run
    pub fn consumer_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Acquire)
    }
}

/// Consuming half, owned by the request handler's relay
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<TaskUpdateEvent>,
    cancellation: CancellationToken,
    disconnected: Arc<AtomicBool>,
    drained: bool,
}

impl EventReceiver {
    /// Next update, or `None` once the producer closed the channel
    pub async fn recv(&mut self) -> Option<TaskUpdateEvent> {
        let event = self.rx.recv().await;
        if event.as_ref().map_or(true, TaskUpdateEvent::is_final) {
            self.drained = true;
        }
        event
    }
}

impl Drop for EventReceiver {
    fn drop(&mut self) {
        if !self.drained {
            self.disconnected.store(true, Ordering::Release);
            self.cancellation.cancel();
        }
    }
}
