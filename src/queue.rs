//! Single-consumer task queue
//!
//! Inbound host frames, timer-fired re-announcements and page handshake
//! signals arrive on unrelated turns of the page's event loop. Producers
//! only push here; one consumer (`Bridge::run` / `Bridge::drain`) applies
//! them, so state is never mutated from inside a DOM or timer callback.

use futures::channel::mpsc;
use futures::StreamExt;

use crate::discovery::HandshakePayload;

pub enum Task {
    /// Raw string received from the host
    Inbound(String),
    /// Scheduled re-announcement `attempt` (0-based)
    Announce { attempt: usize },
    /// Discovery event raised by page code
    Handshake { event: String, payload: Box<dyn HandshakePayload> },
}

impl Task {
    pub fn kind(&self) -> &'static str {
        match self {
            Task::Inbound(_) => "inbound",
            Task::Announce { .. } => "announce",
            Task::Handshake { .. } => "handshake",
        }
    }
}

/// Producer handle; clone freely into callbacks
#[derive(Clone)]
pub struct TaskQueue {
    tx: mpsc::UnboundedSender<Task>,
}

pub struct TaskReceiver {
    rx: mpsc::UnboundedReceiver<Task>,
}

pub fn task_queue() -> (TaskQueue, TaskReceiver) {
    let (tx, rx) = mpsc::unbounded();
    (TaskQueue { tx }, TaskReceiver { rx })
}

impl TaskQueue {
    /// Returns false once the consumer is gone
    pub fn push(&self, task: Task) -> bool {
        let kind = task.kind();
        match self.tx.unbounded_send(task) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(kind, "task queue closed, dropping task");
                false
            }
        }
    }
}

impl TaskReceiver {
    /// Next task without waiting
    pub fn try_next(&mut self) -> Option<Task> {
        self.rx.try_next().ok().flatten()
    }

    pub async fn next(&mut self) -> Option<Task> {
        self.rx.next().await
    }
}
