use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::engine::ActionResult;
use crate::schema::Plan;

use super::TaskStatus;

/// Real-time task progress: one event per action completion plus lifecycle
/// markers, fanned out to every subscriber.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    TaskQueued {
        task_id: Uuid,
        command: String,
    },
    PlanReady {
        task_id: Uuid,
        plan: Plan,
    },
    ActionCompleted {
        task_id: Uuid,
        index: usize,
        result: ActionResult,
    },
    TaskFinished {
        task_id: Uuid,
        status: TaskStatus,
        error: Option<String>,
    },
}

pub struct EventBus {
    tx: broadcast::Sender<TaskEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.tx.subscribe()
    }

    /// Fire-and-forget; having no subscribers is not an error.
    pub(crate) fn emit(&self, event: TaskEvent) {
        let _ = self.tx.send(event);
    }
}
