//! Task lifecycle: one end-to-end interpretation + execution run per
//! submitted command, tracked in a bounded in-memory registry.

pub mod events;
pub mod manager;

pub use events::TaskEvent;
pub use manager::TaskManager;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::ActionResult;
use crate::schema::Plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Interpreting,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// One submitted command and everything recorded about it.
///
/// Owned exclusively by the [`TaskManager`]; callers only ever see clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub command: String,
    /// None until interpretation completes.
    pub plan: Option<Plan>,
    /// Append-only, one entry per dispatched plan action.
    pub results: Vec<ActionResult>,
    pub status: TaskStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    pub(crate) fn new(command: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            command: command.to_string(),
            plan: None,
            results: Vec::new(),
            status: TaskStatus::Pending,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }
}
