use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

use crate::config::AutomationConfig;
use crate::engine::{ActionResult, ActionStatus, AutomationEngine};
use crate::errors::{DeskPilotError, DeskPilotResult};
use crate::interpreter::CommandInterpreter;
use crate::schema::Plan;

use super::events::{EventBus, TaskEvent};
use super::{Task, TaskStatus};

struct TaskEntry {
    task: Task,
    cancel: watch::Sender<bool>,
}

#[derive(Default)]
struct Registry {
    entries: HashMap<Uuid, TaskEntry>,
    order: VecDeque<Uuid>,
}

impl Registry {
    fn insert(&mut self, task: Task, cancel: watch::Sender<bool>) {
        self.order.push_back(task.id);
        self.entries.insert(task.id, TaskEntry { task, cancel });
    }

    /// Evicts the oldest terminal tasks past `max`. Live tasks are never
    /// evicted, so the registry can transiently exceed the bound while many
    /// tasks are in flight.
    fn evict_over(&mut self, max: usize) {
        while self.entries.len() > max {
            let Some(pos) = self.order.iter().position(|id| {
                self.entries
                    .get(id)
                    .map(|entry| entry.task.status.is_terminal())
                    .unwrap_or(true)
            }) else {
                break;
            };
            if let Some(id) = self.order.remove(pos) {
                self.entries.remove(&id);
                tracing::debug!(task = %id, "evicted terminal task");
            }
        }
    }
}

struct Inner {
    registry: Mutex<Registry>,
    events: EventBus,
    interpreter: CommandInterpreter,
    max_tasks: usize,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, id: Uuid, status: TaskStatus) {
        if let Some(entry) = self.lock().entries.get_mut(&id) {
            if !entry.task.status.is_terminal() {
                entry.task.status = status;
            }
        }
    }

    fn set_plan(&self, id: Uuid, plan: Plan) {
        if let Some(entry) = self.lock().entries.get_mut(&id) {
            entry.task.plan = Some(plan);
        }
    }

    fn cancel_requested(&self, id: Uuid) -> bool {
        self.lock()
            .entries
            .get(&id)
            .map(|entry| *entry.cancel.borrow())
            .unwrap_or(false)
    }

    /// Marks the task running and hands out its cancel flag, or None when
    /// cancellation already arrived.
    fn begin_run(&self, id: Uuid) -> Option<watch::Receiver<bool>> {
        let mut registry = self.lock();
        let entry = registry.entries.get_mut(&id)?;
        if *entry.cancel.borrow() {
            return None;
        }
        entry.task.status = TaskStatus::Running;
        entry.task.started_at = Some(Utc::now());
        Some(entry.cancel.subscribe())
    }

    /// The engine's whole write surface on a task: append one result.
    fn append_result(&self, id: Uuid, index: usize, result: ActionResult) {
        if let Some(entry) = self.lock().entries.get_mut(&id) {
            entry.task.results.push(result.clone());
        }
        self.events.emit(TaskEvent::ActionCompleted {
            task_id: id,
            index,
            result,
        });
    }

    fn finish(&self, id: Uuid, status: TaskStatus, error: Option<String>) {
        let mut found = false;
        if let Some(entry) = self.lock().entries.get_mut(&id) {
            entry.task.status = status;
            entry.task.error = error.clone();
            entry.task.finished_at = Some(Utc::now());
            found = true;
        }
        if found {
            tracing::info!(task = %id, status = ?status, "task finished");
            self.events.emit(TaskEvent::TaskFinished {
                task_id: id,
                status,
                error,
            });
        }
    }
}

struct QueuedTask {
    id: Uuid,
    plan_rx: oneshot::Receiver<DeskPilotResult<Plan>>,
}

/// Owns the task registry and serializes plan execution.
///
/// Interpretation runs concurrently across tasks, but the browser and the
/// desktop input focus are single-instance stateful resources, so exactly
/// one engine run is active at a time: tasks execute on a single worker in
/// submission order.
pub struct TaskManager {
    inner: Arc<Inner>,
    queue_tx: mpsc::Sender<QueuedTask>,
}

impl TaskManager {
    /// Spawns the execution worker; must be called inside a Tokio runtime.
    pub fn new(
        interpreter: CommandInterpreter,
        engine: AutomationEngine,
        config: &AutomationConfig,
    ) -> Self {
        let inner = Arc::new(Inner {
            registry: Mutex::new(Registry::default()),
            events: EventBus::new(64),
            interpreter,
            max_tasks: config.max_tasks.max(1),
        });
        let (queue_tx, queue_rx) = mpsc::channel(32);
        tokio::spawn(run_worker(inner.clone(), engine, queue_rx));
        Self { inner, queue_tx }
    }

    /// Registers the command as a new task and queues it for execution.
    ///
    /// Interpretation starts immediately on its own task; the execution
    /// worker picks tasks up strictly in submission order.
    pub async fn submit(&self, command: &str) -> DeskPilotResult<Uuid> {
        let task = Task::new(command);
        let id = task.id;
        let (cancel_tx, _) = watch::channel(false);
        {
            let mut registry = self.inner.lock();
            registry.insert(task, cancel_tx);
            registry.evict_over(self.inner.max_tasks);
        }
        self.inner.events.emit(TaskEvent::TaskQueued {
            task_id: id,
            command: command.to_string(),
        });
        tracing::info!(task = %id, command = %command, "task submitted");

        let (plan_tx, plan_rx) = oneshot::channel();
        let inner = self.inner.clone();
        let command = command.to_string();
        tokio::spawn(async move {
            inner.set_status(id, TaskStatus::Interpreting);
            let outcome = inner.interpreter.interpret(&command, None).await;
            match &outcome {
                Ok(plan) => {
                    inner.set_plan(id, plan.clone());
                    inner.events.emit(TaskEvent::PlanReady {
                        task_id: id,
                        plan: plan.clone(),
                    });
                }
                Err(e) => {
                    tracing::warn!(task = %id, error = %e, "interpretation failed");
                }
            }
            let _ = plan_tx.send(outcome);
        });

        self.queue_tx
            .send(QueuedTask { id, plan_rx })
            .await
            .map_err(|_| DeskPilotError::Task("execution queue is closed".into()))?;
        Ok(id)
    }

    /// Snapshot of the task as currently recorded.
    pub fn get(&self, id: Uuid) -> DeskPilotResult<Task> {
        self.inner
            .lock()
            .entries
            .get(&id)
            .map(|entry| entry.task.clone())
            .ok_or(DeskPilotError::TaskNotFound(id))
    }

    /// All retained tasks in submission order.
    pub fn list(&self) -> Vec<Task> {
        let registry = self.inner.lock();
        registry
            .order
            .iter()
            .filter_map(|id| registry.entries.get(id))
            .map(|entry| entry.task.clone())
            .collect()
    }

    /// Requests cooperative cancellation. The current action is allowed to
    /// finish; the stop takes effect before the next dispatch. Cancelling a
    /// terminal task is a no-op.
    pub fn cancel(&self, id: Uuid) -> DeskPilotResult<()> {
        let registry = self.inner.lock();
        let entry = registry
            .entries
            .get(&id)
            .ok_or(DeskPilotError::TaskNotFound(id))?;
        if entry.task.status.is_terminal() {
            return Ok(());
        }
        let _ = entry.cancel.send(true);
        tracing::info!(task = %id, "cancellation requested");
        Ok(())
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<TaskEvent> {
        self.inner.events.subscribe()
    }
}

async fn run_worker(
    inner: Arc<Inner>,
    engine: AutomationEngine,
    mut queue_rx: mpsc::Receiver<QueuedTask>,
) {
    while let Some(queued) = queue_rx.recv().await {
        let id = queued.id;

        let plan = match queued.plan_rx.await {
            Ok(Ok(plan)) => plan,
            Ok(Err(e)) => {
                // Cancellation during interpretation wins over the interpreter error.
                if inner.cancel_requested(id) {
                    inner.finish(id, TaskStatus::Cancelled, Some(DeskPilotError::Cancelled.to_string()));
                } else {
                    inner.finish(id, TaskStatus::Failed, Some(e.to_string()));
                }
                continue;
            }
            Err(_) => {
                inner.finish(id, TaskStatus::Failed, Some("interpretation aborted".into()));
                continue;
            }
        };

        let Some(cancel_rx) = inner.begin_run(id) else {
            inner.finish(id, TaskStatus::Cancelled, Some(DeskPilotError::Cancelled.to_string()));
            continue;
        };

        tracing::info!(task = %id, actions = plan.len(), "task running");
        let observer = inner.clone();
        let results = engine
            .execute_with(&plan, cancel_rx, |index, result| {
                observer.append_result(id, index, result.clone());
            })
            .await;

        let blocking_failure = plan.actions.iter().zip(&results).find_map(|(action, result)| {
            if action.kind.spec().blocking && result.status == ActionStatus::Failed {
                Some(format!(
                    "blocking action '{}' failed: {}",
                    action.kind,
                    result.error.as_deref().unwrap_or("unknown cause")
                ))
            } else {
                None
            }
        });

        if inner.cancel_requested(id) {
            inner.finish(id, TaskStatus::Cancelled, Some(DeskPilotError::Cancelled.to_string()));
        } else if let Some(error) = blocking_failure {
            inner.finish(id, TaskStatus::Failed, Some(error));
        } else {
            inner.finish(id, TaskStatus::Completed, None);
        }
    }
    tracing::info!("task worker exited");
}
