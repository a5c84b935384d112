//! The background task scheduler.
//!
//! [`TaskScheduler`] owns the task registry and the live queue. Exactly one
//! queued instance executes at a time; whenever the queue changes or a
//! running instance settles, the step function re-evaluates which entry (if
//! any) to start next. Records that failed stay in the queue with their
//! error message, visible to operators, until they are cancelled; the loop
//! skips them in place and never re-runs them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use curator_core::progress::should_forward;
use curator_core::{slot, CoreError, ListedTask, QueuedTask, MAX_TASK_QUEUE_SIZE};
use curator_events::{EventBus, TaskEvent};
use tokio::time::Instant;

use crate::progress::ProgressReporter;
use crate::task::Task;

/// Mutable scheduler state, guarded by a single mutex.
///
/// Admission, cancellation, progress writes, and loop steps each take the
/// lock for a short synchronous section; it is never held across an
/// `.await`, which keeps the state machine serialized without blocking the
/// runtime.
struct SchedulerState {
    /// The live queue, in admission order.
    queue: Vec<QueuedTask>,
    /// When a throttled progress notification last went out. Shared across
    /// all instances, so the emission rate is bounded per process.
    last_progress_emit: Option<Instant>,
}

/// The background task scheduler.
///
/// Constructed once at process start via [`TaskScheduler::new`]; the
/// returned `Arc` is cheaply cloned wherever enqueue/cancel/snapshot access
/// is needed. Task types are registered during startup and never removed.
pub struct TaskScheduler {
    tasks: RwLock<HashMap<String, Task>>,
    state: Mutex<SchedulerState>,
    bus: Arc<EventBus>,
}

impl TaskScheduler {
    /// Create an idle scheduler publishing on the given bus.
    pub fn new(bus: Arc<EventBus>) -> Arc<Self> {
        Arc::new(Self {
            tasks: RwLock::new(HashMap::new()),
            state: Mutex::new(SchedulerState {
                queue: Vec::new(),
                last_progress_emit: None,
            }),
            bus,
        })
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    /// Register a task type.
    ///
    /// Fails with [`CoreError::DuplicateTaskType`] if the id is taken; task
    /// types are never replaced or removed once registered.
    pub fn register(&self, task_type: impl Into<String>, task: Task) -> Result<(), CoreError> {
        let task_type = task_type.into();
        let mut tasks = self.registry_mut();
        if tasks.contains_key(&task_type) {
            return Err(CoreError::DuplicateTaskType(task_type));
        }
        tasks.insert(task_type, task);
        Ok(())
    }

    /// List all registered task types.
    pub fn tasks(&self) -> Vec<ListedTask> {
        self.registry()
            .iter()
            .map(|(id, task)| ListedTask {
                id: id.clone(),
                description: task.description().to_string(),
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Queue operations
    // -----------------------------------------------------------------------

    /// Admit one instance of a registered task type.
    ///
    /// Returns the new instance id (`"<task_type>-<slot>"`). Fails with
    /// [`CoreError::UnknownTaskType`] for an unregistered type and
    /// [`CoreError::QueueFull`] when the queue is at capacity — slot
    /// exhaustion surfaces the same way, since the slot space and the queue
    /// cap are the same size.
    pub fn enqueue(self: &Arc<Self>, task_type: &str) -> Result<String, CoreError> {
        let description = {
            let tasks = self.registry();
            tasks
                .get(task_type)
                .ok_or_else(|| CoreError::UnknownTaskType(task_type.to_string()))?
                .description()
                .to_string()
        };

        let (id, snapshot, head_idle) = {
            let mut state = self.state();
            if state.queue.len() >= MAX_TASK_QUEUE_SIZE {
                return Err(CoreError::QueueFull);
            }

            let free = {
                let live_ids: Vec<&str> = state.queue.iter().map(|t| t.id.as_str()).collect();
                slot::find_free_slot(&live_ids)
            };
            // Slot exhaustion is indistinguishable from a full queue: the
            // slot space and the queue cap are the same constant.
            let free = free.ok_or(CoreError::QueueFull)?;
            let id = slot::instance_id(task_type, free);

            state
                .queue
                .push(QueuedTask::new(id.clone(), task_type, description));
            let head_idle = !state.queue[0].running;
            (id, state.queue.clone(), head_idle)
        };

        tracing::debug!(task_id = %id, "Task queued");
        self.bus.publish(TaskEvent::Queue { tasks: snapshot });

        if head_idle {
            self.step();
        }

        Ok(id)
    }

    /// Cancel a pending or failed instance by id.
    ///
    /// Unknown ids are a no-op. Fails with
    /// [`CoreError::CannotCancelRunning`] when the instance is currently
    /// executing; there is no cancellation signal into a running body.
    pub fn cancel(self: &Arc<Self>, id: &str) -> Result<(), CoreError> {
        let snapshot = {
            let mut state = self.state();
            let Some(index) = state.queue.iter().position(|t| t.id == id) else {
                return Ok(());
            };
            if state.queue[index].running {
                return Err(CoreError::CannotCancelRunning(id.to_string()));
            }
            state.queue.remove(index);
            state.queue.clone()
        };

        tracing::info!(task_id = %id, "Task cancelled");
        self.bus.publish(TaskEvent::Queue { tasks: snapshot });
        self.step();
        Ok(())
    }

    /// Snapshot of the live queue, in queue order.
    ///
    /// The returned records are clones; mutating them has no effect on the
    /// scheduler.
    pub fn queue(&self) -> Vec<QueuedTask> {
        self.state().queue.clone()
    }

    // -----------------------------------------------------------------------
    // Scheduler loop
    // -----------------------------------------------------------------------

    /// Start the next eligible queue entry, if any.
    ///
    /// The eligible entry is the first in queue order without an error;
    /// errored records are skipped in place. Re-entry is harmless: if the
    /// eligible entry is already running this does nothing, so concurrent
    /// calls from enqueue, cancel, and settle cannot double-start a task.
    fn step(self: &Arc<Self>) {
        let started = {
            let mut state = self.state();
            let Some(record) = state.queue.iter_mut().find(|t| t.error.is_none()) else {
                return;
            };
            if record.running {
                return;
            }
            record.running = true;
            record.clone()
        };

        let task = self.registry().get(&started.task_type).cloned();
        let Some(task) = task else {
            // Unreachable by construction: enqueue validates the type and
            // the registry never shrinks.
            tracing::error!(task_id = %started.id, "Queued task type missing from registry");
            self.settle(&started.id, Err(anyhow::anyhow!("No task found for given type")));
            return;
        };

        tracing::info!(task_id = %started.id, "Task started");
        self.bus.publish(TaskEvent::Started {
            task: started.clone(),
        });

        let progress = ProgressReporter::new(Arc::clone(self), started.id.clone());
        let runner = tokio::spawn(task.run(progress));

        // Watch for the runner to settle. Awaiting the join handle also
        // converts a panicking runner into an error outcome, so one
        // misbehaving task can never stop the loop.
        let scheduler = Arc::clone(self);
        let id = started.id;
        tokio::spawn(async move {
            let outcome = match runner.await {
                Ok(result) => result,
                Err(err) if err.is_panic() => Err(anyhow::anyhow!(
                    "Task panicked: {}",
                    panic_text(err.into_panic())
                )),
                Err(err) => Err(anyhow::anyhow!(err)),
            };
            scheduler.settle(&id, outcome);
        });
    }

    /// Apply a settled runner outcome to its queue record.
    ///
    /// Success removes the record; failure retains it with the error
    /// message and clears the running flag. Either way the `end` and
    /// `queue` events go out and the loop looks for the next eligible
    /// entry.
    fn settle(self: &Arc<Self>, id: &str, outcome: anyhow::Result<()>) {
        let (ended, snapshot) = {
            let mut state = self.state();
            let Some(index) = state.queue.iter().position(|t| t.id == id) else {
                return;
            };

            let ended = match outcome {
                Ok(()) => {
                    let mut record = state.queue.remove(index);
                    record.running = false;
                    tracing::info!(task_id = %record.id, "Task completed successfully");
                    record
                }
                Err(err) => {
                    let record = &mut state.queue[index];
                    record.error = Some(err.to_string());
                    record.running = false;
                    tracing::error!(task_id = %record.id, error = %err, "Task failed");
                    record.clone()
                }
            };
            (ended, state.queue.clone())
        };

        self.bus.publish(TaskEvent::Ended { task: ended });
        self.bus.publish(TaskEvent::Queue { tasks: snapshot });
        self.step();
    }

    // -----------------------------------------------------------------------
    // Progress
    // -----------------------------------------------------------------------

    /// Record a progress report from a running instance.
    ///
    /// The record's `current`/`max` fields are updated on every call; the
    /// observer-facing `queue` event is throttled to the first update, the
    /// final updates, and at most one per second in between.
    pub(crate) fn record_progress(&self, id: &str, current: u64, max: u64) {
        let snapshot = {
            let mut state = self.state();
            let Some(record) = state.queue.iter_mut().find(|t| t.id == id) else {
                return;
            };
            record.current = current;
            record.max = max;

            let elapsed = state.last_progress_emit.map(|at| at.elapsed());
            if !should_forward(current, max, elapsed) {
                return;
            }
            state.last_progress_emit = Some(Instant::now());
            state.queue.clone()
        };

        self.bus.publish(TaskEvent::Queue { tasks: snapshot });
    }

    // -----------------------------------------------------------------------
    // Lock helpers
    // -----------------------------------------------------------------------

    fn state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().expect("scheduler state lock poisoned")
    }

    fn registry(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Task>> {
        self.tasks.read().expect("task registry lock poisoned")
    }

    fn registry_mut(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Task>> {
        self.tasks.write().expect("task registry lock poisoned")
    }
}

/// Best-effort extraction of a panic payload message.
fn panic_text(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
