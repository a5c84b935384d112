//! The queued-task data model shared by the scheduler and its observers.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Maximum number of queued task instances.
///
/// This is also the size of the run-slot space used to mint instance ids,
/// so slot exhaustion and a full queue are the same condition.
pub const MAX_TASK_QUEUE_SIZE: usize = 30;

/// A registered task type as listed to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedTask {
    /// The task type id used to enqueue an instance.
    pub id: String,
    /// Human-readable description shown in the queue UI.
    pub description: String,
}

/// One admitted execution of a task type.
///
/// Created on admission with `running = false` and zeroed progress; mutated
/// in place by the scheduler for the rest of its life. Observers only ever
/// see clones of this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedTask {
    /// Instance id, `"<task_type>-<slot>"`.
    pub id: String,
    /// The registered task type this instance runs.
    pub task_type: String,
    /// Description copied from the task definition at admission.
    pub description: String,
    /// Whether the instance is currently executing.
    pub running: bool,
    /// Items processed so far, as last reported by the runner.
    pub current: u64,
    /// Total item count, as last reported by the runner.
    pub max: u64,
    /// Failure message, set once when the runner fails. A record with this
    /// set is skipped by the scheduler until it is cancelled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the instance was admitted to the queue (UTC).
    pub queued_at: Timestamp,
}

impl QueuedTask {
    /// Build a fresh record for a newly admitted instance.
    pub fn new(
        id: impl Into<String>,
        task_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            task_type: task_type.into(),
            description: description.into(),
            running: false,
            current: 0,
            max: 0,
            error: None,
            queued_at: chrono::Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
