//! Progress reporting handle passed to running tasks.

use std::sync::Arc;

use crate::manager::TaskScheduler;

/// Handle a running task uses to report per-item progress.
///
/// Bound to one queue record. Every call updates the record's
/// `current`/`max` fields; the observer-facing `queue` notification is
/// throttled by the scheduler so high-frequency reporters stay cheap while
/// the first and final updates always go out.
#[derive(Clone)]
pub struct ProgressReporter {
    scheduler: Arc<TaskScheduler>,
    task_id: String,
}

impl ProgressReporter {
    pub(crate) fn new(scheduler: Arc<TaskScheduler>, task_id: String) -> Self {
        Self { scheduler, task_id }
    }

    /// Record that `current` of `max` items have been processed.
    pub fn report(&self, current: u64, max: u64) {
        self.scheduler.record_progress(&self.task_id, current, max);
    }

    /// The instance id this reporter is bound to.
    pub fn task_id(&self) -> &str {
        &self.task_id
    }
}
