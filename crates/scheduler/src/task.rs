//! Task definitions: what the scheduler runs.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::progress::ProgressReporter;

/// Future returned by a task runner.
pub type TaskFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

type RunnerFn = dyn Fn(ProgressReporter) -> TaskFuture + Send + Sync;

/// An immutable task definition: a human-readable description plus the
/// runner invoked for each queued instance.
///
/// Registered once at startup under a task type id and never mutated or
/// removed. The runner may be invoked many times over the process lifetime,
/// once per admitted instance, and reports per-item progress through the
/// [`ProgressReporter`] it is handed.
#[derive(Clone)]
pub struct Task {
    description: String,
    runner: Arc<RunnerFn>,
}

impl Task {
    /// Build a task definition from a description and an async runner.
    pub fn new<F, Fut>(description: impl Into<String>, runner: F) -> Self
    where
        F: Fn(ProgressReporter) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            description: description.into(),
            runner: Arc::new(move |progress| Box::pin(runner(progress))),
        }
    }

    /// Description shown in task listings and queue records.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Invoke the runner for one instance.
    pub(crate) fn run(&self, progress: ProgressReporter) -> TaskFuture {
        (self.runner)(progress)
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
