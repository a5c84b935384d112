//! Curator background task scheduler.
//!
//! [`TaskScheduler`] admits queued instances of registered task types, runs
//! exactly one at a time, throttles per-item progress notifications, and
//! reports lifecycle events on the shared event bus. Task bodies are opaque
//! async operations handed a [`ProgressReporter`]; a failing body marks its
//! queue record errored without disturbing later entries or the host
//! process.

pub mod manager;
pub mod progress;
pub mod task;

pub use manager::TaskScheduler;
pub use progress::ProgressReporter;
pub use task::Task;
