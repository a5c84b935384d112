#![allow(dead_code)] // Each test binary uses a subset of these helpers.

use std::sync::Arc;
use std::time::Duration;

use curator_core::QueuedTask;
use curator_events::{EventBus, TaskEvent};
use curator_scheduler::{Task, TaskScheduler};
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

/// How long event waits may take before a test is considered hung.
const EVENT_WAIT: Duration = Duration::from_secs(5);

/// Build a scheduler plus a bus subscription opened before any activity.
pub fn test_scheduler() -> (Arc<TaskScheduler>, broadcast::Receiver<TaskEvent>) {
    let bus = Arc::new(EventBus::default());
    let rx = bus.subscribe();
    (TaskScheduler::new(bus), rx)
}

/// A task whose instances settle only when told to.
///
/// Each invocation of the runner waits for one message on the returned
/// channel: send `Ok(())` to complete the currently running instance,
/// `Err(..)` to fail it. Dropping the sender completes instances
/// immediately.
pub fn controlled_task(
    description: &str,
) -> (Task, mpsc::UnboundedSender<anyhow::Result<()>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let rx = Arc::new(tokio::sync::Mutex::new(rx));
    let task = Task::new(description, move |_progress| {
        let rx = Arc::clone(&rx);
        async move {
            let mut rx = rx.lock().await;
            rx.recv().await.unwrap_or(Ok(()))
        }
    });
    (task, tx)
}

/// Receive the next event, failing the test on timeout.
pub async fn next_event(rx: &mut broadcast::Receiver<TaskEvent>) -> TaskEvent {
    timeout(EVENT_WAIT, rx.recv())
        .await
        .expect("Timed out waiting for a bus event")
        .expect("Event bus closed unexpectedly")
}

/// Skip events until the given instance reports `start`.
pub async fn wait_for_started(
    rx: &mut broadcast::Receiver<TaskEvent>,
    id: &str,
) -> QueuedTask {
    loop {
        if let TaskEvent::Started { task } = next_event(rx).await {
            if task.id == id {
                return task;
            }
        }
    }
}

/// Skip events until the given instance reports `end`.
pub async fn wait_for_ended(rx: &mut broadcast::Receiver<TaskEvent>, id: &str) -> QueuedTask {
    loop {
        if let TaskEvent::Ended { task } = next_event(rx).await {
            if task.id == id {
                return task;
            }
        }
    }
}
