//! Integration tests for progress reporting and throttling.
//!
//! The throttle interval is driven with tokio's paused test clock so the
//! timing assertions are exact rather than sleep-and-hope.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{next_event, test_scheduler, wait_for_ended};
use curator_events::TaskEvent;
use curator_scheduler::Task;
use tokio::sync::Notify;

/// Run a reporting task to completion and collect the `current` values of
/// every forwarded queue event that shows the instance running.
async fn collect_forwarded(
    rx: &mut tokio::sync::broadcast::Receiver<TaskEvent>,
    id: &str,
) -> Vec<u64> {
    let mut forwarded = Vec::new();
    loop {
        match next_event(rx).await {
            TaskEvent::Queue { tasks } => {
                if let Some(record) = tasks.iter().find(|t| t.id == id) {
                    if record.running {
                        forwarded.push(record.current);
                    }
                }
            }
            TaskEvent::Ended { task } if task.id == id => {
                assert!(
                    task.error.is_none(),
                    "Reporting task should complete cleanly, got: {:?}",
                    task.error
                );
                break;
            }
            _ => {}
        }
    }
    forwarded
}

// ---------------------------------------------------------------------------
// Test: first and final updates forward even within the same instant
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn first_and_final_updates_forward_within_the_same_instant() {
    let (scheduler, mut rx) = test_scheduler();
    let task = Task::new("Verify previews exist", |progress| async move {
        progress.report(0, 2);
        progress.report(1, 2);
        Ok(())
    });
    scheduler.register("verify", task).expect("register verify");
    scheduler.enqueue("verify").expect("enqueue");

    let forwarded = collect_forwarded(&mut rx, "verify-0").await;

    assert_eq!(forwarded, vec![0, 1]);
}

// ---------------------------------------------------------------------------
// Test: intermediate updates are throttled to the emission interval
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn intermediate_updates_are_throttled() {
    let (scheduler, mut rx) = test_scheduler();
    let task = Task::new("Verify previews exist", |progress| async move {
        progress.report(0, 10);
        // Same instant as the last forwarded update: suppressed.
        progress.report(1, 10);
        progress.report(2, 10);
        // Let the emission interval elapse, then report again.
        tokio::time::sleep(Duration::from_millis(1001)).await;
        progress.report(3, 10);
        // Same instant again: suppressed.
        progress.report(4, 10);
        // Final update: always forwarded.
        progress.report(9, 10);
        Ok(())
    });
    scheduler.register("verify", task).expect("register verify");
    scheduler.enqueue("verify").expect("enqueue");

    let forwarded = collect_forwarded(&mut rx, "verify-0").await;

    assert_eq!(forwarded, vec![0, 3, 9]);
}

// ---------------------------------------------------------------------------
// Test: suppressed reports still update the queue record
// ---------------------------------------------------------------------------

#[tokio::test]
async fn suppressed_reports_still_update_the_record() {
    let (scheduler, mut rx) = test_scheduler();
    let reported = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let reported_tx = Arc::clone(&reported);
    let release_rx = Arc::clone(&release);

    let task = Task::new("Verify previews exist", move |progress| {
        let reported = Arc::clone(&reported_tx);
        let release = Arc::clone(&release_rx);
        async move {
            progress.report(0, 10);
            // Within the throttle interval: no event goes out for this one.
            progress.report(5, 10);
            reported.notify_one();
            release.notified().await;
            Ok(())
        }
    });
    scheduler.register("verify", task).expect("register verify");
    scheduler.enqueue("verify").expect("enqueue");

    tokio::time::timeout(Duration::from_secs(5), reported.notified())
        .await
        .expect("The runner should have reported progress");

    let queue = scheduler.queue();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].current, 5);
    assert_eq!(queue[0].max, 10);

    release.notify_one();
    wait_for_ended(&mut rx, "verify-0").await;
}
