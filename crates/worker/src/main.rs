//! The curator maintenance daemon.
//!
//! Wires the media store, event bus, and task scheduler together, registers
//! the built-in maintenance tasks, queues any configured startup tasks, and
//! runs until terminated.

mod config;

use std::sync::Arc;
use std::time::Duration;

use curator_events::{EventBus, TaskEvent};
use curator_scheduler::TaskScheduler;
use curator_tasks::{
    backfill_create_times, index_library, verify_previews, JsonStore, MediaStore,
    TASK_BACKFILL_CREATE_TIMES, TASK_INDEX_LIBRARY, TASK_VERIFY_PREVIEWS,
};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::WorkerConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "curator_worker=debug,curator_scheduler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env().expect("Invalid worker configuration");
    config.validate().expect("Invalid library/cache layout");
    tracing::info!(
        library = %config.library_path.display(),
        cache = %config.cache_path.display(),
        "Loaded worker configuration",
    );

    // --- Media store ---
    tokio::fs::create_dir_all(&config.cache_path)
        .await
        .expect("Failed to create cache directory");
    let store = Arc::new(
        JsonStore::open(&config.cache_path)
            .await
            .expect("Failed to open media index"),
    );
    tracing::info!(media_count = store.len().await, "Media index loaded");

    // --- Event bus + scheduler ---
    let bus = Arc::new(EventBus::default());
    let scheduler = TaskScheduler::new(Arc::clone(&bus));

    let media: Arc<dyn MediaStore> = store;
    scheduler
        .register(
            TASK_INDEX_LIBRARY,
            index_library(Arc::clone(&media), &config.library_path),
        )
        .expect("Failed to register library indexing task");
    scheduler
        .register(
            TASK_VERIFY_PREVIEWS,
            verify_previews(Arc::clone(&media), &config.cache_path),
        )
        .expect("Failed to register preview verification task");
    scheduler
        .register(
            TASK_BACKFILL_CREATE_TIMES,
            backfill_create_times(Arc::clone(&media)),
        )
        .expect("Failed to register creation-time backfill task");
    tracing::info!(task_count = scheduler.tasks().len(), "Registered maintenance tasks");

    // --- Event logger ---
    let cancel = CancellationToken::new();
    let logger_handle = tokio::spawn(log_events(bus.subscribe(), cancel.clone()));

    // --- Startup tasks ---
    for task_type in &config.startup_tasks {
        match scheduler.enqueue(task_type) {
            Ok(id) => tracing::info!(task_id = %id, "Queued startup task"),
            Err(err) => {
                tracing::warn!(task_type = %task_type, error = %err, "Failed to queue startup task")
            }
        }
    }

    // --- Run until terminated ---
    shutdown_signal().await;
    tracing::info!("Shutting down");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), logger_handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Log queue activity so an operator can follow task lifecycles from the
/// daemon output alone.
async fn log_events(mut rx: broadcast::Receiver<TaskEvent>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Ok(TaskEvent::Started { task }) => {
                    tracing::info!(task_id = %task.id, description = %task.description, "Task started");
                }
                Ok(TaskEvent::Ended { task }) => match task.error {
                    Some(error) => {
                        tracing::error!(task_id = %task.id, error = %error, "Task failed");
                    }
                    None => {
                        tracing::info!(
                            task_id = %task.id,
                            current = task.current,
                            max = task.max,
                            "Task finished",
                        );
                    }
                },
                Ok(TaskEvent::Queue { tasks }) => {
                    tracing::debug!(queued = tasks.len(), "Queue changed");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the daemon shuts
/// down cleanly whether stopped interactively or by a process manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
