//! Creation-time backfill maintenance task.
//!
//! Files imported before creation times were tracked have no `created_at`;
//! this task fills the gap from filesystem metadata so date-ordered views
//! sort the whole library, not just recent imports.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use curator_core::Timestamp;
use curator_pipeline::{execute, ExecuteOptions, ExecutionPlan};
use curator_scheduler::{ProgressReporter, Task};

use crate::store::{MediaFilter, MediaPatch, MediaStore};

/// Task type id this task is registered under.
pub const TASK_BACKFILL_CREATE_TIMES: &str = "create-times";

/// How many metadata reads run concurrently.
const CREATE_TIME_BATCH_SIZE: usize = 8;

struct BackfillContext {
    store: Arc<dyn MediaStore>,
    progress: ProgressReporter,
    total: u64,
    done: AtomicU64,
}

/// Build the "Get missing file creation times" task.
///
/// Progress counts files actually backfilled; records that already carry a
/// creation time pass through silently.
pub fn backfill_create_times(store: Arc<dyn MediaStore>) -> Task {
    Task::new("Get missing file creation times", move |progress| {
        let store = Arc::clone(&store);
        async move {
            execute(
                || async {
                    let ids = store.list(MediaFilter::default()).await?;
                    let total = ids.len() as u64;
                    Ok(ExecutionPlan {
                        items: ids,
                        state: BackfillContext {
                            store,
                            progress,
                            total,
                            done: AtomicU64::new(0),
                        },
                    })
                },
                |id, ctx| async move {
                    let Some(media) = ctx.store.get(&id).await? else {
                        tracing::warn!(media_id = %id, "Unable to get media, skipping");
                        return Ok(());
                    };
                    if media.created_at.is_some() {
                        return Ok(());
                    }

                    let created_at = file_creation_time(&media.absolute_path).await?;
                    ctx.store
                        .update(
                            &media.id,
                            MediaPatch {
                                created_at: Some(created_at),
                                ..Default::default()
                            },
                        )
                        .await?;

                    let done = ctx.done.fetch_add(1, Ordering::Relaxed);
                    ctx.progress.report(done, ctx.total);
                    Ok(())
                },
                ExecuteOptions {
                    parallel: CREATE_TIME_BATCH_SIZE,
                },
            )
            .await
        }
    })
}

/// Read a file's creation time, falling back to its modification time on
/// filesystems that do not record one.
async fn file_creation_time(path: &Path) -> anyhow::Result<Timestamp> {
    let metadata = tokio::fs::metadata(path).await?;
    let system_time = metadata.created().or_else(|_| metadata.modified())?;
    Ok(system_time.into())
}
