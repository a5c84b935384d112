//! Preview verification maintenance task.
//!
//! Videos are flagged `has_preview` when their preview image is generated
//! into the cache. Cache directories get pruned, moved, or restored from
//! partial backups, so the flag can go stale; this task walks every flagged
//! video and clears the flag wherever the image is actually gone, letting
//! the preview generator re-create it on the next pass.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use curator_pipeline::{execute, ExecuteOptions, ExecutionPlan};
use curator_scheduler::{ProgressReporter, Task};

use crate::store::{MediaFilter, MediaKind, MediaPatch, MediaStore};

/// Task type id this task is registered under.
pub const TASK_VERIFY_PREVIEWS: &str = "verify-previews";

/// How many preview checks run concurrently.
const PREVIEW_BATCH_SIZE: usize = 8;

struct VerifyContext {
    store: Arc<dyn MediaStore>,
    previews_dir: PathBuf,
    progress: ProgressReporter,
    total: u64,
    done: AtomicU64,
}

/// Build the "Verify previews exist" task.
pub fn verify_previews(store: Arc<dyn MediaStore>, cache_path: impl Into<PathBuf>) -> Task {
    let cache_path = cache_path.into();
    Task::new("Verify previews exist", move |progress| {
        let store = Arc::clone(&store);
        let previews_dir = cache_path.join("previews");
        async move {
            execute(
                || async {
                    let ids = store
                        .list(MediaFilter {
                            kind: Some(MediaKind::Video),
                            has_preview: Some(true),
                        })
                        .await?;
                    let total = ids.len() as u64;
                    progress.report(0, total);
                    Ok(ExecutionPlan {
                        items: ids,
                        state: VerifyContext {
                            store,
                            previews_dir,
                            progress,
                            total,
                            done: AtomicU64::new(0),
                        },
                    })
                },
                |id, ctx| async move {
                    let Some(media) = ctx.store.get(&id).await? else {
                        anyhow::bail!("Failed to find media for id: {id}");
                    };

                    let preview = ctx.previews_dir.join(format!("{}.png", media.id));
                    let exists = tokio::fs::try_exists(&preview).await.unwrap_or(false);
                    if !exists {
                        tracing::warn!(
                            media_id = %media.id,
                            path = %media.absolute_path.display(),
                            "Preview missing, clearing flag",
                        );
                        ctx.store
                            .update(
                                &media.id,
                                MediaPatch {
                                    has_preview: Some(false),
                                    ..Default::default()
                                },
                            )
                            .await?;
                    }

                    let done = ctx.done.fetch_add(1, Ordering::Relaxed);
                    ctx.progress.report(done, ctx.total);
                    Ok(())
                },
                ExecuteOptions {
                    parallel: PREVIEW_BATCH_SIZE,
                },
            )
            .await
        }
    })
}
