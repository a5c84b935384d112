//! Library indexing maintenance task.
//!
//! Walks the library root for media files and registers any the index does
//! not know yet, keyed by content hash. Already-indexed files are left
//! untouched, so re-running the task is cheap and idempotent apart from
//! re-hashing.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use curator_pipeline::{execute, ExecuteOptions, ExecutionPlan};
use curator_scheduler::{ProgressReporter, Task};
use walkdir::WalkDir;

use crate::hashing::hash_file;
use crate::store::{MediaKind, MediaRecord, MediaStore};

/// Task type id this task is registered under.
pub const TASK_INDEX_LIBRARY: &str = "index-library";

/// How many files are hashed and registered concurrently.
const INDEX_BATCH_SIZE: usize = 8;

/// Video container extensions the library indexes.
pub const VIDEO_EXTENSIONS: &[&str] = &["avi", "m4v", "mkv", "mov", "mp4", "mpg", "webm", "wmv"];

/// Image extensions the library indexes.
pub const IMAGE_EXTENSIONS: &[&str] = &["bmp", "gif", "jpeg", "jpg", "png", "webp"];

/// Classify a file by extension; `None` means it is not media we index.
fn classify(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else {
        None
    }
}

struct IndexContext {
    store: Arc<dyn MediaStore>,
    progress: ProgressReporter,
    total: u64,
    done: AtomicU64,
}

/// Build the "Index new files in the library" task.
pub fn index_library(store: Arc<dyn MediaStore>, library_path: impl Into<PathBuf>) -> Task {
    let library_path = library_path.into();
    Task::new("Index new files in the library", move |progress| {
        let store = Arc::clone(&store);
        let root = library_path.clone();
        async move {
            execute(
                || async {
                    // Walking the tree is synchronous work; keep it off the
                    // runtime threads.
                    let files =
                        tokio::task::spawn_blocking(move || scan_media_files(&root)).await??;
                    let total = files.len() as u64;
                    progress.report(0, total);
                    Ok(ExecutionPlan {
                        items: files,
                        state: IndexContext {
                            store,
                            progress,
                            total,
                            done: AtomicU64::new(0),
                        },
                    })
                },
                |(path, kind), ctx| async move {
                    let id = hash_file(&path).await?;
                    if ctx.store.get(&id).await?.is_none() {
                        tracing::info!(
                            media_id = %id,
                            path = %path.display(),
                            "Indexed new media file",
                        );
                        ctx.store
                            .insert(MediaRecord {
                                id,
                                absolute_path: path,
                                kind,
                                has_preview: false,
                                created_at: None,
                            })
                            .await?;
                    }

                    let done = ctx.done.fetch_add(1, Ordering::Relaxed);
                    ctx.progress.report(done, ctx.total);
                    Ok(())
                },
                ExecuteOptions {
                    parallel: INDEX_BATCH_SIZE,
                },
            )
            .await
        }
    })
}

/// Collect all media files under the library root.
fn scan_media_files(root: &Path) -> anyhow::Result<Vec<(PathBuf, MediaKind)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if let Some(kind) = classify(&path) {
            files.push((path, kind));
        }
    }
    Ok(files)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
