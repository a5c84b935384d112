#![allow(dead_code)] // Each test binary uses a subset of these helpers.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use curator_core::QueuedTask;
use curator_events::{EventBus, TaskEvent};
use curator_scheduler::{Task, TaskScheduler};
use curator_tasks::{MediaFilter, MediaKind, MediaPatch, MediaRecord, MediaStore};
use tokio::sync::RwLock;
use tokio::time::timeout;

/// In-memory media store for exercising task bodies without a filesystem
/// index. Reads can be made to fail to simulate a lost index.
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, MediaRecord>>,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new(records: impl IntoIterator<Item = MediaRecord>) -> Arc<Self> {
        Arc::new(Self {
            records: RwLock::new(
                records
                    .into_iter()
                    .map(|record| (record.id.clone(), record))
                    .collect(),
            ),
            fail_reads: AtomicBool::new(false),
        })
    }

    /// Make every subsequent read fail.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Direct record access for assertions; never fails.
    pub async fn record(&self, id: &str) -> Option<MediaRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// All records, for assertions over indexer output.
    pub async fn all(&self) -> Vec<MediaRecord> {
        self.records.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn list(&self, filter: MediaFilter) -> anyhow::Result<Vec<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            anyhow::bail!("media index unavailable");
        }
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|record| filter.matches(record))
            .map(|record| record.id.clone())
            .collect())
    }

    async fn get(&self, id: &str) -> anyhow::Result<Option<MediaRecord>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            anyhow::bail!("media index unavailable");
        }
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn insert(&self, record: MediaRecord) -> anyhow::Result<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            anyhow::bail!("Media already indexed: {}", record.id);
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn update(&self, id: &str, patch: MediaPatch) -> anyhow::Result<()> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(id) else {
            anyhow::bail!("Failed to find media for id: {id}");
        };
        if let Some(has_preview) = patch.has_preview {
            record.has_preview = has_preview;
        }
        if let Some(created_at) = patch.created_at {
            record.created_at = Some(created_at);
        }
        Ok(())
    }
}

/// Build a media record with sensible defaults.
pub fn record(id: &str, kind: MediaKind, path: &Path, has_preview: bool) -> MediaRecord {
    MediaRecord {
        id: id.to_string(),
        absolute_path: path.to_path_buf(),
        kind,
        has_preview,
        created_at: None,
    }
}

/// Register the task, enqueue one instance through a real scheduler, and
/// wait for it to settle. Returns the ended record.
pub async fn run_task(task_type: &str, task: Task) -> QueuedTask {
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let scheduler = TaskScheduler::new(bus);
    scheduler.register(task_type, task).expect("register task");
    scheduler.enqueue(task_type).expect("enqueue task");

    loop {
        let event = timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("Timed out waiting for the task to settle")
            .expect("Event bus closed unexpectedly");
        if let TaskEvent::Ended { task } = event {
            return task;
        }
    }
}
