//! Filesystem-backed media store keeping its index as a JSON document.
//!
//! The whole index lives at `{cache}/index.json` and is rewritten on every
//! mutation. That is deliberate: the library index is small relative to the
//! media it describes, and a single document keeps the cache directory
//! self-contained and easy to inspect.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::{MediaFilter, MediaPatch, MediaRecord, MediaStore};

/// Name of the index document inside the cache directory.
const INDEX_FILE: &str = "index.json";

/// JSON-index-backed [`MediaStore`].
///
/// Thread-safe via an interior `RwLock`; designed to be wrapped in `Arc`
/// and shared between the scheduler's task bodies.
pub struct JsonStore {
    index_path: PathBuf,
    records: RwLock<BTreeMap<String, MediaRecord>>,
}

impl JsonStore {
    /// Open the store under the given cache directory, loading an existing
    /// index when present.
    pub async fn open(cache_path: &Path) -> anyhow::Result<Self> {
        let index_path = cache_path.join(INDEX_FILE);
        let records = match tokio::fs::read(&index_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            index_path,
            records: RwLock::new(records),
        })
    }

    /// Number of records currently indexed.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the index currently holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

/// Persist the index. Writes a sibling temp file first and renames it over
/// the index so a crash mid-write cannot truncate the existing document.
async fn persist(
    index_path: &Path,
    records: &BTreeMap<String, MediaRecord>,
) -> anyhow::Result<()> {
    let serialized = serde_json::to_vec_pretty(records)?;
    let tmp_path = index_path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &serialized).await?;
    tokio::fs::rename(&tmp_path, index_path).await?;
    Ok(())
}

#[async_trait]
impl MediaStore for JsonStore {
    async fn list(&self, filter: MediaFilter) -> anyhow::Result<Vec<String>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|record| filter.matches(record))
            .map(|record| record.id.clone())
            .collect())
    }

    async fn get(&self, id: &str) -> anyhow::Result<Option<MediaRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn insert(&self, record: MediaRecord) -> anyhow::Result<()> {
        // The write guard is held across the save so concurrent mutations
        // cannot interleave their index writes.
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            anyhow::bail!("Media already indexed: {}", record.id);
        }
        records.insert(record.id.clone(), record);
        persist(&self.index_path, &records).await
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
        persist(&self.index_path, &records).await
    }
}
