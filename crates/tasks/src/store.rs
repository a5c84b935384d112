//! The media store abstraction task bodies run against.

use std::path::PathBuf;

use async_trait::async_trait;
use curator_core::Timestamp;
use serde::{Deserialize, Serialize};

/// What kind of media a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

/// A media item known to the library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Content hash identifying the item; also keys cached artefacts such
    /// as `previews/<id>.png`.
    pub id: String,
    /// Absolute path of the source file inside the library.
    pub absolute_path: PathBuf,
    pub kind: MediaKind,
    /// Whether a preview is believed to exist in the cache.
    pub has_preview: bool,
    /// When the underlying file was created, once known.
    pub created_at: Option<Timestamp>,
}

/// Selection criteria for [`MediaStore::list`]. Unset fields match anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaFilter {
    pub kind: Option<MediaKind>,
    pub has_preview: Option<bool>,
}

impl MediaFilter {
    /// Whether a record satisfies every set criterion.
    pub fn matches(&self, record: &MediaRecord) -> bool {
        if let Some(kind) = self.kind {
            if record.kind != kind {
                return false;
            }
        }
        if let Some(flag) = self.has_preview {
            if record.has_preview != flag {
                return false;
            }
        }
        true
    }
}

/// Field updates applied by [`MediaStore::update`]. Unset fields are left
/// untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaPatch {
    pub has_preview: Option<bool>,
    pub created_at: Option<Timestamp>,
}

/// Read/write access to the media library index.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Ids of all records matching the filter, in stable order.
    async fn list(&self, filter: MediaFilter) -> anyhow::Result<Vec<String>>;

    /// Fetch one record by id.
    async fn get(&self, id: &str) -> anyhow::Result<Option<MediaRecord>>;

    /// Add a newly discovered record. Fails if the id is already indexed.
    async fn insert(&self, record: MediaRecord) -> anyhow::Result<()>;

    /// Apply a patch to an existing record. Fails for unknown ids.
    async fn update(&self, id: &str, patch: MediaPatch) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
