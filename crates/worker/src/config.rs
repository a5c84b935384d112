//! Daemon configuration loaded from environment variables.

use std::path::{Path, PathBuf};

use curator_core::CoreError;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root directory of the media library.
    pub library_path: PathBuf,
    /// Cache directory holding the index and derived artefacts (previews,
    /// thumbnails). Must not live inside the library.
    pub cache_path: PathBuf,
    /// Task types queued automatically at startup.
    pub startup_tasks: Vec<String>,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var         | Default                       |
    /// |-----------------|-------------------------------|
    /// | `LIBRARY_PATH`  | (required)                    |
    /// | `CACHE_PATH`    | (required)                    |
    /// | `STARTUP_TASKS` | (none; comma-separated ids)   |
    pub fn from_env() -> Result<Self, CoreError> {
        let library_path = std::env::var("LIBRARY_PATH")
            .map(PathBuf::from)
            .map_err(|_| CoreError::Validation("LIBRARY_PATH must be set".to_string()))?;

        let cache_path = std::env::var("CACHE_PATH")
            .map(PathBuf::from)
            .map_err(|_| CoreError::Validation("CACHE_PATH must be set".to_string()))?;

        let startup_tasks = std::env::var("STARTUP_TASKS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            library_path,
            cache_path,
            startup_tasks,
        })
    }

    /// Validate the configured paths.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_paths(&self.library_path, &self.cache_path)
    }
}

/// Path rules for the library/cache layout.
///
/// The library must exist; the cache must not live inside the library, so
/// derived artefacts can never be indexed as media. The cache itself may be
/// missing (it is created on startup).
pub fn validate_paths(library: &Path, cache: &Path) -> Result<(), CoreError> {
    if !library.is_dir() {
        return Err(CoreError::Validation(format!(
            "Library path does not exist: {}",
            library.display()
        )));
    }

    let library_abs = std::path::absolute(library).map_err(|err| {
        CoreError::Validation(format!("Library path cannot be resolved: {err}"))
    })?;
    let cache_abs = std::path::absolute(cache).map_err(|err| {
        CoreError::Validation(format!("Cache path cannot be resolved: {err}"))
    })?;

    if cache_abs.starts_with(&library_abs) {
        return Err(CoreError::Validation(
            "Cache folder cannot be inside the library".to_string(),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
