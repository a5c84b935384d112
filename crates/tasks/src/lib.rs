//! Built-in maintenance tasks for the media library.
//!
//! Each task body iterates the collection through the bounded-parallel
//! pipeline engine and reports per-item progress to the scheduler. The
//! [`MediaStore`] trait is all a body knows about the library, so tests
//! drive them against an in-memory fake while the daemon wires in the
//! JSON-index-backed [`JsonStore`].

pub mod create_times;
pub mod hashing;
pub mod indexer;
pub mod json_store;
pub mod preview_verifier;
pub mod store;

pub use create_times::{backfill_create_times, TASK_BACKFILL_CREATE_TIMES};
pub use indexer::{index_library, TASK_INDEX_LIBRARY};
pub use json_store::JsonStore;
pub use preview_verifier::{verify_previews, TASK_VERIFY_PREVIEWS};
pub use store::{MediaFilter, MediaKind, MediaPatch, MediaRecord, MediaStore};
