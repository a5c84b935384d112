//! Curator task event infrastructure.
//!
//! Provides the building blocks the API/WebSocket layer subscribes to:
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`TaskEvent`] — the queue-state notifications published by the
//!   scheduler (`queue`, `start`, `end`).

pub mod bus;

pub use bus::{EventBus, TaskEvent};
