//! Bounded-parallel iteration over a prepared work list.
//!
//! Long-running task bodies use [`execute`] to fan a per-item worker out
//! over a media collection with a fixed concurrency cap. An async
//! initializer produces the items plus any state shared by all workers; the
//! first worker failure stops further dispatch and is propagated once the
//! items already in flight have finished.

pub mod executor;

pub use executor::{execute, ExecuteOptions, ExecutionPlan};
