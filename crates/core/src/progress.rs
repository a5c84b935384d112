//! Progress notification throttling.
//!
//! A running task may report progress arbitrarily often (once per media
//! item, potentially millions of times). The record is updated on every
//! call; the decision below bounds how often observers are notified while
//! guaranteeing they always see the first and last updates.

use std::time::Duration;

/// Minimum interval between throttled progress notifications.
pub const PROGRESS_EMIT_INTERVAL: Duration = Duration::from_millis(1000);

/// Decide whether a progress update must be forwarded to observers.
///
/// Forwards when the update is the first (`current == 0`), final
/// (`current >= max - 1`), or at least [`PROGRESS_EMIT_INTERVAL`] has
/// elapsed since the last forwarded update. `since_last` is `None` when
/// nothing has been forwarded yet.
pub fn should_forward(current: u64, max: u64, since_last: Option<Duration>) -> bool {
    if current == 0 || current >= max.saturating_sub(1) {
        return true;
    }
    match since_last {
        Some(elapsed) => elapsed >= PROGRESS_EMIT_INTERVAL,
        None => true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
