//! Run-slot allocation for queued task instances.
//!
//! Each admitted instance gets an id of the form `"<task_type>-<slot>"`
//! where the slot is the smallest free integer in `[0, MAX_TASK_QUEUE_SIZE)`.
//! Slots keep instance ids short and stable for display and make them
//! reusable as soon as the owning record leaves the queue.

use crate::task::MAX_TASK_QUEUE_SIZE;

/// Find the smallest free run slot given the ids of all live queue entries.
///
/// A slot `i` is taken while any live id ends with `"-{i}"`, regardless of
/// task type: the slot space is global because it has the same size as the
/// queue cap. Returns `None` when every slot is in use.
pub fn find_free_slot(live_ids: &[&str]) -> Option<usize> {
    (0..MAX_TASK_QUEUE_SIZE).find(|slot| {
        let suffix = format!("-{slot}");
        !live_ids.iter().any(|id| id.ends_with(&suffix))
    })
}

/// Format an instance id from a task type and an allocated slot.
pub fn instance_id(task_type: &str, slot: usize) -> String {
    format!("{task_type}-{slot}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_queue_allocates_slot_zero() {
        assert_eq!(find_free_slot(&[]), Some(0));
    }

    #[test]
    fn next_slot_after_dense_prefix() {
        assert_eq!(find_free_slot(&["verify-0", "verify-1"]), Some(2));
    }

    #[test]
    fn freed_gap_is_reused_first() {
        assert_eq!(find_free_slot(&["verify-0", "verify-2"]), Some(1));
    }

    #[test]
    fn slots_are_shared_across_task_types() {
        // "thumbnails-0" occupies slot 0 even for a "verify" enqueue.
        assert_eq!(find_free_slot(&["thumbnails-0"]), Some(1));
    }

    #[test]
    fn double_digit_slots_do_not_shadow_single_digit_ones() {
        // "verify-10" must not block slot 0 or slot 1.
        assert_eq!(find_free_slot(&["verify-10"]), Some(0));
    }

    #[test]
    fn exhausted_slot_space_returns_none() {
        let ids: Vec<String> = (0..MAX_TASK_QUEUE_SIZE)
            .map(|slot| instance_id("verify", slot))
            .collect();
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();

        assert_eq!(find_free_slot(&ids), None);
    }

    #[test]
    fn instance_id_joins_type_and_slot() {
        assert_eq!(instance_id("verify", 3), "verify-3");
    }
}
