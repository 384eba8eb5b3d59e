use serde::Serialize;
use std::cell::RefCell;

///
/// MetricsState
/// Process-local operation counters, readable as a snapshot for
/// diagnostics and tests.
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct MetricsState {
    pub create_calls: u64,
    pub insert_calls: u64,
    pub update_calls: u64,
    pub delete_calls: u64,

    pub records_created: u64,
    pub records_deleted: u64,
    pub fields_changed: u64,

    pub recomputes: u64,
    pub recompute_cycles: u64,

    pub batches_flushed: u64,
}

thread_local! {
    static STATE: RefCell<MetricsState> = RefCell::new(MetricsState::default());
}

pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut MetricsState) -> R) -> R {
    STATE.with_borrow_mut(f)
}

/// Copy of the current counters.
#[must_use]
pub fn snapshot() -> MetricsState {
    STATE.with_borrow(Clone::clone)
}

/// Zero all counters (test isolation).
pub fn reset() {
    STATE.with_borrow_mut(|state| *state = MetricsState::default());
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_increments() {
        reset();
        with_state_mut(|m| m.recomputes += 3);
        assert_eq!(snapshot().recomputes, 3);
        reset();
        assert_eq!(snapshot().recomputes, 0);
    }
}
