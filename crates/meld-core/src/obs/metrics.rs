use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// MergeState
/// Ephemeral, in-memory counters for merge operations.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MergeState {
    pub ops: MergeOps,
    pub entities: BTreeMap<String, EntityCounters>,
}

///
/// MergeOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MergeOps {
    // Entry points
    pub patch_calls: u64,
    pub put_calls: u64,

    // Structural outcomes
    pub fields_consumed: u64,
    pub identifier_replacements: u64,
    pub degraded_passes: u64,

    // Rejections
    pub payload_rejections: u64,
}

///
/// EntityCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EntityCounters {
    pub patch_calls: u64,
    pub put_calls: u64,
    pub fields_consumed: u64,
    pub identifier_replacements: u64,
}

/// MergeReport
/// Point-in-time snapshot of the counter state.
pub type MergeReport = MergeState;

thread_local! {
    static MERGE_STATE: RefCell<MergeState> = RefCell::new(MergeState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&MergeState) -> R) -> R {
    MERGE_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut MergeState) -> R) -> R {
    MERGE_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters (useful in tests).
pub fn reset_all() {
    with_state_mut(|m| *m = MergeState::default());
}

#[must_use]
pub(crate) fn report() -> MergeReport {
    with_state(Clone::clone)
}
