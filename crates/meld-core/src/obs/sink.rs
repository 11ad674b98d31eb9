//! Metrics sink boundary.
//!
//! Merge logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MergeEvent and MergeSink.
use crate::obs::metrics;
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MergeSink>> = const { RefCell::new(None) };
}

///
/// MergeEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MergeEvent {
    PatchApplied {
        entity_path: &'static str,
        fields_consumed: u64,
    },
    PutApplied {
        entity_path: &'static str,
    },
    IdentifierReplacement {
        entity_path: &'static str,
    },
    DegradedPass,
    PayloadRejected,
}

///
/// MergeSink
///

pub trait MergeSink {
    fn record(&self, event: MergeEvent);
}

/// GlobalMergeSink
/// Default process-local sink that writes into global counter state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMergeSink;

impl MergeSink for GlobalMergeSink {
    fn record(&self, event: MergeEvent) {
        match event {
            MergeEvent::PatchApplied {
                entity_path,
                fields_consumed,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.patch_calls = m.ops.patch_calls.saturating_add(1);
                    m.ops.fields_consumed = m.ops.fields_consumed.saturating_add(fields_consumed);

                    let entry = m.entities.entry(entity_path.to_string()).or_default();
                    entry.patch_calls = entry.patch_calls.saturating_add(1);
                    entry.fields_consumed = entry.fields_consumed.saturating_add(fields_consumed);
                });
            }

            MergeEvent::PutApplied { entity_path } => {
                metrics::with_state_mut(|m| {
                    m.ops.put_calls = m.ops.put_calls.saturating_add(1);
                    let entry = m.entities.entry(entity_path.to_string()).or_default();
                    entry.put_calls = entry.put_calls.saturating_add(1);
                });
            }

            MergeEvent::IdentifierReplacement { entity_path } => {
                metrics::with_state_mut(|m| {
                    m.ops.identifier_replacements =
                        m.ops.identifier_replacements.saturating_add(1);
                    let entry = m.entities.entry(entity_path.to_string()).or_default();
                    entry.identifier_replacements =
                        entry.identifier_replacements.saturating_add(1);
                });
            }

            MergeEvent::DegradedPass => {
                metrics::with_state_mut(|m| {
                    m.ops.degraded_passes = m.ops.degraded_passes.saturating_add(1);
                });
            }

            MergeEvent::PayloadRejected => {
                metrics::with_state_mut(|m| {
                    m.ops.payload_rejections = m.ops.payload_rejections.saturating_add(1);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_MERGE_SINK: GlobalMergeSink = GlobalMergeSink;

pub(crate) fn record(event: MergeEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // Preconditions:
        // - `ptr` was produced from a valid `&dyn MergeSink` in `with_merge_sink`.
        // - `with_merge_sink` always restores the previous pointer before returning,
        //   including unwind paths via `Guard::drop`.
        // - `record` is synchronous and never stores `ptr` beyond this call.
        //
        // Aliasing:
        // - We materialize only a shared reference (`&dyn MergeSink`), matching the
        //   original shared borrow used to install the override.
        // - No mutable alias to the same sink is created here.
        //
        // What would break this:
        // - If `with_merge_sink` failed to restore on all exits (normal + panic),
        //   `ptr` could outlive the borrowed sink and become dangling.
        // - If `record` were changed to store or dispatch asynchronously using `ptr`,
        //   lifetime assumptions would no longer hold.
        unsafe { (&*ptr).record(event) };
    } else {
        GLOBAL_MERGE_SINK.record(event);
    }
}

/// Snapshot the current counter state for endpoint/test plumbing.
#[must_use]
pub fn merge_report() -> metrics::MergeReport {
    metrics::report()
}

/// Reset all counter state.
pub fn merge_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary merge sink override.
pub fn with_merge_sink<T>(sink: &dyn MergeSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn MergeSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // Preconditions:
    // - `sink_ptr` is installed only for this dynamic scope.
    // - `Guard` always restores the previous slot on all exits, including panic.
    // - `record` only dereferences synchronously and never persists `sink_ptr`.
    //
    // Aliasing:
    // - We erase lifetime to a raw pointer, but still only expose shared access.
    // - No mutable alias to the same sink is introduced by this conversion.
    //
    // What would break this:
    // - Any async/deferred use of `sink_ptr` beyond this scope.
    // - Any path that bypasses Guard restoration.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn MergeSink, *const dyn MergeSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| {
        let mut slot = cell.borrow_mut();
        slot.replace(sink_ptr)
    });
    let _guard = Guard(prev);

    f()
}
