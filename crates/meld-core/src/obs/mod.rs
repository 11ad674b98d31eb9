//! Observability: merge telemetry counters and the sink boundary.
//!
//! Merge logic never touches the counter state directly; every
//! instrumentation point goes through `MergeEvent` and `MergeSink`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::MergeReport;
pub use sink::{MergeEvent, MergeSink, merge_report, merge_reset_all, with_merge_sink};

pub(crate) use sink::record;
