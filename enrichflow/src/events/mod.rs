//! Progress notification for pipeline runs.
//!
//! The executor reports coarse per-tool phase transitions to an optional
//! [`ProgressSink`]. Sinks are observers only: a missing or panicking sink
//! never changes the outcome of a run.

mod sink;

pub use sink::{
    CollectingProgressSink, LoggingProgressSink, NoOpProgressSink, ProgressEvent, ProgressSink,
    ToolPhase,
};

use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::warn;

/// Delivers an event to a sink, swallowing any panic raised by the sink.
pub(crate) fn notify_guarded(sink: &dyn ProgressSink, event: &ProgressEvent) {
    if catch_unwind(AssertUnwindSafe(|| sink.notify(event))).is_err() {
        warn!(
            tool = %event.tool,
            phase = event.phase.as_str(),
            "Progress sink panicked; ignoring"
        );
    }
}
