//! Observability utilities.

mod spans;
mod subscriber;

pub use spans::{SpanTimer, ToolSpanAttributes};
pub use subscriber::{init_tracing, DEFAULT_FILTER};
