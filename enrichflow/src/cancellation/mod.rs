//! Cooperative cancellation for pipeline runs.
//!
//! The executor threads a single [`CancellationToken`] through every tool
//! invocation. Tools observe it around their own blocking operations.

mod token;

pub use token::{CancellationToken, Cancelled};
