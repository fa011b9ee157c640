//! Per-run state shared by every tool.
//!
//! This module provides:
//! - [`Baggage`], the single mutable key/value store written and read by tools
//! - [`BaggageKey`], typed accessors naming a slot and its value type
//! - [`RunContext`], the read-only run environment (identity, cancellation, progress)

mod baggage;
mod identity;
mod run;

pub use baggage::{Baggage, BaggageKey, Lookup};
pub use identity::RunIdentity;
pub use run::RunContext;
