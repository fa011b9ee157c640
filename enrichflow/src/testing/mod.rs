//! Testing utilities for enrichflow pipelines.
//!
//! This module provides:
//! - Mock tools that record visitation order and write marker keys
//! - Order assertions for checking linearizations

mod assertions;
mod mocks;

pub use assertions::{assert_each_once, assert_respects_dependencies, assert_runs_before};
pub use mocks::{output_key, FailingTool, RecordingTool, SlowTool, VisitLog};
