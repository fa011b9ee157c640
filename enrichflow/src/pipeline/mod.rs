//! Dependency-ordered tool execution.
//!
//! This module provides:
//! - Dependency graph construction and validation
//! - Deterministic topological scheduling
//! - The sequential, fail-fast [`Pipeline`] executor

mod executor;
mod graph;
mod report;
mod scheduler;

pub use executor::{Pipeline, RunState};
pub use graph::DependencyGraph;
pub use report::{ExecutionReport, ToolTiming};
pub use scheduler::topological_order;
