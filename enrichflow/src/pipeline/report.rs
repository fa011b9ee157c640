//! Summary returned by a successful run.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Elapsed time of one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolTiming {
    /// Tool name.
    pub tool: String,
    /// Elapsed milliseconds of its `process` call.
    pub duration_ms: f64,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// The run ID.
    pub run_id: Uuid,
    /// The order tools ran in.
    pub order: Vec<String>,
    /// Per-tool timings, in execution order.
    pub timings: Vec<ToolTiming>,
    /// Total elapsed milliseconds.
    pub duration_ms: f64,
}

impl ExecutionReport {
    /// Returns the timing recorded for `tool`.
    #[must_use]
    pub fn timing(&self, tool: &str) -> Option<f64> {
        self.timings
            .iter()
            .find(|t| t.tool == tool)
            .map(|t| t.duration_ms)
    }

    /// Returns the slowest tool, if any ran.
    #[must_use]
    pub fn slowest(&self) -> Option<&ToolTiming> {
        self.timings
            .iter()
            .max_by(|a, b| a.duration_ms.total_cmp(&b.duration_ms))
    }
}
