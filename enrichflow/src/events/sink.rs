//! Progress sink trait and implementations.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, Level};

/// Coarse phase of a single tool within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolPhase {
    /// The tool's `process` is about to be called.
    Started,
    /// The tool's `process` returned successfully.
    Completed,
    /// The tool's `process` returned an error.
    Failed,
}

impl ToolPhase {
    /// Returns the dotted event name for this phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "tool.started",
            Self::Completed => "tool.completed",
            Self::Failed => "tool.failed",
        }
    }
}

/// A phase transition reported to a [`ProgressSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The phase entered.
    pub phase: ToolPhase,
    /// The tool name.
    pub tool: String,
    /// Elapsed milliseconds, for terminal phases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    /// Error message, for [`ToolPhase::Failed`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEvent {
    /// A `Started` event.
    #[must_use]
    pub fn started(tool: impl Into<String>) -> Self {
        Self {
            phase: ToolPhase::Started,
            tool: tool.into(),
            duration_ms: None,
            error: None,
        }
    }

    /// A `Completed` event.
    #[must_use]
    pub fn completed(tool: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            phase: ToolPhase::Completed,
            tool: tool.into(),
            duration_ms: Some(duration_ms),
            error: None,
        }
    }

    /// A `Failed` event.
    #[must_use]
    pub fn failed(tool: impl Into<String>, duration_ms: f64, error: impl Into<String>) -> Self {
        Self {
            phase: ToolPhase::Failed,
            tool: tool.into(),
            duration_ms: Some(duration_ms),
            error: Some(error.into()),
        }
    }
}

/// Receiver of per-tool progress notifications.
///
/// Implementations must not block for long; they run inline on the
/// executor's task between tools.
pub trait ProgressSink: Send + Sync {
    /// Receives one phase transition.
    fn notify(&self, event: &ProgressEvent);
}

/// A no-op sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgressSink;

impl ProgressSink for NoOpProgressSink {
    fn notify(&self, _event: &ProgressEvent) {}
}

/// A sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingProgressSink {
    level: Level,
}

impl Default for LoggingProgressSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingProgressSink {
    /// Creates a new logging sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl ProgressSink for LoggingProgressSink {
    fn notify(&self, event: &ProgressEvent) {
        if self.level == Level::DEBUG {
            debug!(
                tool = %event.tool,
                phase = event.phase.as_str(),
                duration_ms = ?event.duration_ms,
                error = ?event.error,
                "Progress: {}", event.phase.as_str()
            );
        } else {
            info!(
                tool = %event.tool,
                phase = event.phase.as_str(),
                duration_ms = ?event.duration_ms,
                error = ?event.error,
                "Progress: {}", event.phase.as_str()
            );
        }
    }
}

/// A collecting sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingProgressSink {
    events: RwLock<Vec<ProgressEvent>>,
}

impl CollectingProgressSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Returns the tool names that reached the given phase, in order.
    #[must_use]
    pub fn tools_in_phase(&self, phase: ToolPhase) -> Vec<String> {
        self.events
            .read()
            .iter()
            .filter(|e| e.phase == phase)
            .map(|e| e.tool.clone())
            .collect()
    }
}

impl ProgressSink for CollectingProgressSink {
    fn notify(&self, event: &ProgressEvent) {
        self.events.write().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names() {
        assert_eq!(ToolPhase::Started.as_str(), "tool.started");
        assert_eq!(ToolPhase::Completed.as_str(), "tool.completed");
        assert_eq!(ToolPhase::Failed.as_str(), "tool.failed");
    }

    #[test]
    fn test_logging_sink_does_not_panic() {
        LoggingProgressSink::default().notify(&ProgressEvent::started("decode"));
        LoggingProgressSink::debug().notify(&ProgressEvent::failed("decode", 1.5, "boom"));
    }

    #[test]
    fn test_collecting_sink_filters_by_phase() {
        let sink = CollectingProgressSink::new();
        assert!(sink.is_empty());

        sink.notify(&ProgressEvent::started("fetch_raw"));
        sink.notify(&ProgressEvent::completed("fetch_raw", 2.0));
        sink.notify(&ProgressEvent::started("decode"));
        sink.notify(&ProgressEvent::failed("decode", 0.4, "bad abi"));

        assert_eq!(sink.len(), 4);
        assert_eq!(sink.tools_in_phase(ToolPhase::Started), vec!["fetch_raw", "decode"]);
        assert_eq!(sink.tools_in_phase(ToolPhase::Failed), vec!["decode"]);
    }

    #[test]
    fn test_event_serialization_skips_empty_fields() {
        let json = serde_json::to_value(ProgressEvent::started("price")).unwrap();
        assert_eq!(json, serde_json::json!({"phase": "started", "tool": "price"}));
    }
}
