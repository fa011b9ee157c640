//! Per-tool span attributes and timing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Attributes describing one tool invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolSpanAttributes {
    /// Tool name.
    pub tool_name: String,
    /// Declared dependencies.
    pub dependencies: Vec<String>,
    /// Final status ("completed" or "failed").
    pub status: Option<String>,
    /// Duration in milliseconds.
    pub duration_ms: Option<f64>,
    /// Error message if failed.
    pub error: Option<String>,
}

impl ToolSpanAttributes {
    /// Creates new tool span attributes.
    #[must_use]
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            ..Default::default()
        }
    }

    /// Sets the declared dependencies.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the error.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Flattens to dotted attribute names.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        attrs.insert("tool.name".to_string(), self.tool_name.clone());

        if !self.dependencies.is_empty() {
            attrs.insert("tool.dependencies".to_string(), self.dependencies.join(","));
        }
        if let Some(ref v) = self.status {
            attrs.insert("tool.status".to_string(), v.clone());
        }
        if let Some(v) = self.duration_ms {
            attrs.insert("tool.duration_ms".to_string(), v.to_string());
        }
        if let Some(ref v) = self.error {
            attrs.insert("tool.error".to_string(), v.clone());
        }

        attrs
    }
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_span_attributes() {
        let attrs = ToolSpanAttributes::new("decode")
            .with_dependencies(vec!["fetch_raw".to_string(), "abi".to_string()])
            .with_status("completed")
            .with_duration_ms(12.5);

        let map = attrs.to_attributes();
        assert_eq!(map.get("tool.name"), Some(&"decode".to_string()));
        assert_eq!(map.get("tool.dependencies"), Some(&"fetch_raw,abi".to_string()));
        assert_eq!(map.get("tool.status"), Some(&"completed".to_string()));
        assert_eq!(map.get("tool.duration_ms"), Some(&"12.5".to_string()));
        assert!(!map.contains_key("tool.error"));
    }

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("decode");
        assert_eq!(timer.name(), "decode");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(timer.finish() >= 10.0);
    }
}
