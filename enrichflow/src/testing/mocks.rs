//! Mock tools for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::context::{Baggage, RunContext};
use crate::tools::{RagContext, RagFragment, Tool};

/// Shared log of tool names in the order they ran.
#[derive(Debug, Clone, Default)]
pub struct VisitLog(Arc<Mutex<Vec<String>>>);

impl VisitLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a visit.
    pub fn record(&self, name: &str) {
        self.0.lock().push(name.to_string());
    }

    /// Returns the visits so far.
    #[must_use]
    pub fn visits(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Returns how many times `name` ran.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.0.lock().iter().filter(|v| *v == name).count()
    }
}

/// The baggage key a [`RecordingTool`] writes.
#[must_use]
pub fn output_key(tool: &str) -> String {
    format!("{tool}.output")
}

/// A tool that records its visit, notes which dependency outputs it could
/// see, and writes `{name}.output`.
#[derive(Debug)]
pub struct RecordingTool {
    name: String,
    dependencies: Vec<String>,
    log: VisitLog,
    seen_upstream: Mutex<Vec<String>>,
}

impl RecordingTool {
    /// Creates a recording tool.
    #[must_use]
    pub fn new(name: impl Into<String>, dependencies: &[&str], log: &VisitLog) -> Self {
        Self {
            name: name.into(),
            dependencies: dependencies.iter().map(|d| (*d).to_string()).collect(),
            log: log.clone(),
            seen_upstream: Mutex::new(Vec::new()),
        }
    }

    /// Returns the dependencies whose output was present when this tool ran.
    #[must_use]
    pub fn seen_upstream(&self) -> Vec<String> {
        self.seen_upstream.lock().clone()
    }
}

#[async_trait]
impl Tool for RecordingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Records its visit and writes a marker key"
    }

    fn dependencies(&self) -> Vec<String> {
        self.dependencies.clone()
    }

    async fn process(&self, _ctx: &RunContext, baggage: &mut Baggage) -> anyhow::Result<()> {
        self.log.record(&self.name);
        let seen: Vec<String> = self
            .dependencies
            .iter()
            .filter(|dep| baggage.contains_key(&output_key(dep)))
            .cloned()
            .collect();
        *self.seen_upstream.lock() = seen;
        baggage.insert_raw(output_key(&self.name), serde_json::json!(self.name));
        Ok(())
    }

    fn prompt_context(&self, _ctx: &RunContext, baggage: &Baggage) -> String {
        baggage
            .get_raw(&output_key(&self.name))
            .and_then(|v| v.as_str())
            .map(|v| format!("## {}\n{v}", self.name))
            .unwrap_or_default()
    }

    fn rag_context(&self, _ctx: &RunContext, baggage: &Baggage) -> RagContext {
        baggage
            .get_raw(&output_key(&self.name))
            .and_then(|v| v.as_str())
            .map(|v| RagFragment::new(format!("{}:output", self.name), v))
            .into_iter()
            .collect()
    }
}

/// A tool that records its visit and then fails.
#[derive(Debug)]
pub struct FailingTool {
    name: String,
    dependencies: Vec<String>,
    error: String,
    log: VisitLog,
}

impl FailingTool {
    /// Creates a failing tool.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        dependencies: &[&str],
        error: impl Into<String>,
        log: &VisitLog,
    ) -> Self {
        Self {
            name: name.into(),
            dependencies: dependencies.iter().map(|d| (*d).to_string()).collect(),
            error: error.into(),
            log: log.clone(),
        }
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<String> {
        self.dependencies.clone()
    }

    async fn process(&self, _ctx: &RunContext, _baggage: &mut Baggage) -> anyhow::Result<()> {
        self.log.record(&self.name);
        anyhow::bail!("{}", self.error)
    }
}

/// A tool that sleeps in short steps, observing cancellation between them.
#[derive(Debug)]
pub struct SlowTool {
    name: String,
    steps: u32,
    step: Duration,
    log: VisitLog,
}

impl SlowTool {
    /// Creates a slow tool that sleeps `steps` times for `step`.
    #[must_use]
    pub fn new(name: impl Into<String>, steps: u32, step: Duration, log: &VisitLog) -> Self {
        Self {
            name: name.into(),
            steps,
            step,
            log: log.clone(),
        }
    }
}

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, ctx: &RunContext, baggage: &mut Baggage) -> anyhow::Result<()> {
        self.log.record(&self.name);
        for _ in 0..self.steps {
            ctx.cancellation().check()?;
            tokio::time::sleep(self.step).await;
        }
        baggage.insert_raw(output_key(&self.name), serde_json::json!(self.name));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_tool() {
        let log = VisitLog::new();
        let tool = RecordingTool::new("decode", &["fetch_raw"], &log);
        let ctx = RunContext::new();
        let mut baggage = Baggage::new();
        baggage.insert_raw(output_key("fetch_raw"), serde_json::json!("fetch_raw"));

        tool.process(&ctx, &mut baggage).await.unwrap();

        assert_eq!(log.visits(), vec!["decode"]);
        assert_eq!(tool.seen_upstream(), vec!["fetch_raw"]);
        assert!(baggage.contains_key("decode.output"));
        assert_eq!(tool.prompt_context(&ctx, &baggage), "## decode\ndecode");
        assert_eq!(tool.rag_context(&ctx, &baggage).len(), 1);
    }

    #[tokio::test]
    async fn test_recording_tool_hooks_empty_without_output() {
        let log = VisitLog::new();
        let tool = RecordingTool::new("decode", &[], &log);
        let ctx = RunContext::new();
        let baggage = Baggage::new();

        assert!(tool.prompt_context(&ctx, &baggage).is_empty());
        assert!(tool.rag_context(&ctx, &baggage).is_empty());
    }

    #[tokio::test]
    async fn test_failing_tool() {
        let log = VisitLog::new();
        let tool = FailingTool::new("price", &[], "market data unavailable", &log);

        let err = tool
            .process(&RunContext::new(), &mut Baggage::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "market data unavailable");
        assert_eq!(log.count("price"), 1);
    }

    #[tokio::test]
    async fn test_slow_tool_observes_cancellation() {
        let log = VisitLog::new();
        let tool = SlowTool::new("explain", 5, Duration::from_millis(1), &log);
        let ctx = RunContext::new();
        ctx.cancellation().cancel("deadline");

        let mut baggage = Baggage::new();
        let err = tool.process(&ctx, &mut baggage).await.unwrap_err();
        assert!(err.to_string().contains("deadline"));
        assert!(baggage.is_empty());
    }
}
