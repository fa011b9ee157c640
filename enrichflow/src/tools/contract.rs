//! Tool trait and a closure-backed implementation.

use super::RagContext;
use crate::context::{Baggage, RunContext};
use async_trait::async_trait;
use std::fmt::Debug;

/// A pluggable analysis step.
///
/// Tools are built once at wiring time, registered into one pipeline and
/// called at most once per run. They keep no per-run state between runs.
///
/// # Baggage discipline
///
/// - Write only your own, documented output keys.
/// - Rely only on keys written by tools in your dependency closure.
/// - Treat an absent optional upstream key as "no data", never as an error.
#[async_trait]
pub trait Tool: Send + Sync + Debug {
    /// Stable, unique identifier. Used as the graph node key.
    fn name(&self) -> &str;

    /// Human-readable description. Documentation only.
    fn description(&self) -> &str {
        ""
    }

    /// Names of tools that must complete successfully before this one starts.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Does the tool's work, writing outputs into `baggage`.
    ///
    /// Any error is fatal for the whole run. Long-running tools should
    /// poll `ctx.cancellation()` and return early once it fires.
    async fn process(&self, ctx: &RunContext, baggage: &mut Baggage) -> anyhow::Result<()>;

    /// Renders this tool's stored output for a prompt.
    ///
    /// Read-only and infallible: returns an empty string when the data it
    /// needs is absent.
    fn prompt_context(&self, _ctx: &RunContext, _baggage: &Baggage) -> String {
        String::new()
    }

    /// Renders this tool's stored output as retrieval fragments.
    ///
    /// Read-only and infallible: returns an empty set when the data it
    /// needs is absent.
    fn rag_context(&self, _ctx: &RunContext, _baggage: &Baggage) -> RagContext {
        RagContext::default()
    }
}

type ProcessFn = dyn Fn(&RunContext, &mut Baggage) -> anyhow::Result<()> + Send + Sync;

/// A tool backed by a synchronous closure.
pub struct FnTool {
    name: String,
    description: String,
    dependencies: Vec<String>,
    func: Box<ProcessFn>,
}

impl FnTool {
    /// Creates a new closure-backed tool with no dependencies.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&RunContext, &mut Baggage) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            dependencies: Vec::new(),
            func: Box::new(func),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds a dependency.
    #[must_use]
    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    /// Adds multiple dependencies.
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(dependencies.into_iter().map(Into::into));
        self
    }
}

impl Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn dependencies(&self) -> Vec<String> {
        self.dependencies.clone()
    }

    async fn process(&self, ctx: &RunContext, baggage: &mut Baggage) -> anyhow::Result<()> {
        (self.func)(ctx, baggage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BaggageKey;

    const TX_HASH: BaggageKey<String> = BaggageKey::new("tx_hash");

    #[derive(Debug)]
    struct LabelTool;

    #[async_trait]
    impl Tool for LabelTool {
        fn name(&self) -> &str {
            "label"
        }

        async fn process(&self, _ctx: &RunContext, _baggage: &mut Baggage) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fn_tool_writes_baggage() {
        let tool = FnTool::new("fetch_raw", |_ctx, baggage| {
            baggage.insert(&TX_HASH, &"0xabc".to_string())?;
            Ok(())
        })
        .with_description("Loads the raw transaction");

        assert_eq!(tool.name(), "fetch_raw");
        assert_eq!(tool.description(), "Loads the raw transaction");
        assert!(tool.dependencies().is_empty());

        let mut baggage = Baggage::new();
        tool.process(&RunContext::new(), &mut baggage).await.unwrap();
        assert_eq!(baggage.get(&TX_HASH), Some("0xabc".to_string()));
    }

    #[test]
    fn test_fn_tool_dependencies() {
        let tool = FnTool::new("price", |_, _| Ok(()))
            .with_dependency("decode")
            .with_dependencies(["metadata", "names"]);
        assert_eq!(tool.dependencies(), vec!["decode", "metadata", "names"]);
    }

    #[test]
    fn test_default_export_hooks_are_empty() {
        let ctx = RunContext::new();
        let baggage = Baggage::new();

        assert_eq!(LabelTool.description(), "");
        assert!(LabelTool.prompt_context(&ctx, &baggage).is_empty());
        assert!(LabelTool.rag_context(&ctx, &baggage).is_empty());
    }

    #[test]
    fn test_fn_tool_error_propagates() {
        let tool = FnTool::new("decode", |_, baggage| {
            baggage
                .get(&TX_HASH)
                .ok_or_else(|| anyhow::anyhow!("tx_hash missing"))?;
            Ok(())
        });

        let mut baggage = Baggage::new();
        let err = tokio_test::block_on(tool.process(&RunContext::new(), &mut baggage)).unwrap_err();
        assert_eq!(err.to_string(), "tx_hash missing");
    }
}
