//! The pipeline: tool registration and sequential, fail-fast execution.

use super::{topological_order, DependencyGraph, ExecutionReport, ToolTiming};
use crate::config::PipelineConfig;
use crate::context::{Baggage, RunContext};
use crate::errors::{
    DuplicateToolError, EnrichflowError, PipelineValidationError, ToolExecutionError,
};
use crate::events::{notify_guarded, ProgressEvent};
use crate::observability::{SpanTimer, ToolSpanAttributes};
use crate::tools::{RagContext, Tool};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, Instrument};

/// Lifecycle of the most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No run has started.
    NotStarted,
    /// A run is in progress.
    Running,
    /// The last run finished with every tool succeeding.
    Completed,
    /// The last run stopped on a tool failure or cancellation.
    Failed,
}

/// Holds a run in `Running` and records its outcome.
///
/// Dropped without [`RunGuard::finish`] (a panicking tool or an abandoned
/// `execute` future), the run is recorded as `Failed`.
struct RunGuard<'a> {
    state: &'a RwLock<RunState>,
    finished: bool,
}

impl<'a> RunGuard<'a> {
    fn start(state: &'a RwLock<RunState>) -> Self {
        *state.write() = RunState::Running;
        Self {
            state,
            finished: false,
        }
    }

    fn finish(mut self, outcome: RunState) {
        *self.state.write() = outcome;
        self.finished = true;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *self.state.write() = RunState::Failed;
        }
    }
}

#[derive(Debug, Clone)]
struct Registered {
    tool: Arc<dyn Tool>,
    dependencies: Vec<String>,
}

/// An ordered set of tools sharing one baggage per run.
///
/// Every registration re-validates the whole set and recomputes the
/// execution order; a rejected registration leaves the pipeline unchanged.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    tools: HashMap<String, Registered>,
    registration_order: Vec<String>,
    execution_order: Vec<String>,
    state: RwLock<RunState>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::with_config(PipelineConfig::default())
    }
}

impl Pipeline {
    /// Creates an empty pipeline with default settings and the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(PipelineConfig::new(name))
    }

    /// Creates an empty pipeline.
    #[must_use]
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            config,
            tools: HashMap::new(),
            registration_order: Vec::new(),
            execution_order: Vec::new(),
            state: RwLock::new(RunState::NotStarted),
        }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Registers one tool.
    ///
    /// # Errors
    ///
    /// Rejects the tool if its name is taken, if any declared dependency is
    /// not already registered, or if it would close a cycle.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), PipelineValidationError> {
        self.register_all([tool])
    }

    /// Registers a batch of tools atomically, in any order.
    ///
    /// Dependencies may refer to tools later in the same batch; the combined
    /// set must be closed and acyclic. On error nothing from the batch is kept.
    ///
    /// # Errors
    ///
    /// Same as [`Pipeline::register`], checked against the combined set.
    pub fn register_all<I>(&mut self, tools: I) -> Result<(), PipelineValidationError>
    where
        I: IntoIterator<Item = Arc<dyn Tool>>,
    {
        let mut staged: Vec<(String, Registered)> = Vec::new();
        for tool in tools {
            let name = tool.name().to_string();
            if self.tools.contains_key(&name) || staged.iter().any(|(n, _)| *n == name) {
                return Err(DuplicateToolError::new(name).into());
            }
            let dependencies = tool.dependencies();
            staged.push((name, Registered { tool, dependencies }));
        }

        let order = {
            let mut declared: HashMap<&str, &[String]> = self
                .tools
                .iter()
                .map(|(name, r)| (name.as_str(), r.dependencies.as_slice()))
                .collect();
            for (name, r) in &staged {
                declared.insert(name.as_str(), r.dependencies.as_slice());
            }
            let candidates = self
                .registration_order
                .iter()
                .map(String::as_str)
                .chain(staged.iter().map(|(name, _)| name.as_str()));

            let graph = DependencyGraph::build(candidates.map(|name| {
                let deps = declared.get(name).copied().unwrap_or(&[]);
                (name, deps.iter().map(String::as_str))
            }))?;
            topological_order(&graph)?
        };

        for (name, registered) in staged {
            debug!(
                pipeline = %self.config.name,
                tool = %name,
                dependencies = ?registered.dependencies,
                "Registered tool"
            );
            self.registration_order.push(name.clone());
            self.tools.insert(name, registered);
        }
        debug!(pipeline = %self.config.name, order = ?order, "Recomputed execution order");
        self.execution_order = order;
        Ok(())
    }

    /// Returns the current execution order.
    #[must_use]
    pub fn execution_order(&self) -> &[String] {
        &self.execution_order
    }

    /// Returns true if a tool with this name is registered.
    #[must_use]
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns the registered tool with this name.
    #[must_use]
    pub fn tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|r| Arc::clone(&r.tool))
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Returns the dependencies `name` declared when it was registered.
    #[must_use]
    pub fn dependencies_of(&self, name: &str) -> Option<&[String]> {
        self.tools.get(name).map(|r| r.dependencies.as_slice())
    }

    /// Returns the state of the most recent run.
    #[must_use]
    pub fn state(&self) -> RunState {
        *self.state.read()
    }

    /// Re-checks that the registered set is closed and acyclic.
    ///
    /// Side-effect free. Registration already enforces this, so an error here
    /// means an invariant was broken.
    pub fn validate_all_dependencies(&self) -> Result<(), PipelineValidationError> {
        let graph = DependencyGraph::build(self.registration_order.iter().map(|name| {
            let deps = self.dependencies_of(name).unwrap_or(&[]);
            (name.as_str(), deps.iter().map(String::as_str))
        }))?;
        topological_order(&graph)?;
        Ok(())
    }

    /// Runs every tool once, in execution order, against `baggage`.
    ///
    /// Stops at the first failure and returns it wrapped with the tool's
    /// name. Writes made by tools that already ran stay in `baggage`.
    ///
    /// # Errors
    ///
    /// - [`EnrichflowError::NotReady`] if no tool is registered.
    /// - [`EnrichflowError::Cancelled`] if `ctx` was cancelled before a tool started.
    /// - [`EnrichflowError::Execution`] for the first failing tool.
    pub async fn execute(
        &self,
        ctx: &RunContext,
        baggage: &mut Baggage,
    ) -> Result<ExecutionReport, EnrichflowError> {
        if self.execution_order.is_empty() {
            return Err(EnrichflowError::NotReady(self.config.name.clone()));
        }

        if self.config.log_plan {
            self.log_plan(ctx);
        }

        let run = RunGuard::start(&self.state);
        let run_timer = SpanTimer::start(self.config.name.as_str());
        let mut timings = Vec::with_capacity(self.execution_order.len());

        for name in &self.execution_order {
            let registered = &self.tools[name];

            if ctx.is_cancelled() {
                let reason = ctx.cancellation().reason().unwrap_or_default();
                info!(tool = %name, reason = %reason, "Run cancelled before tool");
                run.finish(RunState::Failed);
                return Err(EnrichflowError::Cancelled {
                    tool: name.clone(),
                    reason,
                });
            }

            match self.run_tool(ctx, name, registered, baggage).await {
                Ok(duration_ms) => timings.push(ToolTiming {
                    tool: name.clone(),
                    duration_ms,
                }),
                Err(e) => {
                    run.finish(RunState::Failed);
                    return Err(e.into());
                }
            }
        }

        run.finish(RunState::Completed);
        let duration_ms = run_timer.finish();
        info!(
            pipeline = %self.config.name,
            run_id = %ctx.run_id(),
            tools = timings.len(),
            duration_ms,
            "Pipeline completed"
        );

        Ok(ExecutionReport {
            run_id: ctx.run_id(),
            order: self.execution_order.clone(),
            timings,
            duration_ms,
        })
    }

    async fn run_tool(
        &self,
        ctx: &RunContext,
        name: &str,
        registered: &Registered,
        baggage: &mut Baggage,
    ) -> Result<f64, ToolExecutionError> {
        let span = info_span!("tool", tool = %name, run_id = %ctx.run_id());
        let timer = SpanTimer::start(name);
        self.notify(ctx, &ProgressEvent::started(name));
        debug!(parent: &span, "Tool started");

        baggage.set_current_writer(Some(name));
        let result = registered
            .tool
            .process(ctx, baggage)
            .instrument(span.clone())
            .await;
        baggage.set_current_writer(None);

        let duration_ms = timer.finish();
        let attributes = ToolSpanAttributes::new(name)
            .with_dependencies(registered.dependencies.clone())
            .with_duration_ms(duration_ms);

        match result {
            Ok(()) => {
                let attributes = attributes.with_status("completed");
                info!(
                    parent: &span,
                    duration_ms,
                    keys_written = ?baggage.keys_written_by(name),
                    attributes = ?attributes.to_attributes(),
                    "Tool completed"
                );
                self.notify(ctx, &ProgressEvent::completed(name, duration_ms));
                Ok(duration_ms)
            }
            Err(source) => {
                let message = format!("{source:#}");
                let attributes = attributes.with_status("failed").with_error(&message);
                error!(
                    parent: &span,
                    duration_ms,
                    error = %message,
                    attributes = ?attributes.to_attributes(),
                    "Tool failed"
                );
                self.notify(ctx, &ProgressEvent::failed(name, duration_ms, message));
                Err(ToolExecutionError::new(name, source))
            }
        }
    }

    fn notify(&self, ctx: &RunContext, event: &ProgressEvent) {
        if self.config.emit_progress {
            notify_guarded(ctx.progress(), event);
        }
    }

    fn log_plan(&self, ctx: &RunContext) {
        let plan: Vec<String> = self
            .execution_order
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let deps = self.dependencies_of(name).unwrap_or(&[]);
                if deps.is_empty() {
                    format!("{}. {name}", i + 1)
                } else {
                    format!("{}. {name} <- [{}]", i + 1, deps.join(", "))
                }
            })
            .collect();
        info!(
            pipeline = %self.config.name,
            run_id = %ctx.run_id(),
            plan = ?plan,
            "Executing pipeline"
        );
    }

    /// Concatenates every tool's prompt context in execution order.
    ///
    /// Empty contributions are skipped; the rest are separated by a blank line.
    #[must_use]
    pub fn collect_prompt_context(&self, ctx: &RunContext, baggage: &Baggage) -> String {
        self.execution_order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|r| r.tool.prompt_context(ctx, baggage))
            .filter(|section| !section.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Merges every tool's retrieval fragments in execution order.
    #[must_use]
    pub fn collect_rag_context(&self, ctx: &RunContext, baggage: &Baggage) -> RagContext {
        let mut merged = RagContext::new();
        for registered in self
            .execution_order
            .iter()
            .filter_map(|name| self.tools.get(name))
        {
            merged.extend(registered.tool.rag_context(ctx, baggage));
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::FnTool;

    fn tool(name: &str, deps: &[&str]) -> Arc<dyn Tool> {
        Arc::new(FnTool::new(name, |_, _| Ok(())).with_dependencies(deps.iter().copied()))
    }

    #[test]
    fn test_register_recomputes_order() {
        let mut pipeline = Pipeline::new("tx");
        pipeline.register(tool("fetch_raw", &[])).unwrap();
        assert_eq!(pipeline.execution_order(), ["fetch_raw"]);

        pipeline.register(tool("decode", &["fetch_raw"])).unwrap();
        assert_eq!(pipeline.execution_order(), ["fetch_raw", "decode"]);
        assert_eq!(pipeline.tool_count(), 2);
        assert!(pipeline.has_tool("decode"));
        assert!(pipeline.tool("decode").is_some());
        assert!(pipeline.tool("price").is_none());
        assert_eq!(pipeline.dependencies_of("decode"), Some(&["fetch_raw".to_string()][..]));
        assert!(pipeline.validate_all_dependencies().is_ok());
    }

    #[test]
    fn test_duplicate_rejected_and_state_kept() {
        let mut pipeline = Pipeline::new("tx");
        pipeline.register(tool("fetch_raw", &[])).unwrap();

        let err = pipeline.register(tool("fetch_raw", &[])).unwrap_err();
        assert!(matches!(err, PipelineValidationError::Duplicate(_)));
        assert_eq!(pipeline.tool_count(), 1);
    }

    #[test]
    fn test_duplicate_within_batch_rejected() {
        let mut pipeline = Pipeline::new("tx");
        let err = pipeline
            .register_all([tool("a", &[]), tool("a", &[])])
            .unwrap_err();
        assert!(matches!(err, PipelineValidationError::Duplicate(_)));
        assert_eq!(pipeline.tool_count(), 0);
    }

    #[test]
    fn test_batch_with_missing_dependency_is_not_applied() {
        let mut pipeline = Pipeline::new("tx");
        let err = pipeline
            .register_all([tool("price", &["decode"]), tool("fetch_raw", &[])])
            .unwrap_err();
        assert!(matches!(err, PipelineValidationError::MissingDependency(_)));
        assert_eq!(pipeline.tool_count(), 0);
        assert!(pipeline.execution_order().is_empty());
    }

    #[tokio::test]
    async fn test_execute_empty_pipeline_is_not_ready() {
        let pipeline = Pipeline::new("empty");
        let err = pipeline
            .execute(&RunContext::new(), &mut Baggage::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichflowError::NotReady(_)));
        assert_eq!(pipeline.state(), RunState::NotStarted);
    }
}
