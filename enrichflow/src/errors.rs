//! Error types for the enrichflow engine.
//!
//! Construction errors (duplicate names, dangling dependencies, cycles) are
//! raised synchronously at registration time. Execution errors wrap the
//! failing tool's name around the original cause so callers can inspect it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for enrichflow operations.
#[derive(Debug, Error)]
pub enum EnrichflowError {
    /// A tool registration was rejected.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// A tool failed during execution.
    #[error("{0}")]
    Execution(#[from] ToolExecutionError),

    /// The run was cancelled before the named tool started.
    #[error("Pipeline cancelled before tool '{tool}': {reason}")]
    Cancelled {
        /// The tool that would have run next.
        tool: String,
        /// The cancellation reason.
        reason: String,
    },

    /// `execute` was called on a pipeline with no registered tools.
    #[error("Pipeline '{0}' has no execution order; register at least one tool")]
    NotReady(String),
}

impl EnrichflowError {
    /// Returns the name of the tool this error is attributed to, if any.
    #[must_use]
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::Execution(e) => Some(&e.tool),
            Self::Cancelled { tool, .. } => Some(tool),
            Self::Validation(e) => e.tool(),
            _ => None,
        }
    }
}

/// Metadata about a contract error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "TOOL-003-CYCLE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error raised when a tool with an existing name is registered again.
#[derive(Debug, Clone, Error)]
#[error("Tool '{name}' is already registered")]
pub struct DuplicateToolError {
    /// The duplicated tool name.
    pub name: String,
    /// Contract error info.
    pub error_info: ContractErrorInfo,
}

impl DuplicateToolError {
    /// Creates a new duplicate tool error.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let info = ContractErrorInfo::new(
            "TOOL-001-DUPLICATE",
            format!("A tool named '{name}' is already registered"),
        )
        .with_fix_hint("Tool names are graph node keys and must be unique per pipeline.")
        .with_context_entry("tool", name.clone());

        Self {
            name,
            error_info: info,
        }
    }
}

/// Error raised when a tool declares a dependency that is not registered.
#[derive(Debug, Clone, Error)]
#[error("Tool '{tool}' depends on '{dependency}', which is not registered")]
pub struct MissingDependencyError {
    /// The dependent tool.
    pub tool: String,
    /// The missing dependency.
    pub dependency: String,
    /// Contract error info.
    pub error_info: ContractErrorInfo,
}

impl MissingDependencyError {
    /// Creates a new missing dependency error.
    #[must_use]
    pub fn new(tool: impl Into<String>, dependency: impl Into<String>) -> Self {
        let tool = tool.into();
        let dependency = dependency.into();
        let info = ContractErrorInfo::new(
            "TOOL-002-MISSING-DEP",
            format!("'{tool}' declares an unregistered dependency '{dependency}'"),
        )
        .with_fix_hint("Register the dependency before the dependent tool.")
        .with_context_entry("tool", tool.clone())
        .with_context_entry("dependency", dependency.clone());

        Self {
            tool,
            dependency,
            error_info: info,
        }
    }
}

/// Error raised when a cycle is detected in the dependency graph.
#[derive(Debug, Clone, Error)]
#[error("Cycle detected among tools: {}", members.join(", "))]
pub struct CycleDetectedError {
    /// The tools that could not be scheduled, in registration order.
    pub members: Vec<String>,
    /// Contract error info.
    pub error_info: ContractErrorInfo,
}

impl CycleDetectedError {
    /// Creates a new cycle detected error.
    #[must_use]
    pub fn new(members: Vec<String>) -> Self {
        let info = ContractErrorInfo::new(
            "TOOL-003-CYCLE",
            format!("Dependency cycle among: {}", members.join(", ")),
        )
        .with_fix_hint("Remove one of the dependencies in the cycle to break it.");

        Self {
            members,
            error_info: info,
        }
    }
}

/// A rejected tool registration.
#[derive(Debug, Clone, Error)]
pub enum PipelineValidationError {
    /// Same name registered twice.
    #[error("{0}")]
    Duplicate(#[from] DuplicateToolError),

    /// A declared dependency is not registered.
    #[error("{0}")]
    MissingDependency(#[from] MissingDependencyError),

    /// Registration would introduce a cycle.
    #[error("{0}")]
    Cycle(#[from] CycleDetectedError),
}

impl PipelineValidationError {
    /// Returns the diagnostic info for this error.
    #[must_use]
    pub fn error_info(&self) -> &ContractErrorInfo {
        match self {
            Self::Duplicate(e) => &e.error_info,
            Self::MissingDependency(e) => &e.error_info,
            Self::Cycle(e) => &e.error_info,
        }
    }

    /// Returns the tool the error is attributed to, when there is exactly one.
    #[must_use]
    pub fn tool(&self) -> Option<&str> {
        match self {
            Self::Duplicate(e) => Some(&e.name),
            Self::MissingDependency(e) => Some(&e.tool),
            Self::Cycle(_) => None,
        }
    }
}

/// Error raised when a tool's `process` fails.
///
/// The original cause is kept as the error source.
#[derive(Debug, Error)]
#[error("Tool '{tool}' failed: {source}")]
pub struct ToolExecutionError {
    /// The failing tool.
    pub tool: String,
    /// The underlying cause.
    #[source]
    pub source: anyhow::Error,
}

impl ToolExecutionError {
    /// Wraps a tool failure.
    #[must_use]
    pub fn new(tool: impl Into<String>, source: anyhow::Error) -> Self {
        Self {
            tool: tool.into(),
            source,
        }
    }

    /// Returns the innermost cause of the failure.
    #[must_use]
    pub fn root_cause(&self) -> &(dyn std::error::Error + 'static) {
        self.source.root_cause()
    }
}

/// Errors related to the cache layer.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// A key segment was empty or contained a reserved character.
    #[error("Invalid cache key segment '{segment}': {reason}")]
    InvalidKey {
        /// The offending segment.
        segment: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A cached payload could not be decoded into the requested type.
    #[error("Failed to decode cached value at '{key}': {reason}")]
    Decode {
        /// The cache key.
        key: String,
        /// The decoder message.
        reason: String,
    },

    /// A value could not be encoded for storage.
    #[error("Failed to encode value for '{key}': {reason}")]
    Encode {
        /// The cache key.
        key: String,
        /// The encoder message.
        reason: String,
    },

    /// The storage backend reported an error.
    #[error("Cache backend error: {0}")]
    Backend(String),
}

impl CacheError {
    /// Creates an invalid key error.
    #[must_use]
    pub fn invalid_key(segment: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            segment: segment.into(),
            reason: reason.into(),
        }
    }

    /// Creates a backend error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}
