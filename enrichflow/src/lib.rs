//! # Enrichflow
//!
//! A dependency-ordered execution engine for transaction enrichment tools.
//!
//! Enrichflow runs a set of pluggable analysis steps over one shared
//! key/value context, with support for:
//!
//! - **Tool contract**: Each tool declares its name and dependencies and reads
//!   and writes a shared [`Baggage`](context::Baggage)
//! - **Deterministic scheduling**: Kahn's algorithm with FIFO tie-breaking,
//!   recomputed at every registration
//! - **Fail-fast execution**: Tools run one at a time; the first failure stops
//!   the run and is attributed to its tool
//! - **Export hooks**: Prompt text and retrieval fragments assembled in
//!   execution order
//! - **Caching**: A namespaced, TTL-aware cache façade for external lookups
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use enrichflow::prelude::*;
//! use std::sync::Arc;
//!
//! let mut pipeline = Pipeline::new("tx-enrichment");
//! pipeline.register_all([
//!     Arc::new(PriceTool::new()) as Arc<dyn Tool>,
//!     Arc::new(DecodeTool::new()),
//!     Arc::new(FetchRawTool::new()),
//! ])?;
//!
//! let mut baggage = Baggage::new();
//! baggage.insert(&TX_HASH, &"0xabc".to_string())?;
//! pipeline.execute(&RunContext::new(), &mut baggage).await?;
//!
//! let prompt = pipeline.collect_prompt_context(&RunContext::new(), &baggage);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cache;
pub mod cancellation;
pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod testing;
pub mod tools;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::{Cache, CacheCategory, CacheKey, InMemoryStore, KvStore};
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{CacheConfig, PipelineConfig};
    pub use crate::context::{Baggage, BaggageKey, Lookup, RunContext, RunIdentity};
    pub use crate::errors::{
        CacheError, ContractErrorInfo, CycleDetectedError, DuplicateToolError, EnrichflowError,
        MissingDependencyError, PipelineValidationError, ToolExecutionError,
    };
    pub use crate::events::{
        CollectingProgressSink, LoggingProgressSink, NoOpProgressSink, ProgressEvent,
        ProgressSink, ToolPhase,
    };
    pub use crate::observability::init_tracing;
    pub use crate::pipeline::{ExecutionReport, Pipeline, RunState};
    pub use crate::tools::{FnTool, RagContext, RagFragment, Tool, ToolConfig};
}
