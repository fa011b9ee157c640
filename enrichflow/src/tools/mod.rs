//! The capability contract for pluggable analysis steps.
//!
//! A [`Tool`] declares its name and dependencies, does its work in
//! [`Tool::process`], and optionally renders what it stored for downstream
//! consumers through the two export hooks.

mod config;
mod contract;
mod rag;

pub use config::ToolConfig;
pub use contract::{FnTool, Tool};
pub use rag::{RagContext, RagFragment};
