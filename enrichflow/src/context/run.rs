//! The read-only environment handed to every tool invocation.

use super::RunIdentity;
use crate::cancellation::CancellationToken;
use crate::events::{NoOpProgressSink, ProgressSink};
use std::sync::Arc;
use uuid::Uuid;

/// Run-scoped environment: identity, cancellation signal and progress sink.
///
/// Cheap to clone; clones share the same cancellation token and sink.
#[derive(Clone)]
pub struct RunContext {
    identity: RunIdentity,
    cancellation: Arc<CancellationToken>,
    progress: Arc<dyn ProgressSink>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    /// Creates a context with a fresh identity, no progress sink and an
    /// untriggered cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            identity: RunIdentity::new(),
            cancellation: Arc::new(CancellationToken::new()),
            progress: Arc::new(NoOpProgressSink),
        }
    }

    /// Replaces the run identity.
    #[must_use]
    pub fn with_identity(mut self, identity: RunIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Shares an externally owned cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: Arc<CancellationToken>) -> Self {
        self.cancellation = token;
        self
    }

    /// Attaches a progress sink.
    #[must_use]
    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    /// Returns the run identity.
    #[must_use]
    pub fn identity(&self) -> &RunIdentity {
        &self.identity
    }

    /// Returns the run ID.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.identity.run_id
    }

    /// Returns the cancellation token.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub(crate) fn progress(&self) -> &dyn ProgressSink {
        self.progress.as_ref()
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("identity", &self.identity)
            .field("cancellation", &self.cancellation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_cancellation() {
        let ctx = RunContext::new();
        let clone = ctx.clone();

        ctx.cancellation().cancel("operator abort");
        assert!(clone.is_cancelled());
        assert_eq!(clone.run_id(), ctx.run_id());
    }

    #[test]
    fn test_external_token() {
        let token = Arc::new(CancellationToken::new());
        let ctx = RunContext::new().with_cancellation(token.clone());

        token.cancel("shutdown");
        assert_eq!(ctx.cancellation().reason(), Some("shutdown".to_string()));
    }
}
