//! Construction-time configuration shared by tools.

use crate::cache::Cache;
use std::sync::Arc;

/// Configuration every tool receives at construction.
///
/// Defaults: not verbose, no cache. A tool without a cache performs its
/// external lookups uncached.
#[derive(Debug, Clone, Default)]
pub struct ToolConfig {
    /// Emit per-tool debug detail.
    pub verbose: bool,
    /// Shared cache for external lookups.
    pub cache: Option<Arc<Cache>>,
}

impl ToolConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables verbose output.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Attaches a cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Returns the cache, if configured.
    #[must_use]
    pub fn cache(&self) -> Option<&Cache> {
        self.cache.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryStore;

    #[test]
    fn test_defaults() {
        let config = ToolConfig::new();
        assert!(!config.verbose);
        assert!(config.cache().is_none());
    }

    #[test]
    fn test_with_cache() {
        let cache = Arc::new(Cache::new(Arc::new(InMemoryStore::new())));
        let config = ToolConfig::new().with_verbose(true).with_cache(cache);
        assert!(config.verbose);
        assert!(config.cache().is_some());
    }
}
