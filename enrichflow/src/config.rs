//! Configuration types for pipelines and the cache.

use crate::cache::{CacheCategory, PERMANENT_TTL};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Pipeline-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name, used in logs and errors.
    #[serde(default = "default_pipeline_name")]
    pub name: String,
    /// Log the execution plan (order and declared dependencies) before each run.
    #[serde(default = "default_true")]
    pub log_plan: bool,
    /// Send per-tool phase transitions to the run's progress sink.
    #[serde(default = "default_true")]
    pub emit_progress: bool,
}

fn default_pipeline_name() -> String {
    "enrichment".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: default_pipeline_name(),
            log_plan: true,
            emit_progress: true,
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with defaults and the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Enables or disables plan logging.
    #[must_use]
    pub fn with_log_plan(mut self, enabled: bool) -> Self {
        self.log_plan = enabled;
        self
    }

    /// Enables or disables progress notifications.
    #[must_use]
    pub fn with_emit_progress(mut self, enabled: bool) -> Self {
        self.emit_progress = enabled;
        self
    }
}

/// Cache key prefix and per-category TTLs, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// First segment of every key.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// TTL for contract interfaces.
    #[serde(default = "default_permanent_ttl")]
    pub abi_ttl_seconds: u64,
    /// TTL for decimal counts and symbols.
    #[serde(default = "default_permanent_ttl")]
    pub decimals_ttl_seconds: u64,
    /// TTL for market prices.
    #[serde(default = "default_price_ttl")]
    pub price_ttl_seconds: u64,
    /// TTL for name resolutions.
    #[serde(default = "default_name_ttl")]
    pub name_ttl_seconds: u64,
    /// TTL for token and contract metadata.
    #[serde(default = "default_metadata_ttl")]
    pub metadata_ttl_seconds: u64,
}

fn default_prefix() -> String {
    "enrichflow".to_string()
}

fn default_permanent_ttl() -> u64 {
    PERMANENT_TTL.as_secs()
}

fn default_price_ttl() -> u64 {
    CacheCategory::Price.default_ttl().as_secs()
}

fn default_name_ttl() -> u64 {
    CacheCategory::Name.default_ttl().as_secs()
}

fn default_metadata_ttl() -> u64 {
    CacheCategory::Metadata.default_ttl().as_secs()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            abi_ttl_seconds: default_permanent_ttl(),
            decimals_ttl_seconds: default_permanent_ttl(),
            price_ttl_seconds: default_price_ttl(),
            name_ttl_seconds: default_name_ttl(),
            metadata_ttl_seconds: default_metadata_ttl(),
        }
    }
}

impl CacheConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the key prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the price TTL.
    #[must_use]
    pub fn with_price_ttl(mut self, ttl: Duration) -> Self {
        self.price_ttl_seconds = ttl.as_secs();
        self
    }

    /// Builds a configuration from defaults overridden by environment variables.
    ///
    /// Reads `ENRICHFLOW_CACHE_PREFIX`, `ENRICHFLOW_ABI_TTL_SECONDS`,
    /// `ENRICHFLOW_DECIMALS_TTL_SECONDS`, `ENRICHFLOW_PRICE_TTL_SECONDS`,
    /// `ENRICHFLOW_NAME_TTL_SECONDS` and `ENRICHFLOW_METADATA_TTL_SECONDS`.
    /// Unparseable values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`CacheConfig::from_env`], reading variables through `lookup`.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(prefix) = lookup("ENRICHFLOW_CACHE_PREFIX").filter(|p| !p.is_empty()) {
            config.prefix = prefix;
        }

        let overrides: [(&str, &mut u64); 5] = [
            ("ENRICHFLOW_ABI_TTL_SECONDS", &mut config.abi_ttl_seconds),
            ("ENRICHFLOW_DECIMALS_TTL_SECONDS", &mut config.decimals_ttl_seconds),
            ("ENRICHFLOW_PRICE_TTL_SECONDS", &mut config.price_ttl_seconds),
            ("ENRICHFLOW_NAME_TTL_SECONDS", &mut config.name_ttl_seconds),
            ("ENRICHFLOW_METADATA_TTL_SECONDS", &mut config.metadata_ttl_seconds),
        ];
        for (name, slot) in overrides {
            if let Some(raw) = lookup(name) {
                match raw.trim().parse::<u64>() {
                    Ok(seconds) => *slot = seconds,
                    Err(e) => warn!(variable = name, value = %raw, error = %e, "Ignoring invalid TTL override"),
                }
            }
        }
        config
    }

    /// Returns the TTL applied to entries of `category`.
    #[must_use]
    pub fn ttl_for(&self, category: CacheCategory) -> Duration {
        let seconds = match category {
            CacheCategory::Abi => self.abi_ttl_seconds,
            CacheCategory::Decimals | CacheCategory::Symbol => self.decimals_ttl_seconds,
            CacheCategory::Price => self.price_ttl_seconds,
            CacheCategory::Name => self.name_ttl_seconds,
            CacheCategory::Metadata => self.metadata_ttl_seconds,
        };
        Duration::from_secs(seconds)
    }
}
