//! Namespaced, TTL-aware caching for external lookups.
//!
//! Tools use [`Cache`] to avoid repeating blockchain RPC, explorer and
//! market-data calls. Storage is delegated to a [`KvStore`] connector;
//! [`InMemoryStore`] is the bundled implementation.
//!
//! TTL policy is per [`CacheCategory`]: immutable facts (interfaces,
//! decimals) are effectively permanent, prices expire after an hour, name
//! resolutions after thirty days.

mod client;
mod keys;
mod store;

pub use client::Cache;
pub use keys::{CacheCategory, CacheKey, MAX_IDENTIFIER_LEN, PERMANENT_TTL};
pub use store::{InMemoryStore, KvStore};

#[cfg(test)]
pub(crate) use store::MockKvStore;
