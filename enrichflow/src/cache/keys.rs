//! Cache key scheme and per-category TTL policy.
//!
//! Keys are `{prefix}:{category}:{network-id}:{identifier...}`. Every segment
//! is lower-cased and must be non-empty with no `:` or whitespace. The
//! segment order per category is fixed: changing it orphans every entry
//! already cached under the old scheme.

use crate::errors::CacheError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

/// Identifiers longer than this are replaced by their SHA-256 digest.
pub const MAX_IDENTIFIER_LEN: usize = 128;

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;

/// Effectively permanent: ten years.
pub const PERMANENT_TTL: Duration = Duration::from_secs(10 * 365 * DAY);

#[allow(clippy::expect_used)]
fn segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^:\s]+$").expect("static regex"))
}

/// Data category a cache entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheCategory {
    /// Contract interfaces. Immutable.
    Abi,
    /// Token decimal counts. Immutable.
    Decimals,
    /// Token symbols. Immutable.
    Symbol,
    /// Market prices. Volatile.
    Price,
    /// Name-service resolutions. Moderately stable.
    Name,
    /// Token and contract metadata. Moderately stable.
    Metadata,
}

impl CacheCategory {
    /// Returns the key tag for this category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abi => "abi",
            Self::Decimals => "decimals",
            Self::Symbol => "symbol",
            Self::Price => "price",
            Self::Name => "name",
            Self::Metadata => "metadata",
        }
    }

    /// Returns the default TTL for entries of this category.
    #[must_use]
    pub const fn default_ttl(self) -> Duration {
        match self {
            Self::Abi | Self::Decimals | Self::Symbol => PERMANENT_TTL,
            Self::Price => Duration::from_secs(HOUR),
            Self::Name => Duration::from_secs(30 * DAY),
            Self::Metadata => Duration::from_secs(7 * DAY),
        }
    }
}

impl fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built, validated cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    category: CacheCategory,
    key: String,
}

impl CacheKey {
    /// Builds a key for `category` on `network_id` identified by `parts`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidKey`] when the prefix or any part is
    /// empty or contains `:` or whitespace.
    pub fn build<I, S>(
        prefix: &str,
        category: CacheCategory,
        network_id: u64,
        parts: I,
    ) -> Result<Self, CacheError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut segments = vec![
            validate_segment(prefix)?,
            category.as_str().to_string(),
            network_id.to_string(),
        ];
        let before = segments.len();
        for part in parts {
            segments.push(normalize_identifier(part.as_ref())?);
        }
        if segments.len() == before {
            return Err(CacheError::invalid_key("", "at least one identifier is required"));
        }

        Ok(Self {
            category,
            key: segments.join(":"),
        })
    }

    /// Contract interface for `address`.
    pub fn abi(prefix: &str, network_id: u64, address: &str) -> Result<Self, CacheError> {
        Self::build(prefix, CacheCategory::Abi, network_id, [address])
    }

    /// Decimal count of the token at `address`.
    pub fn decimals(prefix: &str, network_id: u64, address: &str) -> Result<Self, CacheError> {
        Self::build(prefix, CacheCategory::Decimals, network_id, [address])
    }

    /// Symbol of the token at `address`.
    pub fn symbol(prefix: &str, network_id: u64, address: &str) -> Result<Self, CacheError> {
        Self::build(prefix, CacheCategory::Symbol, network_id, [address])
    }

    /// Price of `address` quoted in `currency`.
    pub fn price(
        prefix: &str,
        network_id: u64,
        address: &str,
        currency: &str,
    ) -> Result<Self, CacheError> {
        Self::build(prefix, CacheCategory::Price, network_id, [address, currency])
    }

    /// Name-service resolution for `address`.
    pub fn name(prefix: &str, network_id: u64, address: &str) -> Result<Self, CacheError> {
        Self::build(prefix, CacheCategory::Name, network_id, [address])
    }

    /// Metadata for `address`.
    pub fn metadata(prefix: &str, network_id: u64, address: &str) -> Result<Self, CacheError> {
        Self::build(prefix, CacheCategory::Metadata, network_id, [address])
    }

    /// Returns the category.
    #[must_use]
    pub const fn category(&self) -> CacheCategory {
        self.category
    }

    /// Returns the key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.key
    }
}

fn validate_segment(segment: &str) -> Result<String, CacheError> {
    if segment.is_empty() {
        return Err(CacheError::invalid_key(segment, "segment is empty"));
    }
    if !segment_pattern().is_match(segment) {
        return Err(CacheError::invalid_key(
            segment,
            "segment must not contain ':' or whitespace",
        ));
    }
    Ok(segment.to_lowercase())
}

fn normalize_identifier(part: &str) -> Result<String, CacheError> {
    let segment = validate_segment(part)?;
    if segment.len() > MAX_IDENTIFIER_LEN {
        return Ok(hex::encode(Sha256::digest(segment.as_bytes())));
    }
    Ok(segment)
}
