//! Retrieval fragments produced by the export hooks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One retrievable piece of text contributed by a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagFragment {
    /// Stable identifier, conventionally `{tool}:{subject}`.
    pub id: String,
    /// The text to index.
    pub content: String,
    /// Free-form metadata for filtering.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl RagFragment {
    /// Creates a fragment with no metadata.
    #[must_use]
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// An ordered set of retrieval fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagContext {
    /// Fragments in contribution order.
    pub fragments: Vec<RagFragment>,
}

impl RagContext {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment.
    pub fn push(&mut self, fragment: RagFragment) {
        self.fragments.push(fragment);
    }

    /// Appends every fragment of `other`.
    pub fn extend(&mut self, other: Self) {
        self.fragments.extend(other.fragments);
    }

    /// Returns the number of fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Returns true if there are no fragments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl FromIterator<RagFragment> for RagContext {
    fn from_iter<I: IntoIterator<Item = RagFragment>>(iter: I) -> Self {
        Self {
            fragments: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_preserves_order() {
        let mut ctx: RagContext = [RagFragment::new("decode:call", "swapExactTokensForTokens")]
            .into_iter()
            .collect();
        ctx.extend(RagContext {
            fragments: vec![RagFragment::new("price:weth", "WETH = 3120 USD")
                .with_metadata("source", "market")],
        });

        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.fragments[1].id, "price:weth");
        assert_eq!(ctx.fragments[1].metadata.get("source").map(String::as_str), Some("market"));
    }
}
