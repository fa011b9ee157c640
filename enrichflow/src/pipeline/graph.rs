//! Dependency graph construction.
//!
//! Built from `(tool, declared dependencies)` pairs in registration order.
//! Edges run from each dependency to its dependents.

use crate::errors::MissingDependencyError;
use std::collections::{HashMap, HashSet};

/// Adjacency (dependency -> dependents) and in-degree per tool.
///
/// Node order and each adjacency list follow registration order, which is
/// what makes scheduling reproducible.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<String>,
    dependents: HashMap<String, Vec<String>>,
    in_degree: HashMap<String, usize>,
}

impl DependencyGraph {
    /// Builds and validates a graph.
    ///
    /// Duplicate entries in one tool's dependency list count once.
    ///
    /// # Errors
    ///
    /// Returns [`MissingDependencyError`] for the first declared dependency
    /// (in registration order) that names no registered tool.
    pub fn build<'a, I, D>(tools: I) -> Result<Self, MissingDependencyError>
    where
        I: IntoIterator<Item = (&'a str, D)>,
        D: IntoIterator<Item = &'a str>,
    {
        let tools: Vec<(&str, Vec<&str>)> = tools
            .into_iter()
            .map(|(name, deps)| (name, deps.into_iter().collect()))
            .collect();
        let known: HashSet<&str> = tools.iter().map(|(name, _)| *name).collect();

        let mut graph = Self {
            nodes: Vec::with_capacity(tools.len()),
            dependents: HashMap::with_capacity(tools.len()),
            in_degree: HashMap::with_capacity(tools.len()),
        };
        for (name, _) in &tools {
            graph.nodes.push((*name).to_string());
            graph.dependents.insert((*name).to_string(), Vec::new());
            graph.in_degree.insert((*name).to_string(), 0);
        }

        for (name, deps) in &tools {
            let mut seen = HashSet::new();
            for dep in deps {
                if !known.contains(dep) {
                    return Err(MissingDependencyError::new(*name, *dep));
                }
                if !seen.insert(*dep) {
                    continue;
                }
                if let Some(children) = graph.dependents.get_mut(*dep) {
                    children.push((*name).to_string());
                }
                if let Some(count) = graph.in_degree.get_mut(*name) {
                    *count += 1;
                }
            }
        }

        Ok(graph)
    }

    /// Returns tool names in registration order.
    #[must_use]
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Returns the tools that declared `name` as a dependency.
    #[must_use]
    pub fn dependents(&self, name: &str) -> &[String] {
        self.dependents.get(name).map_or(&[], Vec::as_slice)
    }

    /// Returns the number of distinct dependencies `name` declared.
    #[must_use]
    pub fn in_degree(&self, name: &str) -> Option<usize> {
        self.in_degree.get(name).copied()
    }

    /// Returns the number of tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no tools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn in_degrees(&self) -> HashMap<&str, usize> {
        self.in_degree
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacency_and_in_degree() {
        let graph = DependencyGraph::build([
            ("price", vec!["decode", "metadata"]),
            ("decode", vec!["fetch_raw"]),
            ("metadata", vec!["fetch_raw"]),
            ("fetch_raw", vec![]),
        ])
        .unwrap();

        assert_eq!(graph.len(), 4);
        assert_eq!(graph.dependents("fetch_raw"), ["decode", "metadata"]);
        assert_eq!(graph.dependents("price"), [] as [String; 0]);
        assert_eq!(graph.in_degree("price"), Some(2));
        assert_eq!(graph.in_degree("fetch_raw"), Some(0));
        assert_eq!(graph.in_degree("unknown"), None);
    }

    #[test]
    fn test_missing_dependency_names_both_sides() {
        let err = DependencyGraph::build([("decode", vec!["fetch_raw"])]).unwrap_err();
        assert_eq!(err.tool, "decode");
        assert_eq!(err.dependency, "fetch_raw");
    }

    #[test]
    fn test_duplicate_dependency_counts_once() {
        let graph =
            DependencyGraph::build([("a", vec![]), ("b", vec!["a", "a"])]).unwrap();
        assert_eq!(graph.in_degree("b"), Some(1));
        assert_eq!(graph.dependents("a"), ["b"]);
    }

    #[test]
    fn test_empty_graph() {
        let graph = DependencyGraph::build(Vec::<(&str, Vec<&str>)>::new()).unwrap();
        assert!(graph.is_empty());
    }
}
