//! Topological scheduling (Kahn's algorithm).

use super::DependencyGraph;
use crate::errors::CycleDetectedError;
use std::collections::VecDeque;

/// Computes a deterministic execution order for `graph`.
///
/// The queue is seeded with zero in-degree tools in registration order, and
/// tools become eligible in the order their last dependency completes, so
/// ties break FIFO by first eligibility.
///
/// # Errors
///
/// Returns [`CycleDetectedError`] listing, in registration order, every tool
/// that could not be scheduled.
pub fn topological_order(graph: &DependencyGraph) -> Result<Vec<String>, CycleDetectedError> {
    let mut in_degree = graph.in_degrees();
    let mut queue: VecDeque<&str> = graph
        .nodes()
        .iter()
        .map(String::as_str)
        .filter(|name| in_degree.get(name).copied() == Some(0))
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(name) = queue.pop_front() {
        order.push(name.to_string());
        for child in graph.dependents(name) {
            if let Some(count) = in_degree.get_mut(child.as_str()) {
                *count -= 1;
                if *count == 0 {
                    queue.push_back(child.as_str());
                }
            }
        }
    }

    if order.len() < graph.len() {
        let unscheduled = graph
            .nodes()
            .iter()
            .filter(|name| in_degree.get(name.as_str()).copied().unwrap_or(0) > 0)
            .cloned()
            .collect();
        return Err(CycleDetectedError::new(unscheduled));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn order_of(tools: &[(&'static str, Vec<&'static str>)]) -> Result<Vec<String>, CycleDetectedError> {
        let graph = DependencyGraph::build(tools.iter().map(|(n, d)| (*n, d.iter().copied())))
            .expect("closed graph");
        topological_order(&graph)
    }

    #[test]
    fn test_chain_registered_backwards() {
        let order = order_of(&[
            ("price", vec!["decode"]),
            ("decode", vec!["fetch_raw"]),
            ("fetch_raw", vec![]),
        ])
        .unwrap();
        assert_eq!(order, vec!["fetch_raw", "decode", "price"]);
    }

    #[test]
    fn test_independent_tools_keep_registration_order() {
        let order = order_of(&[("c", vec![]), ("a", vec![]), ("b", vec![])]).unwrap();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_fifo_tie_break_by_eligibility() {
        // `late` becomes eligible only after `root`, so it runs after the other roots.
        let order = order_of(&[
            ("late", vec!["root"]),
            ("root", vec![]),
            ("other", vec![]),
            ("join", vec!["late", "other"]),
        ])
        .unwrap();
        assert_eq!(order, vec!["root", "other", "late", "join"]);
    }

    #[test]
    fn test_diamond() {
        let order = order_of(&[
            ("fetch_raw", vec![]),
            ("decode", vec!["fetch_raw"]),
            ("metadata", vec!["fetch_raw"]),
            ("explain", vec!["decode", "metadata"]),
        ])
        .unwrap();
        assert_eq!(order, vec!["fetch_raw", "decode", "metadata", "explain"]);
    }

    #[test]
    fn test_two_cycle_reports_members() {
        let err = order_of(&[("a", vec!["b"]), ("b", vec!["a"]), ("c", vec![])]).unwrap_err();
        assert_eq!(err.members, vec!["a", "b"]);
    }

    #[test]
    fn test_downstream_of_cycle_is_unscheduled() {
        let err = order_of(&[
            ("a", vec!["b"]),
            ("b", vec!["a"]),
            ("tail", vec!["a"]),
            ("ok", vec![]),
        ])
        .unwrap_err();
        assert_eq!(err.members, vec!["a", "b", "tail"]);
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let err = order_of(&[("loop", vec!["loop"])]).unwrap_err();
        assert_eq!(err.members, vec!["loop"]);
    }

    #[test]
    fn test_deterministic_across_calls() {
        let tools = [
            ("x", vec![]),
            ("y", vec!["x"]),
            ("z", vec![]),
            ("w", vec!["z", "x"]),
        ];
        assert_eq!(order_of(&tools).unwrap(), order_of(&tools).unwrap());
    }
}
