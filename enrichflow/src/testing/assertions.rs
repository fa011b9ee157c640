//! Assertions over execution orders.

use crate::pipeline::Pipeline;
use std::collections::HashSet;

/// Asserts that `before` appears strictly earlier than `after` in `order`.
pub fn assert_runs_before(order: &[String], before: &str, after: &str) {
    let pos = |name: &str| order.iter().position(|n| n == name);
    match (pos(before), pos(after)) {
        (Some(b), Some(a)) => assert!(
            b < a,
            "Expected '{before}' to run before '{after}', got order {order:?}"
        ),
        _ => panic!("Expected both '{before}' and '{after}' in order {order:?}"),
    }
}

/// Asserts that `order` contains every name in `expected` exactly once and nothing else.
pub fn assert_each_once<S: AsRef<str>>(order: &[String], expected: &[S]) {
    assert_eq!(
        order.len(),
        expected.len(),
        "Expected {} entries, got order {order:?}",
        expected.len()
    );
    let unique: HashSet<&str> = order.iter().map(String::as_str).collect();
    assert_eq!(unique.len(), order.len(), "Duplicate entries in order {order:?}");
    for name in expected {
        assert!(
            unique.contains(name.as_ref()),
            "Expected '{}' in order {order:?}",
            name.as_ref()
        );
    }
}

/// Asserts that every declared dependency in `pipeline` precedes its dependent in `order`.
pub fn assert_respects_dependencies(pipeline: &Pipeline, order: &[String]) {
    for name in order {
        for dep in pipeline.dependencies_of(name).unwrap_or(&[]) {
            assert_runs_before(order, dep, name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn test_runs_before() {
        assert_runs_before(&order(&["a", "b"]), "a", "b");
    }

    #[test]
    #[should_panic(expected = "to run before")]
    fn test_runs_before_panics_when_reversed() {
        assert_runs_before(&order(&["b", "a"]), "a", "b");
    }

    #[test]
    fn test_each_once() {
        assert_each_once(&order(&["c", "a", "b"]), &["a", "b", "c"]);
    }

    #[test]
    #[should_panic(expected = "Duplicate")]
    fn test_each_once_rejects_duplicates() {
        assert_each_once(&order(&["a", "a"]), &["a", "b"]);
    }
}
