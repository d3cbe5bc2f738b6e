//! Dependency ordering for manifest features
//!
//! Produces an execution order in which every feature appears after all the
//! features it lists under `depends`.
//!
//! ## Algorithm
//!
//! Kahn-style peeling that keeps the manifest's declaration order stable:
//!
//! 1. Seed the result with every node that has no dependencies, in order
//! 2. Repeatedly scan the remaining nodes in order, appending any node whose
//!    dependencies are all already placed
//! 3. If a full scan places nothing, first unmet dependencies are followed
//!    from the first remaining node until they reach an undeclared name
//!    (missing) or loop back (circular)
//!
//! ## Example
//!
//! ```text
//! [a] depends = b
//! [b]
//!
//! Result: [b, a]
//! ```

use std::collections::{HashMap, HashSet};

use crate::error::{self, Result, RiggerError};

/// A named node and the names it depends on
pub type Node = (String, Vec<String>);

/// Order nodes so that every node follows its dependencies
///
/// # Arguments
///
/// * `nodes` - Nodes in declaration order with their dependency lists
///
/// # Errors
///
/// Returns `DuplicateNode` if a name is declared twice, `MissingDependency`
/// if the stuck nodes wait on an undeclared name, and `CircularDependency`
/// if they wait on each other.
pub fn order(nodes: &[Node]) -> Result<Vec<String>> {
    let mut declared = HashSet::new();
    for (name, _) in nodes {
        if !declared.insert(name.as_str()) {
            return Err(error::deps::duplicate(name));
        }
    }

    let mut placed: HashSet<&str> = HashSet::new();
    let mut result = Vec::with_capacity(nodes.len());

    for (name, deps) in nodes {
        if deps.is_empty() {
            placed.insert(name);
            result.push(name.clone());
        }
    }

    let mut remaining: Vec<&Node> = nodes.iter().filter(|(_, deps)| !deps.is_empty()).collect();

    while !remaining.is_empty() {
        let before = remaining.len();
        let mut still_waiting = Vec::with_capacity(before);

        for node in remaining {
            let (name, deps) = node;
            if deps.iter().all(|dep| placed.contains(dep.as_str())) {
                placed.insert(name);
                result.push(name.clone());
            } else {
                still_waiting.push(node);
            }
        }

        if still_waiting.len() == before {
            return Err(stuck_error(&still_waiting, &placed));
        }

        remaining = still_waiting;
    }

    Ok(result)
}

/// Explain why nothing more can be placed
///
/// Follows first unmet dependencies from the first stuck node. Reaching an
/// undeclared name is a missing dependency of the node that lists it;
/// reaching an already visited node is a cycle through that node.
fn stuck_error(stuck: &[&Node], placed: &HashSet<&str>) -> RiggerError {
    let waiting: HashMap<&str, &[String]> = stuck
        .iter()
        .map(|(name, deps)| (name.as_str(), deps.as_slice()))
        .collect();
    let first_unmet = |deps: &[String]| -> String {
        deps.iter()
            .find(|dep| !placed.contains(dep.as_str()))
            .cloned()
            .unwrap_or_default()
    };

    let (start, start_deps) = stuck[0];
    let mut visited: HashSet<&str> = HashSet::new();
    let mut name = start.as_str();
    let mut unmet = first_unmet(start_deps);
    loop {
        visited.insert(name);
        let Some((next, next_deps)) = waiting.get_key_value(unmet.as_str()) else {
            return error::deps::missing(name, unmet);
        };
        if visited.contains(next) {
            let dependency = first_unmet(next_deps);
            return error::deps::circular(*next, dependency);
        }
        name = *next;
        unmet = first_unmet(next_deps);
    }
}

/// Split a raw `depends` value into names
///
/// Names may be separated by commas, whitespace or newlines.
pub fn parse_depends(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RiggerError;

    fn node(name: &str, deps: &[&str]) -> Node {
        (
            name.to_string(),
            deps.iter().map(|d| (*d).to_string()).collect(),
        )
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn test_dependency_placed_first() {
        let result = order(&[node("a", &["b"]), node("b", &[])]).unwrap();
        assert_eq!(result, vec!["b", "a"]);
    }

    #[test]
    fn test_independent_nodes_keep_declaration_order() {
        let result = order(&[node("x", &[]), node("y", &[]), node("z", &[])]).unwrap();
        assert_eq!(result, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_every_node_follows_its_dependencies() {
        let nodes = vec![
            node("app", &["db", "cache"]),
            node("cache", &["base"]),
            node("db", &["base"]),
            node("base", &[]),
            node("tools", &[]),
            node("docs", &["app", "tools"]),
        ];
        let result = order(&nodes).unwrap();
        assert_eq!(result.len(), nodes.len());
        for (name, deps) in &nodes {
            for dep in deps {
                assert!(position(&result, dep) < position(&result, name));
            }
        }
    }

    #[test]
    fn test_self_dependency_is_circular() {
        let err = order(&[node("a", &["a"])]).unwrap_err();
        assert!(matches!(
            err,
            RiggerError::CircularDependency { ref node, ref dependency }
                if node == "a" && dependency == "a"
        ));
    }

    #[test]
    fn test_cycle_reports_first_stuck_node() {
        let err = order(&[node("ok", &[]), node("a", &["b"]), node("b", &["a"])]).unwrap_err();
        assert!(matches!(
            err,
            RiggerError::CircularDependency { ref node, ref dependency }
                if node == "a" && dependency == "b"
        ));
    }

    #[test]
    fn test_missing_dependency_is_distinct() {
        let err = order(&[node("a", &["ghost"])]).unwrap_err();
        assert!(matches!(
            err,
            RiggerError::MissingDependency { ref node, ref dependency }
                if node == "a" && dependency == "ghost"
        ));
    }

    #[test]
    fn test_chain_ending_in_undeclared_name_is_missing() {
        let err = order(&[node("a", &["b"]), node("b", &["ghost"])]).unwrap_err();
        assert!(matches!(
            err,
            RiggerError::MissingDependency { ref node, ref dependency }
                if node == "b" && dependency == "ghost"
        ));
    }

    #[test]
    fn test_chain_into_cycle_names_cycle_member() {
        let err = order(&[
            node("app", &["lib"]),
            node("lib", &["core"]),
            node("core", &["lib"]),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            RiggerError::CircularDependency { ref node, ref dependency }
                if node == "lib" && dependency == "core"
        ));
    }

    #[test]
    fn test_duplicate_node_rejected_before_ordering() {
        let err = order(&[node("a", &["missing"]), node("a", &[])]).unwrap_err();
        assert!(matches!(err, RiggerError::DuplicateNode { ref name } if name == "a"));
    }

    #[test]
    fn test_parse_depends_separators() {
        assert_eq!(parse_depends("a, b\n c  d,,"), vec!["a", "b", "c", "d"]);
        assert!(parse_depends("  ").is_empty());
    }
}
