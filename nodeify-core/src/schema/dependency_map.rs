//! Dependency Map
//!
//! The inverted form of the analyzer's output: for every attribute name, the
//! nodes whose computation reads it. Built once per type and read-only after.

use indexmap::IndexMap;
use serde::Serialize;

/// Attribute name to the ordered list of nodes that read it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DependencyMap {
    listeners: IndexMap<String, Vec<&'static str>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

impl DependencyMap {
    /// Invert `(node, reads)` pairs.
    ///
    /// Keys appear in order of first read; each listener list keeps the
    /// order in which nodes were given and holds each node once.
    pub fn from_reads<I>(reads: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Vec<String>)>,
    {
        let mut listeners: IndexMap<String, Vec<&'static str>> = IndexMap::new();
        for (node, attributes) in reads {
            for attribute in attributes {
                let entry = listeners.entry(attribute).or_default();
                if !entry.contains(&node) {
                    entry.push(node);
                }
            }
        }
        Self { listeners }
    }

    /// Nodes that read `attribute`.
    pub fn listeners(&self, attribute: &str) -> &[&'static str] {
        self.listeners.get(attribute).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[&'static str])> {
        self.listeners
            .iter()
            .map(|(attribute, nodes)| (attribute.as_str(), nodes.as_slice()))
    }

    /// Number of distinct attributes read by any node.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Find a node that transitively reads itself.
    ///
    /// Only edges between the given nodes count. The returned path starts
    /// and ends at the same node and follows upstream-to-listener edges.
    pub fn find_cycle(&self, nodes: &[&'static str]) -> Option<Vec<String>> {
        let mut marks: IndexMap<&'static str, Mark> =
            nodes.iter().map(|node| (*node, Mark::Unvisited)).collect();
        let mut stack = Vec::new();

        nodes
            .iter()
            .find_map(|node| self.visit(*node, &mut marks, &mut stack))
    }

    fn visit(
        &self,
        node: &'static str,
        marks: &mut IndexMap<&'static str, Mark>,
        stack: &mut Vec<&'static str>,
    ) -> Option<Vec<String>> {
        match marks.get(node)? {
            Mark::Done => return None,
            Mark::OnStack => {
                let start = stack.iter().position(|n| *n == node)?;
                let mut path: Vec<String> = stack[start..].iter().map(|n| n.to_string()).collect();
                path.push(node.to_string());
                return Some(path);
            }
            Mark::Unvisited => {}
        }

        marks[node] = Mark::OnStack;
        stack.push(node);
        for listener in self.listeners(node) {
            if let Some(cycle) = self.visit(*listener, marks, stack) {
                return Some(cycle);
            }
        }
        stack.pop();
        marks[node] = Mark::Done;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reads(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn inverts_reads() {
        let map = DependencyMap::from_reads([
            ("a", reads(&["x", "y"])),
            ("b", reads(&["a", "x"])),
        ]);

        assert_eq!(map.listeners("x"), &["a", "b"]);
        assert_eq!(map.listeners("y"), &["a"]);
        assert_eq!(map.listeners("a"), &["b"]);
        assert!(map.listeners("b").is_empty());
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn repeated_reads_produce_one_listener() {
        let map = DependencyMap::from_reads([("a", reads(&["x", "x", "x"]))]);
        assert_eq!(map.listeners("x"), &["a"]);
    }

    #[test]
    fn serializes_as_plain_map() {
        let map = DependencyMap::from_reads([("a", reads(&["x", "y"]))]);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"x":["a"],"y":["a"]}"#);
    }

    #[test]
    fn acyclic_graph_has_no_cycle() {
        let map = DependencyMap::from_reads([
            ("a", reads(&["x", "y"])),
            ("b", reads(&["a"])),
            ("c", reads(&["a", "b"])),
        ]);
        assert_eq!(map.find_cycle(&["x", "y", "a", "b", "c"]), None);
    }

    #[test]
    fn finds_self_read() {
        let map = DependencyMap::from_reads([("a", reads(&["a"]))]);
        assert_eq!(map.find_cycle(&["a"]), Some(reads(&["a", "a"])));
    }

    #[test]
    fn finds_indirect_cycle() {
        let map = DependencyMap::from_reads([
            ("a", reads(&["c"])),
            ("b", reads(&["a"])),
            ("c", reads(&["b"])),
        ]);
        assert_eq!(map.find_cycle(&["a", "b", "c"]), Some(reads(&["a", "b", "c", "a"])));
    }

    #[test]
    fn undeclared_names_break_cycles() {
        // "helper" is a plain method, not a node
        let map = DependencyMap::from_reads([
            ("helper", reads(&["a"])),
            ("a", reads(&["helper"])),
        ]);
        assert_eq!(map.find_cycle(&["a"]), None);
    }
}
