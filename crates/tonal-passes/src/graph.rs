//! Directed dependency graph and strongly connected components.
//!
//! Vertices are opaque identifiers (declaration names in practice). Both
//! forward and backward adjacency are kept, built incrementally as edges
//! arrive, in insertion order so that every traversal is deterministic for a
//! deterministic input.
//!
//! # Components
//!
//! [`Graph::components`] is Kosaraju's two-pass algorithm:
//!
//! 1. **Finishing order** - post-order DFS over forward edges, pushing each
//!    vertex once all its successors are done
//! 2. **Collection** - pop the finishing stack; each vertex not yet assigned
//!    starts a DFS over *reverse* edges that collects one component
//!
//! Membership is exact. The order of components and of vertices inside a
//! component follows visitation order and carries no meaning.

use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

/// A directed graph with forward and backward adjacency.
#[derive(Debug, Clone)]
pub struct Graph<V> {
    forward: IndexMap<V, Vec<V>>,
    backward: IndexMap<V, Vec<V>>,
}

impl<V> Default for Graph<V> {
    fn default() -> Self {
        Self {
            forward: IndexMap::new(),
            backward: IndexMap::new(),
        }
    }
}

impl<V: Clone + Eq + Hash> Graph<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a vertex with an empty edge set. Idempotent.
    pub fn add_vertex(&mut self, v: V) {
        self.backward.entry(v.clone()).or_default();
        self.forward.entry(v).or_default();
    }

    /// Record `from -> to`, registering both endpoints. Idempotent.
    pub fn add_edge(&mut self, from: V, to: V) {
        self.add_vertex(from.clone());
        self.add_vertex(to.clone());

        let out = self.forward.entry(from.clone()).or_default();
        if !out.contains(&to) {
            out.push(to.clone());
        }
        let inc = self.backward.entry(to).or_default();
        if !inc.contains(&from) {
            inc.push(from);
        }
    }

    pub fn contains(&self, v: &V) -> bool {
        self.forward.contains_key(v)
    }

    /// Vertices in registration order.
    pub fn vertices(&self) -> impl Iterator<Item = &V> {
        self.forward.keys()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// What `v` depends on (its successors). Empty for unknown vertices.
    pub fn dependencies(&self, v: &V) -> &[V] {
        self.forward.get(v).map(Vec::as_slice).unwrap_or(&[])
    }

    /// What depends on `v` (its predecessors). Empty for unknown vertices.
    pub fn rev_dependencies(&self, v: &V) -> &[V] {
        self.backward.get(v).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Strongly connected components.
    ///
    /// Every vertex lands in exactly one component; isolated vertices form
    /// singletons.
    pub fn components(&self) -> Vec<Vec<V>> {
        let mut visited = IndexSet::new();
        let mut finished = Vec::with_capacity(self.len());
        for v in self.forward.keys() {
            self.finish(v, &mut visited, &mut finished);
        }

        let mut assigned = IndexSet::new();
        let mut components = Vec::new();
        while let Some(v) = finished.pop() {
            if assigned.contains(v) {
                continue;
            }
            let mut component = Vec::new();
            self.collect(v, &mut assigned, &mut component);
            components.push(component);
        }
        components
    }

    /// Components that form a cycle: more than one vertex, or a self-loop.
    pub fn cycles(&self) -> Vec<Vec<V>> {
        self.components()
            .into_iter()
            .filter(|c| match c.as_slice() {
                [single] => self.dependencies(single).contains(single),
                _ => true,
            })
            .collect()
    }

    fn finish<'a>(&'a self, v: &'a V, visited: &mut IndexSet<&'a V>, finished: &mut Vec<&'a V>) {
        if !visited.insert(v) {
            return;
        }
        for next in self.dependencies(v) {
            self.finish(next, visited, finished);
        }
        finished.push(v);
    }

    fn collect<'a>(&'a self, v: &'a V, assigned: &mut IndexSet<&'a V>, component: &mut Vec<V>) {
        if !assigned.insert(v) {
            return;
        }
        component.push(v.clone());
        for prev in self.rev_dependencies(v) {
            self.collect(prev, assigned, component);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut components: Vec<Vec<&'static str>>) -> Vec<Vec<&'static str>> {
        for c in &mut components {
            c.sort_unstable();
        }
        components.sort();
        components
    }

    #[test]
    fn test_add_edge_registers_endpoints_once() {
        let mut graph = Graph::new();
        graph.add_edge("a", "b");
        graph.add_edge("a", "b");

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.dependencies(&"a"), &["b"]);
        assert_eq!(graph.rev_dependencies(&"b"), &["a"]);
        assert!(graph.dependencies(&"b").is_empty());
    }

    #[test]
    fn test_unknown_vertex_has_no_edges() {
        let graph: Graph<&str> = Graph::new();
        assert!(graph.dependencies(&"missing").is_empty());
        assert!(graph.rev_dependencies(&"missing").is_empty());
        assert!(!graph.contains(&"missing"));
    }

    #[test]
    fn test_three_cycle_and_isolated_vertex() {
        let mut graph = Graph::new();
        graph.add_edge("A", "B");
        graph.add_edge("B", "C");
        graph.add_edge("C", "A");
        graph.add_vertex("D");

        assert_eq!(
            sorted(graph.components()),
            vec![vec!["A", "B", "C"], vec!["D"]]
        );
    }

    #[test]
    fn test_membership_ignores_insertion_order() {
        let edges = [("x", "y"), ("y", "x"), ("y", "z"), ("z", "w"), ("w", "z")];

        let mut forward = Graph::new();
        for (from, to) in edges {
            forward.add_edge(from, to);
        }
        let mut reversed = Graph::new();
        for (from, to) in edges.iter().rev() {
            reversed.add_edge(*from, *to);
        }

        let expected = vec![vec!["w", "z"], vec!["x", "y"]];
        assert_eq!(sorted(forward.components()), expected);
        assert_eq!(sorted(reversed.components()), expected);
    }

    #[test]
    fn test_chain_is_all_singletons() {
        let mut graph = Graph::new();
        graph.add_edge("A", "B");
        graph.add_edge("B", "C");

        assert_eq!(graph.components().len(), 3);
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let mut graph = Graph::new();
        graph.add_edge("f", "f");
        graph.add_edge("f", "g");

        assert_eq!(graph.cycles(), vec![vec!["f"]]);
    }
}
