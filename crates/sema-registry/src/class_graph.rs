//! Class hierarchy graph.
//!
//! Uses `petgraph::StableDiGraph` with:
//! - Nodes: record `TypeHash`
//! - Edges: derived -> direct base
//!
//! Node indices stay valid when a record is removed, which happens when a
//! template instance is rolled back.

use petgraph::algo::{all_simple_paths, has_path_connecting};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::Bfs;
use rustc_hash::FxHashMap;

use sema_core::{RegistrationError, TypeHash};

/// Inheritance relation between registered records.
#[derive(Debug, Default)]
pub struct ClassGraph {
    graph: StableDiGraph<TypeHash, ()>,
    nodes: FxHashMap<TypeHash, NodeIndex>,
}

impl ClassGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the node for `hash`.
    pub fn ensure_node(&mut self, hash: TypeHash) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&hash) {
            return idx;
        }
        let idx = self.graph.add_node(hash);
        self.nodes.insert(hash, idx);
        idx
    }

    pub fn contains(&self, hash: TypeHash) -> bool {
        self.nodes.contains_key(&hash)
    }

    /// Add a derived -> base edge.
    ///
    /// Fails if the edge would close a cycle.
    pub fn add_base(&mut self, derived: TypeHash, base: TypeHash, name: &str) -> Result<(), RegistrationError> {
        let d = self.ensure_node(derived);
        let b = self.ensure_node(base);
        if d == b || has_path_connecting(&self.graph, b, d, None) {
            return Err(RegistrationError::CircularInheritance {
                name: name.to_string(),
            });
        }
        self.graph.add_edge(d, b, ());
        Ok(())
    }

    /// Drop a record and all its edges.
    pub fn remove(&mut self, hash: TypeHash) {
        if let Some(idx) = self.nodes.remove(&hash) {
            self.graph.remove_node(idx);
        }
    }

    /// Whether `base` is a (direct or indirect) proper base class of `derived`.
    pub fn is_base_of(&self, base: TypeHash, derived: TypeHash) -> bool {
        match (self.nodes.get(&derived), self.nodes.get(&base)) {
            (Some(&d), Some(&b)) if d != b => has_path_connecting(&self.graph, d, b, None),
            _ => false,
        }
    }

    /// Number of distinct inheritance paths from `derived` up to `base`.
    ///
    /// More than one path means the base subobject is ambiguous.
    pub fn path_count(&self, derived: TypeHash, base: TypeHash) -> usize {
        match (self.nodes.get(&derived), self.nodes.get(&base)) {
            (Some(&d), Some(&b)) if d != b => {
                all_simple_paths::<Vec<_>, _>(&self.graph, d, b, 0, None).count()
            }
            _ => 0,
        }
    }

    /// Every proper base of `derived`, nearest first.
    pub fn all_bases(&self, derived: TypeHash) -> Vec<TypeHash> {
        let Some(&start) = self.nodes.get(&derived) else {
            return Vec::new();
        };
        let mut bases = Vec::new();
        let mut bfs = Bfs::new(&self.graph, start);
        while let Some(idx) = bfs.next(&self.graph) {
            if idx != start {
                bases.push(self.graph[idx]);
            }
        }
        bases
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}
