// Whole-program class reference graph

mod builder;
pub mod reference;

pub use builder::{GraphBuilder, ParseFailure};
pub use reference::{ClassName, ClassReferences, ReferenceCollector, ReferenceKind};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};

/// Directed graph of classes, an edge meaning "origin references target"
///
/// Vertices are created lazily, one per distinct class name. The graph is
/// simple: recording an edge that already exists changes nothing, and the
/// edge keeps the kind it was first recorded with.
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    inner: DiGraph<ClassName, ReferenceKind>,

    /// Map from class name to node index
    node_map: HashMap<ClassName, NodeIndex>,
}

impl ReferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn vertex(&mut self, name: &ClassName) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            return index;
        }
        let index = self.inner.add_node(name.clone());
        self.node_map.insert(name.clone(), index);
        index
    }

    /// Merge the references of `origin` into the graph
    pub fn record_references(&mut self, origin: &ClassName, references: &ClassReferences) {
        let from = self.vertex(origin);
        for (name, kind) in references.iter() {
            let to = self.vertex(name);
            if self.inner.find_edge(from, to).is_none() {
                self.inner.add_edge(from, to, kind);
            }
        }
    }

    /// Classes referenced directly by any of `seeds`
    ///
    /// One hop only: what the referenced classes reference in turn is not
    /// followed. A seed is part of the result only when another seed
    /// references it.
    pub fn reachable_from<'a, I>(&self, seeds: I) -> BTreeSet<ClassName>
    where
        I: IntoIterator<Item = &'a ClassName>,
    {
        seeds
            .into_iter()
            .filter_map(|seed| self.node_map.get(seed))
            .flat_map(|&index| self.inner.neighbors_directed(index, Direction::Outgoing))
            .map(|index| self.inner[index].clone())
            .collect()
    }

    /// Outgoing references of a class with the recorded kind
    pub fn references_from(&self, name: &str) -> Vec<(&ClassName, ReferenceKind)> {
        self.edges(name, Direction::Outgoing)
    }

    /// Classes referencing `name`, with the recorded kind
    pub fn referrers_of(&self, name: &str) -> Vec<(&ClassName, ReferenceKind)> {
        self.edges(name, Direction::Incoming)
    }

    fn edges(&self, name: &str, direction: Direction) -> Vec<(&ClassName, ReferenceKind)> {
        let Some(&index) = self.node_map.get(name) else {
            return Vec::new();
        };

        let mut edges: Vec<_> = self
            .inner
            .edges_directed(index, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                (&self.inner[other], *edge.weight())
            })
            .collect();
        edges.sort();
        edges
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node_map.contains_key(name)
    }

    pub fn vertex_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    /// Drop every vertex and edge
    pub fn clear(&mut self) {
        self.inner.clear();
        self.node_map.clear();
    }

    /// Get the underlying petgraph for advanced operations
    pub fn inner(&self) -> &DiGraph<ClassName, ReferenceKind> {
        &self.inner
    }
}
