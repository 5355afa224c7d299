//! Variable-level dependency graph
//!
//! Directed graph over [`Vertex`] identities backed by petgraph. Parallel
//! edges and self-loops are never inserted; [`DependencyGraph::ensure_edge`]
//! reports whether an edge was new, which the engine uses as its recursion
//! signal.

pub mod dot;
pub mod vertex;

use std::collections::{HashMap, VecDeque};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

pub use dot::DotError;
pub use vertex::{EnclNamePosTuple, UnsafeUse, Vertex};

#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<Vertex, ()>,
    index: HashMap<Vertex, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `vertex` unless already present and returns its node.
    pub fn add_vertex(&mut self, vertex: Vertex) -> NodeIndex {
        if let Some(&idx) = self.index.get(&vertex) {
            return idx;
        }
        let idx = self.graph.add_node(vertex.clone());
        self.index.insert(vertex, idx);
        idx
    }

    pub fn contains_vertex(&self, vertex: &Vertex) -> bool {
        self.index.contains_key(vertex)
    }

    pub fn contains_edge(&self, source: &Vertex, target: &Vertex) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Adds `source -> target`, inserting missing vertices. Returns `false`
    /// without touching the graph for a self-loop or an existing edge.
    pub fn ensure_edge(&mut self, source: &Vertex, target: &Vertex) -> bool {
        if source == target || self.contains_edge(source, target) {
            return false;
        }
        let a = self.add_vertex(source.clone());
        let b = self.add_vertex(target.clone());
        self.graph.add_edge(a, b, ());
        true
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&Vertex, &Vertex)> {
        self.graph.edge_indices().filter_map(move |edge| {
            let (a, b) = self.graph.edge_endpoints(edge)?;
            Some((&self.graph[a], &self.graph[b]))
        })
    }

    pub fn in_degree(&self, vertex: &Vertex) -> usize {
        self.index
            .get(vertex)
            .map(|&idx| self.graph.neighbors_directed(idx, Direction::Incoming).count())
            .unwrap_or(0)
    }

    /// Vertices nothing flows into, in insertion order.
    pub fn origins(&self) -> Vec<&Vertex> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|idx| &self.graph[idx])
            .collect()
    }

    pub fn successors(&self, vertex: &Vertex) -> Vec<&Vertex> {
        self.index
            .get(vertex)
            .map(|&idx| {
                self.successor_indices(idx)
                    .into_iter()
                    .map(|next| &self.graph[next])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Breadth-first search from `origin`, kept so that every reachable
    /// target can be traced from one traversal. Ties go to the edge inserted
    /// first.
    pub fn bfs_tree(&self, origin: &Vertex) -> Option<BfsTree<'_>> {
        let &start = self.index.get(origin)?;

        let mut parents: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut order = vec![start];
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for next in self.successor_indices(current) {
                if next == start || parents.contains_key(&next) {
                    continue;
                }
                parents.insert(next, current);
                order.push(next);
                queue.push_back(next);
            }
        }

        Some(BfsTree {
            graph: self,
            start,
            order,
            parents,
        })
    }

    // petgraph walks adjacency lists newest-first
    fn successor_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut next: Vec<_> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        next.reverse();
        next
    }

    fn backtrack(&self, end: NodeIndex, parents: &HashMap<NodeIndex, NodeIndex>) -> Vec<Vertex> {
        let mut path = vec![self.graph[end].clone()];
        let mut current = end;
        while let Some(&parent) = parents.get(&current) {
            path.push(self.graph[parent].clone());
            current = parent;
        }
        path.reverse();
        path
    }

    pub(crate) fn inner(&self) -> &DiGraph<Vertex, ()> {
        &self.graph
    }
}

/// Parent links of one breadth-first traversal.
pub struct BfsTree<'g> {
    graph: &'g DependencyGraph,
    start: NodeIndex,
    order: Vec<NodeIndex>,
    parents: HashMap<NodeIndex, NodeIndex>,
}

impl BfsTree<'_> {
    /// Fewest-edge path from the origin to `target`, both ends included.
    pub fn path_to(&self, target: &Vertex) -> Option<Vec<Vertex>> {
        let &goal = self.graph.index.get(target)?;
        if goal != self.start && !self.parents.contains_key(&goal) {
            return None;
        }
        Some(self.graph.backtrack(goal, &self.parents))
    }

    /// One path per reachable vertex (the origin included), in visit order.
    pub fn paths(&self) -> Vec<Vec<Vertex>> {
        self.order
            .iter()
            .map(|&idx| self.graph.backtrack(idx, &self.parents))
            .collect()
    }
}
