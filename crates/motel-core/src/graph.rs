//! # Graph Store
//!
//! The attributed directed multigraph each document is stored as.
//!
//! This module defines the `GraphStore` trait, the contract every storage
//! backend fulfills, and `Graph`, the in-memory implementation.
//! All data structures use `BTreeMap` for deterministic ordering.

use crate::config::EdgeWeights;
use crate::primitives::{POSITIVE_LABEL, USER_LABEL_KIND};
use crate::{Attribute, Edge, EdgeId, MotelError, Vertex, VertexId};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// GRAPHSTORE TRAIT
// =============================================================================

/// The GraphStore trait defines the operations the engine needs from a
/// document store.
///
/// All fallible operations return `Result<T, MotelError>` to support both
/// in-memory and persistent storage backends uniformly.
pub trait GraphStore {
    /// Create a vertex carrying the given attributes. Returns its id.
    fn create_vertex(&mut self, attributes: Vec<Attribute>) -> Result<VertexId, MotelError>;

    /// Append an attribute to an existing vertex.
    ///
    /// Attributes are append-only; existing entries are never touched.
    fn add_attribute(&mut self, vertex: VertexId, attribute: Attribute) -> Result<(), MotelError>;

    /// Create a labeled edge between two existing vertices. Returns its id.
    ///
    /// Fails with `EdgeEndpointMissing` if either endpoint does not exist.
    fn create_edge(
        &mut self,
        source: VertexId,
        label: &str,
        destination: VertexId,
    ) -> Result<EdgeId, MotelError>;

    /// Lookup a vertex with its attributes.
    fn vertex(&self, id: VertexId) -> Result<Option<Vertex>, MotelError>;

    /// Check if a vertex exists.
    fn contains_vertex(&self, id: VertexId) -> Result<bool, MotelError>;

    /// All vertex ids in ascending order.
    fn vertex_ids(&self) -> Result<Vec<VertexId>, MotelError>;

    /// All attributes of a vertex, in insertion order.
    fn attributes(&self, vertex: VertexId) -> Result<Vec<Attribute>, MotelError>;

    /// All vertices carrying the attribute `(kind, value)`.
    fn select_vertices(&self, kind: &str, value: &str) -> Result<BTreeSet<VertexId>, MotelError>;

    /// All edges with exactly the given label.
    fn select_edges(&self, label: &str) -> Result<Vec<Edge>, MotelError>;

    /// All edges with `vertex` as source or destination, ordered by edge id.
    fn incident_edges(&self, vertex: VertexId) -> Result<Vec<Edge>, MotelError>;

    /// All edges ordered by edge id.
    fn edges(&self) -> Result<Vec<Edge>, MotelError>;

    /// Get the total number of vertices.
    fn vertex_count(&self) -> Result<usize, MotelError>;

    /// Get the total number of edges.
    fn edge_count(&self) -> Result<usize, MotelError>;

    /// Weighted neighbor expansion: every incident edge of `vertex` with the
    /// opposite endpoint and the edge's traversal weight.
    fn weighted_neighbors(
        &self,
        vertex: VertexId,
        weights: &EdgeWeights,
    ) -> Result<Vec<(Edge, VertexId, f64)>, MotelError> {
        Ok(self
            .incident_edges(vertex)?
            .into_iter()
            .filter_map(|edge| {
                let other = edge.other_endpoint(vertex)?;
                let weight = weights.weight(&edge.label);
                Some((edge, other, weight))
            })
            .collect())
    }

    /// All edges whose endpoints both lie in `vertices`.
    fn edges_between(&self, vertices: &BTreeSet<VertexId>) -> Result<Vec<Edge>, MotelError> {
        let mut found = BTreeMap::new();
        for &vertex in vertices {
            for edge in self.incident_edges(vertex)? {
                if vertices.contains(&edge.source) && vertices.contains(&edge.destination) {
                    found.insert(edge.id, edge);
                }
            }
        }
        Ok(found.into_values().collect())
    }

    /// All vertices the analyst labeled positive: the ground-truth seeds.
    fn positive_vertices(&self) -> Result<BTreeSet<VertexId>, MotelError> {
        self.select_vertices(USER_LABEL_KIND, POSITIVE_LABEL)
    }
}

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// The in-memory graph.
///
/// Uses `BTreeMap` exclusively for deterministic ordering.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Vertex storage: VertexId -> attributes in insertion order
    vertices: BTreeMap<VertexId, Vec<Attribute>>,

    /// Edge storage: EdgeId -> Edge
    edges: BTreeMap<EdgeId, Edge>,

    /// Outgoing adjacency: source -> edge ids
    outgoing: BTreeMap<VertexId, BTreeSet<EdgeId>>,

    /// Incoming adjacency: destination -> edge ids
    incoming: BTreeMap<VertexId, BTreeSet<EdgeId>>,

    /// Next available VertexId
    next_vertex_id: u64,

    /// Next available EdgeId
    next_edge_id: u64,
}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all vertices in deterministic order.
    pub fn vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        self.vertices
            .iter()
            .map(|(id, attributes)| Vertex::new(*id, attributes.clone()))
    }

    /// Iterate edge ids touching a vertex (outgoing first, deduplicated).
    fn incident_ids(&self, vertex: VertexId) -> BTreeSet<EdgeId> {
        let mut ids = BTreeSet::new();
        if let Some(out) = self.outgoing.get(&vertex) {
            ids.extend(out.iter().copied());
        }
        if let Some(inc) = self.incoming.get(&vertex) {
            ids.extend(inc.iter().copied());
        }
        ids
    }
}

impl GraphStore for Graph {
    fn create_vertex(&mut self, attributes: Vec<Attribute>) -> Result<VertexId, MotelError> {
        let id = VertexId(self.next_vertex_id);
        self.next_vertex_id = self.next_vertex_id.saturating_add(1);
        self.vertices.insert(id, attributes);
        tracing::debug!(vertex = id.0, "constructed vertex");
        Ok(id)
    }

    fn add_attribute(&mut self, vertex: VertexId, attribute: Attribute) -> Result<(), MotelError> {
        self.vertices
            .get_mut(&vertex)
            .ok_or(MotelError::VertexNotFound(vertex))?
            .push(attribute);
        Ok(())
    }

    fn create_edge(
        &mut self,
        source: VertexId,
        label: &str,
        destination: VertexId,
    ) -> Result<EdgeId, MotelError> {
        if !self.vertices.contains_key(&source) || !self.vertices.contains_key(&destination) {
            return Err(MotelError::EdgeEndpointMissing(source, destination));
        }

        let id = EdgeId(self.next_edge_id);
        self.next_edge_id = self.next_edge_id.saturating_add(1);

        self.edges
            .insert(id, Edge::new(id, source, destination, label));
        self.outgoing.entry(source).or_default().insert(id);
        self.incoming.entry(destination).or_default().insert(id);

        tracing::debug!(edge = id.0, "constructed edge {} --{}-> {}", source, label, destination);
        Ok(id)
    }

    fn vertex(&self, id: VertexId) -> Result<Option<Vertex>, MotelError> {
        Ok(self
            .vertices
            .get(&id)
            .map(|attributes| Vertex::new(id, attributes.clone())))
    }

    fn contains_vertex(&self, id: VertexId) -> Result<bool, MotelError> {
        Ok(self.vertices.contains_key(&id))
    }

    fn vertex_ids(&self) -> Result<Vec<VertexId>, MotelError> {
        Ok(self.vertices.keys().copied().collect())
    }

    fn attributes(&self, vertex: VertexId) -> Result<Vec<Attribute>, MotelError> {
        self.vertices
            .get(&vertex)
            .cloned()
            .ok_or(MotelError::VertexNotFound(vertex))
    }

    fn select_vertices(&self, kind: &str, value: &str) -> Result<BTreeSet<VertexId>, MotelError> {
        Ok(self
            .vertices
            .iter()
            .filter(|(_, attributes)| attributes.iter().any(|a| a.matches(kind, value)))
            .map(|(id, _)| *id)
            .collect())
    }

    fn select_edges(&self, label: &str) -> Result<Vec<Edge>, MotelError> {
        Ok(self
            .edges
            .values()
            .filter(|edge| edge.label == label)
            .cloned()
            .collect())
    }

    fn incident_edges(&self, vertex: VertexId) -> Result<Vec<Edge>, MotelError> {
        Ok(self
            .incident_ids(vertex)
            .into_iter()
            .filter_map(|id| self.edges.get(&id).cloned())
            .collect())
    }

    fn edges(&self) -> Result<Vec<Edge>, MotelError> {
        Ok(self.edges.values().cloned().collect())
    }

    fn vertex_count(&self) -> Result<usize, MotelError> {
        Ok(self.vertices.len())
    }

    fn edge_count(&self) -> Result<usize, MotelError> {
        Ok(self.edges.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn noun() -> Attribute {
        Attribute::new("pos", "NOUN")
    }

    #[test]
    fn create_and_lookup_vertex() {
        let mut graph = Graph::new();
        let id = graph.create_vertex(vec![noun()]).expect("create");

        let vertex = graph.vertex(id).expect("lookup");
        assert_eq!(vertex.map(|v| v.attributes), Some(vec![noun()]));
        assert_eq!(graph.vertex_count().expect("count"), 1);
    }

    #[test]
    fn vertex_ids_are_unique() {
        let mut graph = Graph::new();
        let a = graph.create_vertex(Vec::new()).expect("create");
        let b = graph.create_vertex(Vec::new()).expect("create");
        assert_ne!(a, b);
    }

    #[test]
    fn attributes_are_append_only() {
        let mut graph = Graph::new();
        let id = graph.create_vertex(vec![noun()]).expect("create");
        graph
            .add_attribute(id, Attribute::new("pos", "PROPN"))
            .expect("append");

        let attrs = graph.attributes(id).expect("attrs");
        assert_eq!(attrs, vec![noun(), Attribute::new("pos", "PROPN")]);
    }

    #[test]
    fn add_attribute_nonexistent_vertex_fails() {
        let mut graph = Graph::new();
        let result = graph.add_attribute(VertexId(999), noun());
        assert!(matches!(result, Err(MotelError::VertexNotFound(_))));
    }

    #[test]
    fn parallel_edges_with_distinct_labels() {
        let mut graph = Graph::new();
        let a = graph.create_vertex(Vec::new()).expect("create");
        let b = graph.create_vertex(Vec::new()).expect("create");

        graph.create_edge(a, "motel:next", b).expect("edge");
        graph.create_edge(a, "spacy:amod", b).expect("edge");

        assert_eq!(graph.edge_count().expect("count"), 2);
        assert_eq!(graph.select_edges("motel:next").expect("select").len(), 1);
    }

    #[test]
    fn create_edge_rejects_dangling_endpoints() {
        let mut graph = Graph::new();
        let a = graph.create_vertex(Vec::new()).expect("create");

        let result = graph.create_edge(a, "motel:next", VertexId(999));
        assert!(matches!(result, Err(MotelError::EdgeEndpointMissing(_, _))));
        assert_eq!(graph.edge_count().expect("count"), 0);
    }

    #[test]
    fn select_vertices_by_attribute() {
        let mut graph = Graph::new();
        let a = graph.create_vertex(vec![noun()]).expect("create");
        let _b = graph
            .create_vertex(vec![Attribute::new("pos", "VERB")])
            .expect("create");
        let c = graph
            .create_vertex(vec![Attribute::new("pos", "VERB"), noun()])
            .expect("create");

        let selected = graph.select_vertices("pos", "NOUN").expect("select");
        assert_eq!(selected, BTreeSet::from([a, c]));
    }

    #[test]
    fn incident_edges_cover_both_directions() {
        let mut graph = Graph::new();
        let a = graph.create_vertex(Vec::new()).expect("create");
        let b = graph.create_vertex(Vec::new()).expect("create");
        let c = graph.create_vertex(Vec::new()).expect("create");

        let ab = graph.create_edge(a, "x", b).expect("edge");
        let cb = graph.create_edge(c, "y", b).expect("edge");

        let ids: Vec<_> = graph
            .incident_edges(b)
            .expect("incident")
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![ab, cb]);
    }

    #[test]
    fn self_loop_reported_once() {
        let mut graph = Graph::new();
        let a = graph.create_vertex(Vec::new()).expect("create");
        graph.create_edge(a, "x", a).expect("edge");
        assert_eq!(graph.incident_edges(a).expect("incident").len(), 1);
    }

    #[test]
    fn edges_between_is_induced() {
        let mut graph = Graph::new();
        let a = graph.create_vertex(Vec::new()).expect("create");
        let b = graph.create_vertex(Vec::new()).expect("create");
        let c = graph.create_vertex(Vec::new()).expect("create");

        let ab = graph.create_edge(a, "x", b).expect("edge");
        graph.create_edge(b, "x", c).expect("edge");

        let edges = graph
            .edges_between(&BTreeSet::from([a, b]))
            .expect("between");
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].id, ab);
    }

    #[test]
    fn positive_vertices_use_reserved_label() {
        let mut graph = Graph::new();
        let a = graph
            .create_vertex(vec![Attribute::new(USER_LABEL_KIND, POSITIVE_LABEL)])
            .expect("create");
        graph
            .create_vertex(vec![Attribute::new(USER_LABEL_KIND, "negative")])
            .expect("create");

        assert_eq!(graph.positive_vertices().expect("positives"), BTreeSet::from([a]));
    }

    #[test]
    fn weighted_neighbors_resolve_labels() {
        let mut graph = Graph::new();
        let a = graph.create_vertex(Vec::new()).expect("create");
        let b = graph.create_vertex(Vec::new()).expect("create");
        graph.create_edge(b, "spacy:nsubj", a).expect("edge");

        let mut table = BTreeMap::new();
        table.insert("spacy".to_string(), 0.5);
        let weights = EdgeWeights::new(table, 1.0).expect("weights");

        let neighbors = graph.weighted_neighbors(a, &weights).expect("neighbors");
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].1, b);
        assert_eq!(neighbors[0].2, 0.5);
    }
}
