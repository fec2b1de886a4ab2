//! # Neighborhood Extraction
//!
//! Bounded weighted traversal around a vertex, and the extraction of
//! motif-shaped neighborhood records around every ground-truth positive.
//!
//! A vertex is in the neighborhood of `origin` if some path from `origin`,
//! following edges in either direction, has accumulated weight at most
//! `distance`. Traversal is an explicit frontier: a vertex is expanded again
//! only when reached with strictly more remaining budget than before, so it
//! terminates for any positive weights.

use crate::config::EdgeWeights;
use crate::graph::GraphStore;
use crate::motif::{Filter, Motif, MotifEdge, MotifVertex};
use crate::primitives::USER_LABEL_KIND;
use crate::{Edge, MotelError, VertexId};
use std::collections::{BTreeMap, BTreeSet};

/// The induced subgraph around an origin vertex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighborhood {
    /// Vertices reachable within the distance bound.
    pub vertices: BTreeSet<VertexId>,
    /// Edges among the reached vertices and the origin.
    pub edges: Vec<Edge>,
}

impl Neighborhood {
    /// Check if nothing was reached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Collect the neighborhood of `origin` within `distance`.
///
/// The origin itself is listed only when a path leads back to it. Edges are
/// those whose endpoints both lie among the reached vertices or the origin;
/// with nothing reached there are none, so `distance = 0` is always empty.
pub fn neighborhood<S: GraphStore + ?Sized>(
    store: &S,
    origin: VertexId,
    distance: f64,
    weights: &EdgeWeights,
) -> Result<Neighborhood, MotelError> {
    if distance.is_nan() || distance < 0.0 {
        return Err(MotelError::InvalidConfiguration(format!(
            "neighborhood distance must be non-negative, got {}",
            distance
        )));
    }
    if !store.contains_vertex(origin)? {
        return Err(MotelError::VertexNotFound(origin));
    }

    let mut vertices = BTreeSet::new();
    let mut best: BTreeMap<VertexId, f64> = BTreeMap::new();
    best.insert(origin, distance);
    let mut frontier = vec![(origin, distance)];

    while let Some((current, budget)) = frontier.pop() {
        for (_, other, weight) in store.weighted_neighbors(current, weights)? {
            if weight > budget {
                continue;
            }
            vertices.insert(other);

            let remaining = budget - weight;
            let improves = best.get(&other).is_none_or(|&seen| remaining > seen);
            if remaining > 0.0 && improves {
                best.insert(other, remaining);
                frontier.push((other, remaining));
            }
        }
    }

    let edges = if vertices.is_empty() {
        Vec::new()
    } else {
        let mut members = vertices.clone();
        members.insert(origin);
        store.edges_between(&members)?
    };

    Ok(Neighborhood { vertices, edges })
}

/// Build the extraction record for one origin: a motif whose selector is
/// the origin and whose vertices carry every attribute except the
/// ground-truth label.
pub fn neighborhood_record<S: GraphStore + ?Sized>(
    store: &S,
    origin: VertexId,
    distance: f64,
    weights: &EdgeWeights,
) -> Result<Motif, MotelError> {
    let found = neighborhood(store, origin, distance, weights)?;

    let mut members = found.vertices;
    members.insert(origin);

    let mut vertices = Vec::with_capacity(members.len());
    for id in members {
        let attributes = store.attributes(id)?;
        vertices.push(MotifVertex::new(
            id.0,
            Filter::from_attributes(&attributes, &[USER_LABEL_KIND]),
        ));
    }

    let edges = found
        .edges
        .iter()
        .map(|edge| MotifEdge::new(edge.source.0, edge.label.clone(), edge.destination.0))
        .collect();

    Motif::new(origin.0, vertices, edges)
}

/// Extract one neighborhood record per ground-truth positive vertex.
pub fn extract_neighborhoods<S: GraphStore + ?Sized>(
    store: &S,
    distance: f64,
    weights: &EdgeWeights,
) -> Result<Vec<Motif>, MotelError> {
    let positives = store.positive_vertices()?;
    tracing::info!(count = positives.len(), "found positively labeled vertices");

    let mut records = Vec::with_capacity(positives.len());
    for origin in positives {
        let record = neighborhood_record(store, origin, distance, weights)?;
        tracing::debug!(
            vertex = origin.0,
            vertices = record.vertices().len(),
            edges = record.edges().len(),
            "constructed neighborhood"
        );
        records.push(record);
    }
    Ok(records)
}

// =============================================================================
// TESTS
// =============================================================================
