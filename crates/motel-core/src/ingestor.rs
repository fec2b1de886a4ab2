//! # Ingestor Module
//!
//! Validation and ingestion of pre-parsed graph documents.
//!
//! Text processing happens upstream; the ingestor accepts the graph an
//! external pipeline produced:
//!
//! ```json
//! {"vertices": [{"identifier": 0, "attributes": [["pos", "NOUN"]]}],
//!  "edges": [{"source": 0, "destination": 1, "label": "motel:next"}]}
//! ```
//!
//! - Validate the whole document before any store mutation
//! - Reject malformed input
//! - No semantic inference or enrichment

use crate::graph::GraphStore;
use crate::primitives::{MAX_ATTRIBUTE_LENGTH, MAX_GRAPH_VERTICES, MAX_VALUE_LENGTH};
use crate::{Attribute, MotelError, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

/// A vertex as written by the upstream pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexRecord {
    /// Document-local identifier, referenced by edge records.
    pub identifier: u64,
    /// Attributes as `[kind, value]` pairs.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// An edge as written by the upstream pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Identifier of the source vertex record.
    pub source: u64,
    /// Identifier of the destination vertex record.
    pub destination: u64,
    /// Edge label.
    pub label: String,
}

/// A whole document graph ready for ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Vertex records.
    #[serde(default)]
    pub vertices: Vec<VertexRecord>,
    /// Edge records.
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

impl GraphDocument {
    /// Parse a graph document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, MotelError> {
        serde_json::from_str(text).map_err(|e| MotelError::DeserializationError(e.to_string()))
    }

    /// Parse a graph document from a reader.
    pub fn from_reader(reader: impl Read) -> Result<Self, MotelError> {
        serde_json::from_reader(reader)
            .map_err(|e| MotelError::DeserializationError(e.to_string()))
    }
}

/// The GraphIngestor handles document validation and graph ingestion.
pub struct GraphIngestor;

impl GraphIngestor {
    /// Validate a graph document.
    ///
    /// A document is valid if:
    /// - It has at most `MAX_GRAPH_VERTICES` vertices with unique identifiers
    /// - Every attribute kind is non-empty and within length limits
    /// - Every attribute value is within length limits
    /// - Every edge label is non-empty and within length limits
    /// - Every edge references declared vertex identifiers
    pub fn validate(document: &GraphDocument) -> Result<(), MotelError> {
        if document.vertices.len() > MAX_GRAPH_VERTICES {
            return Err(MotelError::InvalidGraph(format!(
                "{} vertices exceed the limit of {}",
                document.vertices.len(),
                MAX_GRAPH_VERTICES
            )));
        }

        let mut declared = BTreeSet::new();
        for record in &document.vertices {
            if !declared.insert(record.identifier) {
                return Err(MotelError::InvalidGraph(format!(
                    "duplicate vertex identifier {}",
                    record.identifier
                )));
            }
            for attribute in &record.attributes {
                if attribute.kind.is_empty() || attribute.kind.len() > MAX_ATTRIBUTE_LENGTH {
                    return Err(MotelError::InvalidGraph(format!(
                        "vertex {} has an attribute kind of invalid length",
                        record.identifier
                    )));
                }
                if attribute.value.len() > MAX_VALUE_LENGTH {
                    return Err(MotelError::InvalidGraph(format!(
                        "vertex {} attribute '{}' value too long",
                        record.identifier, attribute.kind
                    )));
                }
            }
        }

        for record in &document.edges {
            if record.label.is_empty() || record.label.len() > MAX_ATTRIBUTE_LENGTH {
                return Err(MotelError::InvalidGraph(format!(
                    "edge {} -> {} has a label of invalid length",
                    record.source, record.destination
                )));
            }
            for endpoint in [record.source, record.destination] {
                if !declared.contains(&endpoint) {
                    return Err(MotelError::InvalidGraph(format!(
                        "edge references undeclared vertex {}",
                        endpoint
                    )));
                }
            }
        }

        Ok(())
    }

    /// Ingest a document into any graph store.
    ///
    /// Works with both in-memory Graph and persistent RedbGraph; for the
    /// latter prefer `RedbGraph::ingest_batch`, which commits once.
    /// Returns the mapping from document identifiers to store ids.
    pub fn ingest<G: GraphStore + ?Sized>(
        store: &mut G,
        document: &GraphDocument,
    ) -> Result<BTreeMap<u64, VertexId>, MotelError> {
        Self::validate(document)?;

        let mut mapping = BTreeMap::new();
        for record in &document.vertices {
            let id = store.create_vertex(record.attributes.clone())?;
            mapping.insert(record.identifier, id);
        }

        for record in &document.edges {
            let (Some(&source), Some(&destination)) =
                (mapping.get(&record.source), mapping.get(&record.destination))
            else {
                return Err(MotelError::InvalidGraph(format!(
                    "edge {} -> {} lost its endpoints",
                    record.source, record.destination
                )));
            };
            store.create_edge(source, &record.label, destination)?;
        }

        Ok(mapping)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    const SAMPLE: &str = r#"{
        "vertices": [
            {"identifier": 0, "attributes": [["pos", "PROPN"], ["text", "Motel"]]},
            {"identifier": 1, "attributes": [["pos", "VERB"]]},
            {"identifier": 2}
        ],
        "edges": [
            {"source": 1, "destination": 0, "label": "spacy:nsubj"},
            {"source": 0, "destination": 1, "label": "motel:next"}
        ]
    }"#;

    #[test]
    fn parse_and_ingest_sample() {
        let document = GraphDocument::from_json(SAMPLE).expect("parse");
        let mut graph = Graph::new();

        let mapping = GraphIngestor::ingest(&mut graph, &document).expect("ingest");
        assert_eq!(mapping.len(), 3);
        assert_eq!(graph.vertex_count().expect("count"), 3);
        assert_eq!(graph.edge_count().expect("count"), 2);

        let proper = graph.select_vertices("pos", "PROPN").expect("select");
        assert_eq!(proper, BTreeSet::from([mapping[&0]]));
    }

    #[test]
    fn validate_rejects_undeclared_endpoint() {
        let document = GraphDocument {
            vertices: vec![VertexRecord {
                identifier: 0,
                attributes: Vec::new(),
            }],
            edges: vec![EdgeRecord {
                source: 0,
                destination: 5,
                label: "x".to_string(),
            }],
        };
        assert!(matches!(
            GraphIngestor::validate(&document),
            Err(MotelError::InvalidGraph(_))
        ));
    }

    #[test]
    fn validate_rejects_duplicate_identifiers() {
        let record = VertexRecord {
            identifier: 3,
            attributes: Vec::new(),
        };
        let document = GraphDocument {
            vertices: vec![record.clone(), record],
            edges: Vec::new(),
        };
        assert!(GraphIngestor::validate(&document).is_err());
    }

    #[test]
    fn validate_rejects_empty_kind_and_label() {
        let document = GraphDocument {
            vertices: vec![VertexRecord {
                identifier: 0,
                attributes: vec![Attribute::new("", "x")],
            }],
            edges: Vec::new(),
        };
        assert!(GraphIngestor::validate(&document).is_err());

        let document = GraphDocument {
            vertices: vec![VertexRecord {
                identifier: 0,
                attributes: Vec::new(),
            }],
            edges: vec![EdgeRecord {
                source: 0,
                destination: 0,
                label: String::new(),
            }],
        };
        assert!(GraphIngestor::validate(&document).is_err());
    }

    #[test]
    fn failed_validation_leaves_store_untouched() {
        let document = GraphDocument {
            vertices: vec![VertexRecord {
                identifier: 0,
                attributes: Vec::new(),
            }],
            edges: vec![EdgeRecord {
                source: 0,
                destination: 1,
                label: "x".to_string(),
            }],
        };
        let mut graph = Graph::new();
        assert!(GraphIngestor::ingest(&mut graph, &document).is_err());
        assert_eq!(graph.vertex_count().expect("count"), 0);
    }

    #[test]
    fn malformed_json_is_deserialization_error() {
        assert!(matches!(
            GraphDocument::from_json("{\"vertices\": 3}"),
            Err(MotelError::DeserializationError(_))
        ));
    }
}
