//! # Core Type Definitions
//!
//! This module contains the core types shared by every Motel component:
//! - Store identifiers (`VertexId`, `EdgeId`)
//! - Graph data (`Attribute`, `Vertex`, `Edge`)
//! - The unit of classification (`Point`)
//! - Error types (`MotelError`)
//!
//! ## Ordering Guarantees
//!
//! Every type here implements `Ord` so it can live in `BTreeMap`/`BTreeSet`
//! and produce deterministic iteration order.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// STORE IDENTIFIERS
// =============================================================================

/// Identifier of a vertex in a document's graph store.
/// Assigned by the store, unique and immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(pub u64);

/// Identifier of an edge in a document's graph store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub u64);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// ATTRIBUTES
// =============================================================================

/// A (kind, value) pair carried by a vertex.
///
/// Serialized as a two-element array `[kind, value]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Attribute {
    /// Attribute kind, e.g. `pos` or `user:label`.
    pub kind: String,
    /// Attribute value.
    pub value: String,
}

impl Attribute {
    /// Create a new attribute.
    #[must_use]
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// Check whether this attribute has the given kind and value.
    #[must_use]
    pub fn matches(&self, kind: &str, value: &str) -> bool {
        self.kind == kind && self.value == value
    }
}

impl From<(String, String)> for Attribute {
    fn from((kind, value): (String, String)) -> Self {
        Self { kind, value }
    }
}

impl From<Attribute> for (String, String) {
    fn from(attribute: Attribute) -> Self {
        (attribute.kind, attribute.value)
    }
}

// =============================================================================
// VERTEX & EDGE
// =============================================================================

/// A vertex in a document graph.
///
/// Attributes form an ordered multiset: entries may be appended but are
/// never removed or mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    /// Store-assigned identifier.
    pub id: VertexId,
    /// Attributes in insertion order.
    pub attributes: Vec<Attribute>,
}

impl Vertex {
    /// Create a new vertex.
    #[must_use]
    pub fn new(id: VertexId, attributes: Vec<Attribute>) -> Self {
        Self { id, attributes }
    }

    /// Check whether the vertex carries the attribute `(kind, value)`.
    #[must_use]
    pub fn has_attribute(&self, kind: &str, value: &str) -> bool {
        self.attributes.iter().any(|a| a.matches(kind, value))
    }
}

/// A directed, labeled edge in a document graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Store-assigned identifier.
    pub id: EdgeId,
    /// Source vertex.
    pub source: VertexId,
    /// Destination vertex.
    pub destination: VertexId,
    /// Edge label, e.g. `spacy:nsubj` or `motel:next`.
    pub label: String,
}

impl Edge {
    /// Create a new edge.
    #[must_use]
    pub fn new(id: EdgeId, source: VertexId, destination: VertexId, label: impl Into<String>) -> Self {
        Self {
            id,
            source,
            destination,
            label: label.into(),
        }
    }

    /// The endpoint opposite to `vertex`, if `vertex` is an endpoint.
    #[must_use]
    pub fn other_endpoint(&self, vertex: VertexId) -> Option<VertexId> {
        if self.source == vertex {
            Some(self.destination)
        } else if self.destination == vertex {
            Some(self.source)
        } else {
            None
        }
    }
}

// =============================================================================
// POINT
// =============================================================================

/// A vertex of a specific document: the atomic unit classified by ensembles.
///
/// Equality and ordering are by value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Storage locator of the document the point belongs to.
    #[serde(rename = "file")]
    pub document: String,
    /// Vertex identifier within that document.
    pub identifier: VertexId,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub fn new(document: impl Into<String>, identifier: VertexId) -> Self {
        Self {
            document: document.into(),
            identifier,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document, self.identifier)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Motel system.
///
/// - No silent failures
/// - Use `Result<T, MotelError>` for fallible operations
/// - The core never panics; all errors are returned to the caller
#[derive(Debug, Error)]
pub enum MotelError {
    /// A motif is structurally invalid.
    #[error("Invalid motif: {0}")]
    InvalidMotif(String),

    /// A point record is malformed (e.g. an empty document locator).
    #[error("Invalid point: {0}")]
    InvalidPoint(String),

    /// A graph document handed to the ingestor is malformed.
    #[error("Invalid graph document: {0}")]
    InvalidGraph(String),

    /// A split name has no close match among the canonical names.
    #[error("Unknown split: {0}")]
    UnknownSplit(String),

    /// An ensemble name has no close match among the known strategies.
    #[error("Unknown ensemble: {0}")]
    UnknownEnsemble(String),

    /// The configuration is unusable (e.g. a non-positive edge weight).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The requested vertex was not found in the store.
    #[error("Vertex not found: {0}")]
    VertexNotFound(VertexId),

    /// An edge references a vertex that does not exist.
    #[error("Edge endpoint missing: {0} -> {1}")]
    EdgeEndpointMissing(VertexId, VertexId),

    /// A document store was expected on disk but is missing.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// A point was passed to an ensemble that does not classify it.
    #[error("Point not in ensemble domain: {0}")]
    PointNotInDomain(Point),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
