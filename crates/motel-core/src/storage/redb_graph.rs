//! # redb-backed Graph Storage
//!
//! A disk-backed document store using the redb embedded database.
//!
//! Each document lives in its own database file. Vertices and edges are
//! postcard-encoded; two adjacency tables keyed by `(vertex, edge)` give
//! range scans over incoming and outgoing edges of a vertex.
//!
//! ## Integration with Session
//!
//! `RedbGraph` is the persistent backend of a [`crate::Session`]. Unlike the
//! in-memory `Graph`, every write is committed to disk before returning.

use crate::graph::GraphStore;
use crate::ingestor::{GraphDocument, GraphIngestor};
use crate::{Attribute, Edge, EdgeId, MotelError, Vertex, VertexId};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Table for vertices: VertexId(u64) -> serialized attribute list
const VERTICES: TableDefinition<u64, &[u8]> = TableDefinition::new("vertices");

/// Table for edges: EdgeId(u64) -> serialized Edge
const EDGES: TableDefinition<u64, &[u8]> = TableDefinition::new("edges");

/// Outgoing adjacency: (source, edge_id) -> destination
const OUTGOING: TableDefinition<(u64, u64), u64> = TableDefinition::new("outgoing");

/// Incoming adjacency: (destination, edge_id) -> source
const INCOMING: TableDefinition<(u64, u64), u64> = TableDefinition::new("incoming");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_VERTEX_KEY: &str = "next_vertex_id";
const NEXT_EDGE_KEY: &str = "next_edge_id";

fn io_error(e: impl std::fmt::Display) -> MotelError {
    MotelError::IoError(e.to_string())
}

/// A disk-backed document graph using redb.
pub struct RedbGraph {
    /// The redb database handle.
    db: Database,
    /// Location of the database file.
    path: PathBuf,
    /// Next available vertex ID.
    next_vertex_id: u64,
    /// Next available edge ID.
    next_edge_id: u64,
}

impl std::fmt::Debug for RedbGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbGraph")
            .field("path", &self.path)
            .field("next_vertex_id", &self.next_vertex_id)
            .field("next_edge_id", &self.next_edge_id)
            .finish_non_exhaustive()
    }
}

impl RedbGraph {
    /// Open or create a document database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MotelError> {
        let db = Database::create(path.as_ref()).map_err(io_error)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_error)?;
            let _ = write_txn.open_table(VERTICES).map_err(io_error)?;
            let _ = write_txn.open_table(EDGES).map_err(io_error)?;
            let _ = write_txn.open_table(OUTGOING).map_err(io_error)?;
            let _ = write_txn.open_table(INCOMING).map_err(io_error)?;
            let _ = write_txn.open_table(METADATA).map_err(io_error)?;
            write_txn.commit().map_err(io_error)?;
        }

        // Load id counters
        let (next_vertex_id, next_edge_id) = {
            let read_txn = db.begin_read().map_err(io_error)?;
            let table = read_txn.open_table(METADATA).map_err(io_error)?;
            let vertex = table
                .get(NEXT_VERTEX_KEY)
                .map_err(io_error)?
                .map(|v| v.value())
                .unwrap_or(0);
            let edge = table
                .get(NEXT_EDGE_KEY)
                .map_err(io_error)?
                .map(|v| v.value())
                .unwrap_or(0);
            (vertex, edge)
        };

        Ok(Self {
            db,
            path: path.as_ref().to_path_buf(),
            next_vertex_id,
            next_edge_id,
        })
    }

    /// Location of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ingest a whole graph document in a single ACID transaction.
    ///
    /// The document is validated before the transaction opens; if any
    /// vertex or edge is invalid, nothing is written. Returns the mapping
    /// from the document's identifiers to store ids.
    pub fn ingest_batch(
        &mut self,
        document: &GraphDocument,
    ) -> Result<BTreeMap<u64, VertexId>, MotelError> {
        GraphIngestor::validate(document)?;

        let mut mapping = BTreeMap::new();
        let mut current_vertex_id = self.next_vertex_id;
        let mut current_edge_id = self.next_edge_id;

        let write_txn = self.db.begin_write().map_err(io_error)?;
        {
            let mut vertices = write_txn.open_table(VERTICES).map_err(io_error)?;
            let mut edges = write_txn.open_table(EDGES).map_err(io_error)?;
            let mut outgoing = write_txn.open_table(OUTGOING).map_err(io_error)?;
            let mut incoming = write_txn.open_table(INCOMING).map_err(io_error)?;
            let mut meta = write_txn.open_table(METADATA).map_err(io_error)?;

            // Pass 1: vertices.
            for record in &document.vertices {
                let id = VertexId(current_vertex_id);
                current_vertex_id = current_vertex_id.saturating_add(1);

                let bytes = postcard::to_allocvec(&record.attributes)
                    .map_err(|e| MotelError::SerializationError(e.to_string()))?;
                vertices.insert(id.0, bytes.as_slice()).map_err(io_error)?;
                mapping.insert(record.identifier, id);
            }

            // Pass 2: edges, endpoints resolved through the mapping.
            for record in &document.edges {
                let source = *mapping.get(&record.source).ok_or_else(|| {
                    MotelError::InvalidGraph(format!("undeclared source {}", record.source))
                })?;
                let destination = *mapping.get(&record.destination).ok_or_else(|| {
                    MotelError::InvalidGraph(format!(
                        "undeclared destination {}",
                        record.destination
                    ))
                })?;

                let id = EdgeId(current_edge_id);
                current_edge_id = current_edge_id.saturating_add(1);

                let edge = Edge::new(id, source, destination, record.label.clone());
                let bytes = postcard::to_allocvec(&edge)
                    .map_err(|e| MotelError::SerializationError(e.to_string()))?;
                edges.insert(id.0, bytes.as_slice()).map_err(io_error)?;
                outgoing
                    .insert((source.0, id.0), destination.0)
                    .map_err(io_error)?;
                incoming
                    .insert((destination.0, id.0), source.0)
                    .map_err(io_error)?;
            }

            meta.insert(NEXT_VERTEX_KEY, current_vertex_id)
                .map_err(io_error)?;
            meta.insert(NEXT_EDGE_KEY, current_edge_id)
                .map_err(io_error)?;
        }
        write_txn.commit().map_err(io_error)?;

        // Update in-memory counters only after successful commit.
        self.next_vertex_id = current_vertex_id;
        self.next_edge_id = current_edge_id;

        tracing::debug!(
            vertices = document.vertices.len(),
            edges = document.edges.len(),
            path = %self.path.display(),
            "ingested graph document"
        );

        Ok(mapping)
    }

    /// Decode every edge whose id appears in `ids`.
    fn edges_by_id(&self, ids: &BTreeSet<u64>) -> Result<Vec<Edge>, MotelError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(EDGES).map_err(io_error)?;

        let mut result = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(data) = table.get(id).map_err(io_error)? {
                let edge: Edge = postcard::from_bytes(data.value())
                    .map_err(|e| MotelError::DeserializationError(e.to_string()))?;
                result.push(edge);
            }
        }
        Ok(result)
    }

    /// Scan every edge and keep those accepted by `keep`.
    fn scan_edges(&self, keep: impl Fn(&Edge) -> bool) -> Result<Vec<Edge>, MotelError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(EDGES).map_err(io_error)?;

        let mut result = Vec::new();
        for entry in table.iter().map_err(io_error)? {
            let (_, value) = entry.map_err(io_error)?;
            let edge: Edge = postcard::from_bytes(value.value())
                .map_err(|e| MotelError::DeserializationError(e.to_string()))?;
            if keep(&edge) {
                result.push(edge);
            }
        }
        Ok(result)
    }
}

// =============================================================================
// GRAPHSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl GraphStore for RedbGraph {
    fn create_vertex(&mut self, attributes: Vec<Attribute>) -> Result<VertexId, MotelError> {
        let id = VertexId(self.next_vertex_id);
        let next = self.next_vertex_id.saturating_add(1);

        let bytes = postcard::to_allocvec(&attributes)
            .map_err(|e| MotelError::SerializationError(e.to_string()))?;

        let write_txn = self.db.begin_write().map_err(io_error)?;
        {
            let mut vertices = write_txn.open_table(VERTICES).map_err(io_error)?;
            vertices.insert(id.0, bytes.as_slice()).map_err(io_error)?;
        }
        {
            let mut meta = write_txn.open_table(METADATA).map_err(io_error)?;
            meta.insert(NEXT_VERTEX_KEY, next).map_err(io_error)?;
        }
        write_txn.commit().map_err(io_error)?;

        self.next_vertex_id = next;
        tracing::debug!(vertex = id.0, "constructed vertex");
        Ok(id)
    }

    fn add_attribute(&mut self, vertex: VertexId, attribute: Attribute) -> Result<(), MotelError> {
        let write_txn = self.db.begin_write().map_err(io_error)?;
        {
            let mut vertices = write_txn.open_table(VERTICES).map_err(io_error)?;

            // Read-modify-write within the same transaction.
            let mut attributes: Vec<Attribute> = match vertices.get(vertex.0).map_err(io_error)? {
                Some(data) => postcard::from_bytes(data.value())
                    .map_err(|e| MotelError::DeserializationError(e.to_string()))?,
                None => return Err(MotelError::VertexNotFound(vertex)),
            };
            attributes.push(attribute);

            let bytes = postcard::to_allocvec(&attributes)
                .map_err(|e| MotelError::SerializationError(e.to_string()))?;
            vertices.insert(vertex.0, bytes.as_slice()).map_err(io_error)?;
        }
        write_txn.commit().map_err(io_error)?;
        Ok(())
    }

    fn create_edge(
        &mut self,
        source: VertexId,
        label: &str,
        destination: VertexId,
    ) -> Result<EdgeId, MotelError> {
        if !self.contains_vertex(source)? || !self.contains_vertex(destination)? {
            return Err(MotelError::EdgeEndpointMissing(source, destination));
        }

        let id = EdgeId(self.next_edge_id);
        let next = self.next_edge_id.saturating_add(1);

        let edge = Edge::new(id, source, destination, label);
        let bytes = postcard::to_allocvec(&edge)
            .map_err(|e| MotelError::SerializationError(e.to_string()))?;

        let write_txn = self.db.begin_write().map_err(io_error)?;
        {
            let mut edges = write_txn.open_table(EDGES).map_err(io_error)?;
            edges.insert(id.0, bytes.as_slice()).map_err(io_error)?;
        }
        {
            let mut outgoing = write_txn.open_table(OUTGOING).map_err(io_error)?;
            outgoing
                .insert((source.0, id.0), destination.0)
                .map_err(io_error)?;
        }
        {
            let mut incoming = write_txn.open_table(INCOMING).map_err(io_error)?;
            incoming
                .insert((destination.0, id.0), source.0)
                .map_err(io_error)?;
        }
        {
            let mut meta = write_txn.open_table(METADATA).map_err(io_error)?;
            meta.insert(NEXT_EDGE_KEY, next).map_err(io_error)?;
        }
        write_txn.commit().map_err(io_error)?;

        self.next_edge_id = next;
        tracing::debug!(edge = id.0, "constructed edge {} --{}-> {}", source, label, destination);
        Ok(id)
    }

    fn vertex(&self, id: VertexId) -> Result<Option<Vertex>, MotelError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(VERTICES).map_err(io_error)?;

        match table.get(id.0).map_err(io_error)? {
            Some(data) => {
                let attributes: Vec<Attribute> = postcard::from_bytes(data.value())
                    .map_err(|e| MotelError::DeserializationError(e.to_string()))?;
                Ok(Some(Vertex::new(id, attributes)))
            }
            None => Ok(None),
        }
    }

    fn contains_vertex(&self, id: VertexId) -> Result<bool, MotelError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(VERTICES).map_err(io_error)?;
        Ok(table.get(id.0).map_err(io_error)?.is_some())
    }

    fn vertex_ids(&self) -> Result<Vec<VertexId>, MotelError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(VERTICES).map_err(io_error)?;

        let mut ids = Vec::new();
        for entry in table.iter().map_err(io_error)? {
            let (key, _) = entry.map_err(io_error)?;
            ids.push(VertexId(key.value()));
        }
        Ok(ids)
    }

    fn attributes(&self, vertex: VertexId) -> Result<Vec<Attribute>, MotelError> {
        self.vertex(vertex)?
            .map(|v| v.attributes)
            .ok_or(MotelError::VertexNotFound(vertex))
    }

    fn select_vertices(&self, kind: &str, value: &str) -> Result<BTreeSet<VertexId>, MotelError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(VERTICES).map_err(io_error)?;

        let mut selected = BTreeSet::new();
        for entry in table.iter().map_err(io_error)? {
            let (key, data) = entry.map_err(io_error)?;
            let attributes: Vec<Attribute> = postcard::from_bytes(data.value())
                .map_err(|e| MotelError::DeserializationError(e.to_string()))?;
            if attributes.iter().any(|a| a.matches(kind, value)) {
                selected.insert(VertexId(key.value()));
            }
        }
        Ok(selected)
    }

    fn select_edges(&self, label: &str) -> Result<Vec<Edge>, MotelError> {
        self.scan_edges(|edge| edge.label == label)
    }

    fn incident_edges(&self, vertex: VertexId) -> Result<Vec<Edge>, MotelError> {
        let mut ids = BTreeSet::new();
        {
            let read_txn = self.db.begin_read().map_err(io_error)?;
            let outgoing = read_txn.open_table(OUTGOING).map_err(io_error)?;
            let incoming = read_txn.open_table(INCOMING).map_err(io_error)?;

            // Range query for all edges touching this vertex
            for table in [&outgoing, &incoming] {
                for entry in table
                    .range((vertex.0, 0u64)..=(vertex.0, u64::MAX))
                    .map_err(io_error)?
                {
                    let (key, _) = entry.map_err(io_error)?;
                    let (_, edge_id) = key.value();
                    ids.insert(edge_id);
                }
            }
        }
        self.edges_by_id(&ids)
    }

    fn edges(&self) -> Result<Vec<Edge>, MotelError> {
        self.scan_edges(|_| true)
    }

    fn vertex_count(&self) -> Result<usize, MotelError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(VERTICES).map_err(io_error)?;
        let count = table.len().map_err(io_error)?;
        Ok(count as usize)
    }

    fn edge_count(&self) -> Result<usize, MotelError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(EDGES).map_err(io_error)?;
        let count = table.len().map_err(io_error)?;
        Ok(count as usize)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ingestor::{EdgeRecord, VertexRecord};
    use tempfile::tempdir;

    #[test]
    fn basic_operations() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("doc.redb");
        let mut graph = RedbGraph::open(&db_path).expect("open db");

        let a = graph
            .create_vertex(vec![Attribute::new("pos", "NOUN")])
            .expect("vertex");
        let b = graph.create_vertex(Vec::new()).expect("vertex");
        assert_ne!(a, b);
        assert_eq!(graph.vertex_count().expect("count"), 2);

        graph.create_edge(a, "motel:next", b).expect("edge");
        assert_eq!(graph.edge_count().expect("count"), 1);
    }

    #[test]
    fn dangling_edge_rejected() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbGraph::open(temp.path().join("doc.redb")).expect("open db");
        let a = graph.create_vertex(Vec::new()).expect("vertex");

        let result = graph.create_edge(a, "x", VertexId(42));
        assert!(matches!(result, Err(MotelError::EdgeEndpointMissing(_, _))));
        assert_eq!(graph.edge_count().expect("count"), 0);
    }

    #[test]
    fn attributes_append_in_order() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbGraph::open(temp.path().join("doc.redb")).expect("open db");
        let a = graph
            .create_vertex(vec![Attribute::new("pos", "NOUN")])
            .expect("vertex");
        graph
            .add_attribute(a, Attribute::new("lemma", "motel"))
            .expect("append");

        assert_eq!(
            graph.attributes(a).expect("attrs"),
            vec![Attribute::new("pos", "NOUN"), Attribute::new("lemma", "motel")]
        );
        assert!(matches!(
            graph.add_attribute(VertexId(9), Attribute::new("k", "v")),
            Err(MotelError::VertexNotFound(_))
        ));
    }

    #[test]
    fn selections_match_in_memory_semantics() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbGraph::open(temp.path().join("doc.redb")).expect("open db");
        let a = graph
            .create_vertex(vec![Attribute::new("pos", "NOUN")])
            .expect("vertex");
        let b = graph
            .create_vertex(vec![Attribute::new("pos", "VERB")])
            .expect("vertex");
        let c = graph
            .create_vertex(vec![Attribute::new("pos", "NOUN")])
            .expect("vertex");
        graph.create_edge(b, "spacy:nsubj", a).expect("edge");
        graph.create_edge(b, "spacy:dobj", c).expect("edge");

        assert_eq!(
            graph.select_vertices("pos", "NOUN").expect("select"),
            BTreeSet::from([a, c])
        );
        assert_eq!(graph.select_edges("spacy:nsubj").expect("edges").len(), 1);
        assert_eq!(graph.incident_edges(b).expect("incident").len(), 2);
        assert_eq!(graph.incident_edges(a).expect("incident").len(), 1);
    }

    #[test]
    fn recovery_persistence_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("doc.redb");

        // Phase 1: create data
        let (a, b) = {
            let mut graph = RedbGraph::open(&db_path).expect("open db");
            let a = graph.create_vertex(Vec::new()).expect("vertex");
            let b = graph.create_vertex(Vec::new()).expect("vertex");
            graph.create_edge(a, "motel:next", b).expect("edge");
            (a, b)
        };
        // Graph dropped here, simulating process exit

        // Phase 2: reopen, verify, and keep allocating fresh ids
        let mut graph = RedbGraph::open(&db_path).expect("reopen db");
        assert_eq!(graph.vertex_count().expect("count"), 2);
        assert_eq!(graph.edge_count().expect("count"), 1);

        let c = graph.create_vertex(Vec::new()).expect("vertex");
        assert!(c != a && c != b);
        let second = graph.create_edge(b, "motel:next", c).expect("edge");
        assert_eq!(second, EdgeId(1));
    }

    #[test]
    fn ingest_batch_maps_identifiers() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbGraph::open(temp.path().join("doc.redb")).expect("open db");

        let document = GraphDocument {
            vertices: vec![
                VertexRecord {
                    identifier: 10,
                    attributes: vec![Attribute::new("pos", "NOUN")],
                },
                VertexRecord {
                    identifier: 20,
                    attributes: Vec::new(),
                },
            ],
            edges: vec![EdgeRecord {
                source: 20,
                destination: 10,
                label: "spacy:nsubj".to_string(),
            }],
        };

        let mapping = graph.ingest_batch(&document).expect("ingest");
        assert_eq!(mapping.len(), 2);
        let edges = graph.edges().expect("edges");
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, mapping[&20]);
        assert_eq!(edges[0].destination, mapping[&10]);
    }

    #[test]
    fn ingest_batch_is_atomic_on_invalid_input() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbGraph::open(temp.path().join("doc.redb")).expect("open db");

        let document = GraphDocument {
            vertices: vec![VertexRecord {
                identifier: 1,
                attributes: Vec::new(),
            }],
            edges: vec![EdgeRecord {
                source: 1,
                destination: 2,
                label: "x".to_string(),
            }],
        };

        assert!(graph.ingest_batch(&document).is_err());
        assert_eq!(graph.vertex_count().expect("count"), 0);
    }
}
