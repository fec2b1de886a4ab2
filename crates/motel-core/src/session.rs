//! # Session Module
//!
//! Scoped connection to one document store.
//!
//! A `Session` is opened for one evaluation or traversal pass over a single
//! document and released on drop, on every exit path. Sessions are never
//! shared across documents.
//!
//! ## Storage Backends
//!
//! - `InMemory`: in-memory `Graph`, selected by the locator `":memory:"`
//! - `Persistent`: `RedbGraph` for disk-backed ACID storage

use crate::graph::{Graph, GraphStore};
use crate::ingestor::{GraphDocument, GraphIngestor};
use crate::primitives::MEMORY_LOCATOR;
use crate::storage::RedbGraph;
use crate::{Attribute, Edge, EdgeId, MotelError, Vertex, VertexId};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Storage backend for a Session.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory graph (fast, volatile).
    InMemory(Graph),
    /// Disk-backed graph using redb (ACID, persistent).
    Persistent(RedbGraph),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(Graph::new())
    }
}

/// An open document store bound to one locator.
#[derive(Debug)]
pub struct Session {
    /// Storage locator the session was opened with.
    locator: String,
    /// The storage backend (in-memory or persistent).
    backend: StorageBackend,
}

impl Session {
    /// Open a volatile in-memory session.
    #[must_use]
    pub fn in_memory() -> Self {
        tracing::debug!(locator = MEMORY_LOCATOR, "opened connection");
        Self {
            locator: MEMORY_LOCATOR.to_string(),
            backend: StorageBackend::default(),
        }
    }

    /// Wrap an existing in-memory graph.
    #[must_use]
    pub fn with_graph(graph: Graph) -> Self {
        Self {
            locator: MEMORY_LOCATOR.to_string(),
            backend: StorageBackend::InMemory(graph),
        }
    }

    /// Open (creating if needed) the document store at `locator`.
    ///
    /// Missing parent directories are created. The locator `":memory:"`
    /// opens an in-memory store instead of a file.
    pub fn open(locator: impl AsRef<Path>) -> Result<Self, MotelError> {
        let path = locator.as_ref();
        if path.as_os_str() == MEMORY_LOCATOR {
            return Ok(Self::in_memory());
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| MotelError::IoError(e.to_string()))?;
        }

        let redb = RedbGraph::open(path)?;
        let locator = path.display().to_string();
        tracing::debug!(locator = %locator, "opened connection");
        Ok(Self {
            locator,
            backend: StorageBackend::Persistent(redb),
        })
    }

    /// Open an existing document store for reading.
    ///
    /// Fails with `DocumentNotFound` instead of creating an empty store.
    pub fn open_existing(locator: impl AsRef<Path>) -> Result<Self, MotelError> {
        let path = locator.as_ref();
        if path.as_os_str() != MEMORY_LOCATOR && !path.is_file() {
            return Err(MotelError::DocumentNotFound(path.display().to_string()));
        }
        Self::open(path)
    }

    /// Storage locator this session is bound to.
    #[must_use]
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    /// Borrow the backend as a trait object.
    fn store(&self) -> &dyn GraphStore {
        match &self.backend {
            StorageBackend::InMemory(graph) => graph,
            StorageBackend::Persistent(redb) => redb,
        }
    }

    /// Mutably borrow the backend as a trait object.
    fn store_mut(&mut self) -> &mut dyn GraphStore {
        match &mut self.backend {
            StorageBackend::InMemory(graph) => graph,
            StorageBackend::Persistent(redb) => redb,
        }
    }

    // =========================================================================
    // INGESTION
    // =========================================================================

    /// Ingest a graph document.
    ///
    /// Persistent stores commit the whole document in one transaction.
    pub fn ingest(&mut self, document: &GraphDocument) -> Result<BTreeMap<u64, VertexId>, MotelError> {
        let mapping = match &mut self.backend {
            StorageBackend::InMemory(graph) => GraphIngestor::ingest(graph, document)?,
            StorageBackend::Persistent(redb) => redb.ingest_batch(document)?,
        };
        tracing::info!(
            locator = %self.locator,
            vertices = document.vertices.len(),
            edges = document.edges.len(),
            "ingested document"
        );
        Ok(mapping)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::debug!(locator = %self.locator, "released connection");
    }
}

// =============================================================================
// GRAPHSTORE DELEGATION
// =============================================================================

impl GraphStore for Session {
    fn create_vertex(&mut self, attributes: Vec<Attribute>) -> Result<VertexId, MotelError> {
        self.store_mut().create_vertex(attributes)
    }

    fn add_attribute(&mut self, vertex: VertexId, attribute: Attribute) -> Result<(), MotelError> {
        self.store_mut().add_attribute(vertex, attribute)
    }

    fn create_edge(
        &mut self,
        source: VertexId,
        label: &str,
        destination: VertexId,
    ) -> Result<EdgeId, MotelError> {
        self.store_mut().create_edge(source, label, destination)
    }

    fn vertex(&self, id: VertexId) -> Result<Option<Vertex>, MotelError> {
        self.store().vertex(id)
    }

    fn contains_vertex(&self, id: VertexId) -> Result<bool, MotelError> {
        self.store().contains_vertex(id)
    }

    fn vertex_ids(&self) -> Result<Vec<VertexId>, MotelError> {
        self.store().vertex_ids()
    }

    fn attributes(&self, vertex: VertexId) -> Result<Vec<Attribute>, MotelError> {
        self.store().attributes(vertex)
    }

    fn select_vertices(&self, kind: &str, value: &str) -> Result<BTreeSet<VertexId>, MotelError> {
        self.store().select_vertices(kind, value)
    }

    fn select_edges(&self, label: &str) -> Result<Vec<Edge>, MotelError> {
        self.store().select_edges(label)
    }

    fn incident_edges(&self, vertex: VertexId) -> Result<Vec<Edge>, MotelError> {
        self.store().incident_edges(vertex)
    }

    fn edges(&self) -> Result<Vec<Edge>, MotelError> {
        self.store().edges()
    }

    fn vertex_count(&self) -> Result<usize, MotelError> {
        self.store().vertex_count()
    }

    fn edge_count(&self) -> Result<usize, MotelError> {
        self.store().edge_count()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_locator_is_volatile() {
        let mut session = Session::open(MEMORY_LOCATOR).expect("open");
        assert!(!session.is_persistent());
        session.create_vertex(Vec::new()).expect("vertex");
        assert_eq!(session.vertex_count().expect("count"), 1);

        let fresh = Session::open(MEMORY_LOCATOR).expect("open");
        assert_eq!(fresh.vertex_count().expect("count"), 0);
    }

    #[test]
    fn open_creates_parent_directories() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("nested").join("deeper").join("doc.redb");

        let session = Session::open(&path).expect("open");
        assert!(session.is_persistent());
        assert!(path.is_file());
        assert_eq!(session.locator(), path.display().to_string());
    }

    #[test]
    fn open_existing_requires_file() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("missing.redb");

        let result = Session::open_existing(&path);
        assert!(matches!(result, Err(MotelError::DocumentNotFound(_))));
        assert!(!path.exists());
    }

    #[test]
    fn persistent_session_survives_release() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("doc.redb");

        {
            let mut session = Session::open(&path).expect("open");
            let a = session
                .create_vertex(vec![Attribute::new("pos", "NOUN")])
                .expect("vertex");
            let b = session.create_vertex(Vec::new()).expect("vertex");
            session.create_edge(a, "motel:next", b).expect("edge");
        }

        let session = Session::open_existing(&path).expect("reopen");
        assert_eq!(session.vertex_count().expect("count"), 2);
        assert_eq!(session.select_edges("motel:next").expect("edges").len(), 1);
    }

    #[test]
    fn ingest_dispatches_per_backend() {
        let document = GraphDocument::from_json(
            r#"{"vertices": [{"identifier": 1}, {"identifier": 2}],
                "edges": [{"source": 1, "destination": 2, "label": "x"}]}"#,
        )
        .expect("parse");

        let mut memory = Session::in_memory();
        memory.ingest(&document).expect("ingest");
        assert_eq!(memory.edge_count().expect("count"), 1);

        let temp = tempdir().expect("temp dir");
        let mut disk = Session::open(temp.path().join("doc.redb")).expect("open");
        disk.ingest(&document).expect("ingest");
        assert_eq!(disk.edge_count().expect("count"), 1);
    }
}
