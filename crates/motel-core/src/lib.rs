//! # motel-core
//!
//! The motif engine for Motel - THE LOGIC.
//!
//! Documents are attributed directed multigraphs. Motifs are small pattern
//! graphs with attribute filters and a distinguished selector vertex; each
//! motif compiles to a join over the document's store and selects the
//! vertices bound to its selector. A sparse image records which points every
//! motif selected across a dataset, and ensembles combine those selections
//! into per-point probabilities that active learning refines.
//!
//! ## Pipeline
//!
//! ```text
//! GraphStore -> Motif -> MotifQuery -> SparseImage -> Ensemble -> ActiveLearning
//! ```
//!
//! ## Architectural Constraints
//!
//! - Synchronous and single-threaded: one [`Session`] per document, released
//!   before the next document is opened
//! - Deterministic: every ordering a caller can observe comes from a BTreeMap,
//!   a BTreeSet, or insertion order
//! - Configuration is an explicit [`MotelConfig`] value, validated at startup
//! - NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod active;
pub mod config;
pub mod document;
pub mod ensemble;
pub mod formats;
pub mod fuzzy;
pub mod graph;
pub mod image;
pub mod ingestor;
pub mod motif;
pub mod neighborhood;
pub mod primitives;
pub mod query;
pub mod session;
pub mod stats;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Attribute, Edge, EdgeId, MotelError, Point, Vertex, VertexId};

// =============================================================================
// RE-EXPORTS: Graph Store
// =============================================================================

pub use config::{EdgeWeights, MotelConfig};
pub use graph::{Graph, GraphStore};
pub use ingestor::{EdgeRecord, GraphDocument, GraphIngestor, VertexRecord};
pub use session::{Session, StorageBackend};
pub use storage::RedbGraph;

// =============================================================================
// RE-EXPORTS: Motifs
// =============================================================================

pub use motif::{Filter, Motif, MotifEdge, MotifVertex, Predicate, Structure};
pub use neighborhood::{Neighborhood, extract_neighborhoods, neighborhood, neighborhood_record};
pub use query::{JoinExecutor, MotifQuery, QueryExecutor, Relation, Selection};

// =============================================================================
// RE-EXPORTS: Analysis
// =============================================================================

pub use active::{ActiveLearning, Partition, ResultRow};
pub use document::{Dataset, Document, Split};
pub use ensemble::{Ensemble, EnsembleKind, InclusionMatrix, Strategy, UpdateParams};
pub use image::{EvaluationReport, ImageRow, SparseImage};
pub use stats::{CurvePoint, Statistics, min_absolute_logit, precision_recall_curve, statistics};
