//! # Reserved Names and Limits
//!
//! Constants compiled into the engine. Tunable values (thresholds, learning
//! rate, edge weights) live in [`crate::config::MotelConfig`] instead.

/// Attribute kind reserved for analyst-provided ground-truth labels.
pub const USER_LABEL_KIND: &str = "user:label";

/// Attribute value marking a vertex as a ground-truth positive.
pub const POSITIVE_LABEL: &str = "positive";

/// Locator that opens a volatile in-memory store instead of a file.
pub const MEMORY_LOCATOR: &str = ":memory:";

/// Separator between an edge label's namespace and its name (`spacy:nsubj`).
pub const LABEL_NAMESPACE_SEPARATOR: char = ':';

/// Minimum similarity ratio for closest-string matching of names.
pub const CLOSE_MATCH_CUTOFF: f64 = 0.6;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for attribute kinds and edge labels.
///
/// Longer strings are rejected by the ingestor.
pub const MAX_ATTRIBUTE_LENGTH: usize = 256;

/// Maximum length for attribute values (64KB).
pub const MAX_VALUE_LENGTH: usize = 65536;

/// Maximum number of vertices in a single ingested graph document.
pub const MAX_GRAPH_VERTICES: usize = 1_000_000;
