//! # Motifs
//!
//! Small labeled pattern graphs with attribute filters, used as declarative
//! selectors over document graphs.
//!
//! A motif is written as one JSON object per line:
//!
//! ```json
//! {"selector": 0,
//!  "structure": {"vertices": [{"identifier": 0, "label": {"pos": "NOUN"}}],
//!                "edges": []}}
//! ```
//!
//! Vertex labels also accept the older list form
//! `[{"attribute": "pos", "value": "NOUN"}]`; encoding always emits the
//! object form. Motifs are immutable and compared by structural value.

use crate::graph::GraphStore;
use crate::query::{JoinExecutor, MotifQuery, QueryExecutor, Selection};
use crate::{Attribute, MotelError, VertexId};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// PREDICATE & FILTER
// =============================================================================

/// Attribute equality constraint on a vertex.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Predicate {
    /// Attribute kind to check.
    pub kind: String,
    /// Required attribute value.
    pub value: String,
}

impl Predicate {
    /// Create a new predicate.
    #[must_use]
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.kind, self.value)
    }
}

/// Conjunction of predicates. The empty filter accepts every vertex.
///
/// Kinds are unique within a filter, since the object encoding cannot
/// carry the same key twice. Predicates are kept sorted by kind, so two
/// filters are equal exactly when they state the same conjunction.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "LabelRepr")]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// Create a filter, rejecting repeated attribute kinds.
    pub fn new(mut predicates: Vec<Predicate>) -> Result<Self, MotelError> {
        let mut seen = BTreeSet::new();
        for predicate in &predicates {
            if !seen.insert(predicate.kind.as_str()) {
                return Err(MotelError::InvalidMotif(format!(
                    "attribute kind '{}' repeated in one filter",
                    predicate.kind
                )));
            }
        }
        predicates.sort();
        Ok(Self { predicates })
    }

    /// The filter accepting every vertex.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A filter with a single predicate.
    #[must_use]
    pub fn single(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            predicates: vec![Predicate::new(kind, value)],
        }
    }

    /// Filter matching a vertex's attributes, skipping kinds in `avoid`.
    ///
    /// Repeated kinds collapse onto one predicate holding the last value
    /// seen.
    #[must_use]
    pub fn from_attributes(attributes: &[Attribute], avoid: &[&str]) -> Self {
        let mut predicates: Vec<Predicate> = Vec::new();
        for attribute in attributes {
            if avoid.contains(&attribute.kind.as_str()) {
                continue;
            }
            match predicates.iter_mut().find(|p| p.kind == attribute.kind) {
                Some(existing) => existing.value.clone_from(&attribute.value),
                None => predicates.push(Predicate::new(&attribute.kind, &attribute.value)),
            }
        }
        predicates.sort();
        Self { predicates }
    }

    /// Predicates sorted by kind.
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Check if the filter is trivially satisfied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.predicates.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", parts.join(" & "))
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.predicates.len()))?;
        for predicate in &self.predicates {
            map.serialize_entry(&predicate.kind, &predicate.value)?;
        }
        map.end()
    }
}

/// Entry of the older list-form label.
#[derive(Deserialize)]
struct LegacyPredicate {
    attribute: String,
    value: serde_json::Value,
}

/// Accepted encodings of a vertex label.
#[derive(Deserialize)]
#[serde(untagged)]
enum LabelRepr {
    Object(serde_json::Map<String, serde_json::Value>),
    List(Vec<LegacyPredicate>),
}

/// Coerce a scalar JSON value to its string form.
fn scalar_to_string(kind: &str, value: serde_json::Value) -> Result<String, MotelError> {
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(MotelError::InvalidMotif(format!(
            "value of '{}' must be a scalar, got {}",
            kind, other
        ))),
    }
}

impl TryFrom<LabelRepr> for Filter {
    type Error = MotelError;

    fn try_from(repr: LabelRepr) -> Result<Self, Self::Error> {
        let predicates = match repr {
            LabelRepr::Object(map) => map
                .into_iter()
                .map(|(kind, value)| {
                    let value = scalar_to_string(&kind, value)?;
                    Ok(Predicate::new(kind, value))
                })
                .collect::<Result<Vec<_>, MotelError>>()?,
            LabelRepr::List(entries) => entries
                .into_iter()
                .map(|entry| {
                    let value = scalar_to_string(&entry.attribute, entry.value)?;
                    Ok(Predicate::new(entry.attribute, value))
                })
                .collect::<Result<Vec<_>, MotelError>>()?,
        };
        Self::new(predicates)
    }
}

// =============================================================================
// MOTIF STRUCTURE
// =============================================================================

/// A vertex of a motif, identified locally.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MotifVertex {
    /// Motif-scoped identifier.
    pub identifier: u64,
    /// Requirements on the bound store vertex.
    #[serde(rename = "label", default)]
    pub filter: Filter,
}

impl MotifVertex {
    /// Create a new motif vertex.
    #[must_use]
    pub fn new(identifier: u64, filter: Filter) -> Self {
        Self { identifier, filter }
    }
}

impl fmt::Display for MotifVertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.identifier, self.filter)
    }
}

/// A directed labeled edge between two motif vertices.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MotifEdge {
    /// Local id of the source vertex.
    pub source: u64,
    /// Local id of the destination vertex.
    pub destination: u64,
    /// Required store edge label.
    pub label: String,
}

impl MotifEdge {
    /// Create a new motif edge.
    #[must_use]
    pub fn new(source: u64, label: impl Into<String>, destination: u64) -> Self {
        Self {
            source,
            destination,
            label: label.into(),
        }
    }
}

impl fmt::Display for MotifEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --[{}]-> {}", self.source, self.label, self.destination)
    }
}

/// Vertices and edges of a motif.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Structure {
    /// Motif vertices.
    #[serde(default)]
    pub vertices: Vec<MotifVertex>,
    /// Motif edges.
    #[serde(default)]
    pub edges: Vec<MotifEdge>,
}

#[derive(Deserialize)]
struct RawMotif {
    selector: u64,
    structure: Structure,
}

/// A pattern graph with a distinguished selector vertex.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMotif")]
pub struct Motif {
    selector: u64,
    structure: Structure,
}

impl TryFrom<RawMotif> for Motif {
    type Error = MotelError;

    fn try_from(raw: RawMotif) -> Result<Self, Self::Error> {
        Self::new(raw.selector, raw.structure.vertices, raw.structure.edges)
    }
}

impl Motif {
    /// Build a motif, checking that the selector and every edge endpoint
    /// name a declared vertex and that vertex ids are unique.
    pub fn new(
        selector: u64,
        vertices: Vec<MotifVertex>,
        edges: Vec<MotifEdge>,
    ) -> Result<Self, MotelError> {
        let mut declared = BTreeSet::new();
        for vertex in &vertices {
            if !declared.insert(vertex.identifier) {
                return Err(MotelError::InvalidMotif(format!(
                    "vertex {} declared twice",
                    vertex.identifier
                )));
            }
        }

        if !declared.contains(&selector) {
            return Err(MotelError::InvalidMotif(format!(
                "selector {} is not a motif vertex",
                selector
            )));
        }

        for edge in &edges {
            if !declared.contains(&edge.source) || !declared.contains(&edge.destination) {
                return Err(MotelError::InvalidMotif(format!(
                    "edge {} references an undeclared vertex",
                    edge
                )));
            }
        }

        Ok(Self {
            selector,
            structure: Structure { vertices, edges },
        })
    }

    /// Local id of the selected vertex.
    #[must_use]
    pub fn selector(&self) -> u64 {
        self.selector
    }

    /// Motif vertices.
    #[must_use]
    pub fn vertices(&self) -> &[MotifVertex] {
        &self.structure.vertices
    }

    /// Motif edges.
    #[must_use]
    pub fn edges(&self) -> &[MotifEdge] {
        &self.structure.edges
    }

    /// Compile into a typed query: one selection per vertex and per edge,
    /// projected onto the selector.
    #[must_use]
    pub fn to_query(&self) -> MotifQuery {
        let vertices = self.vertices().iter().map(|vertex| Selection::Vertices {
            column: vertex.identifier,
            predicates: vertex.filter.predicates().to_vec(),
        });
        let edges = self.edges().iter().map(|edge| Selection::Edges {
            label: edge.label.clone(),
            source: edge.source,
            destination: edge.destination,
        });
        MotifQuery::new(vertices.chain(edges).collect(), self.selector)
    }

    /// Evaluate against a store, returning the distinct selected vertices.
    pub fn evaluate<S: GraphStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<BTreeSet<VertexId>, MotelError> {
        JoinExecutor::new(store).execute(&self.to_query())
    }

    /// Parse a motif from its JSON line.
    pub fn from_json(text: &str) -> Result<Self, MotelError> {
        serde_json::from_str(text).map_err(|e| MotelError::InvalidMotif(e.to_string()))
    }

    /// Encode as a single JSON line.
    pub fn to_json(&self) -> Result<String, MotelError> {
        serde_json::to_string(self).map_err(|e| MotelError::SerializationError(e.to_string()))
    }
}

impl fmt::Display for Motif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vertices: Vec<String> = self.vertices().iter().map(ToString::to_string).collect();
        let edges: Vec<String> = self.edges().iter().map(ToString::to_string).collect();
        write!(
            f,
            "select {} from {{{}}} where {{{}}}",
            self.selector,
            vertices.join(", "),
            edges.join(", ")
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    const SUBJECT: &str = r#"{"selector": 0, "structure": {
        "vertices": [
            {"identifier": 0, "label": {"pos": "PROPN"}},
            {"identifier": 1, "label": {}}
        ],
        "edges": [{"source": 1, "destination": 0, "label": "spacy:nsubj"}]
    }}"#;

    #[test]
    fn parse_canonical_form() {
        let motif = Motif::from_json(SUBJECT).expect("parse");
        assert_eq!(motif.selector(), 0);
        assert_eq!(motif.vertices().len(), 2);
        assert_eq!(motif.edges()[0].label, "spacy:nsubj");
        assert_eq!(
            motif.vertices()[0].filter.predicates(),
            &[Predicate::new("pos", "PROPN")]
        );
        assert!(motif.vertices()[1].filter.is_empty());
    }

    #[test]
    fn parse_legacy_list_form() {
        let legacy = r#"{"selector": 3, "structure": {
            "vertices": [{"identifier": 3, "label": [{"attribute": "pos", "value": "NOUN"}]}],
            "edges": []
        }}"#;
        let motif = Motif::from_json(legacy).expect("parse");
        let canonical = Motif::new(
            3,
            vec![MotifVertex::new(3, Filter::single("pos", "NOUN"))],
            Vec::new(),
        )
        .expect("motif");
        assert_eq!(motif, canonical);
    }

    #[test]
    fn scalar_values_are_coerced() {
        let text = r#"{"selector": 0, "structure": {
            "vertices": [{"identifier": 0, "label": {"length": 5, "is_title": true}}],
            "edges": []
        }}"#;
        let motif = Motif::from_json(text).expect("parse");
        assert_eq!(
            motif.vertices()[0].filter.predicates(),
            &[Predicate::new("is_title", "true"), Predicate::new("length", "5")]
        );
    }

    #[test]
    fn nested_values_rejected() {
        let text = r#"{"selector": 0, "structure": {
            "vertices": [{"identifier": 0, "label": {"pos": ["NOUN"]}}], "edges": []
        }}"#;
        assert!(matches!(
            Motif::from_json(text),
            Err(MotelError::InvalidMotif(_))
        ));
    }

    #[test]
    fn encode_preserves_key_order() {
        let motif = Motif::from_json(SUBJECT).expect("parse");
        let json = motif.to_json().expect("encode");
        assert!(json.starts_with(r#"{"selector":0,"structure":{"vertices":"#));
        assert_eq!(Motif::from_json(&json).expect("decode"), motif);
    }

    #[test]
    fn selector_must_be_declared() {
        let result = Motif::new(5, vec![MotifVertex::new(0, Filter::empty())], Vec::new());
        assert!(matches!(result, Err(MotelError::InvalidMotif(_))));
    }

    #[test]
    fn edges_must_reference_declared_vertices() {
        let result = Motif::new(
            0,
            vec![MotifVertex::new(0, Filter::empty())],
            vec![MotifEdge::new(0, "x", 1)],
        );
        assert!(matches!(result, Err(MotelError::InvalidMotif(_))));
    }

    #[test]
    fn duplicate_vertex_ids_rejected() {
        let result = Motif::new(
            0,
            vec![
                MotifVertex::new(0, Filter::empty()),
                MotifVertex::new(0, Filter::single("pos", "NOUN")),
            ],
            Vec::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn filter_equality_ignores_key_order() {
        let forward = r#"{"selector": 0, "structure": {
            "vertices": [{"identifier": 0, "label": {"a": "1", "b": "2"}}], "edges": []
        }}"#;
        let backward = r#"{"selector": 0, "structure": {
            "vertices": [{"identifier": 0, "label": {"b": "2", "a": "1"}}], "edges": []
        }}"#;
        let forward = Motif::from_json(forward).expect("parse");
        let backward = Motif::from_json(backward).expect("parse");
        assert_eq!(forward, backward);
        assert_eq!(
            forward.to_json().expect("encode"),
            backward.to_json().expect("encode")
        );

        let built = Filter::new(vec![Predicate::new("b", "2"), Predicate::new("a", "1")])
            .expect("filter");
        let attributes = [Attribute::new("b", "2"), Attribute::new("a", "1")];
        assert_eq!(built, Filter::from_attributes(&attributes, &[]));
        assert_eq!(built.predicates()[0].kind, "a");
    }

    #[test]
    fn repeated_kinds_rejected() {
        let result = Filter::new(vec![Predicate::new("pos", "NOUN"), Predicate::new("pos", "X")]);
        assert!(result.is_err());
    }

    #[test]
    fn evaluate_subject_motif() {
        let mut graph = Graph::new();
        let name = graph
            .create_vertex(vec![Attribute::new("pos", "PROPN")])
            .expect("vertex");
        let verb = graph
            .create_vertex(vec![Attribute::new("pos", "VERB")])
            .expect("vertex");
        let object = graph
            .create_vertex(vec![Attribute::new("pos", "PROPN")])
            .expect("vertex");
        graph.create_edge(verb, "spacy:nsubj", name).expect("edge");
        graph.create_edge(verb, "spacy:dobj", object).expect("edge");

        let motif = Motif::from_json(SUBJECT).expect("parse");
        assert_eq!(motif.evaluate(&graph).expect("evaluate"), BTreeSet::from([name]));
    }

    #[test]
    fn display_is_readable() {
        let motif = Motif::from_json(SUBJECT).expect("parse");
        assert_eq!(
            motif.to_string(),
            "select 0 from {0 @ [pos = PROPN], 1 @ []} where {1 --[spacy:nsubj]-> 0}"
        );
    }
}
