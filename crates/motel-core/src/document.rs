//! # Documents and Datasets
//!
//! A dataset file lists document stores, one per line:
//!
//! ```json
//! {"filename": "docs/0001.redb", "split": ["train"]}
//! ```
//!
//! Split names are matched against `train`, `test`, and `validate` with a
//! closest-name fallback.

use crate::formats::read_jsonl_file;
use crate::fuzzy::closest_match;
use crate::graph::GraphStore;
use crate::session::Session;
use crate::{MotelError, Point, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// =============================================================================
// SPLIT
// =============================================================================

/// Dataset partition a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Split {
    Train,
    Test,
    Validate,
}

impl Split {
    /// Canonical names, in declaration order.
    pub const NAMES: [&'static str; 3] = ["train", "test", "validate"];

    /// Canonical name of the split.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
            Self::Validate => "validate",
        }
    }
}

impl FromStr for Split {
    type Err = MotelError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match closest_match(name, &Self::NAMES) {
            Some("train") => Ok(Self::Train),
            Some("test") => Ok(Self::Test),
            Some("validate") => Ok(Self::Validate),
            _ => Err(MotelError::UnknownSplit(name.to_string())),
        }
    }
}

impl TryFrom<String> for Split {
    type Error = MotelError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<Split> for String {
    fn from(split: Split) -> Self {
        split.as_str().to_string()
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// A document store referenced by a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Storage locator of the document.
    pub filename: String,
    /// Splits the document belongs to.
    #[serde(default)]
    pub split: Vec<Split>,
}

impl Document {
    /// Create a document outside any split.
    #[must_use]
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            split: Vec::new(),
        }
    }

    /// Add the document to a split.
    #[must_use]
    pub fn with_split(mut self, split: Split) -> Self {
        self.split.push(split);
        self
    }

    /// Open a session on the existing store.
    pub fn open(&self) -> Result<Session, MotelError> {
        Session::open_existing(&self.filename)
    }

    /// The point for a vertex of this document.
    #[must_use]
    pub fn point(&self, identifier: VertexId) -> Point {
        Point::new(self.filename.clone(), identifier)
    }

    /// Check if the document belongs to `split`.
    #[must_use]
    pub fn in_split(&self, split: Split) -> bool {
        self.split.contains(&split)
    }

    /// Ground-truth positive points of this document.
    pub fn positive_points(&self) -> Result<Vec<Point>, MotelError> {
        let session = self.open()?;
        Ok(session
            .positive_vertices()?
            .into_iter()
            .map(|id| self.point(id))
            .collect())
    }
}

// =============================================================================
// DATASET
// =============================================================================

/// An ordered collection of documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    documents: Vec<Document>,
}

impl Dataset {
    /// Create a dataset from documents.
    #[must_use]
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Load a dataset file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MotelError> {
        let documents: Vec<Document> = read_jsonl_file(path.as_ref())?;
        tracing::info!(
            path = %path.as_ref().display(),
            documents = documents.len(),
            "loaded dataset"
        );
        Ok(Self::new(documents))
    }

    /// All documents in file order.
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Documents belonging to `split`.
    pub fn documents_in(&self, split: Split) -> impl Iterator<Item = &Document> + '_ {
        self.documents.iter().filter(move |doc| doc.in_split(split))
    }

    /// Check if any document carries a split.
    #[must_use]
    pub fn has_splits(&self) -> bool {
        self.documents.iter().any(|doc| !doc.split.is_empty())
    }

    /// Locators of the documents in `split`.
    #[must_use]
    pub fn locators_in(&self, split: Split) -> BTreeSet<&str> {
        self.documents_in(split)
            .map(|doc| doc.filename.as_str())
            .collect()
    }

    /// Positive points across every document.
    ///
    /// Best effort: a document that cannot be read is logged and skipped.
    #[must_use]
    pub fn ground_truth(&self) -> BTreeSet<Point> {
        let mut points = BTreeSet::new();
        for document in &self.documents {
            match document.positive_points() {
                Ok(found) => points.extend(found),
                Err(e) => tracing::warn!(
                    document = %document.filename,
                    error = %e,
                    "skipping document while collecting ground truth"
                ),
            }
        }
        points
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::Attribute;
    use crate::primitives::{POSITIVE_LABEL, USER_LABEL_KIND};
    use tempfile::tempdir;

    #[test]
    fn split_names_use_closest_match() {
        assert_eq!("train".parse::<Split>().expect("parse"), Split::Train);
        assert_eq!("Tests".parse::<Split>().expect("parse"), Split::Test);
        assert_eq!("validation".parse::<Split>().expect("parse"), Split::Validate);
        assert!(matches!(
            "holdout".parse::<Split>(),
            Err(MotelError::UnknownSplit(_))
        ));
    }

    #[test]
    fn document_line_parses_fuzzy_splits() {
        let doc: Document =
            serde_json::from_str(r#"{"filename": "a.redb", "split": ["trains", "test"]}"#)
                .expect("parse");
        assert_eq!(doc.split, vec![Split::Train, Split::Test]);

        let json = serde_json::to_string(&doc).expect("encode");
        assert_eq!(json, r#"{"filename":"a.redb","split":["train","test"]}"#);
    }

    #[test]
    fn split_is_optional() {
        let doc: Document = serde_json::from_str(r#"{"filename": "a.redb"}"#).expect("parse");
        assert!(doc.split.is_empty());
    }

    #[test]
    fn documents_in_filters_by_split() {
        let dataset = Dataset::new(vec![
            Document::new("a").with_split(Split::Train),
            Document::new("b").with_split(Split::Test),
            Document::new("c").with_split(Split::Train),
        ]);
        let train: Vec<&str> = dataset
            .documents_in(Split::Train)
            .map(|d| d.filename.as_str())
            .collect();
        assert_eq!(train, vec!["a", "c"]);
        assert!(dataset.has_splits());
        assert_eq!(dataset.locators_in(Split::Test), BTreeSet::from(["b"]));
    }

    #[test]
    fn ground_truth_skips_missing_documents() {
        let temp = tempdir().expect("temp dir");
        let present = temp.path().join("present.redb");
        let missing = temp.path().join("missing.redb");

        let positive = {
            let mut session = Session::open(&present).expect("open");
            session.create_vertex(Vec::new()).expect("vertex");
            session
                .create_vertex(vec![Attribute::new(USER_LABEL_KIND, POSITIVE_LABEL)])
                .expect("vertex")
        };

        let present = present.display().to_string();
        let dataset = Dataset::new(vec![
            Document::new(missing.display().to_string()),
            Document::new(present.clone()),
        ]);

        let truth = dataset.ground_truth();
        assert_eq!(truth, BTreeSet::from([Point::new(present, positive)]));
    }

    #[test]
    fn load_dataset_file() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("data.jsonl");
        std::fs::write(
            &path,
            "{\"filename\": \"a.redb\", \"split\": [\"train\"]}\n{\"filename\": \"b.redb\", \"split\": [\"test\"]}\n",
        )
        .expect("write");

        let dataset = Dataset::load(&path).expect("load");
        assert_eq!(dataset.documents().len(), 2);
        assert_eq!(dataset.documents()[1].split, vec![Split::Test]);
    }
}
