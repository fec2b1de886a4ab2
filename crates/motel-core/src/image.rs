//! # Sparse Images
//!
//! The image of a set of motifs over a set of documents: for each
//! registered motif, the sequence of points it selected.
//!
//! Evaluation appends, so evaluating the same document twice duplicates its
//! points. Callers evaluate each document once.
//!
//! On disk an image is newline-delimited JSON, one line per motif:
//! `{"motif": <motif>, "image": [{"file": ..., "identifier": ...}, ...]}`.

use crate::document::{Dataset, Document};
use crate::formats::{read_jsonl, read_jsonl_file, write_jsonl, write_jsonl_file};
use crate::graph::GraphStore;
use crate::motif::Motif;
use crate::{MotelError, Point, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::path::Path;

/// One motif with the points it selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRow {
    /// The motif.
    pub motif: Motif,
    /// Selected points, in evaluation order.
    pub image: Vec<Point>,
}

/// Outcome of evaluating a whole dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationReport {
    /// Locators of documents evaluated successfully.
    pub evaluated: Vec<String>,
    /// Locators of documents that failed, with the error message.
    pub failed: Vec<(String, String)>,
}

impl EvaluationReport {
    /// Check if every document was evaluated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Per-motif record of selected points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseImage {
    rows: Vec<ImageRow>,
}

impl SparseImage {
    /// Create an empty image.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a motif with an empty row.
    ///
    /// Registering the same motif twice creates two rows.
    pub fn register(&mut self, motif: Motif) {
        tracing::info!(motif = %motif, "registered motif");
        self.rows.push(ImageRow {
            motif,
            image: Vec::new(),
        });
    }

    /// Register several motifs in order.
    pub fn register_many(&mut self, motifs: impl IntoIterator<Item = Motif>) {
        for motif in motifs {
            self.register(motif);
        }
    }

    /// Evaluate every registered motif against an open store, appending the
    /// selected vertices as points of `document`.
    ///
    /// Rows are only extended once every motif has evaluated; a failure
    /// leaves the image untouched. Returns the number of points appended.
    pub fn evaluate_store<S: GraphStore + ?Sized>(
        &mut self,
        store: &S,
        document: &str,
    ) -> Result<usize, MotelError> {
        let mut selections: Vec<BTreeSet<VertexId>> = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let selected = row.motif.evaluate(store)?;
            tracing::debug!(
                motif = %row.motif,
                document,
                selected = selected.len(),
                "evaluated motif"
            );
            selections.push(selected);
        }

        let mut added = 0;
        for (row, selected) in self.rows.iter_mut().zip(selections) {
            added += selected.len();
            row.image.extend(
                selected
                    .into_iter()
                    .map(|id| Point::new(document.to_string(), id)),
            );
        }
        Ok(added)
    }

    /// Evaluate every registered motif on one document.
    ///
    /// The document's session is released before returning, on every path.
    pub fn evaluate(&mut self, document: &Document) -> Result<usize, MotelError> {
        let session = document.open()?;
        let added = self.evaluate_store(&session, &document.filename)?;
        tracing::info!(document = %document.filename, points = added, "evaluated document");
        Ok(added)
    }

    /// Evaluate every document of a dataset, best effort.
    ///
    /// A document that fails is logged and recorded in the report; the loop
    /// continues with the next one.
    pub fn evaluate_dataset(&mut self, dataset: &Dataset) -> EvaluationReport {
        let mut report = EvaluationReport::default();
        for document in dataset.documents() {
            match self.evaluate(document) {
                Ok(_) => report.evaluated.push(document.filename.clone()),
                Err(e) => {
                    tracing::warn!(document = %document.filename, error = %e, "evaluation failed");
                    report.failed.push((document.filename.clone(), e.to_string()));
                }
            }
        }
        report
    }

    /// Rows in registration order.
    #[must_use]
    pub fn rows(&self) -> &[ImageRow] {
        &self.rows
    }

    /// Registered motifs in registration order.
    pub fn motifs(&self) -> impl Iterator<Item = &Motif> + '_ {
        self.rows.iter().map(|row| &row.motif)
    }

    /// Number of registered motifs.
    #[must_use]
    pub fn motif_count(&self) -> usize {
        self.rows.len()
    }

    /// Points selected by the first row registered for `motif`.
    #[must_use]
    pub fn motif_domain(&self, motif: &Motif) -> Option<&[Point]> {
        self.rows
            .iter()
            .find(|row| &row.motif == motif)
            .map(|row| row.image.as_slice())
    }

    /// Every selected point of every row, duplicates included.
    pub fn domain(&self) -> impl Iterator<Item = &Point> + '_ {
        self.rows.iter().flat_map(|row| row.image.iter())
    }

    /// Selected points without duplicates, in first-seen order.
    #[must_use]
    pub fn distinct_domain(&self) -> Vec<Point> {
        let mut seen = BTreeSet::new();
        self.domain()
            .filter(|point| seen.insert(*point))
            .cloned()
            .collect()
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Write one line per row.
    pub fn to_writer(&self, writer: impl Write) -> Result<(), MotelError> {
        write_jsonl(writer, &self.rows)
    }

    /// Read an image written by `to_writer`.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, MotelError> {
        Self::from_rows(read_jsonl(reader)?)
    }

    /// Write the image to a file.
    pub fn dump(&self, path: impl AsRef<Path>) -> Result<(), MotelError> {
        write_jsonl_file(path.as_ref(), &self.rows)?;
        tracing::info!(path = %path.as_ref().display(), motifs = self.rows.len(), "wrote image");
        Ok(())
    }

    /// Load an image from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MotelError> {
        let image = Self::from_rows(read_jsonl_file(path.as_ref())?)?;
        tracing::info!(path = %path.as_ref().display(), motifs = image.rows.len(), "loaded image");
        Ok(image)
    }

    fn from_rows(rows: Vec<ImageRow>) -> Result<Self, MotelError> {
        for row in &rows {
            if let Some(point) = row.image.iter().find(|p| p.document.is_empty()) {
                return Err(MotelError::InvalidPoint(format!(
                    "point {} has no document",
                    point.identifier
                )));
            }
        }
        Ok(Self { rows })
    }
}

// =============================================================================
// TESTS
// =============================================================================
