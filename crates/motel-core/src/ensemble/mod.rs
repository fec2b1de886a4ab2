//! # Ensembles
//!
//! Classifiers that combine the selections of several motifs into one
//! probability per point.
//!
//! Every ensemble is built once from a [`SparseImage`]: the image's distinct
//! domain fixes the row order, its motifs fix the column order, and the
//! 0/1 inclusion matrix never changes afterwards. Re-evaluating the image
//! does not affect an ensemble already built from it.
//!
//! Strategies form a closed set:
//!
//! - [`Disjunction`]: 1 for points selected by any relevant motif.
//! - [`MajorityVote`]: fraction of relevant motifs selecting the point.
//! - [`WeightedVote`]: multiplicative-weights vote over false-positive rates.

mod disjunction;
mod weighted;

pub use disjunction::{Disjunction, MajorityVote};
pub use weighted::WeightedVote;

use crate::config::MotelConfig;
use crate::fuzzy::closest_match;
use crate::image::SparseImage;
use crate::motif::Motif;
use crate::{MotelError, Point};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// INCLUSION MATRIX
// =============================================================================

/// Point × motif 0/1 matrix, fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct InclusionMatrix {
    points: Vec<Point>,
    motifs: Vec<Motif>,
    index: BTreeMap<Point, usize>,
    /// One row per point, one column per motif.
    rows: Vec<Vec<bool>>,
    /// Length of each motif's selected sequence in the image.
    selection_sizes: Vec<usize>,
}

impl InclusionMatrix {
    /// Build the matrix from an image.
    #[must_use]
    pub fn from_image(image: &SparseImage) -> Self {
        let points = image.distinct_domain();
        let motifs: Vec<Motif> = image.motifs().cloned().collect();

        let mut rows = vec![vec![false; motifs.len()]; points.len()];
        let mut selection_sizes = Vec::with_capacity(motifs.len());
        let index: BTreeMap<Point, usize> = points
            .iter()
            .enumerate()
            .map(|(i, point)| (point.clone(), i))
            .collect();

        for (column, motif) in motifs.iter().enumerate() {
            let selected = image.motif_domain(motif).unwrap_or_default();
            selection_sizes.push(selected.len());
            for point in selected {
                if let Some(&row) = index.get(point) {
                    rows[row][column] = true;
                }
            }
        }

        Self {
            points,
            motifs,
            index,
            rows,
            selection_sizes,
        }
    }

    /// Points in row order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Motifs in column order.
    #[must_use]
    pub fn motifs(&self) -> &[Motif] {
        &self.motifs
    }

    /// Number of rows.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of columns.
    #[must_use]
    pub fn motif_count(&self) -> usize {
        self.motifs.len()
    }

    /// Row index of a point.
    #[must_use]
    pub fn index_of(&self, point: &Point) -> Option<usize> {
        self.index.get(point).copied()
    }

    /// Row of a point, one entry per motif.
    #[must_use]
    pub fn row(&self, index: usize) -> &[bool] {
        self.rows.get(index).map_or(&[], Vec::as_slice)
    }

    /// Check if motif `column` selects point `row`.
    #[must_use]
    pub fn includes(&self, row: usize, column: usize) -> bool {
        self.row(row).get(column).copied().unwrap_or(false)
    }

    /// Check if motif `column` selects at least one point.
    #[must_use]
    pub fn column_is_empty(&self, column: usize) -> bool {
        !self.rows.iter().any(|row| row.get(column).copied().unwrap_or(false))
    }

    /// Length of each motif's selected sequence, duplicates included.
    #[must_use]
    pub fn selection_sizes(&self) -> &[usize] {
        &self.selection_sizes
    }

    fn require(&self, point: &Point) -> Result<usize, MotelError> {
        self.index_of(point)
            .ok_or_else(|| MotelError::PointNotInDomain(point.clone()))
    }
}

// =============================================================================
// ENSEMBLE KIND
// =============================================================================

/// Ensemble strategy name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnsembleKind {
    Disjunction,
    MajorityVote,
    WeightedVote,
}

impl EnsembleKind {
    /// Canonical names, in declaration order.
    pub const NAMES: [&'static str; 3] = ["disjunction", "majority-vote", "weighted-vote"];

    /// Every strategy, in declaration order.
    pub const ALL: [Self; 3] = [Self::Disjunction, Self::MajorityVote, Self::WeightedVote];

    /// Canonical name of the strategy.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disjunction => "disjunction",
            Self::MajorityVote => "majority-vote",
            Self::WeightedVote => "weighted-vote",
        }
    }
}

impl FromStr for EnsembleKind {
    type Err = MotelError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match closest_match(name, &Self::NAMES) {
            Some("disjunction") => Ok(Self::Disjunction),
            Some("majority-vote") => Ok(Self::MajorityVote),
            Some("weighted-vote") => Ok(Self::WeightedVote),
            _ => Err(MotelError::UnknownEnsemble(name.to_string())),
        }
    }
}

impl fmt::Display for EnsembleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// UPDATE PARAMETERS
// =============================================================================

/// Parameters of one `update` call.
///
/// Only the weighted vote reads them; the disjunction strategies learn from
/// the observation alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateParams {
    /// Learning rate; the configured rate when `None`.
    pub learning_rate: Option<f64>,
    /// Per-step decay applied as `decay^step`.
    pub decay: f64,
    /// Number of updates performed so far.
    pub step: u32,
    /// Scale of positive observations.
    pub scale: f64,
}

impl Default for UpdateParams {
    fn default() -> Self {
        Self {
            learning_rate: None,
            decay: 1.0,
            step: 0,
            scale: 1.0,
        }
    }
}

impl UpdateParams {
    /// Same parameters at another step.
    #[must_use]
    pub fn at_step(self, step: u32) -> Self {
        Self { step, ..self }
    }

    /// The step discount `decay^step`.
    #[must_use]
    pub fn discount(&self) -> f64 {
        self.decay.powf(f64::from(self.step))
    }
}

// =============================================================================
// ENSEMBLE
// =============================================================================

/// The strategy-specific state of an ensemble.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Disjunction(Disjunction),
    MajorityVote(MajorityVote),
    WeightedVote(WeightedVote),
}

/// A motif ensemble with its classification settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble {
    strategy: Strategy,
    classification_threshold: f64,
    learning_rate: f64,
}

impl Ensemble {
    /// Build an ensemble of the given kind from an image.
    #[must_use]
    pub fn new(kind: EnsembleKind, image: &SparseImage, config: &MotelConfig) -> Self {
        let matrix = InclusionMatrix::from_image(image);
        tracing::info!(
            ensemble = %kind,
            motifs = matrix.motif_count(),
            points = matrix.point_count(),
            "built ensemble"
        );

        let strategy = match kind {
            EnsembleKind::Disjunction => Strategy::Disjunction(Disjunction::new(
                matrix,
                config.accuracy_smoothing,
                config.accuracy_threshold,
            )),
            EnsembleKind::MajorityVote => Strategy::MajorityVote(MajorityVote::new(
                matrix,
                config.accuracy_smoothing,
                config.accuracy_threshold,
            )),
            EnsembleKind::WeightedVote => {
                let fpr = (!config.approximate_fpr).then_some(config.flat_fpr);
                Strategy::WeightedVote(WeightedVote::new(matrix, fpr))
            }
        };

        Self {
            strategy,
            classification_threshold: config.classification_threshold,
            learning_rate: config.learning_rate,
        }
    }

    /// Strategy of this ensemble.
    #[must_use]
    pub fn kind(&self) -> EnsembleKind {
        match &self.strategy {
            Strategy::Disjunction(_) => EnsembleKind::Disjunction,
            Strategy::MajorityVote(_) => EnsembleKind::MajorityVote,
            Strategy::WeightedVote(_) => EnsembleKind::WeightedVote,
        }
    }

    /// Strategy-specific state.
    #[must_use]
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// The inclusion matrix the ensemble was built with.
    #[must_use]
    pub fn matrix(&self) -> &InclusionMatrix {
        match &self.strategy {
            Strategy::Disjunction(inner) => inner.matrix(),
            Strategy::MajorityVote(inner) => inner.matrix(),
            Strategy::WeightedVote(inner) => inner.matrix(),
        }
    }

    /// Points classified by the ensemble, in row order.
    #[must_use]
    pub fn domain(&self) -> &[Point] {
        self.matrix().points()
    }

    /// Motifs of the ensemble, in column order.
    #[must_use]
    pub fn motifs(&self) -> &[Motif] {
        self.matrix().motifs()
    }

    /// Number of motifs that take part in the vote.
    ///
    /// Relevant motifs only for the disjunction strategies.
    #[must_use]
    pub fn size(&self) -> usize {
        match &self.strategy {
            Strategy::Disjunction(inner) => inner.relevant_count(),
            Strategy::MajorityVote(inner) => inner.relevant_count(),
            Strategy::WeightedVote(inner) => inner.matrix().motif_count(),
        }
    }

    /// Positive probability of every domain point, in row order.
    #[must_use]
    pub fn probabilities(&self) -> Vec<f64> {
        match &self.strategy {
            Strategy::Disjunction(inner) => inner.probabilities(),
            Strategy::MajorityVote(inner) => inner.probabilities(),
            Strategy::WeightedVote(inner) => inner.probabilities(),
        }
    }

    /// Domain points paired with their probabilities.
    #[must_use]
    pub fn probabilities_per_point(&self) -> Vec<(&Point, f64)> {
        self.domain().iter().zip(self.probabilities()).collect()
    }

    /// Domain points whose probability reaches `threshold`, in row order.
    ///
    /// Uses the configured classification threshold when `threshold` is `None`.
    #[must_use]
    pub fn classified(&self, threshold: Option<f64>) -> Vec<Point> {
        let threshold = threshold.unwrap_or(self.classification_threshold);
        self.probabilities_per_point()
            .into_iter()
            .filter(|(_, probability)| *probability >= threshold)
            .map(|(point, _)| point.clone())
            .collect()
    }

    /// Classified points as a set.
    #[must_use]
    pub fn classified_set(&self, threshold: Option<f64>) -> BTreeSet<Point> {
        self.classified(threshold).into_iter().collect()
    }

    /// Check if a point is classified positive at the configured threshold.
    #[must_use]
    pub fn classify(&self, point: &Point) -> bool {
        self.classified(None).contains(point)
    }

    /// Learn from one observed `(point, label)` pair.
    pub fn update(
        &mut self,
        point: &Point,
        label: bool,
        params: &UpdateParams,
    ) -> Result<(), MotelError> {
        let row = self.matrix().require(point)?;
        let learning_rate = params.learning_rate.unwrap_or(self.learning_rate);

        match &mut self.strategy {
            Strategy::Disjunction(inner) => inner.observe(row, label),
            Strategy::MajorityVote(inner) => inner.observe(row, label),
            Strategy::WeightedVote(inner) => inner.observe(
                row,
                label,
                learning_rate,
                params.discount(),
                params.scale,
            ),
        }

        tracing::debug!(ensemble = %self.kind(), point = %point, label, "updated ensemble");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
