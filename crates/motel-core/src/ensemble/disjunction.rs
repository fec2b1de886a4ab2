//! Disjunction and majority-vote ensembles.
//!
//! Both keep one Laplace-smoothed accuracy per motif,
//! `(correct + k) / (total + k)`, recomputed from the full observation
//! history on every update. A motif is relevant when its accuracy reaches
//! the accuracy threshold and it selects at least one domain point.

use super::InclusionMatrix;

/// Classifies a point positive when any relevant motif selects it.
#[derive(Debug, Clone, PartialEq)]
pub struct Disjunction {
    matrix: InclusionMatrix,
    smoothing: f64,
    accuracy_threshold: f64,
    /// Observed `(row, label)` pairs, oldest first.
    observations: Vec<(usize, bool)>,
    accuracies: Vec<f64>,
}

impl Disjunction {
    /// Create a disjunction with every accuracy at 1.
    #[must_use]
    pub fn new(matrix: InclusionMatrix, smoothing: f64, accuracy_threshold: f64) -> Self {
        let accuracies = vec![1.0; matrix.motif_count()];
        Self {
            matrix,
            smoothing,
            accuracy_threshold,
            observations: Vec::new(),
            accuracies,
        }
    }

    /// The inclusion matrix.
    #[must_use]
    pub fn matrix(&self) -> &InclusionMatrix {
        &self.matrix
    }

    /// Per-motif accuracy estimates, in column order.
    #[must_use]
    pub fn accuracies(&self) -> &[f64] {
        &self.accuracies
    }

    /// Number of observations seen so far.
    #[must_use]
    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }

    /// Relevance flag per motif, in column order.
    #[must_use]
    pub fn relevant(&self) -> Vec<bool> {
        self.accuracies
            .iter()
            .enumerate()
            .map(|(column, &accuracy)| {
                accuracy >= self.accuracy_threshold && !self.matrix.column_is_empty(column)
            })
            .collect()
    }

    /// Number of relevant motifs.
    #[must_use]
    pub fn relevant_count(&self) -> usize {
        self.relevant().into_iter().filter(|&r| r).count()
    }

    /// Number of relevant motifs selecting each point, in row order.
    fn relevant_votes(&self) -> Vec<usize> {
        let relevant = self.relevant();
        (0..self.matrix.point_count())
            .map(|row| {
                self.matrix
                    .row(row)
                    .iter()
                    .zip(&relevant)
                    .filter(|(included, relevant)| **included && **relevant)
                    .count()
            })
            .collect()
    }

    /// 1 for points selected by at least one relevant motif, else 0.
    #[must_use]
    pub fn probabilities(&self) -> Vec<f64> {
        self.relevant_votes()
            .into_iter()
            .map(|votes| if votes > 0 { 1.0 } else { 0.0 })
            .collect()
    }

    pub(super) fn observe(&mut self, row: usize, label: bool) {
        self.observations.push((row, label));
        let total = self.observations.len() as f64;

        self.accuracies = (0..self.matrix.motif_count())
            .map(|column| {
                let correct = self
                    .observations
                    .iter()
                    .filter(|&&(row, label)| self.matrix.includes(row, column) == label)
                    .count() as f64;
                (correct + self.smoothing) / (total + self.smoothing)
            })
            .collect();
    }
}

/// Classifies by the fraction of relevant motifs selecting a point.
#[derive(Debug, Clone, PartialEq)]
pub struct MajorityVote {
    inner: Disjunction,
}

impl MajorityVote {
    /// Create a majority vote with every accuracy at 1.
    #[must_use]
    pub fn new(matrix: InclusionMatrix, smoothing: f64, accuracy_threshold: f64) -> Self {
        Self {
            inner: Disjunction::new(matrix, smoothing, accuracy_threshold),
        }
    }

    /// The inclusion matrix.
    #[must_use]
    pub fn matrix(&self) -> &InclusionMatrix {
        self.inner.matrix()
    }

    /// Per-motif accuracy estimates, in column order.
    #[must_use]
    pub fn accuracies(&self) -> &[f64] {
        self.inner.accuracies()
    }

    /// Number of relevant motifs.
    #[must_use]
    pub fn relevant_count(&self) -> usize {
        self.inner.relevant_count()
    }

    /// `votes / relevant` per point; all zero when nothing is relevant.
    #[must_use]
    pub fn probabilities(&self) -> Vec<f64> {
        let relevant = self.relevant_count();
        self.inner
            .relevant_votes()
            .into_iter()
            .map(|votes| {
                if relevant == 0 {
                    0.0
                } else {
                    votes as f64 / relevant as f64
                }
            })
            .collect()
    }

    pub(super) fn observe(&mut self, row: usize, label: bool) {
        self.inner.observe(row, label);
    }
}
