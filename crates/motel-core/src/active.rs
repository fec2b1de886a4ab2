//! # Active Learning
//!
//! Uncertainty-driven refinement of an ensemble. Each step scores the
//! ensemble at every configured threshold, then reveals the true label of
//! the learnable point the ensemble is least sure about and updates on it.
//! The final step only scores.

use crate::document::{Dataset, Split};
use crate::ensemble::{Ensemble, UpdateParams};
use crate::stats::{min_absolute_logit, statistics};
use crate::{MotelError, Point};
use serde::Serialize;
use std::collections::BTreeSet;

/// Default number of active-learning steps.
pub const DEFAULT_STEPS: u32 = 10;

/// Default F-beta weight.
pub const DEFAULT_BETA: f64 = 1.0;

/// One scored `(step, threshold)` pair.
///
/// Serializes with the result CSV column names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub ensemble: String,
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f-beta")]
    pub f_beta: f64,
    #[serde(rename = "al-step")]
    pub al_step: u32,
    pub threshold: f64,
}

impl ResultRow {
    /// Column names, as serialized.
    pub const HEADER: [&'static str; 6] = [
        "ensemble",
        "precision",
        "recall",
        "f-beta",
        "al-step",
        "threshold",
    ];
}

/// Which points may be queried and which documents are scored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    learnable: BTreeSet<Point>,
    /// Scored documents; every document when `None`.
    scored: Option<BTreeSet<String>>,
}

impl Partition {
    /// Learn from and score the whole domain.
    #[must_use]
    pub fn whole(domain: &[Point]) -> Self {
        Self {
            learnable: domain.iter().cloned().collect(),
            scored: None,
        }
    }

    /// Learn from `train` documents and score `test` documents.
    ///
    /// Falls back to [`Partition::whole`] when no document carries a split.
    #[must_use]
    pub fn from_dataset(domain: &[Point], dataset: &Dataset) -> Self {
        if !dataset.has_splits() {
            return Self::whole(domain);
        }

        let train = dataset.locators_in(Split::Train);
        let test = dataset.locators_in(Split::Test);
        Self {
            learnable: domain
                .iter()
                .filter(|p| train.contains(p.document.as_str()))
                .cloned()
                .collect(),
            scored: Some(test.into_iter().map(str::to_string).collect()),
        }
    }

    /// Points still available for querying.
    #[must_use]
    pub fn learnable(&self) -> &BTreeSet<Point> {
        &self.learnable
    }

    fn is_scored(&self, point: &Point) -> bool {
        self.scored
            .as_ref()
            .is_none_or(|documents| documents.contains(&point.document))
    }

    fn scored_subset<'a>(&self, points: impl IntoIterator<Item = &'a Point>) -> BTreeSet<Point> {
        points
            .into_iter()
            .filter(|p| self.is_scored(p))
            .cloned()
            .collect()
    }
}

/// Active-learning run settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveLearning {
    /// Number of scored steps.
    pub steps: u32,
    /// Classification thresholds scored at every step.
    pub thresholds: Vec<f64>,
    /// F-beta weight.
    pub beta: f64,
    /// Update parameters; `step` is overwritten per step.
    pub update: UpdateParams,
}

impl Default for ActiveLearning {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
            thresholds: Vec::new(),
            beta: DEFAULT_BETA,
            update: UpdateParams::default(),
        }
    }
}

impl ActiveLearning {
    /// Run the loop, consuming learnable points from `partition`.
    ///
    /// With no thresholds configured, each step is scored once at
    /// `default_threshold`. Labels are revealed from `truth` in full, while
    /// scoring only counts points of scored documents.
    pub fn run(
        &self,
        ensemble: &mut Ensemble,
        truth: &BTreeSet<Point>,
        partition: &mut Partition,
        default_threshold: f64,
    ) -> Result<Vec<ResultRow>, MotelError> {
        let thresholds = if self.thresholds.is_empty() {
            vec![default_threshold]
        } else {
            self.thresholds.clone()
        };

        let scored_truth = partition.scored_subset(truth);
        if scored_truth.is_empty() {
            tracing::warn!("no ground-truth positives among scored documents; recall is undefined");
        }

        let mut rows = Vec::with_capacity(self.steps as usize * thresholds.len());
        for step in 0..self.steps {
            for &threshold in &thresholds {
                let predicted = partition.scored_subset(&ensemble.classified(Some(threshold)));
                let stats = statistics(&predicted, &scored_truth, self.beta);
                rows.push(ResultRow {
                    ensemble: ensemble.kind().to_string(),
                    precision: stats.precision,
                    recall: stats.recall,
                    f_beta: stats.f_beta,
                    al_step: step,
                    threshold,
                });
            }
            tracing::info!(ensemble = %ensemble.kind(), step, "scored active-learning step");

            if step + 1 == self.steps {
                break;
            }
            let Some(query) = min_absolute_logit(ensemble, &partition.learnable) else {
                tracing::info!(step, "learnable pool exhausted");
                continue;
            };
            partition.learnable.remove(&query);
            let label = truth.contains(&query);
            tracing::debug!(point = %query, label, "revealed label");
            ensemble.update(&query, label, &self.update.at_step(step))?;
        }
        Ok(rows)
    }
}

// =============================================================================
// TESTS
// =============================================================================
