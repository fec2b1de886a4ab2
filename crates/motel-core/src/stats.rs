//! # Statistics
//!
//! Precision, recall and F-beta of a predicted point set, the
//! precision-recall curve of an ensemble's ranking, and the uncertainty
//! query used by active learning.

use crate::Point;
use crate::ensemble::Ensemble;
use serde::Serialize;
use std::collections::BTreeSet;

/// Precision, recall and F-beta of one prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    pub precision: f64,
    pub recall: f64,
    pub f_beta: f64,
}

/// Score `predicted` against `truth`.
///
/// Precision is 0 for an empty prediction and F-beta is 0 when both
/// precision and recall are 0. `truth` must be non-empty; an empty truth
/// set yields a NaN recall.
#[must_use]
pub fn statistics(predicted: &BTreeSet<Point>, truth: &BTreeSet<Point>, beta: f64) -> Statistics {
    let true_positives = predicted.intersection(truth).count() as f64;

    let precision = if predicted.is_empty() {
        0.0
    } else {
        true_positives / predicted.len() as f64
    };
    let recall = true_positives / truth.len() as f64;

    let f_beta = if precision == 0.0 && recall == 0.0 {
        0.0
    } else {
        let beta2 = beta * beta;
        (1.0 + beta2) * precision * recall / (beta2 * precision + recall)
    };

    Statistics {
        precision,
        recall,
        f_beta,
    }
}

/// One step of a precision-recall curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurvePoint {
    /// Probability the point was ranked by.
    pub ranking: f64,
    pub point: Point,
    pub precision: f64,
    pub recall: f64,
    /// Whether the point is a ground-truth positive.
    #[serde(rename = "gt")]
    pub ground_truth: bool,
}

/// Precision and recall after adding each domain point in descending
/// probability order.
///
/// Ties keep domain order. With an empty `truth` every step reports zero
/// precision and recall.
#[must_use]
pub fn precision_recall_curve(ensemble: &Ensemble, truth: &BTreeSet<Point>) -> Vec<CurvePoint> {
    let mut ranked = ensemble.probabilities_per_point();
    ranked.sort_by(|(_, left), (_, right)| right.total_cmp(left));

    let mut selected = BTreeSet::new();
    let mut curve = Vec::with_capacity(ranked.len());
    for (point, ranking) in ranked {
        selected.insert(point.clone());
        let (precision, recall) = if truth.is_empty() {
            (0.0, 0.0)
        } else {
            let stats = statistics(&selected, truth, 1.0);
            (stats.precision, stats.recall)
        };
        curve.push(CurvePoint {
            ranking,
            point: point.clone(),
            precision,
            recall,
            ground_truth: truth.contains(point),
        });
    }
    curve
}

/// The pool point whose probability is closest to 0.5.
///
/// Scans in domain order; on ties the last candidate wins. `None` when no
/// domain point is in the pool.
#[must_use]
pub fn min_absolute_logit(ensemble: &Ensemble, pool: &BTreeSet<Point>) -> Option<Point> {
    let mut best: Option<(&Point, f64)> = None;
    for (point, p_true) in ensemble.probabilities_per_point() {
        if !pool.contains(point) {
            continue;
        }
        let logit = (p_true - (1.0 - p_true)).abs();
        if best.is_none_or(|(_, lowest)| logit <= lowest) {
            best = Some((point, logit));
        }
    }
    best.map(|(point, _)| point.clone())
}

// =============================================================================
// TESTS
// =============================================================================
