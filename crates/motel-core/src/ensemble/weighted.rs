//! Weighted-vote ensemble.
//!
//! Each motif carries a fixed coverage weight `w_c = |selected| / motifs`
//! and a false-positive-rate estimate that moves by multiplicative updates.
//! A point's score combines the votes of motifs that select it against the
//! votes of those that do not:
//!
//! ```text
//! w      = w_c - 2 * fpr
//! s+     = inclusion       · w
//! s-     = (1 - inclusion) · w
//! denom  = max(max(s+), max(s-))
//! p      = exp(s+/denom) / (exp(s+/denom) + exp(s-/denom))
//! ```

use super::InclusionMatrix;

/// Multiplicative-weights vote over motif false-positive rates.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedVote {
    matrix: InclusionMatrix,
    coverage: Vec<f64>,
    fpr: Vec<f64>,
}

impl WeightedVote {
    /// Create a weighted vote.
    ///
    /// With `flat_fpr = None` each motif's FPR starts at `(w_c - 1) / 2`;
    /// otherwise every motif starts at the given flat rate.
    #[must_use]
    pub fn new(matrix: InclusionMatrix, flat_fpr: Option<f64>) -> Self {
        let motifs = matrix.motif_count() as f64;
        let coverage: Vec<f64> = matrix
            .selection_sizes()
            .iter()
            .map(|&size| size as f64 / motifs)
            .collect();
        let fpr = match flat_fpr {
            Some(rate) => vec![rate; coverage.len()],
            None => coverage.iter().map(|w| (w - 1.0) / 2.0).collect(),
        };
        Self {
            matrix,
            coverage,
            fpr,
        }
    }

    /// The inclusion matrix.
    #[must_use]
    pub fn matrix(&self) -> &InclusionMatrix {
        &self.matrix
    }

    /// Fixed coverage weight per motif, in column order.
    #[must_use]
    pub fn coverage(&self) -> &[f64] {
        &self.coverage
    }

    /// Current false-positive-rate estimate per motif, in column order.
    #[must_use]
    pub fn fpr(&self) -> &[f64] {
        &self.fpr
    }

    /// Positive probability per point, in row order.
    #[must_use]
    pub fn probabilities(&self) -> Vec<f64> {
        let weights: Vec<f64> = self
            .coverage
            .iter()
            .zip(&self.fpr)
            .map(|(w_c, fpr)| w_c - 2.0 * fpr)
            .collect();

        let (plus, minus): (Vec<f64>, Vec<f64>) = (0..self.matrix.point_count())
            .map(|row| {
                self.matrix.row(row).iter().zip(&weights).fold(
                    (0.0, 0.0),
                    |(plus, minus), (&included, &weight)| {
                        if included {
                            (plus + weight, minus)
                        } else {
                            (plus, minus + weight)
                        }
                    },
                )
            })
            .unzip();

        let denom = plus
            .iter()
            .chain(&minus)
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        // Degenerate scores leave the exponents unnormalized.
        let denom = if denom.is_finite() && denom != 0.0 {
            denom
        } else {
            1.0
        };

        plus.iter()
            .zip(&minus)
            .map(|(s_plus, s_minus)| {
                let plus = (s_plus / denom).exp();
                let minus = (s_minus / denom).exp();
                plus / (plus + minus)
            })
            .collect()
    }

    /// Multiplicative FPR update for one observation.
    ///
    /// `discount` is `decay^step`; a positive label flips and scales the
    /// inclusion row before exponentiating.
    pub(super) fn observe(
        &mut self,
        row: usize,
        label: bool,
        learning_rate: f64,
        discount: f64,
        scale: f64,
    ) {
        let included = self.matrix.row(row).to_vec();
        for (fpr, included) in self.fpr.iter_mut().zip(included) {
            let mut signal = if included { 1.0 } else { 0.0 };
            if label {
                signal *= -scale;
            }
            *fpr *= (-learning_rate * signal * discount).exp();
        }
    }
}
