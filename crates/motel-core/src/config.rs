//! # Configuration
//!
//! Explicit configuration value handed to every component constructor.
//!
//! | key | default |
//! |-----|---------|
//! | `classification_threshold` | 0.01 |
//! | `accuracy_threshold` | 0.7 |
//! | `learning_rate` | 10 |
//! | `accuracy_smoothing` | 1 |
//! | `approximate_fpr` | true |
//! | `flat_fpr` | 0.1 |
//! | `edge_weight_default` | 1 |
//! | `edge_weights` | empty |
//! | `neighborhood_distance` | 2 |

use crate::MotelError;
use crate::primitives::LABEL_NAMESPACE_SEPARATOR;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default minimum probability for a point to be classified positive.
pub const DEFAULT_CLASSIFICATION_THRESHOLD: f64 = 0.01;

/// Default minimum accuracy for a motif to count as relevant.
pub const DEFAULT_ACCURACY_THRESHOLD: f64 = 0.7;

/// Default multiplicative-weights learning rate.
pub const DEFAULT_LEARNING_RATE: f64 = 10.0;

/// Default Laplace smoothing constant for motif accuracies.
pub const DEFAULT_ACCURACY_SMOOTHING: f64 = 1.0;

/// Default flat false-positive rate when FPR approximation is disabled.
pub const DEFAULT_FLAT_FPR: f64 = 0.1;

/// Default weight for edges whose label has no configured weight.
pub const DEFAULT_EDGE_WEIGHT: f64 = 1.0;

/// Default accumulated-weight bound for neighborhood extraction.
pub const DEFAULT_NEIGHBORHOOD_DISTANCE: f64 = 2.0;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotelConfig {
    /// Minimum probability for `Ensemble::classified`.
    pub classification_threshold: f64,
    /// Minimum accuracy for a motif to be relevant in a disjunction.
    pub accuracy_threshold: f64,
    /// Learning rate used by weighted-vote updates when none is supplied.
    pub learning_rate: f64,
    /// Laplace smoothing constant `k` for disjunction accuracies.
    pub accuracy_smoothing: f64,
    /// Initialize weighted-vote FPR from motif coverage instead of a flat value.
    pub approximate_fpr: bool,
    /// Flat FPR used when `approximate_fpr` is false.
    pub flat_fpr: f64,
    /// Weight for labels absent from `edge_weights`.
    pub edge_weight_default: f64,
    /// Edge weights keyed by exact label or by label namespace.
    pub edge_weights: BTreeMap<String, f64>,
    /// Distance bound used when extracting neighborhoods.
    pub neighborhood_distance: f64,
}

impl Default for MotelConfig {
    fn default() -> Self {
        Self {
            classification_threshold: DEFAULT_CLASSIFICATION_THRESHOLD,
            accuracy_threshold: DEFAULT_ACCURACY_THRESHOLD,
            learning_rate: DEFAULT_LEARNING_RATE,
            accuracy_smoothing: DEFAULT_ACCURACY_SMOOTHING,
            approximate_fpr: true,
            flat_fpr: DEFAULT_FLAT_FPR,
            edge_weight_default: DEFAULT_EDGE_WEIGHT,
            edge_weights: BTreeMap::new(),
            neighborhood_distance: DEFAULT_NEIGHBORHOOD_DISTANCE,
        }
    }
}

impl MotelConfig {
    /// Check every startup invariant.
    ///
    /// Edge weights must be finite and strictly positive so that bounded
    /// traversals terminate.
    pub fn validate(&self) -> Result<(), MotelError> {
        self.edge_weights()?;

        for (name, value) in [
            ("classification_threshold", self.classification_threshold),
            ("accuracy_threshold", self.accuracy_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MotelError::InvalidConfiguration(format!(
                    "{} must lie in [0, 1], got {}",
                    name, value
                )));
            }
        }

        if !self.learning_rate.is_finite() || self.learning_rate < 0.0 {
            return Err(MotelError::InvalidConfiguration(format!(
                "learning_rate must be finite and non-negative, got {}",
                self.learning_rate
            )));
        }

        if !self.accuracy_smoothing.is_finite() || self.accuracy_smoothing < 0.0 {
            return Err(MotelError::InvalidConfiguration(format!(
                "accuracy_smoothing must be finite and non-negative, got {}",
                self.accuracy_smoothing
            )));
        }

        if !self.neighborhood_distance.is_finite() || self.neighborhood_distance < 0.0 {
            return Err(MotelError::InvalidConfiguration(format!(
                "neighborhood_distance must be finite and non-negative, got {}",
                self.neighborhood_distance
            )));
        }

        Ok(())
    }

    /// Build the validated edge-weight table.
    pub fn edge_weights(&self) -> Result<EdgeWeights, MotelError> {
        EdgeWeights::new(self.edge_weights.clone(), self.edge_weight_default)
    }
}

// =============================================================================
// EDGE WEIGHTS
// =============================================================================

/// Validated label → traversal weight table.
///
/// Weights are never persisted; they only bound neighborhood traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeWeights {
    weights: BTreeMap<String, f64>,
    default: f64,
}

impl EdgeWeights {
    /// Create a weight table, rejecting any non-positive or non-finite weight.
    pub fn new(weights: BTreeMap<String, f64>, default: f64) -> Result<Self, MotelError> {
        check_weight("edge_weight_default", default)?;
        for (label, &weight) in &weights {
            check_weight(label, weight)?;
        }
        Ok(Self { weights, default })
    }

    /// Resolve the weight of a label: exact label, then the namespace before
    /// the first `:`, then the default.
    #[must_use]
    pub fn weight(&self, label: &str) -> f64 {
        if let Some(&weight) = self.weights.get(label) {
            return weight;
        }
        label
            .split_once(LABEL_NAMESPACE_SEPARATOR)
            .and_then(|(namespace, _)| self.weights.get(namespace).copied())
            .unwrap_or(self.default)
    }
}

impl Default for EdgeWeights {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
            default: DEFAULT_EDGE_WEIGHT,
        }
    }
}

fn check_weight(label: &str, weight: f64) -> Result<(), MotelError> {
    if weight.is_finite() && weight > 0.0 {
        Ok(())
    } else {
        Err(MotelError::InvalidConfiguration(format!(
            "edge weight for '{}' must be positive, got {}",
            label, weight
        )))
    }
}

// =============================================================================
// TESTS
// =============================================================================
