//! # Closest-name Matching
//!
//! Resolves loosely spelled names (`"majority vote"`, `"Train"`) against a
//! fixed vocabulary using edit-distance similarity.

use crate::primitives::CLOSE_MATCH_CUTOFF;

/// Levenshtein distance between two strings, over chars.
fn edit_distance(left: &[char], right: &[char]) -> usize {
    if right.is_empty() {
        return left.len();
    }

    let mut prev: Vec<usize> = (0..=right.len()).collect();
    let mut curr: Vec<usize> = vec![0; right.len() + 1];

    for (i, &c) in left.iter().enumerate() {
        curr[0] = i + 1;
        for j in 1..=right.len() {
            let cost = usize::from(c != right[j - 1]);
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[right.len()]
}

/// Similarity in [0, 1]: `1 - distance / longer length`, case-insensitive.
#[must_use]
pub fn similarity(left: &str, right: &str) -> f64 {
    let left: Vec<char> = left.to_lowercase().chars().collect();
    let right: Vec<char> = right.to_lowercase().chars().collect();
    let longest = left.len().max(right.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - edit_distance(&left, &right) as f64 / longest as f64
}

/// The candidate most similar to `name`, if it clears `CLOSE_MATCH_CUTOFF`.
///
/// Ties go to the earlier candidate.
pub fn closest_match<'a>(name: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let mut best: Option<(&'a str, f64)> = None;
    for &candidate in candidates {
        let score = similarity(name, candidate);
        if score < CLOSE_MATCH_CUTOFF {
            continue;
        }
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }
    best.map(|(candidate, _)| candidate)
}
