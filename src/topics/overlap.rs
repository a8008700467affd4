// Jaccard similarity between topic term sets.
//
// Calibration compares the topics of a k-topic fit with those of the
// (k+1)-topic fit. Every topic of one run is compared with every topic of
// the other and the scores are averaged:
//
//   |A ∩ B| / |A ∪ B|
//
// High average overlap means the extra topic mostly duplicated existing
// ones.

use std::collections::HashSet;
use std::hash::Hash;

/// Jaccard similarity of two sets. Two empty sets score 0.0.
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Mean Jaccard similarity over every (topic of `run_a`, topic of `run_b`)
/// pair. Each topic is given as its list of top terms.
pub fn mean_pairwise_jaccard<T: Eq + Hash + Clone>(run_a: &[Vec<T>], run_b: &[Vec<T>]) -> f64 {
    let sets_a: Vec<HashSet<T>> = run_a.iter().map(|t| t.iter().cloned().collect()).collect();
    let sets_b: Vec<HashSet<T>> = run_b.iter().map(|t| t.iter().cloned().collect()).collect();

    let mut total = 0.0;
    let mut pairs = 0usize;
    for a in &sets_a {
        for b in &sets_b {
            total += jaccard(a, b);
            pairs += 1;
        }
    }
    if pairs == 0 {
        0.0
    } else {
        total / pairs as f64
    }
}
