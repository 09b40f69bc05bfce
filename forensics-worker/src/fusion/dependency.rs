//! Dependency Estimator
//!
//! Scores how redundant each signal type is with the others. For every
//! other type, the two label vectors are compared over the sources where
//! both vote; positive Pearson correlation counts as redundancy, weighted
//! by the size of that overlap.

use tracing::debug;

use super::labeler::LabelMatrix;
use super::math;

/// Fewest co-voting sources needed to estimate a pairwise correlation
pub const MIN_OVERLAP: usize = 6;

/// Restricted label vectors at or below this variance are skipped
pub const MIN_VARIANCE: f64 = 1e-9;

/// Upper bound on any type's penalty
pub const MAX_PENALTY: f64 = 0.95;

/// Overlap-weighted mean positive correlation per type, in `[0, MAX_PENALTY]`
///
/// A type with no qualifying partner gets 0.
pub fn estimate(labels: &LabelMatrix) -> Vec<f64> {
    let n_types = labels.cols();

    // A type voting on fewer than MIN_OVERLAP sources cannot reach the
    // overlap gate with any partner
    let eligible: Vec<bool> = (0..n_types)
        .map(|j| labels.column(j).filter(|l| l.is_active()).count() >= MIN_OVERLAP)
        .collect();

    let penalties: Vec<f64> = (0..n_types)
        .map(|j| {
            if !eligible[j] {
                return 0.0;
            }

            let mut weighted_redundancy = 0.0;
            let mut total_overlap = 0usize;

            for k in (0..n_types).filter(|&k| k != j && eligible[k]) {
                let Some((redundancy, overlap)) = pair_redundancy(labels, j, k) else {
                    continue;
                };
                weighted_redundancy += redundancy * overlap as f64;
                total_overlap += overlap;
            }

            if total_overlap == 0 {
                0.0
            } else {
                math::clamp(weighted_redundancy / total_overlap as f64, 0.0, MAX_PENALTY)
            }
        })
        .collect();

    debug!(penalties = ?penalties, "Estimated dependency penalties");

    penalties
}

/// Clipped correlation of types `j` and `k` over their co-voting sources,
/// with the overlap size; `None` if the pair does not qualify
fn pair_redundancy(labels: &LabelMatrix, j: usize, k: usize) -> Option<(f64, usize)> {
    let (lj, lk): (Vec<f64>, Vec<f64>) = (0..labels.rows())
        .map(|i| (labels.get(i, j), labels.get(i, k)))
        .filter(|(a, b)| a.is_active() && b.is_active())
        .map(|(a, b)| (a.as_f64(), b.as_f64()))
        .unzip();

    let overlap = lj.len();
    if overlap < MIN_OVERLAP {
        return None;
    }

    let corr = math::pearson(&lj, &lk, MIN_VARIANCE)?;
    Some((math::clamp(corr, 0.0, 1.0), overlap))
}
