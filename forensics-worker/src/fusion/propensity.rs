//! Propensity Estimator: how often each signal type votes at all

use super::labeler::LabelMatrix;

/// Fraction of sources with a non-abstaining label, per type
pub fn estimate(labels: &LabelMatrix) -> Vec<f64> {
    let n_sources = labels.rows();
    if n_sources == 0 {
        return vec![0.0; labels.cols()];
    }

    (0..labels.cols())
        .map(|j| labels.column(j).filter(|l| l.is_active()).count() as f64 / n_sources as f64)
        .collect()
}
