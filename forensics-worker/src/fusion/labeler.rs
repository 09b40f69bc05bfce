//! Labeler
//!
//! Turns each value cell into a ternary polarity vote using a per-type
//! percentile threshold over that type's positive values.

use tracing::debug;

use super::aggregator::SignalMatrix;
use super::math;
use super::matrix::DenseMatrix;

/// Percentile of a type's positive values that marks a confident vote
pub const LABEL_PERCENTILE: f64 = 70.0;

/// Polarity vote of one signal type on one source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Label {
    /// Fired, but below the type's own high-confidence bar
    Negative,
    /// Silent: non-positive or non-finite value
    #[default]
    Abstain,
    /// Fired at or above the threshold
    Positive,
}

impl Label {
    /// Numeric polarity in {-1, 0, 1}
    pub fn as_f64(self) -> f64 {
        match self {
            Label::Negative => -1.0,
            Label::Abstain => 0.0,
            Label::Positive => 1.0,
        }
    }

    /// True for any non-abstaining vote
    pub fn is_active(self) -> bool {
        self != Label::Abstain
    }
}

pub type LabelMatrix = DenseMatrix<Label>;

/// Per-type thresholds: the `percentile` of strictly positive finite values
///
/// A column with no positive values gets `f64::INFINITY`, so nothing in it
/// can ever be labeled positive.
///
/// Sums that overflowed to `+inf` are left out of the percentile. Left in,
/// they would drag the threshold to `+inf` (or NaN when interpolating
/// between two of them) and turn every finite positive in the column into a
/// -1 vote. Thresholds stay finite whenever a finite positive exists.
pub fn thresholds(matrix: &SignalMatrix, percentile: f64) -> Vec<f64> {
    (0..matrix.n_types())
        .map(|j| {
            let positives: Vec<f64> = matrix
                .values
                .column(j)
                .filter(|v| v.is_finite() && *v > 0.0)
                .collect();
            math::percentile(&positives, percentile).unwrap_or(f64::INFINITY)
        })
        .collect()
}

/// Label every cell against its column threshold
pub fn label(matrix: &SignalMatrix, thresholds: &[f64]) -> LabelMatrix {
    let mut labels = LabelMatrix::new(matrix.n_sources(), matrix.n_types());

    for i in 0..matrix.n_sources() {
        for (j, threshold) in thresholds.iter().enumerate() {
            labels.set(i, j, classify(matrix.values.get(i, j), *threshold));
        }
    }

    debug!(
        thresholds = ?thresholds,
        active_cells = labels.iter().filter(|l| l.is_active()).count(),
        "Labeled value matrix"
    );

    labels
}

fn classify(value: f64, threshold: f64) -> Label {
    if !value.is_finite() || value <= 0.0 {
        Label::Abstain
    } else if value >= threshold {
        Label::Positive
    } else {
        Label::Negative
    }
}
