//! Result Composer
//!
//! Converts fitted soft labels into scores, Wald confidence intervals and
//! the top contributing signal types per source.

use std::cmp::Ordering;

use forensics_common::api::{Contributor, FusedSignal};

use super::aggregator::SignalMatrix;
use super::label_model::LabelModelFit;
use super::labeler::LabelMatrix;
use super::math;

/// z-score of a two-sided 95% interval
const Z_95: f64 = 1.96;

/// Contributors reported per source
pub const MAX_CONTRIBUTORS: usize = 3;

/// Build one `FusedSignal` per source, in source index order
pub fn compose(matrix: &SignalMatrix, labels: &LabelMatrix, fit: &LabelModelFit) -> Vec<FusedSignal> {
    matrix
        .source_ids
        .iter()
        .enumerate()
        .map(|(i, source_id)| {
            let p = fit.soft_labels[i];
            let profile = &matrix.profiles[i];
            let active_count = labels.row(i).iter().filter(|l| l.is_active()).count();
            let (confidence_lower, confidence_upper) = wald_interval(p, active_count);

            FusedSignal {
                source_id: source_id.clone(),
                region: profile.region.clone(),
                domain: profile.domain.clone(),
                probability: p,
                score: p * 100.0,
                confidence_lower,
                confidence_upper,
                contributors: contributors(matrix, labels, &fit.accuracies, i),
                evidence_ids: profile.evidence_ids.iter().cloned().collect(),
            }
        })
        .collect()
}

/// Normal-approximation interval around `p` with `n` floored at 1
pub fn wald_interval(p: f64, n: usize) -> (f64, f64) {
    let margin = Z_95 * (p * (1.0 - p) / n.max(1) as f64).sqrt();
    (
        math::clamp(p - margin, 0.0, 1.0),
        math::clamp(p + margin, 0.0, 1.0),
    )
}

fn contributors(
    matrix: &SignalMatrix,
    labels: &LabelMatrix,
    accuracies: &[f64],
    source: usize,
) -> Vec<Contributor> {
    let mut contributors: Vec<Contributor> = labels
        .row(source)
        .iter()
        .enumerate()
        .filter(|(_, label)| label.is_active())
        .map(|(j, label)| Contributor {
            signal_type: matrix.signal_types[j].clone(),
            contribution: label.as_f64().abs() * accuracies[j] * 100.0,
            learned_weight: accuracies[j],
        })
        .collect();

    // Stable sort: ties keep type index order
    contributors.sort_by(|a, b| {
        b.contribution
            .partial_cmp(&a.contribution)
            .unwrap_or(Ordering::Equal)
    });
    contributors.truncate(MAX_CONTRIBUTORS);
    contributors
}
