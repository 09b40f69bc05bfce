//! Label Model (EM Estimator)
//!
//! Treats each signal type as a noisy labeling function and jointly
//! estimates a class prior, per-type accuracies and per-source soft labels
//! by Expectation-Maximization.
//!
//! # Fixed iteration count
//! The loop always runs `iterations` E/M rounds with no convergence check,
//! so identical input always produces identical output at identical cost.
//!
//! # Vote weight
//! A type's vote on a source is its accuracy log-odds scaled by
//! ```text
//! vote_scale = clip((1 - 0.7 * dependency) * (0.4 + 0.6 * propensity), 0.15, 1.0)
//! ```
//! so redundant or rarely-firing types count for less.

use std::collections::HashMap;

use tracing::debug;

use super::aggregator::SignalMatrix;
use super::labeler::{Label, LabelMatrix};
use super::math;

/// Default number of EM rounds
pub const EM_ITERATIONS: usize = 80;

/// Starting accuracy for every type
pub const INITIAL_ACCURACY: f64 = 0.7;

/// Starting marginal probability of the positive class
pub const INITIAL_CLASS_PRIOR: f64 = 0.5;

/// Floor applied to the prior and its complement before taking log-odds
const PRIOR_FLOOR: f64 = 1e-6;

/// Accuracy range used when turning accuracy into log-odds (E-step)
const VOTE_ACCURACY_RANGE: (f64, f64) = (0.501, 0.999);

/// Accuracy range after re-estimation (M-step)
const ACCURACY_RANGE: (f64, f64) = (0.4, 0.95);

/// Class prior range after re-estimation (M-step)
const PRIOR_RANGE: (f64, f64) = (0.01, 0.99);

/// Share of the dependency penalty removed from a vote
const DEPENDENCY_DISCOUNT: f64 = 0.7;

/// Vote scale floor/ceiling
const VOTE_SCALE_RANGE: (f64, f64) = (0.15, 1.0);

/// Ground-truth pins resolved against the label matrix
///
/// Only feedback on a (source, type) cell with a non-abstaining label
/// counts. When several types of one source carry feedback, the first in
/// type index order wins.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackOverrides {
    pinned: Vec<Option<f64>>,
}

impl FeedbackOverrides {
    /// No overrides for `n_sources` sources
    pub fn none(n_sources: usize) -> Self {
        Self {
            pinned: vec![None; n_sources],
        }
    }

    /// Resolve a `"sourceId:signalType" -> bool` map
    pub fn resolve(
        matrix: &SignalMatrix,
        labels: &LabelMatrix,
        feedback: &HashMap<String, bool>,
    ) -> Self {
        if feedback.is_empty() {
            return Self::none(matrix.n_sources());
        }

        let pinned: Vec<Option<f64>> = matrix
            .source_ids
            .iter()
            .enumerate()
            .map(|(i, source_id)| {
                matrix
                    .signal_types
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| labels.get(i, *j).is_active())
                    .find_map(|(_, signal_type)| {
                        feedback
                            .get(&feedback_key(source_id, signal_type))
                            .map(|&truth| if truth { 1.0 } else { 0.0 })
                    })
            })
            .collect();

        debug!(
            feedback_entries = feedback.len(),
            pinned_sources = pinned.iter().filter(|p| p.is_some()).count(),
            "Resolved feedback overrides"
        );

        Self { pinned }
    }

    /// Pinned soft label for source `i`, if any
    pub fn pinned(&self, i: usize) -> Option<f64> {
        self.pinned.get(i).copied().flatten()
    }
}

/// Key format of the feedback map
pub fn feedback_key(source_id: &str, signal_type: &str) -> String {
    format!("{}:{}", source_id, signal_type)
}

/// Fitted model parameters
#[derive(Debug, Clone, PartialEq)]
pub struct LabelModelFit {
    pub class_prior: f64,
    /// Per-type accuracy, in `[0.4, 0.95]`
    pub accuracies: Vec<f64>,
    /// Per-source probability of the latent positive class
    pub soft_labels: Vec<f64>,
}

/// EM estimator over one label matrix
pub struct LabelModel<'a> {
    labels: &'a LabelMatrix,
    /// Per-type multiplier on accuracy log-odds
    vote_scales: Vec<f64>,
    iterations: usize,
}

impl<'a> LabelModel<'a> {
    pub fn new(labels: &'a LabelMatrix, propensity: &[f64], dependency: &[f64]) -> Self {
        let vote_scales = propensity
            .iter()
            .zip(dependency)
            .map(|(&prop, &dep)| vote_scale(prop, dep))
            .collect();

        Self {
            labels,
            vote_scales,
            iterations: EM_ITERATIONS,
        }
    }

    /// Override the number of EM rounds (at least one round always runs)
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Run the fixed-length EM loop
    pub fn fit(&self, overrides: &FeedbackOverrides) -> LabelModelFit {
        let mut class_prior = INITIAL_CLASS_PRIOR;
        let mut accuracies = vec![INITIAL_ACCURACY; self.labels.cols()];
        let mut soft_labels = vec![0.0; self.labels.rows()];

        for _ in 0..self.iterations {
            soft_labels = self.e_step(class_prior, &accuracies, overrides);
            class_prior = self.m_step(&soft_labels, &mut accuracies);
        }

        debug!(
            iterations = self.iterations,
            class_prior,
            accuracies = ?accuracies,
            "EM label model fit complete"
        );

        LabelModelFit {
            class_prior,
            accuracies,
            soft_labels,
        }
    }

    /// Posterior soft label per source given current parameters
    fn e_step(&self, class_prior: f64, accuracies: &[f64], overrides: &FeedbackOverrides) -> Vec<f64> {
        let prior_logit = math::logit(class_prior, PRIOR_FLOOR);

        (0..self.labels.rows())
            .map(|i| {
                if let Some(truth) = overrides.pinned(i) {
                    return truth;
                }

                let logit = self
                    .labels
                    .row(i)
                    .iter()
                    .enumerate()
                    .filter(|(_, label)| label.is_active())
                    .fold(prior_logit, |acc, (j, &label)| {
                        let a = math::clamp(accuracies[j], VOTE_ACCURACY_RANGE.0, VOTE_ACCURACY_RANGE.1);
                        let odds = (a / (1.0 - a)).ln() * self.vote_scales[j];
                        match label {
                            Label::Positive => acc + odds,
                            _ => acc - odds,
                        }
                    });

                math::sigmoid(logit)
            })
            .collect()
    }

    /// Re-estimate accuracies in place and return the new class prior
    fn m_step(&self, soft_labels: &[f64], accuracies: &mut [f64]) -> f64 {
        let class_prior = math::mean(soft_labels)
            .map(|m| math::clamp(m, PRIOR_RANGE.0, PRIOR_RANGE.1))
            .unwrap_or(INITIAL_CLASS_PRIOR);

        for (j, accuracy) in accuracies.iter_mut().enumerate() {
            let matches: Vec<f64> = self
                .labels
                .column(j)
                .zip(soft_labels)
                .filter_map(|(label, &p)| match label {
                    Label::Positive => Some(p),
                    Label::Negative => Some(1.0 - p),
                    Label::Abstain => None,
                })
                .collect();

            // Types with no active sources keep their previous accuracy
            if let Some(m) = math::mean(&matches) {
                *accuracy = math::clamp(m, ACCURACY_RANGE.0, ACCURACY_RANGE.1);
            }
        }

        class_prior
    }
}

fn vote_scale(propensity: f64, dependency: f64) -> f64 {
    let independence = 1.0 - DEPENDENCY_DISCOUNT * dependency;
    math::clamp(
        independence * (0.4 + 0.6 * propensity),
        VOTE_SCALE_RANGE.0,
        VOTE_SCALE_RANGE.1,
    )
}
