//! Fusion Module - weak-supervision label fusion
//!
//! Pipeline, each stage consuming the previous stage's output:
//! Aggregator → Labeler → Propensity / Dependency → Label Model (EM) → Composer
//!
//! Every call is a complete, stateless re-estimation over the signals in one
//! request. Nothing is cached between calls.

pub mod aggregator;
pub mod composer;
pub mod dependency;
pub mod label_model;
pub mod labeler;
pub mod math;
pub mod matrix;
pub mod propensity;

use forensics_common::api::{FuseRequest, FuseResponse};
use tracing::{debug, info};

pub use aggregator::{SignalMatrix, SourceProfile};
pub use label_model::{FeedbackOverrides, LabelModel, LabelModelFit, EM_ITERATIONS};
pub use labeler::{Label, LabelMatrix, LABEL_PERCENTILE};

/// Tunables for one fusion run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionParams {
    /// Fixed number of EM rounds
    pub em_iterations: usize,
    /// Percentile of positive values that separates +1 from -1 votes
    pub label_percentile: f64,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            em_iterations: EM_ITERATIONS,
            label_percentile: LABEL_PERCENTILE,
        }
    }
}

impl FusionParams {
    pub fn with_iterations(em_iterations: usize) -> Self {
        Self {
            em_iterations,
            ..Self::default()
        }
    }
}

/// Fuse all signals of one request into calibrated per-source results
///
/// `confidence`, `observedAt`, `alpha` and the request-level `domain` are
/// accepted on the wire but do not influence the result.
pub fn fuse_signals(request: &FuseRequest, params: &FusionParams) -> FuseResponse {
    let Some(matrix) = aggregator::aggregate(&request.signals) else {
        debug!("Empty signal list, returning empty result");
        return FuseResponse::empty();
    };

    let thresholds = labeler::thresholds(&matrix, params.label_percentile);
    let labels = labeler::label(&matrix, &thresholds);

    let propensity = propensity::estimate(&labels);
    let dependency = dependency::estimate(&labels);
    debug!(propensity = ?propensity, "Estimated propensities");

    let overrides = FeedbackOverrides::resolve(&matrix, &labels, &request.feedback_map);

    let fit = LabelModel::new(&labels, &propensity, &dependency)
        .with_iterations(params.em_iterations)
        .fit(&overrides);

    let fused_signals = composer::compose(&matrix, &labels, &fit);

    info!(
        sources = matrix.n_sources(),
        signal_types = matrix.n_types(),
        class_prior = fit.class_prior,
        "Fused signals"
    );

    FuseResponse { fused_signals }
}
