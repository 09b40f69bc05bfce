//! Fuse endpoint
//!
//! POST /internal/forensics/v1/fuse

use axum::{extract::State, routing::post, Json, Router};
use forensics_common::api::{FuseRequest, FuseResponse};
use forensics_common::Error;
use tracing::debug;

use crate::fusion::{self, aggregator};
use crate::{error::ApiResult, ApiError, AppState};

pub const FUSE_PATH: &str = "/internal/forensics/v1/fuse";

/// POST /internal/forensics/v1/fuse
///
/// Malformed bodies are rejected by the `Json` extractor before this runs.
/// The fusion itself is CPU-bound, so it runs on the blocking pool.
pub async fn fuse(
    State(state): State<AppState>,
    Json(request): Json<FuseRequest>,
) -> ApiResult<Json<FuseResponse>> {
    check_limits(&request, &state)?;

    debug!(
        domain = %request.domain,
        signals = request.signals.len(),
        feedback_entries = request.feedback_map.len(),
        "Fuse request received"
    );

    let params = state.params;
    let response = tokio::task::spawn_blocking(move || fusion::fuse_signals(&request, &params))
        .await
        .map_err(|e| ApiError::Internal(format!("fusion task failed: {}", e)))?;

    Ok(Json(response))
}

/// Reject requests whose size would make fusion unreasonably expensive
///
/// Matrix memory and the pairwise dependency pass both scale with
/// distinct sources times distinct types, so that product is bounded
/// alongside the raw signal count.
fn check_limits(request: &FuseRequest, state: &AppState) -> Result<(), Error> {
    if request.signals.len() > state.max_signals {
        return Err(Error::InvalidInput(format!(
            "too many signals: {} (limit {})",
            request.signals.len(),
            state.max_signals
        )));
    }

    let (sources, signal_types) = aggregator::distinct_counts(&request.signals);
    let cells = sources.saturating_mul(signal_types);
    if cells > state.max_cells {
        return Err(Error::InvalidInput(format!(
            "too many source/type combinations: {} sources x {} signal types (limit {} cells)",
            sources, signal_types, state.max_cells
        )));
    }

    Ok(())
}

/// Build fuse routes
pub fn fuse_routes() -> Router<AppState> {
    Router::new().route(FUSE_PATH, post(fuse))
}
