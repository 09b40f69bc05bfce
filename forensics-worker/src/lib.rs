//! forensics-worker library interface
//!
//! Exposes the fusion core and the HTTP router for the binary and for
//! integration tests.

pub mod api;
pub mod error;
pub mod fusion;
pub mod logging;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use forensics_common::config::TomlConfig;
use tower_http::trace::TraceLayer;

use crate::fusion::FusionParams;

/// Application state shared across handlers
///
/// Holds only immutable settings: concurrent requests share no mutable state.
#[derive(Clone)]
pub struct AppState {
    /// Parameters applied to every fusion run
    pub params: FusionParams,
    /// Largest accepted `signals` list
    pub max_signals: usize,
    /// Largest accepted distinct sources x distinct signal types
    pub max_cells: usize,
    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: &TomlConfig) -> Self {
        Self {
            params: FusionParams::with_iterations(config.em_iterations),
            max_signals: config.max_signals,
            max_cells: config.max_cells,
            max_body_bytes: config.max_body_bytes,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;

    Router::new()
        .merge(api::fuse_routes())
        .merge(api::health_routes())
        .fallback(api::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
