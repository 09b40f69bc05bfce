//! HTTP API handlers for forensics-worker

pub mod fuse;
pub mod health;

pub use fuse::fuse_routes;
pub use health::health_routes;

use axum::http::Uri;

use crate::ApiError;

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
