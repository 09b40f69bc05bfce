//! Shared HTTP API types
//!
//! Contains ONLY serde types with no HTTP framework dependencies. The worker
//! wraps these with axum extractors and responses.

pub mod types;

pub use types::{
    Contributor, ErrorBody, ErrorResponse, FuseRequest, FuseResponse, FusedSignal, SignalInput,
};
