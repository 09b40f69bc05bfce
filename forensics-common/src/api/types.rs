//! Request/response types for the fuse endpoint
//!
//! Field names are camelCase on the wire. Optional request fields are
//! defaulted here so the fusion core only ever sees well-typed values.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

// ========================================
// Request Types
// ========================================

/// Body of `POST /internal/forensics/v1/fuse`
///
/// # Examples
///
/// ```
/// use forensics_common::api::types::FuseRequest;
///
/// let request: FuseRequest = serde_json::from_str(r#"{
///     "domain": "infrastructure",
///     "signals": [
///         { "sourceId": "host-1", "domain": "infrastructure",
///           "signalType": "beacon", "value": 4.0 }
///     ],
///     "alpha": 0.5
/// }"#).unwrap();
///
/// assert_eq!(request.signals.len(), 1);
/// assert!(request.feedback_map.is_empty());
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuseRequest {
    /// Request-level domain (accepted, not used by the fusion core)
    pub domain: String,

    /// Raw observations, in arrival order
    pub signals: Vec<SignalInput>,

    /// Smoothing parameter (accepted, not used by the fusion core)
    pub alpha: f64,

    /// Ground-truth overrides keyed by `"<sourceId>:<signalType>"`
    #[serde(default, deserialize_with = "null_as_default")]
    pub feedback_map: HashMap<String, bool>,
}

/// One raw observation about a source
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalInput {
    pub source_id: String,

    #[serde(default)]
    pub region: Option<String>,

    pub domain: String,

    pub signal_type: String,

    pub value: f64,

    /// Reporter confidence; absent means 1.0 (accepted, not used by the fusion core)
    #[serde(default)]
    pub confidence: Option<f64>,

    /// Observation time, Unix millis; absent means 0 (accepted, not used)
    #[serde(default)]
    pub observed_at: Option<i64>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub evidence_ids: Vec<String>,
}

// ========================================
// Response Types
// ========================================

/// Body returned by the fuse endpoint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuseResponse {
    pub fused_signals: Vec<FusedSignal>,
}

impl FuseResponse {
    pub fn empty() -> Self {
        Self {
            fused_signals: Vec::new(),
        }
    }
}

/// Calibrated result for one source
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FusedSignal {
    pub source_id: String,
    pub region: String,
    pub domain: String,

    /// Posterior probability of the latent property (0.0-1.0)
    pub probability: f64,

    /// `probability * 100`
    pub score: f64,

    pub confidence_lower: f64,
    pub confidence_upper: f64,

    /// At most three, highest contribution first
    pub contributors: Vec<Contributor>,

    pub evidence_ids: Vec<String>,
}

/// Explanation entry: how much one signal type drove a score
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    pub signal_type: String,
    pub contribution: f64,
    pub learned_weight: f64,
}

// ========================================
// Error Response Types
// ========================================

/// Error body shared by every endpoint
///
/// ```json
/// { "error": { "code": "BAD_REQUEST", "message": "..." } }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

/// Treat an explicit JSON `null` the same as an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
