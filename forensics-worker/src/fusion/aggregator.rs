//! Signal Aggregator
//!
//! Groups raw observations by source and signal type into a dense value
//! matrix. Sources and types get positional indices in first-seen order;
//! repeated (source, type) observations are summed.

use std::collections::{BTreeMap, BTreeSet};

use forensics_common::api::SignalInput;
use tracing::debug;

use super::matrix::DenseMatrix;

/// Domain used when an observation carries none
pub const DEFAULT_DOMAIN: &str = "infrastructure";

/// Region used when an observation carries none
pub const DEFAULT_REGION: &str = "global";

/// Per-source descriptive fields carried through to the output
#[derive(Debug, Clone, PartialEq)]
pub struct SourceProfile {
    /// Domain of the last observation seen for the source
    pub domain: String,
    /// Region of the last observation seen for the source
    pub region: String,
    /// Union of evidence ids across all of the source's observations
    pub evidence_ids: BTreeSet<String>,
}

/// Dense `n_sources x n_types` view of one request
#[derive(Debug, Clone)]
pub struct SignalMatrix {
    pub source_ids: Vec<String>,
    pub signal_types: Vec<String>,
    source_index: BTreeMap<String, usize>,
    type_index: BTreeMap<String, usize>,
    /// Summed signal value per (source, type)
    pub values: DenseMatrix<f64>,
    /// Indexed like `source_ids`
    pub profiles: Vec<SourceProfile>,
}

impl SignalMatrix {
    pub fn n_sources(&self) -> usize {
        self.source_ids.len()
    }

    pub fn n_types(&self) -> usize {
        self.signal_types.len()
    }

    pub fn source_index(&self, source_id: &str) -> Option<usize> {
        self.source_index.get(source_id).copied()
    }

    pub fn type_index(&self, signal_type: &str) -> Option<usize> {
        self.type_index.get(signal_type).copied()
    }
}

/// Distinct `(sources, signal types)` in an observation list
///
/// Cheap enough to run at the request boundary, before `aggregate`
/// allocates the `sources x types` matrix.
pub fn distinct_counts(signals: &[SignalInput]) -> (usize, usize) {
    let sources: BTreeSet<&str> = signals.iter().map(|s| s.source_id.as_str()).collect();
    let types: BTreeSet<&str> = signals.iter().map(|s| s.signal_type.as_str()).collect();
    (sources.len(), types.len())
}

/// Build the value matrix from raw observations
///
/// Returns `None` for an empty observation list; callers short-circuit to
/// an empty result.
pub fn aggregate(signals: &[SignalInput]) -> Option<SignalMatrix> {
    if signals.is_empty() {
        return None;
    }

    let mut source_ids = Vec::new();
    let mut signal_types = Vec::new();
    let mut source_index = BTreeMap::new();
    let mut type_index = BTreeMap::new();

    for signal in signals {
        if !source_index.contains_key(&signal.source_id) {
            source_index.insert(signal.source_id.clone(), source_ids.len());
            source_ids.push(signal.source_id.clone());
        }
        if !type_index.contains_key(&signal.signal_type) {
            type_index.insert(signal.signal_type.clone(), signal_types.len());
            signal_types.push(signal.signal_type.clone());
        }
    }

    let mut values = DenseMatrix::new(source_ids.len(), signal_types.len());
    let mut profiles = vec![
        SourceProfile {
            domain: DEFAULT_DOMAIN.to_string(),
            region: DEFAULT_REGION.to_string(),
            evidence_ids: BTreeSet::new(),
        };
        source_ids.len()
    ];

    for signal in signals {
        let i = source_index[&signal.source_id];
        let j = type_index[&signal.signal_type];

        *values.get_mut(i, j) += signal.value;

        let profile = &mut profiles[i];
        profile.domain = non_empty_or(Some(signal.domain.as_str()), DEFAULT_DOMAIN);
        profile.region = non_empty_or(signal.region.as_deref(), DEFAULT_REGION);
        profile
            .evidence_ids
            .extend(signal.evidence_ids.iter().cloned());
    }

    debug!(
        observations = signals.len(),
        sources = source_ids.len(),
        signal_types = signal_types.len(),
        "Aggregated signals into value matrix"
    );

    Some(SignalMatrix {
        source_ids,
        signal_types,
        source_index,
        type_index,
        values,
        profiles,
    })
}

fn non_empty_or(value: Option<&str>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}
