//! Property and scenario tests for the fusion pipeline
//!
//! Exercises `fuse_signals` end to end: output bounds, determinism,
//! feedback dominance, monotonicity and EM convergence.

use std::collections::HashMap;

use forensics_common::api::{FuseRequest, FuseResponse, SignalInput};
use forensics_worker::fusion::{aggregator, fuse_signals, labeler, FusionParams, Label};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn signal(source: &str, signal_type: &str, value: f64) -> SignalInput {
    SignalInput {
        source_id: source.to_string(),
        region: None,
        domain: "infrastructure".to_string(),
        signal_type: signal_type.to_string(),
        value,
        confidence: None,
        observed_at: None,
        evidence_ids: Vec::new(),
    }
}

fn request(signals: Vec<SignalInput>, feedback: HashMap<String, bool>) -> FuseRequest {
    FuseRequest {
        domain: "infrastructure".to_string(),
        signals,
        alpha: 0.5,
        feedback_map: feedback,
    }
}

fn fuse(signals: Vec<SignalInput>) -> FuseResponse {
    fuse_signals(&request(signals, HashMap::new()), &FusionParams::default())
}

fn probability_of(response: &FuseResponse, source: &str) -> f64 {
    response
        .fused_signals
        .iter()
        .find(|f| f.source_id == source)
        .map(|f| f.probability)
        .unwrap()
}

/// Seeded random workload: `n_sources` sources, `n_types` types, mixed signs
fn random_signals(seed: u64, n_sources: usize, n_types: usize) -> Vec<SignalInput> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut signals = Vec::new();

    for _ in 0..(n_sources * n_types * 2) {
        let source = format!("src-{}", rng.gen_range(0..n_sources));
        let signal_type = format!("type-{}", rng.gen_range(0..n_types));
        let value = rng.gen_range(-5.0..50.0);
        let mut s = signal(&source, &signal_type, value);
        s.evidence_ids = vec![format!("ev-{}", rng.gen_range(0..20))];
        signals.push(s);
    }

    signals
}

#[test]
fn test_empty_input_yields_empty_output() {
    let response = fuse(Vec::new());
    assert!(response.fused_signals.is_empty());
}

#[test]
fn test_output_bounds_hold_on_random_inputs() {
    for seed in 0..20 {
        let response = fuse(random_signals(seed, 25, 6));

        for fused in &response.fused_signals {
            assert!((0.0..=1.0).contains(&fused.probability), "seed {}", seed);
            assert_eq!(fused.score, fused.probability * 100.0);
            assert!(fused.confidence_lower <= fused.confidence_upper);
            assert!((0.0..=1.0).contains(&fused.confidence_lower));
            assert!((0.0..=1.0).contains(&fused.confidence_upper));
            assert!(fused.contributors.len() <= 3);
            assert!(fused
                .contributors
                .windows(2)
                .all(|w| w[0].contribution >= w[1].contribution));
            assert!(fused
                .contributors
                .iter()
                .all(|c| (0.4..=0.95).contains(&c.learned_weight)));
        }
    }
}

#[test]
fn test_identical_input_is_byte_identical() {
    let mut feedback = HashMap::new();
    feedback.insert("src-3:type-1".to_string(), true);
    feedback.insert("src-4:type-2".to_string(), false);

    let req = request(random_signals(7, 30, 5), feedback);
    let first = serde_json::to_string(&fuse_signals(&req, &FusionParams::default())).unwrap();
    let second = serde_json::to_string(&fuse_signals(&req, &FusionParams::default())).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_two_source_scenario() {
    let response = fuse(vec![signal("A", "t", 100.0), signal("B", "t", 1.0)]);

    let a = &response.fused_signals[0];
    let b = &response.fused_signals[1];
    assert!(a.probability > b.probability);
    assert_eq!(a.contributors.len(), 1);
    assert_eq!(b.contributors.len(), 1);
}

#[test]
fn test_feedback_dominates_evidence() {
    let signals = vec![
        signal("s1", "beacon", 90.0),
        signal("s1", "dns", 90.0),
        signal("s1", "proc", 90.0),
        signal("s2", "beacon", 1.0),
        signal("s2", "dns", 1.0),
    ];

    let mut feedback = HashMap::new();
    feedback.insert("s1:dns".to_string(), false);
    feedback.insert("s2:beacon".to_string(), true);

    let response = fuse_signals(&request(signals, feedback), &FusionParams::default());
    assert_eq!(probability_of(&response, "s1"), 0.0);
    assert_eq!(probability_of(&response, "s2"), 1.0);
}

#[test]
fn test_feedback_on_silent_type_ignored() {
    let signals = vec![
        signal("s1", "typeA", 0.0),
        signal("s1", "typeB", 4.0),
        signal("s2", "typeB", 2.0),
    ];

    let without = fuse(signals.clone());

    let mut feedback = HashMap::new();
    feedback.insert("s1:typeA".to_string(), true);
    let with = fuse_signals(&request(signals, feedback), &FusionParams::default());

    assert_eq!(without, with);
    assert!(probability_of(&with, "s1") < 1.0);
}

#[test]
fn test_monotone_in_positive_value() {
    // Ten sources on one type; s7 sits above the 70th percentile
    let base: Vec<SignalInput> = (0..10)
        .flat_map(|i| {
            let source = format!("s{}", i);
            vec![
                signal(&source, "beacon", (i + 1) as f64),
                signal(&source, "dns", ((i * 7) % 10 + 1) as f64),
            ]
        })
        .collect();

    let sweep: Vec<f64> = (80..=99)
        .map(|v| v as f64 / 10.0)
        .chain([10.0, 25.0, 100.0, 1e6])
        .collect();

    let mut previous = f64::NEG_INFINITY;
    for value in sweep {
        let mut signals = base.clone();
        signals[14].value = value; // s7 / beacon

        let p = probability_of(&fuse(signals), "s7");
        assert!(
            p >= previous - 1e-12,
            "probability fell from {} to {} at value {}",
            previous,
            p,
            value
        );
        previous = p;
    }
}

/// (source, type) pairs currently voting +1
fn positive_cells(signals: &[SignalInput]) -> Vec<(String, String)> {
    let Some(matrix) = aggregator::aggregate(signals) else {
        return Vec::new();
    };
    let params = FusionParams::default();
    let labels = labeler::label(&matrix, &labeler::thresholds(&matrix, params.label_percentile));

    let mut cells = Vec::new();
    for (i, source) in matrix.source_ids.iter().enumerate() {
        for (j, signal_type) in matrix.signal_types.iter().enumerate() {
            if labels.get(i, j) == Label::Positive {
                cells.push((source.clone(), signal_type.clone()));
            }
        }
    }
    cells
}

#[test]
fn test_monotone_in_positive_value_on_random_inputs() {
    let mut checked = 0;

    for seed in 0..10 {
        let base = random_signals(seed, 12, 4);
        let before = fuse(base.clone());
        let mut rng = StdRng::seed_from_u64(seed + 1000);

        for (source, signal_type) in positive_cells(&base) {
            let mut raised = base.clone();
            raised.push(signal(&source, &signal_type, rng.gen_range(0.5..100.0)));

            let p_before = probability_of(&before, &source);
            let p_after = probability_of(&fuse(raised), &source);
            assert!(
                p_after >= p_before - 1e-12,
                "seed {}: raising {}/{} dropped probability {} -> {}",
                seed,
                source,
                signal_type,
                p_before,
                p_after
            );
            checked += 1;
        }
    }

    assert!(checked > 0, "no positively labeled cells were exercised");
}

#[test]
fn test_single_source_converges_within_fixed_iterations() {
    let req = request(vec![signal("s1", "t", 5.0)], HashMap::new());

    let at_80 = fuse_signals(&req, &FusionParams::with_iterations(80));
    let at_160 = fuse_signals(&req, &FusionParams::with_iterations(160));

    let p80 = at_80.fused_signals[0].probability;
    let p160 = at_160.fused_signals[0].probability;
    assert!((p80 - p160).abs() < 1e-9, "{} vs {}", p80, p160);
    assert!(p80 > 0.5);
}

#[test]
fn test_correlated_copies_are_discounted() {
    // Eight sources with alternating polarity, voted on by one type or by
    // three perfectly correlated copies of it
    let values = [9.0, 1.0, 9.0, 1.0, 9.0, 1.0, 9.0, 1.0];

    let single: Vec<SignalInput> = values
        .iter()
        .enumerate()
        .map(|(i, v)| signal(&format!("s{}", i), "t1", *v))
        .collect();

    let triple: Vec<SignalInput> = values
        .iter()
        .enumerate()
        .flat_map(|(i, v)| {
            let source = format!("s{}", i);
            ["t1", "t2", "t3"].map(|t| signal(&source, t, *v))
        })
        .collect();

    let p_single = probability_of(&fuse(single), "s0");
    let p_triple = probability_of(&fuse(triple), "s0");

    // Undiscounted, three agreeing votes would drive s0 to ~0.9999
    assert!(p_triple >= p_single);
    assert!(p_triple < 0.9, "correlated copies counted as independent: {}", p_triple);
}
