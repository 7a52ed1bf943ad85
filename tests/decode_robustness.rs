// tests/decode_robustness.rs
//
// Randomized malformed payloads: the normalizer must never panic and must
// always hand back a list, whatever the upstream sheet put in the cell.

use deal_signal_engine::decode::decode_field;
use deal_signal_engine::{normalize_signals, DealRecord, Engine};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

const FRAGMENTS: &[&str] = &[
    "{", "}", "[", "]", "\"", ":", ",", "signals", "signal_type", "Objection::Pricing",
    "confidence", "85", "null", "true", "\\", "objection_analysis", "|", " ", "\n", "💥",
];

fn random_text(rng: &mut StdRng) -> String {
    let n = rng.random_range(0..24);
    (0..n)
        .map(|_| FRAGMENTS[rng.random_range(0..FRAGMENTS.len())])
        .collect()
}

#[test]
fn random_strings_never_panic() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..2_000 {
        let raw = Value::String(random_text(&mut rng));
        let _ = normalize_signals(&raw, Vec::new());
        let _ = decode_field("signals", &raw, json!([]));
    }
}

#[test]
fn odd_structured_values_resolve_to_lists() {
    let cases = [
        json!(null),
        json!(0),
        json!(true),
        json!([]),
        json!({}),
        json!({"signals": null}),
        json!({"signals": {"signal_type": "X"}}),
        json!([[{"signal_type": "nested"}]]),
        json!([{"signals": [{"signal_type": "wrapped-in-array"}]}]),
        json!("\"\\\"[]\\\"\""),
    ];
    for raw in cases {
        let out = normalize_signals(&raw, Vec::new());
        assert!(out.len() <= 1, "unexpected expansion for {raw}");
    }
}

#[test]
fn random_deal_batches_aggregate_without_panicking() {
    let mut rng = StdRng::seed_from_u64(42);
    let deals: Vec<DealRecord> = (0..200)
        .map(|_| DealRecord {
            stage: Some(random_text(&mut rng)),
            signals: Value::String(random_text(&mut rng)),
            actions: Value::String(random_text(&mut rng)),
            nba: Value::String(random_text(&mut rng)),
            ..DealRecord::default()
        })
        .collect();
    let d = Engine::default().dashboard(&deals);
    assert_eq!(d.deal_count, 200);
}
