//! # Safe Decoder
//! Tolerant decoding of payload fields that may arrive as an already-parsed
//! value, a JSON string (sometimes encoded twice), an empty string, or garbage.
//!
//! Every `signals` / `actions` / `nba` field passes through [`decode_field`]
//! before any other engine logic looks at it. Nothing here panics: parse
//! failures are logged with a short fingerprint of the payload and the caller's
//! default is returned instead.

use metrics::counter;
use serde_json::Value;
use tracing::warn;

use crate::metrics::ensure_metrics_described;

/// How many layers of string-wrapped JSON we are willing to peel.
const MAX_UNWRAP_DEPTH: usize = 3;

/// Decode `raw` or return `default`.
///
/// - `null` → `default`
/// - object / array / number / bool → returned as-is
/// - blank string → `default` (no parse attempt)
/// - JSON string → parsed; string-in-string payloads are unwrapped up to 3 levels
/// - malformed string → `default`, logged under target `decode`
pub fn decode_field(field: &str, raw: &Value, default: Value) -> Value {
    match raw {
        Value::Null => default,
        Value::String(s) => decode_str(field, s, default),
        other => other.clone(),
    }
}

/// Same as [`decode_field`] but starting from raw text.
pub fn decode_str(field: &str, text: &str, default: Value) -> Value {
    let mut current = text.trim().to_string();

    for _ in 0..MAX_UNWRAP_DEPTH {
        if current.is_empty() {
            return default;
        }
        match serde_json::from_str::<Value>(&current) {
            Ok(Value::String(inner)) => {
                // Double-encoded: keep peeling only if the inner text looks like JSON.
                let inner = inner.trim();
                if looks_like_json(inner) {
                    current = inner.to_string();
                    continue;
                }
                return Value::String(inner.to_string());
            }
            Ok(Value::Null) => return default,
            Ok(v) => return v,
            Err(e) => {
                log_failure(field, &current, &e.to_string());
                return default;
            }
        }
    }

    log_failure(field, &current, "nesting too deep");
    default
}

fn looks_like_json(s: &str) -> bool {
    matches!(s.chars().next(), Some('{') | Some('[') | Some('"'))
}

fn log_failure(field: &str, payload: &str, error: &str) {
    ensure_metrics_described();
    counter!("engine_decode_failures_total", "field" => field.to_string()).increment(1);

    // Never log raw payload text. Only a short hash + length.
    let id = fingerprint(payload);
    warn!(
        target: "decode",
        field,
        %id,
        len = payload.len(),
        error,
        "payload decode failed, using default"
    );
}

/// Short, stable sha256 prefix used to correlate log lines with a payload.
pub(crate) fn fingerprint(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_and_blank_yield_default() {
        assert_eq!(decode_field("signals", &Value::Null, json!([])), json!([]));
        assert_eq!(decode_field("signals", &json!(""), json!([])), json!([]));
        assert_eq!(decode_field("signals", &json!("   \n\t"), json!({})), json!({}));
    }

    #[test]
    fn structured_values_pass_through() {
        let v = json!({"signals": [{"signal_type": "Objection::Pricing"}]});
        assert_eq!(decode_field("signals", &v, json!([])), v);
        assert_eq!(decode_field("signals", &json!([1, 2]), json!([])), json!([1, 2]));
    }

    #[test]
    fn json_string_is_parsed() {
        let raw = json!(r#"{"signals":[{"signal_type":"X"}]}"#);
        let out = decode_field("signals", &raw, json!([]));
        assert_eq!(out["signals"][0]["signal_type"], json!("X"));
    }

    #[test]
    fn double_encoded_string_is_unwrapped() {
        let inner = r#"[{"signal_type":"Expansion::Upsell"}]"#;
        let twice = serde_json::to_string(inner).unwrap();
        let out = decode_field("signals", &Value::String(twice), json!([]));
        assert!(out.is_array());
        assert_eq!(out[0]["signal_type"], json!("Expansion::Upsell"));
    }

    #[test]
    fn malformed_string_yields_default() {
        let out = decode_field("nba", &json!("{not json"), json!({"fallback": true}));
        assert_eq!(out, json!({"fallback": true}));
    }

    #[test]
    fn json_null_literal_yields_default() {
        assert_eq!(decode_field("nba", &json!("null"), json!({})), json!({}));
    }

    #[test]
    fn fingerprint_is_short_and_stable() {
        let a = fingerprint("payload");
        assert_eq!(a.len(), 12);
        assert_eq!(a, fingerprint("payload"));
        assert_ne!(a, fingerprint("payload2"));
    }
}
