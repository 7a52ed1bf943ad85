//! # Shape Resolver
//! Turns a decoded payload into an ordered sequence of records.
//!
//! Precedence (hard rule, checked in this order):
//! 1. object with a wrapper key holding an array (`{"signals": [...]}`)
//! 2. bare array
//! 3. single object carrying one of the record's marker keys
//! 4. anything else → empty
//!
//! The same precedence serves `signals`, `actions` and `nba`; only the wrapper
//! key and marker keys differ (see [`PayloadShape`]).

use serde_json::Value;

use crate::decode::decode_field;
use crate::signal::{Action, Nba, Signal};

/// Wrapper key + single-object markers for one payload kind.
#[derive(Debug, Clone, Copy)]
pub struct PayloadShape {
    pub field: &'static str,
    pub wrapper: &'static str,
    pub markers: &'static [&'static str],
}

pub const SIGNALS: PayloadShape = PayloadShape {
    field: "signals",
    wrapper: "signals",
    markers: &["signal_type", "objection_analysis"],
};

pub const ACTIONS: PayloadShape = PayloadShape {
    field: "actions",
    wrapper: "actions",
    markers: &["action_verb", "type"],
};

pub const NBA: PayloadShape = PayloadShape {
    field: "nba",
    wrapper: "nba_action",
    markers: &["action_reference_id", "action_verb", "execution_plan"],
};

/// Resolve an already-decoded value into its element objects.
pub fn resolve_elements<'a>(value: &'a Value, shape: &PayloadShape) -> Vec<&'a Value> {
    // 1) wrapper object
    if let Some(inner) = value.as_object().and_then(|m| m.get(shape.wrapper)) {
        match inner {
            Value::Array(items) => return items.iter().collect(),
            // `nba_action` is usually a single object rather than a list
            Value::Object(_) if shape.wrapper == NBA.wrapper => return vec![inner],
            _ => {}
        }
    }

    // 2) bare array
    if let Value::Array(items) = value {
        return items.iter().collect();
    }

    // 3) single record
    if let Value::Object(m) = value {
        if shape.markers.iter().any(|k| m.contains_key(*k)) {
            return vec![value];
        }
    }

    // 4) unrecognised: expected and common, no log
    Vec::new()
}

/// Decode a raw `signals` field and resolve it into signals.
///
/// Never panics. Returns `default` when the field decodes to nothing usable
/// (null, blank, malformed).
pub fn normalize_signals(raw: &Value, default: Vec<Signal>) -> Vec<Signal> {
    let decoded = decode_field(SIGNALS.field, raw, Value::Null);
    if decoded.is_null() {
        return default;
    }
    resolve_elements(&decoded, &SIGNALS)
        .into_iter()
        .filter_map(Signal::from_value)
        .collect()
}

/// Decode a raw `actions` field and resolve it into actions.
pub fn normalize_actions(raw: &Value) -> Vec<Action> {
    let decoded = decode_field(ACTIONS.field, raw, Value::Null);
    resolve_elements(&decoded, &ACTIONS)
        .into_iter()
        .filter_map(Action::from_value)
        .collect()
}

/// Decode a raw `nba` field and resolve it into next-best-action records.
pub fn normalize_nba(raw: &Value) -> Vec<Nba> {
    let decoded = decode_field(NBA.field, raw, Value::Null);
    resolve_elements(&decoded, &NBA)
        .into_iter()
        .filter_map(Nba::from_value)
        .collect()
}

/// The deal's leading NBA (first element), if any.
pub fn primary_nba(raw: &Value) -> Option<Nba> {
    normalize_nba(raw).into_iter().next()
}
