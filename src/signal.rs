//! Typed views over the loosely-shaped records found inside payloads.
//!
//! Upstream JSON is not trusted to be well-typed: an id may be a number, a
//! confidence may be a string, a nested object may be missing. The `from_value`
//! constructors read each field leniently instead of failing the whole record.

use serde::Serialize;
use serde_json::{Map, Value};

/// Nested `objection_analysis` block carried by objection signals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectionAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objection_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_in_resolution: Option<f64>,
}

impl ObjectionAnalysis {
    fn from_map(m: &Map<String, Value>) -> Self {
        Self {
            resolution_status: text(m, "resolution_status"),
            objection_type: text(m, "objection_type"),
            confidence_in_resolution: number(m, "confidence_in_resolution"),
        }
    }
}

/// A normalized unit extracted from a deal's `signals` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Signal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supporting_quote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objection_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objection_analysis: Option<ObjectionAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_receptiveness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upsell_detection: Option<String>,
}

impl Signal {
    /// Build from a JSON object; anything else is not a signal.
    pub fn from_value(v: &Value) -> Option<Self> {
        let m = v.as_object()?;

        // Upsell fields sometimes live under a nested `upsell_analysis` block.
        let upsell = m.get("upsell_analysis").and_then(Value::as_object);
        let upsell_text = |key: &str| text(m, key).or_else(|| upsell.and_then(|u| text(u, key)));

        Some(Self {
            signal_id: text(m, "signal_id"),
            signal_type: text(m, "signal_type"),
            confidence: number(m, "confidence"),
            supporting_quote: text(m, "supporting_quote"),
            resolution_status: text(m, "resolution_status"),
            objection_type: text(m, "objection_type"),
            objection_analysis: m
                .get("objection_analysis")
                .and_then(Value::as_object)
                .map(ObjectionAnalysis::from_map),
            customer_receptiveness: upsell_text("customer_receptiveness"),
            upsell_detection: upsell_text("upsell_detection"),
        })
    }

    /// `resolution_status`, direct first, then under `objection_analysis`.
    pub fn resolution_status(&self) -> Option<&str> {
        self.resolution_status.as_deref().or_else(|| {
            self.objection_analysis
                .as_ref()
                .and_then(|oa| oa.resolution_status.as_deref())
        })
    }

    /// Numeric confidence, direct first, then `objection_analysis.confidence_in_resolution`.
    pub fn effective_confidence(&self) -> Option<f64> {
        self.confidence.or_else(|| {
            self.objection_analysis
                .as_ref()
                .and_then(|oa| oa.confidence_in_resolution)
        })
    }
}

/// A normalized unit from a deal's `actions` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Action {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_verb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Action {
    pub fn from_value(v: &Value) -> Option<Self> {
        let m = v.as_object()?;
        Some(Self {
            action_verb: text(m, "action_verb").or_else(|| text(m, "type")),
            priority: text(m, "priority"),
            signal_reference_id: text(m, "signal_reference_id"),
            action_reference_id: text(m, "action_reference_id"),
            status: text(m, "status"),
        })
    }

    /// True when this action refers to `id` by either reference field.
    pub fn references(&self, id: &str) -> bool {
        self.signal_reference_id.as_deref() == Some(id)
            || self.action_reference_id.as_deref() == Some(id)
    }

    pub fn is_successful(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.to_lowercase().contains("successful"))
    }
}

/// A normalized "next best action" from a deal's `nba` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Nba {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_verb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_impact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_effort: Option<String>,
}

impl Nba {
    pub fn from_value(v: &Value) -> Option<Self> {
        let m = v.as_object()?;
        Some(Self {
            action_reference_id: text(m, "action_reference_id"),
            execution_plan: text(m, "execution_plan"),
            action_verb: text(m, "action_verb"),
            estimated_impact: text(m, "estimated_impact"),
            estimated_effort: text(m, "estimated_effort"),
        })
    }
}

/// Non-empty trimmed string; numbers are rendered as text (ids arrive both ways).
pub(crate) fn text(m: &Map<String, Value>, key: &str) -> Option<String> {
    match m.get(key)? {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Finite JSON number only. Numeric strings do not count.
pub(crate) fn number(m: &Map<String, Value>, key: &str) -> Option<f64> {
    m.get(key)?.as_f64().filter(|x| x.is_finite())
}
