//! Taxonomy buckets the classifiers map records into.
//!
//! Closed taxonomies are plain enums. Open ones (action verbs) keep a literal
//! fallback variant so unknown values are still tallied.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Objection resolution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionStatus {
    Resolved,
    PartiallyResolved,
    InProgress,
    NotResolved,
}

impl ResolutionStatus {
    /// Substring rules in strict order: "partially resolved" also contains "resolved".
    pub fn from_status_text(raw: &str) -> Self {
        let s = raw.to_lowercase();
        if s.contains("resolved") && !s.contains("partially") {
            Self::Resolved
        } else if s.contains("partially") {
            Self::PartiallyResolved
        } else if s.contains("progress") {
            Self::InProgress
        } else {
            Self::NotResolved
        }
    }
}

/// Upsell receptiveness tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Receptiveness {
    High,
    Medium,
    Low,
}

impl Receptiveness {
    pub fn from_text(raw: &str) -> Option<Self> {
        let s = raw.to_lowercase();
        if s.contains("high") {
            Some(Self::High)
        } else if s.contains("medium") {
            Some(Self::Medium)
        } else if s.contains("low") {
            Some(Self::Low)
        } else {
            None
        }
    }
}

/// Action urgency. Only high/medium are tracked; everything else is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

impl Priority {
    pub fn from_text(raw: &str) -> Option<Self> {
        let s = raw.to_lowercase();
        if s.contains("high") {
            Some(Self::High)
        } else if s.contains("medium") {
            Some(Self::Medium)
        } else {
            None
        }
    }
}

/// Confidence score bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceBucket {
    High,
    Medium,
    Low,
}

impl ConfidenceBucket {
    pub const ALL: [ConfidenceBucket; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

/// Recommended action verb. The seed set is fixed; the taxonomy is open.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionVerb {
    Reframe,
    Educate,
    Accelerate,
    Trigger,
    Align,
    Escalate,
    FollowUp,
    Other(String),
}

impl ActionVerb {
    pub const SEED: [&'static str; 7] = [
        "Reframe",
        "Educate",
        "Accelerate",
        "Trigger",
        "Align",
        "Escalate",
        "Follow Up",
    ];

    /// Known verbs match case-insensitively; anything else keeps its literal text.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let folded: String = trimmed
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Some(match folded.as_str() {
            "reframe" => Self::Reframe,
            "educate" => Self::Educate,
            "accelerate" => Self::Accelerate,
            "trigger" => Self::Trigger,
            "align" => Self::Align,
            "escalate" => Self::Escalate,
            "followup" => Self::FollowUp,
            _ => Self::Other(trimmed.to_string()),
        })
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Reframe => "Reframe",
            Self::Educate => "Educate",
            Self::Accelerate => "Accelerate",
            Self::Trigger => "Trigger",
            Self::Align => "Align",
            Self::Escalate => "Escalate",
            Self::FollowUp => "Follow Up",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for ActionVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Capitalize the first letter only, lower-case the rest ("dISCOVERY" → "Discovery").
pub fn normalize_stage_name(raw: &str) -> String {
    let t = raw.trim();
    let mut chars = t.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
