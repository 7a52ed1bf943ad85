//! # Classifiers
//! Pure functions mapping one normalized record to a taxonomy bucket.
//! `None` means "contributes nothing" to the corresponding aggregate.
//!
//! The free-text matching rules (substring tests, `Category::Subtype`
//! splitting) are all here so they can be tested without any rendering code.

use crate::config::ConfidenceThresholds;
use crate::signal::{Action, Nba, Signal};
use crate::taxonomy::{ActionVerb, ConfidenceBucket, Priority, Receptiveness, ResolutionStatus};

/// Fallback objection bucket for missing or malformed types.
pub const UNKNOWN_OBJECTION: &str = "Unknown";

/// Resolution status of an objection signal. `None` when no status is present.
pub fn classify_resolution(signal: &Signal) -> Option<ResolutionStatus> {
    signal
        .resolution_status()
        .map(ResolutionStatus::from_status_text)
}

/// Objection type of a signal, reduced to its subtype(s).
///
/// Source order: `objection_type`, then `objection_analysis.objection_type`,
/// then `signal_type` when it mentions "objection". An objection signal with
/// no usable type lands in `"Unknown"`. Non-objection signals → `None`.
pub fn classify_objection_type(signal: &Signal) -> Option<String> {
    let typed = signal.objection_type.as_deref().or_else(|| {
        signal
            .objection_analysis
            .as_ref()
            .and_then(|oa| oa.objection_type.as_deref())
    });
    if let Some(raw) = typed {
        return Some(objection_main_type(raw));
    }

    let raw = signal
        .signal_type
        .as_deref()
        .filter(|t| t.to_lowercase().contains("objection"));
    match raw {
        Some(raw) => Some(objection_main_type(raw)),
        None if signal.objection_analysis.is_some() => Some(UNKNOWN_OBJECTION.to_string()),
        None => None,
    }
}

/// `"Objection::Pricing"` → `"Pricing"`, `"Objection::A|Objection::B"` → `"A/B"`.
pub fn objection_main_type(raw: &str) -> String {
    let parts: Vec<&str> = raw
        .split('|')
        .map(|seg| match seg.split_once("::") {
            Some((_, sub)) => sub.trim(),
            None => seg.trim(),
        })
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        UNKNOWN_OBJECTION.to_string()
    } else {
        parts.join("/")
    }
}

/// Categories named by a compound `signal_type` (`"Objection::Pricing|Expansion::Seats"`
/// → `["Objection", "Expansion"]`).
pub fn signal_categories(signal: &Signal) -> Vec<String> {
    let Some(raw) = signal.signal_type.as_deref() else {
        return Vec::new();
    };
    raw.split('|')
        .map(|seg| match seg.split_once("::") {
            Some((cat, _)) => cat.trim(),
            None => seg.trim(),
        })
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Outcome of the upsell rules for one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsellHit {
    /// `upsell_detection == "Yes"`; tier from `customer_receptiveness` when recognised.
    Detected(Option<Receptiveness>),
    /// Expansion signal without explicit receptiveness; defaults to medium.
    Expansion,
}

impl UpsellHit {
    pub fn tier(self) -> Option<Receptiveness> {
        match self {
            Self::Detected(t) => t,
            Self::Expansion => Some(Receptiveness::Medium),
        }
    }
}

/// Upsell opportunity for a single signal. The secondary (Expansion) rule only
/// applies to signals the primary rule did not count.
pub fn classify_upsell(signal: &Signal) -> Option<UpsellHit> {
    let detected = signal
        .upsell_detection
        .as_deref()
        .is_some_and(|d| d.trim().eq_ignore_ascii_case("yes"));
    if detected {
        let tier = signal
            .customer_receptiveness
            .as_deref()
            .and_then(Receptiveness::from_text);
        return Some(UpsellHit::Detected(tier));
    }

    let expansion = signal
        .signal_type
        .as_deref()
        .is_some_and(|t| t.contains("Expansion::"));
    if expansion && signal.customer_receptiveness.is_none() {
        return Some(UpsellHit::Expansion);
    }
    None
}

/// Confidence bucket; non-numeric or missing confidence → `None`.
pub fn classify_confidence(
    signal: &Signal,
    thresholds: &ConfidenceThresholds,
) -> Option<ConfidenceBucket> {
    signal.effective_confidence().map(|c| thresholds.bucket(c))
}

pub fn classify_priority(action: &Action) -> Option<Priority> {
    action.priority.as_deref().and_then(Priority::from_text)
}

/// Actions whose priority counts for a deal.
///
/// With a reference id: the first action referring to it. No reference id, or
/// no action referring to it: every action (unfiltered scan).
pub fn priority_candidates<'a>(nba: Option<&Nba>, actions: &'a [Action]) -> Vec<&'a Action> {
    let reference = nba.and_then(|n| n.action_reference_id.as_deref());
    if let Some(id) = reference {
        if let Some(hit) = actions.iter().find(|a| a.references(id)) {
            return vec![hit];
        }
    }
    actions.iter().collect()
}

/// Verbs to tally for one deal: the NBA's verb when it has one, otherwise
/// each action's verb.
pub fn classify_action_verbs(nba: Option<&Nba>, actions: &[Action]) -> Vec<ActionVerb> {
    if let Some(v) = nba
        .and_then(|n| n.action_verb.as_deref())
        .and_then(ActionVerb::parse)
    {
        return vec![v];
    }
    actions
        .iter()
        .filter_map(|a| a.action_verb.as_deref())
        .filter_map(ActionVerb::parse)
        .collect()
}
