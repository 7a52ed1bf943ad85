//! # Deal Selection
//! Picks the single "primary" signal shown on a deal's card/table row, and
//! builds that row.
//!
//! Primary signal: the signal whose `signal_id` equals the NBA's
//! `action_reference_id`; otherwise the highest-confidence signal (first one
//! wins on ties); `None` for a deal without signals.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::deal::DealRecord;
use crate::shape::{normalize_signals, primary_nba};
use crate::signal::Signal;

pub fn select_primary_signal(deal: &DealRecord) -> Option<Signal> {
    let reference = primary_nba(&deal.nba).and_then(|n| n.action_reference_id);
    let signals = normalize_signals(&deal.signals, Vec::new());
    pick_primary(signals, reference.as_deref())
}

/// Selection over an already-normalized signal list.
pub fn pick_primary(signals: Vec<Signal>, reference: Option<&str>) -> Option<Signal> {
    if let Some(id) = reference {
        if let Some(pos) = signals
            .iter()
            .position(|s| s.signal_id.as_deref() == Some(id))
        {
            return signals.into_iter().nth(pos);
        }
    }

    // Strict `>` keeps the first occurrence on ties; signals without a
    // numeric confidence rank below every numbered one.
    let mut best: Option<(usize, f64)> = None;
    for (i, s) in signals.iter().enumerate() {
        let c = s.effective_confidence().unwrap_or(f64::NEG_INFINITY);
        match best {
            Some((_, bc)) if c <= bc => {}
            _ => best = Some((i, c)),
        }
    }
    let (idx, _) = best?;
    signals.into_iter().nth(idx)
}

static BULLET_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*•]|\d{1,2}[.)])\s*").expect("bullet marker regex")
});

/// Splits a free-text execution plan into bullets.
///
/// Line breaks, inline `•` separators, `-`/`*` markers and `1.` / `1)`
/// numbering are recognised; empty items are dropped.
pub fn execution_plan_bullets(plan: &str) -> Vec<String> {
    plan.split(['\n', '\r', '•'])
        .flat_map(split_inline_numbering)
        .map(|line| BULLET_MARKER.replace(line, "").trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

static INLINE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s(?:\d{1,2}[.)])\s").expect("inline numbering regex")
});

/// "1. Call CFO 2. Send deck" → ["1. Call CFO", "Send deck"]
fn split_inline_numbering(line: &str) -> Vec<&str> {
    INLINE_NUMBER.split(line).collect()
}

/// One card/table row for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealSummary {
    pub company: Option<String>,
    pub deal_name: Option<String>,
    pub stage: Option<String>,
    pub amount: Option<f64>,
    pub owner: Option<String>,
    pub close_date: Option<NaiveDate>,
    /// `None` → render the "no signal" state.
    pub primary_signal: Option<Signal>,
    pub nba_verb: Option<String>,
    pub execution_plan: Vec<String>,
    pub estimated_impact: Option<String>,
    pub estimated_effort: Option<String>,
}

pub fn summarize_deal(deal: &DealRecord) -> DealSummary {
    let nba = primary_nba(&deal.nba);
    let signals = normalize_signals(&deal.signals, Vec::new());
    let reference = nba.as_ref().and_then(|n| n.action_reference_id.as_deref());
    let primary_signal = pick_primary(signals, reference);

    let (nba_verb, execution_plan, estimated_impact, estimated_effort) = match nba {
        Some(n) => (
            n.action_verb,
            n.execution_plan
                .as_deref()
                .map(execution_plan_bullets)
                .unwrap_or_default(),
            n.estimated_impact,
            n.estimated_effort,
        ),
        None => (None, Vec::new(), None, None),
    };

    DealSummary {
        company: deal.company.clone(),
        deal_name: deal.deal_name.clone(),
        stage: deal.stage.clone(),
        amount: deal.amount,
        owner: deal.owner.clone(),
        close_date: deal.close_date,
        primary_signal,
        nba_verb,
        execution_plan,
        estimated_impact,
        estimated_effort,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conf(id: &str, c: Option<f64>) -> Signal {
        Signal {
            signal_id: Some(id.into()),
            confidence: c,
            ..Signal::default()
        }
    }

    #[test]
    fn exact_reference_wins() {
        let signals = vec![conf("S1", Some(10.0)), conf("S2", Some(95.0))];
        let p = pick_primary(signals, Some("S1")).unwrap();
        assert_eq!(p.signal_id.as_deref(), Some("S1"));
    }

    #[test]
    fn ties_keep_first_occurrence() {
        let signals = vec![conf("A", Some(80.0)), conf("B", Some(80.0)), conf("C", Some(20.0))];
        assert_eq!(pick_primary(signals, None).unwrap().signal_id.as_deref(), Some("A"));
    }

    #[test]
    fn unnumbered_signals_rank_last_but_still_selectable() {
        let signals = vec![conf("A", None), conf("B", Some(5.0))];
        assert_eq!(pick_primary(signals, None).unwrap().signal_id.as_deref(), Some("B"));

        let only_unnumbered = vec![conf("A", None), conf("B", None)];
        assert_eq!(
            pick_primary(only_unnumbered, None).unwrap().signal_id.as_deref(),
            Some("A")
        );
        assert!(pick_primary(Vec::new(), Some("X")).is_none());
    }

    #[test]
    fn deal_without_signals_has_no_primary() {
        let d = DealRecord {
            nba: json!({"nba_action": {"action_reference_id": "S1"}}),
            signals: json!("not json at all"),
            ..DealRecord::default()
        };
        assert!(select_primary_signal(&d).is_none());
    }

    #[test]
    fn bullets_from_mixed_plan_text() {
        let plan = "1. Call the CFO\n2) Send ROI deck\n- Book demo • Follow up Friday\n\n";
        assert_eq!(
            execution_plan_bullets(plan),
            vec!["Call the CFO", "Send ROI deck", "Book demo", "Follow up Friday"]
        );
        assert_eq!(
            execution_plan_bullets("1. Call CFO 2. Send deck"),
            vec!["Call CFO", "Send deck"]
        );
        assert!(execution_plan_bullets("   ").is_empty());
    }

    #[test]
    fn summary_row_carries_nba_details() {
        let d = DealRecord {
            company: Some("Acme".into()),
            nba: json!(r#"{"nba_action":{"action_reference_id":"S2","action_verb":"Educate","execution_plan":"- Share docs\n- Schedule call","estimated_impact":"High"}}"#),
            signals: json!([{"signal_id": "S1", "confidence": 99}, {"signal_id": "S2", "confidence": 10}]),
            ..DealRecord::default()
        };
        let s = summarize_deal(&d);
        assert_eq!(s.company.as_deref(), Some("Acme"));
        assert_eq!(s.primary_signal.unwrap().signal_id.as_deref(), Some("S2"));
        assert_eq!(s.nba_verb.as_deref(), Some("Educate"));
        assert_eq!(s.execution_plan, vec!["Share docs", "Schedule call"]);
        assert_eq!(s.estimated_impact.as_deref(), Some("High"));
        assert_eq!(s.estimated_effort, None);
    }
}
