//! # Aggregators
//! Fold a deal collection through one classifier into chart-ready buckets.
//!
//! Every aggregator is a single pass: decode payload → resolve shape →
//! classify each element → increment bucket. Deals without a payload
//! contribute zero, and a malformed payload on one deal only costs that deal
//! (the decoder already degraded it to an empty default).
//!
//! Unknown taxonomy values follow a per-aggregate policy, on purpose not unified:
//! - stage timeline / stage amounts: unrecognised stage → dropped
//! - objection types: malformed → "Unknown"
//! - action verbs, signal categories, owners: open buckets under the literal value
//! - priority: anything but high/medium → dropped

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::classify::{
    classify_action_verbs, classify_confidence, classify_objection_type, classify_priority,
    classify_resolution, classify_upsell, priority_candidates, signal_categories,
};
use crate::config::EngineConfig;
use crate::deal::DealRecord;
use crate::shape::{normalize_actions, normalize_signals, primary_nba};
use crate::signal::Signal;
use crate::taxonomy::{ConfidenceBucket, Priority, Receptiveness, ResolutionStatus};

/// Owner bucket for deals without an AE.
pub const UNASSIGNED_OWNER: &str = "Unassigned";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionCounts {
    pub resolved: u64,
    pub partially_resolved: u64,
    pub in_progress: u64,
    pub not_resolved: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsellCounts {
    pub total: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub high: u64,
    pub medium: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionOutcomes {
    pub total: u64,
    pub successful: u64,
}

/// `{name, value}` count bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedValue {
    pub name: String,
    pub value: u64,
}

/// `{name, value}` monetary bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedAmount {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub name: String,
    pub count: u64,
    pub avg_days: f64,
}

/// Insertion-ordered counter for open taxonomies.
#[derive(Debug, Default)]
struct OpenTally {
    order: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl OpenTally {
    fn seeded<I: IntoIterator<Item = String>>(names: I) -> Self {
        let mut t = Self::default();
        for n in names {
            t.slot(&n);
        }
        t
    }

    fn slot(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        self.order.push((name.to_string(), 0));
        let i = self.order.len() - 1;
        self.index.insert(name.to_string(), i);
        i
    }

    fn bump(&mut self, name: &str) {
        let i = self.slot(name);
        self.order[i].1 += 1;
    }

    /// Value descending, ties keep first-seen order (stable sort).
    fn into_sorted(mut self) -> Vec<NamedValue> {
        self.order.sort_by(|a, b| b.1.cmp(&a.1));
        self.into_fixed()
    }

    fn into_fixed(self) -> Vec<NamedValue> {
        self.order
            .into_iter()
            .map(|(name, value)| NamedValue { name, value })
            .collect()
    }
}

fn deal_signals(deal: &DealRecord) -> Vec<Signal> {
    normalize_signals(&deal.signals, Vec::new())
}

pub fn aggregate_resolution_status(deals: &[DealRecord]) -> ResolutionCounts {
    let mut out = ResolutionCounts::default();
    for deal in deals {
        for s in deal_signals(deal) {
            match classify_resolution(&s) {
                Some(ResolutionStatus::Resolved) => out.resolved += 1,
                Some(ResolutionStatus::PartiallyResolved) => out.partially_resolved += 1,
                Some(ResolutionStatus::InProgress) => out.in_progress += 1,
                Some(ResolutionStatus::NotResolved) => out.not_resolved += 1,
                None => {}
            }
        }
    }
    out
}

/// Per signal, not per deal: a deal with two Expansion signals counts twice.
pub fn aggregate_upsell_opportunities(deals: &[DealRecord]) -> UpsellCounts {
    let mut out = UpsellCounts::default();
    for deal in deals {
        for s in deal_signals(deal) {
            let Some(hit) = classify_upsell(&s) else {
                continue;
            };
            out.total += 1;
            match hit.tier() {
                Some(Receptiveness::High) => out.high += 1,
                Some(Receptiveness::Medium) => out.medium += 1,
                Some(Receptiveness::Low) => out.low += 1,
                None => {}
            }
        }
    }
    out
}

pub fn aggregate_priority_actions(deals: &[DealRecord]) -> PriorityCounts {
    let mut out = PriorityCounts::default();
    for deal in deals {
        let nba = primary_nba(&deal.nba);
        let actions = normalize_actions(&deal.actions);
        for a in priority_candidates(nba.as_ref(), &actions) {
            match classify_priority(a) {
                Some(Priority::High) => out.high += 1,
                Some(Priority::Medium) => out.medium += 1,
                None => {}
            }
        }
    }
    out
}

pub fn aggregate_objection_types(deals: &[DealRecord]) -> Vec<NamedValue> {
    let mut tally = OpenTally::default();
    for deal in deals {
        for s in deal_signals(deal) {
            if let Some(t) = classify_objection_type(&s) {
                tally.bump(&t);
            }
        }
    }
    tally.into_sorted()
}

/// Always High, Medium, Low in that order (zeros included).
pub fn aggregate_confidence(deals: &[DealRecord], cfg: &EngineConfig) -> Vec<NamedValue> {
    let mut tally =
        OpenTally::seeded(ConfidenceBucket::ALL.iter().map(|b| b.label().to_string()));
    for deal in deals {
        for s in deal_signals(deal) {
            if let Some(b) = classify_confidence(&s, &cfg.confidence) {
                tally.bump(b.label());
            }
        }
    }
    tally.into_fixed()
}

/// Configured seed verbs first (zeros included, in seed order), then unknown
/// verbs under their literal text. Seed matching is case-insensitive.
pub fn aggregate_action_verbs(deals: &[DealRecord], cfg: &EngineConfig) -> Vec<NamedValue> {
    let mut tally = OpenTally::seeded(cfg.verbs.known.iter().cloned());
    let seeds = tally.order.len();
    for deal in deals {
        let nba = primary_nba(&deal.nba);
        let actions = normalize_actions(&deal.actions);
        for verb in classify_action_verbs(nba.as_ref(), &actions) {
            let label = verb.label();
            let name = cfg
                .verbs
                .known
                .iter()
                .find(|k| k.eq_ignore_ascii_case(label))
                .map(String::as_str)
                .unwrap_or(label);
            tally.bump(name);
        }
    }
    let mut out = tally.into_fixed();
    // Seeds keep their order; open buckets after them sort by count.
    out[seeds..].sort_by(|a, b| b.value.cmp(&a.value));
    out
}

pub fn aggregate_signal_types(deals: &[DealRecord]) -> Vec<NamedValue> {
    let mut tally = OpenTally::default();
    for deal in deals {
        for s in deal_signals(deal) {
            for cat in signal_categories(&s) {
                tally.bump(&cat);
            }
        }
    }
    tally.into_sorted()
}

/// One entry per configured stage. `avg_days` is the mean number of days from
/// `as_of` to each close date (past dates count as 0), over deals that have a
/// parsable close date. Unrecognised stages are dropped.
pub fn aggregate_deal_stage_timeline(
    deals: &[DealRecord],
    cfg: &EngineConfig,
    as_of: NaiveDate,
) -> Vec<StageTiming> {
    // (count, days_sum, dated)
    let mut acc: Vec<(u64, i64, u64)> = vec![(0, 0, 0); cfg.stages.names.len()];

    for deal in deals {
        let Some(idx) = stage_index(deal, cfg) else {
            continue;
        };
        let slot = &mut acc[idx];
        slot.0 += 1;
        if let Some(close) = deal.close_date {
            slot.1 += (close - as_of).num_days().max(0);
            slot.2 += 1;
        }
    }

    cfg.stages
        .names
        .iter()
        .zip(acc)
        .map(|(name, (count, days, dated))| StageTiming {
            name: name.clone(),
            count,
            avg_days: if dated == 0 {
                0.0
            } else {
                round1(days as f64 / dated as f64)
            },
        })
        .collect()
}

/// Summed deal amount per configured stage; unrecognised stages dropped.
pub fn aggregate_stage_amounts(deals: &[DealRecord], cfg: &EngineConfig) -> Vec<NamedAmount> {
    let mut sums = vec![0.0f64; cfg.stages.names.len()];
    for deal in deals {
        if let Some(idx) = stage_index(deal, cfg) {
            sums[idx] += deal.amount_or_zero();
        }
    }
    cfg.stages
        .names
        .iter()
        .zip(sums)
        .map(|(name, value)| NamedAmount {
            name: name.clone(),
            value,
        })
        .collect()
}

/// Summed deal amount per owner, largest first.
pub fn aggregate_amount_by_owner(deals: &[DealRecord]) -> Vec<NamedAmount> {
    let mut order: Vec<NamedAmount> = Vec::new();
    for deal in deals {
        let owner = deal
            .owner
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .unwrap_or(UNASSIGNED_OWNER);
        match order.iter_mut().find(|b| b.name == owner) {
            Some(b) => b.value += deal.amount_or_zero(),
            None => order.push(NamedAmount {
                name: owner.to_string(),
                value: deal.amount_or_zero(),
            }),
        }
    }
    order.sort_by(|a, b| b.value.total_cmp(&a.value));
    order
}

pub fn aggregate_action_outcomes(deals: &[DealRecord]) -> ActionOutcomes {
    let mut out = ActionOutcomes::default();
    for deal in deals {
        for a in normalize_actions(&deal.actions) {
            out.total += 1;
            if a.is_successful() {
                out.successful += 1;
            }
        }
    }
    out
}

fn stage_index(deal: &DealRecord, cfg: &EngineConfig) -> Option<usize> {
    let stage = cfg.match_stage(deal.stage.as_deref()?)?;
    cfg.stages.names.iter().position(|n| n == stage)
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deal_with_signals(signals: serde_json::Value) -> DealRecord {
        DealRecord {
            signals,
            ..DealRecord::default()
        }
    }

    fn staged(stage: &str, amount: f64, close: Option<&str>) -> DealRecord {
        DealRecord {
            stage: Some(stage.into()),
            amount: Some(amount),
            close_date: close.and_then(|c| NaiveDate::parse_from_str(c, "%Y-%m-%d").ok()),
            ..DealRecord::default()
        }
    }

    #[test]
    fn resolution_counts_across_nested_and_direct_status() {
        let deals = vec![
            deal_with_signals(json!([
                {"signal_type": "Objection::Pricing", "objection_analysis": {"resolution_status": "Resolved"}},
                {"signal_type": "Objection::Timing", "resolution_status": "Partially Resolved"},
                {"signal_type": "Confusion::Scope"}
            ])),
            deal_with_signals(json!(r#"{"objection_analysis":{"resolution_status":"in progress"}}"#)),
            deal_with_signals(json!("{broken json")),
            deal_with_signals(json!({"signals": [{"resolution_status": "open"}]})),
        ];
        let r = aggregate_resolution_status(&deals);
        assert_eq!(
            r,
            ResolutionCounts {
                resolved: 1,
                partially_resolved: 1,
                in_progress: 1,
                not_resolved: 1
            }
        );
    }

    #[test]
    fn upsell_counts_primary_and_expansion() {
        let deals = vec![deal_with_signals(json!([
            {"signal_type": "Expansion::Seats", "upsell_detection": "yes", "customer_receptiveness": "High"},
            {"signal_type": "Expansion::Upsell"},
            {"signal_type": "Other", "upsell_detection": "Yes"},
            {"signal_type": "Expansion::Addon", "customer_receptiveness": "Low"}
        ]))];
        let u = aggregate_upsell_opportunities(&deals);
        assert_eq!(
            u,
            UpsellCounts {
                total: 3,
                high: 1,
                medium: 1,
                low: 0
            }
        );
    }

    #[test]
    fn priority_uses_match_then_unfiltered_scan() {
        let matched = DealRecord {
            nba: json!({"nba_action": {"action_reference_id": "S1"}}),
            actions: json!([
                {"action_verb": "Educate", "priority": "High", "signal_reference_id": "S1"},
                {"action_verb": "Align", "priority": "Medium", "signal_reference_id": "S2"}
            ]),
            ..DealRecord::default()
        };
        let unfiltered = DealRecord {
            actions: json!(r#"{"actions":[{"priority":"medium"},{"priority":"Low"},{"priority":"HIGH"}]}"#),
            ..DealRecord::default()
        };
        let p = aggregate_priority_actions(&[matched, unfiltered]);
        assert_eq!(p, PriorityCounts { high: 2, medium: 1 });
    }

    #[test]
    fn objection_types_sorted_by_count() {
        let deals = vec![
            deal_with_signals(json!([
                {"signal_type": "Objection::Pricing"},
                {"signal_type": "Objection::Integration"},
                {"signal_type": "Objection::Integration"},
                {"objection_type": "Objection::"}
            ])),
        ];
        let out = aggregate_objection_types(&deals);
        assert_eq!(
            out,
            vec![
                NamedValue { name: "Integration".into(), value: 2 },
                NamedValue { name: "Pricing".into(), value: 1 },
                NamedValue { name: "Unknown".into(), value: 1 },
            ]
        );
    }

    #[test]
    fn objection_without_type_counts_as_unknown() {
        let deals = vec![deal_with_signals(json!([
            {"objection_analysis": {"resolution_status": "Resolved"}},
            {"signal_type": "Expansion::Seats"}
        ]))];
        assert_eq!(
            aggregate_objection_types(&deals),
            vec![NamedValue { name: "Unknown".into(), value: 1 }]
        );
    }

    #[test]
    fn open_verbs_sort_after_repeated_seeds() {
        let mut cfg = EngineConfig::default();
        cfg.verbs.known = vec!["Reframe".into(), "Reframe".into(), "Educate".into()];
        let deals = vec![DealRecord {
            actions: json!([
                {"action_verb": "Zeta"},
                {"action_verb": "Omega"},
                {"action_verb": "Omega"}
            ]),
            ..DealRecord::default()
        }];
        let names: Vec<String> = aggregate_action_verbs(&deals, &cfg)
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Reframe", "Educate", "Omega", "Zeta"]);
    }

    #[test]
    fn confidence_only_counts_numeric_values() {
        let deals = vec![deal_with_signals(json!([
            {"confidence": 90},
            {"confidence": 55},
            {"objection_analysis": {"confidence_in_resolution": 10}},
            {"signal_type": "X", "confidence": "high"},
            {"signal_type": "Y"}
        ]))];
        let out = aggregate_confidence(&deals, &EngineConfig::default());
        let values: Vec<u64> = out.iter().map(|b| b.value).collect();
        assert_eq!(values, vec![1, 1, 1]);
        let names: Vec<&str> = out.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["High", "Medium", "Low"]);
    }

    #[test]
    fn action_verbs_seed_then_open_buckets() {
        let deals = vec![
            DealRecord {
                nba: json!({"action_verb": "follow-up"}),
                actions: json!([{"action_verb": "Educate"}]),
                ..DealRecord::default()
            },
            DealRecord {
                actions: json!([{"action_verb": "Negotiate"}, {"type": "Educate"}, {"action_verb": "Negotiate"}]),
                ..DealRecord::default()
            },
        ];
        let out = aggregate_action_verbs(&deals, &EngineConfig::default());
        assert_eq!(out.len(), 8);
        let get = |n: &str| out.iter().find(|b| b.name == n).map(|b| b.value);
        assert_eq!(get("Follow Up"), Some(1));
        assert_eq!(get("Educate"), Some(1));
        assert_eq!(get("Reframe"), Some(0));
        assert_eq!(out[7], NamedValue { name: "Negotiate".into(), value: 2 });
    }

    #[test]
    fn signal_type_distribution() {
        let deals = vec![deal_with_signals(json!([
            {"signal_type": "Objection::Pricing|Expansion::Seats"},
            {"signal_type": "Objection::Timing"}
        ]))];
        let out = aggregate_signal_types(&deals);
        assert_eq!(out[0], NamedValue { name: "Objection".into(), value: 2 });
        assert_eq!(out[1], NamedValue { name: "Expansion".into(), value: 1 });
    }

    #[test]
    fn stage_timeline_drops_unknown_and_averages_days() {
        let as_of = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let deals = vec![
            staged("discovery", 100.0, Some("2026-01-11")),
            staged("DISCOVERY", 50.0, Some("2026-01-21")),
            staged("Discovery", 10.0, None),
            staged("qualification", 20.0, Some("2025-12-01")),
            staged("Closed Won", 999.0, Some("2026-02-01")),
        ];
        let out = aggregate_deal_stage_timeline(&deals, &EngineConfig::default(), as_of);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].name, "Discovery");
        assert_eq!(out[0].count, 3);
        assert_eq!(out[0].avg_days, 15.0);
        assert_eq!(out[1].count, 1);
        assert_eq!(out[1].avg_days, 0.0);
        assert_eq!(out[2].count, 0);

        let total: u64 = out.iter().map(|s| s.count).sum();
        assert_eq!(total, 4);

        let amounts = aggregate_stage_amounts(&deals, &EngineConfig::default());
        assert_eq!(amounts[0].value, 160.0);
        assert_eq!(amounts[1].value, 20.0);
    }

    #[test]
    fn owner_amounts_and_outcomes() {
        let deals = vec![
            DealRecord {
                owner: Some("Dana".into()),
                amount: Some(10.0),
                actions: json!([{"status": "Successful"}, {"status": "pending"}]),
                ..DealRecord::default()
            },
            DealRecord {
                owner: Some("Lee".into()),
                amount: Some(30.0),
                ..DealRecord::default()
            },
            DealRecord {
                owner: Some("  ".into()),
                amount: Some(5.0),
                ..DealRecord::default()
            },
        ];
        let owners = aggregate_amount_by_owner(&deals);
        assert_eq!(owners[0].name, "Lee");
        assert_eq!(owners[2].name, UNASSIGNED_OWNER);
        assert_eq!(
            aggregate_action_outcomes(&deals),
            ActionOutcomes { total: 2, successful: 1 }
        );
    }

    #[test]
    fn aggregators_are_idempotent() {
        let deals = vec![deal_with_signals(json!(
            r#"{"signals":[{"signal_type":"Objection::Pricing","confidence":85,"resolution_status":"resolved"}]}"#
        ))];
        let cfg = EngineConfig::default();
        assert_eq!(aggregate_confidence(&deals, &cfg), aggregate_confidence(&deals, &cfg));
        assert_eq!(aggregate_objection_types(&deals), aggregate_objection_types(&deals));
        assert_eq!(
            aggregate_resolution_status(&deals),
            aggregate_resolution_status(&deals)
        );
    }
}
