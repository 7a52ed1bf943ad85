//! # Engine
//! Pure, testable facade over the aggregators: `(deals, config)` → chart data.
//! No I/O, no state between calls; every call rebuilds its buckets from scratch.

use chrono::{NaiveDate, Utc};
use metrics::counter;
use serde::Serialize;
use serde_json::Value;

use crate::aggregate::{self, ActionOutcomes, NamedAmount, NamedValue, PriorityCounts};
use crate::aggregate::{ResolutionCounts, StageTiming, UpsellCounts};
use crate::classify;
use crate::config::EngineConfig;
use crate::deal::DealRecord;
use crate::metrics::ensure_metrics_described;
use crate::select::{self, DealSummary};
use crate::shape;
use crate::signal::Signal;
use crate::taxonomy::ResolutionStatus;

/// Every aggregate the dashboard renders, computed in one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub deal_count: usize,
    pub resolution_status: ResolutionCounts,
    pub upsell_opportunities: UpsellCounts,
    pub priority_actions: PriorityCounts,
    pub objection_types: Vec<NamedValue>,
    pub confidence: Vec<NamedValue>,
    pub action_verbs: Vec<NamedValue>,
    pub signal_types: Vec<NamedValue>,
    pub deal_stage_timeline: Vec<StageTiming>,
    pub stage_amounts: Vec<NamedAmount>,
    pub amount_by_owner: Vec<NamedAmount>,
    pub action_outcomes: ActionOutcomes,
}

/// Engine bound to one configuration snapshot.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    cfg: EngineConfig,
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn normalize_signals(&self, raw: &Value) -> Vec<Signal> {
        shape::normalize_signals(raw, Vec::new())
    }

    pub fn classify_resolution(&self, signal: &Signal) -> Option<ResolutionStatus> {
        classify::classify_resolution(signal)
    }

    pub fn aggregate_resolution_status(&self, deals: &[DealRecord]) -> ResolutionCounts {
        aggregate::aggregate_resolution_status(deals)
    }

    pub fn aggregate_upsell_opportunities(&self, deals: &[DealRecord]) -> UpsellCounts {
        aggregate::aggregate_upsell_opportunities(deals)
    }

    pub fn aggregate_priority_actions(&self, deals: &[DealRecord]) -> PriorityCounts {
        aggregate::aggregate_priority_actions(deals)
    }

    pub fn aggregate_objection_types(&self, deals: &[DealRecord]) -> Vec<NamedValue> {
        aggregate::aggregate_objection_types(deals)
    }

    pub fn aggregate_confidence(&self, deals: &[DealRecord]) -> Vec<NamedValue> {
        aggregate::aggregate_confidence(deals, &self.cfg)
    }

    pub fn aggregate_action_verbs(&self, deals: &[DealRecord]) -> Vec<NamedValue> {
        aggregate::aggregate_action_verbs(deals, &self.cfg)
    }

    pub fn aggregate_signal_types(&self, deals: &[DealRecord]) -> Vec<NamedValue> {
        aggregate::aggregate_signal_types(deals)
    }

    /// Stage timeline as of today (UTC).
    pub fn aggregate_deal_stage_timeline(&self, deals: &[DealRecord]) -> Vec<StageTiming> {
        self.aggregate_deal_stage_timeline_as_of(deals, Utc::now().date_naive())
    }

    pub fn aggregate_deal_stage_timeline_as_of(
        &self,
        deals: &[DealRecord],
        as_of: NaiveDate,
    ) -> Vec<StageTiming> {
        aggregate::aggregate_deal_stage_timeline(deals, &self.cfg, as_of)
    }

    pub fn aggregate_stage_amounts(&self, deals: &[DealRecord]) -> Vec<NamedAmount> {
        aggregate::aggregate_stage_amounts(deals, &self.cfg)
    }

    pub fn aggregate_amount_by_owner(&self, deals: &[DealRecord]) -> Vec<NamedAmount> {
        aggregate::aggregate_amount_by_owner(deals)
    }

    pub fn aggregate_action_outcomes(&self, deals: &[DealRecord]) -> ActionOutcomes {
        aggregate::aggregate_action_outcomes(deals)
    }

    pub fn select_primary_signal(&self, deal: &DealRecord) -> Option<Signal> {
        select::select_primary_signal(deal)
    }

    pub fn summarize_deals(&self, deals: &[DealRecord]) -> Vec<DealSummary> {
        deals.iter().map(select::summarize_deal).collect()
    }

    pub fn dashboard(&self, deals: &[DealRecord]) -> Dashboard {
        self.dashboard_as_of(deals, Utc::now().date_naive())
    }

    pub fn dashboard_as_of(&self, deals: &[DealRecord], as_of: NaiveDate) -> Dashboard {
        ensure_metrics_described();
        counter!("engine_deals_processed_total").increment(deals.len() as u64);

        Dashboard {
            deal_count: deals.len(),
            resolution_status: self.aggregate_resolution_status(deals),
            upsell_opportunities: self.aggregate_upsell_opportunities(deals),
            priority_actions: self.aggregate_priority_actions(deals),
            objection_types: self.aggregate_objection_types(deals),
            confidence: self.aggregate_confidence(deals),
            action_verbs: self.aggregate_action_verbs(deals),
            signal_types: self.aggregate_signal_types(deals),
            deal_stage_timeline: self.aggregate_deal_stage_timeline_as_of(deals, as_of),
            stage_amounts: self.aggregate_stage_amounts(deals),
            amount_by_owner: self.aggregate_amount_by_owner(deals),
            action_outcomes: self.aggregate_action_outcomes(deals),
        }
    }
}
