//! The run engine: session clock, decision windows, delta merging, event
//! log, unlock edges, and end detection.
//!
//! One `GameSession` is one run. The host owns the tick cadence and the
//! monotonic clock; the session never reads time on its own. Dropping the
//! session cancels the run — there is nothing to undo.

use std::collections::BTreeMap;

use contracts::{
    BenefitId, ContentItem, Event, EventType, RunConfig, RunMode, RunStatus, RunSummary,
    SCHEMA_VERSION_V1,
};
use serde_json::Value;

use crate::catalogue::Catalogue;
use crate::meters::MeterBoard;
use crate::picker::ItemPicker;
use crate::recovery::RecoveryTracker;
use crate::rng::SessionRng;

mod snapshot;
mod step;

/// The item currently on screen, with its absolute deadline.
#[derive(Debug, Clone)]
pub struct PresentedItem {
    pub item: ContentItem,
    pub presented_at_ms: u64,
    pub deadline_at_ms: u64,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    config: RunConfig,
    status: RunStatus,
    rng: SessionRng,
    picker: ItemPicker,
    meters: MeterBoard,
    score: i64,
    streak: u32,
    max_streak: u32,
    answered: u64,
    correct_count: u64,
    wrong_count: u64,
    wrong_streak: u32,
    tag_counts: BTreeMap<String, u64>,
    correct_by_tag: BTreeMap<String, u64>,
    recovery: RecoveryTracker,
    benefit_flags: BTreeMap<BenefitId, bool>,
    current: Option<PresentedItem>,
    started_at_ms: Option<u64>,
    safety_sustained_since_ms: Option<u64>,
    longest_safety_sustained_ms: u64,
    event_log: Vec<Event>,
    next_event_sequence: u64,
    summary: Option<RunSummary>,
}

impl GameSession {
    /// Build a session for one run. Nothing happens until `start`.
    pub fn new(config: RunConfig, catalogue: &Catalogue) -> Self {
        let status = RunStatus {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: config.run_id.clone(),
            elapsed_ms: 0,
            session_ms: config.session_ms,
            mode: RunMode::Running,
            items_delivered: 0,
        };
        let picker = ItemPicker::new(&config, catalogue);
        let rng = SessionRng::new(config.seed);
        let meters = MeterBoard::new(config.initial_meter);
        let recovery = RecoveryTracker::new(config.recovery);
        let benefit_flags = BenefitId::ALL.iter().map(|id| (*id, false)).collect();

        Self {
            config,
            status,
            rng,
            picker,
            meters,
            score: 0,
            streak: 0,
            max_streak: 0,
            answered: 0,
            correct_count: 0,
            wrong_count: 0,
            wrong_streak: 0,
            tag_counts: BTreeMap::new(),
            correct_by_tag: BTreeMap::new(),
            recovery,
            benefit_flags,
            current: None,
            started_at_ms: None,
            safety_sustained_since_ms: None,
            longest_safety_sustained_ms: 0,
            event_log: Vec::new(),
            next_event_sequence: 0,
            summary: None,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn run_id(&self) -> &str {
        &self.status.run_id
    }

    pub fn events(&self) -> &[Event] {
        &self.event_log
    }

    /// `Some` exactly from the finishing tick onward; built once.
    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_complete()
    }

    pub fn current_item(&self) -> Option<&PresentedItem> {
        self.current.as_ref()
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn max_streak(&self) -> u32 {
        self.max_streak
    }

    pub fn meters(&self) -> &MeterBoard {
        &self.meters
    }

    pub fn benefit_flags(&self) -> &BTreeMap<BenefitId, bool> {
        &self.benefit_flags
    }

    fn push_event(&mut self, at_ms: u64, event_type: EventType, details: Option<Value>) {
        let sequence = self.next_event_sequence;
        self.next_event_sequence += 1;
        self.event_log.push(Event {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: self.status.run_id.clone(),
            at_ms,
            event_id: format!("evt:{}:{}", self.status.run_id, sequence),
            sequence,
            event_type,
            details,
        });
    }
}
