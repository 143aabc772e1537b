//! v1 cross-boundary contracts for the session engine, CLI host, and any
//! external presentation layer.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod serde_u32_string;

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Default session length in milliseconds (one timed run).
pub const DEFAULT_SESSION_MS: u64 = 60_000;

/// Player role used for catalogue weighting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Factory,
    Technician,
    Engineer,
    Logistics,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Factory,
        Role::Technician,
        Role::Engineer,
        Role::Logistics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Factory => "factory",
            Role::Technician => "technician",
            Role::Engineer => "engineer",
            Role::Logistics => "logistics",
        }
    }
}

/// Closed set of player responses. `Fair` and `Shortcut` are the quiz
/// responses; `Stop` is the hazard response used by task-runner content.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Fair,
    Shortcut,
    Stop,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Fair, Action::Shortcut, Action::Stop];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Fair => "fair",
            Action::Shortcut => "shortcut",
            Action::Stop => "stop",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed per-meter deltas. Missing fields deserialize as zero change.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectVector {
    #[serde(default)]
    pub performance: i64,
    #[serde(default)]
    pub quality: i64,
    #[serde(default)]
    pub safety: i64,
    #[serde(default)]
    pub energy: i64,
}

impl EffectVector {
    pub fn uniform(delta: i64) -> Self {
        Self {
            performance: delta,
            quality: delta,
            safety: delta,
            energy: delta,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.performance == 0 && self.quality == 0 && self.safety == 0 && self.energy == 0
    }
}

/// One schedulable unit of content. Immutable from the engine's point of
/// view; display text lives with the presentation layer, keyed by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentItem {
    pub id: String,
    pub correct_action: Action,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub weight_by_role: BTreeMap<Role, u32>,
    /// Declared positive meter effect applied on a correct answer under
    /// meter policies. Absent means no declared effect.
    #[serde(default)]
    pub effects: Option<EffectVector>,
}

impl ContentItem {
    /// Selection weight for a role; unknown roles default to 1.
    pub fn weight_for(&self, role: Role) -> u32 {
        self.weight_by_role.get(&role).copied().unwrap_or(1)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MeterKind {
    Performance,
    Quality,
    Safety,
    Energy,
}

impl MeterKind {
    pub const ALL: [MeterKind; 4] = [
        MeterKind::Performance,
        MeterKind::Quality,
        MeterKind::Safety,
        MeterKind::Energy,
    ];

    /// Critical meters end the run when they reach zero.
    pub fn is_critical(&self) -> bool {
        matches!(self, MeterKind::Safety | MeterKind::Energy)
    }
}

/// Current meter values, each in [0, 100].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MeterSnapshot {
    pub performance: i64,
    pub quality: i64,
    pub safety: i64,
    pub energy: i64,
}

/// Which accumulator the decision resolver feeds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPolicy {
    ScoreOnly,
    MeterOnly,
    Hybrid,
}

impl DecisionPolicy {
    pub fn tracks_score(&self) -> bool {
        matches!(self, DecisionPolicy::ScoreOnly | DecisionPolicy::Hybrid)
    }

    pub fn tracks_meters(&self) -> bool {
        matches!(self, DecisionPolicy::MeterOnly | DecisionPolicy::Hybrid)
    }
}

/// Per-item decision window. The ramp shrinks linearly with session
/// proportion elapsed; difficulty follows the clock, not the score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionWindow {
    Fixed { ms: u64 },
    Ramp { open_ms: u64, close_ms: u64 },
}

impl DecisionWindow {
    /// Window duration at `progress` (session proportion elapsed, clamped
    /// to [0, 1]).
    pub fn duration_at(&self, progress: f64) -> u64 {
        match *self {
            DecisionWindow::Fixed { ms } => ms,
            DecisionWindow::Ramp { open_ms, close_ms } => {
                let p = progress.clamp(0.0, 1.0);
                let open = open_ms as f64;
                let close = close_ms as f64;
                (open + (close - open) * p).round() as u64
            }
        }
    }

    pub fn default_for(policy: DecisionPolicy) -> Self {
        match policy {
            DecisionPolicy::ScoreOnly => DecisionWindow::Fixed { ms: 3_000 },
            DecisionPolicy::MeterOnly | DecisionPolicy::Hybrid => DecisionWindow::Ramp {
                open_ms: 5_000,
                close_ms: 3_500,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoringRules {
    pub score_correct: i64,
    pub score_wrong: i64,
    pub streak_bonus_multiplier: i64,
    pub speed_bonus: i64,
    pub speed_bonus_threshold_ms: u64,
    /// Flat damage applied to every meter on a wrong answer or timeout
    /// under meter policies.
    pub wrong_meter_penalty: i64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            score_correct: 100,
            score_wrong: -50,
            streak_bonus_multiplier: 15,
            speed_bonus: 25,
            speed_bonus_threshold_ms: 1_000,
            wrong_meter_penalty: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecoveryRules {
    /// Consecutive wrong answers that trip the dip.
    pub trip_wrong_streak: u32,
    /// Consecutive correct answers that complete a recovery.
    pub recover_correct_streak: u32,
    /// A meter below this value counts as a dip.
    pub meter_low: i64,
    /// A dipped meter rising to this value counts as a recovery.
    pub meter_high: i64,
    /// Safety-meter level that accrues sustained time.
    pub sustained_safety_threshold: i64,
    /// Sustained time at or above the threshold that satisfies the
    /// meter-variant unlock path.
    pub sustained_safety_ms: u64,
}

impl Default for RecoveryRules {
    fn default() -> Self {
        Self {
            trip_wrong_streak: 2,
            recover_correct_streak: 3,
            meter_low: 30,
            meter_high: 50,
            sustained_safety_threshold: 70,
            sustained_safety_ms: 15_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    pub schema_version: String,
    pub run_id: String,
    #[serde(with = "serde_u32_string")]
    pub seed: u32,
    pub role: Role,
    pub policy: DecisionPolicy,
    pub session_ms: u64,
    pub decision_window: DecisionWindow,
    pub bag_size: usize,
    /// Refill when the cursor is within this many slots of the bag end.
    pub bag_refill_margin: usize,
    pub max_pick_attempts: u32,
    /// Rolling answer-history length the picker keeps.
    pub answer_history_len: usize,
    /// Candidate rejected when the last this-many delivered actions all
    /// match its correct action.
    pub anti_streak_window: usize,
    /// Hard cap on consecutive `Stop` hazard deliveries.
    pub max_consecutive_hazard: usize,
    pub initial_meter: i64,
    pub scoring: ScoringRules,
    pub recovery: RecoveryRules,
    pub notes: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: "run_local_001".to_string(),
            seed: 1337,
            role: Role::Factory,
            policy: DecisionPolicy::ScoreOnly,
            session_ms: DEFAULT_SESSION_MS,
            decision_window: DecisionWindow::default_for(DecisionPolicy::ScoreOnly),
            bag_size: 30,
            bag_refill_margin: 2,
            max_pick_attempts: 20,
            answer_history_len: 5,
            anti_streak_window: 3,
            max_consecutive_hazard: 2,
            initial_meter: 60,
            scoring: ScoringRules::default(),
            recovery: RecoveryRules::default(),
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Running,
    AwaitingNext,
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunStatus {
    pub schema_version: String,
    pub run_id: String,
    pub elapsed_ms: u64,
    pub session_ms: u64,
    pub mode: RunMode,
    pub items_delivered: u64,
}

impl RunStatus {
    pub fn remaining_ms(&self) -> u64 {
        self.session_ms.saturating_sub(self.elapsed_ms)
    }

    pub fn is_complete(&self) -> bool {
        self.mode == RunMode::Finished
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={} elapsed={}ms/{}ms mode={:?} items_delivered={}",
            self.run_id, self.elapsed_ms, self.session_ms, self.mode, self.items_delivered
        )
    }
}

/// Informational rewards unlocked by run-state predicates. `Death` is
/// end-of-run only and is never announced mid-session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BenefitId {
    Legal,
    Strike,
    Disciplinary,
    Leisure,
    Emergency,
    Death,
}

impl BenefitId {
    pub const ALL: [BenefitId; 6] = [
        BenefitId::Legal,
        BenefitId::Strike,
        BenefitId::Disciplinary,
        BenefitId::Leisure,
        BenefitId::Emergency,
        BenefitId::Death,
    ];

    pub fn unlocks_mid_session(&self) -> bool {
        !matches!(self, BenefitId::Death)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RunStarted,
    ItemPresented,
    ActionResolved,
    ItemTimedOut,
    BenefitUnlocked,
    RecoveryTripped,
    RecoveryCompleted,
    MeterCritical,
    RunEnded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub schema_version: String,
    pub run_id: String,
    /// Host-clock timestamp the event was recorded at.
    pub at_ms: u64,
    pub event_id: String,
    /// Monotonic per-run sequence; total order of the event log.
    pub sequence: u64,
    pub event_type: EventType,
    pub details: Option<Value>,
}

/// Emitted exactly once per run, at end detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub schema_version: String,
    pub run_id: String,
    pub role: Role,
    pub policy: DecisionPolicy,
    pub duration_ms_used: u64,
    pub answered: u64,
    pub correct: u64,
    pub wrong: u64,
    pub max_streak: u32,
    pub final_score: Option<i64>,
    pub final_meters: Option<MeterSnapshot>,
    pub benefits_unlocked: BTreeMap<BenefitId, bool>,
    pub correct_by_tag: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub schema_version: String,
    pub run_id: String,
    pub at_ms: u64,
    pub snapshot_id: String,
    pub run_state: Value,
    pub picker_state: Value,
    pub benefit_flags: Value,
}
