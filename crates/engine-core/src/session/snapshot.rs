use contracts::{Snapshot, SCHEMA_VERSION_V1};
use serde_json::json;

use super::GameSession;

impl GameSession {
    /// Point-in-time inspection blocks for hosts and tooling. Snapshots
    /// are derived views; taking one never mutates the run.
    pub fn snapshot_for_now(&self, at_ms: u64) -> Snapshot {
        let run_state = json!({
            "mode": self.status.mode,
            "elapsed_ms": self.status.elapsed_ms,
            "remaining_ms": self.status.remaining_ms(),
            "items_delivered": self.status.items_delivered,
            "score": self.score,
            "streak": self.streak,
            "max_streak": self.max_streak,
            "answered": self.answered,
            "correct": self.correct_count,
            "wrong": self.wrong_count,
            "wrong_streak": self.wrong_streak,
            "meters": self.meters.snapshot(),
            "current_item_id": self.current.as_ref().map(|p| p.item.id.clone()),
            "recovered_from_dip": self.recovery.recovered(),
            "longest_safety_sustained_ms": self.longest_safety_sustained_ms,
        });

        Snapshot {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: self.status.run_id.clone(),
            at_ms,
            snapshot_id: format!("snap:{}:{}", self.status.run_id, at_ms),
            run_state,
            picker_state: self.picker.state_json(),
            benefit_flags: json!(self.benefit_flags),
        }
    }
}
