use contracts::{Action, EventType, MeterKind, MeterSnapshot, RunMode, RunSummary};
use serde_json::json;

use super::GameSession;
use crate::resolver::{self, Resolution};
use crate::unlocks::{self, UnlockView};

impl GameSession {
    /// Capture the start instant and present the first item. Calling
    /// `start` twice is a no-op — one session is one run; a replay means
    /// constructing a fresh session with a new nonce-derived seed.
    pub fn start(&mut self, now_ms: u64) {
        if self.started_at_ms.is_some() {
            return;
        }
        self.started_at_ms = Some(now_ms);
        self.status.mode = RunMode::Running;
        self.picker.reset();
        self.push_event(
            now_ms,
            EventType::RunStarted,
            Some(json!({
                "seed": self.config.seed.to_string(),
                "role": self.config.role.as_str(),
                "policy": self.config.policy,
                "session_ms": self.config.session_ms,
            })),
        );
        self.present_next(now_ms);
    }

    /// One host tick. Recomputes the clock, resolves an expired deadline,
    /// advances the recovery machine, re-evaluates unlocks, and runs end
    /// detection. Safe to call at any cadence; after the run has finished
    /// every further tick is a no-op.
    pub fn tick(&mut self, now_ms: u64) {
        let Some(started) = self.started_at_ms else {
            return;
        };
        if self.is_finished() {
            return;
        }

        self.status.elapsed_ms = now_ms.saturating_sub(started);

        // Deadline check is suspended during the between-items pause.
        if self.status.mode == RunMode::Running {
            let expired = self
                .current
                .as_ref()
                .map_or(false, |presented| now_ms >= presented.deadline_at_ms);
            if expired {
                self.resolve_timeout(now_ms);
            }
        }

        self.track_sustained_safety(now_ms);
        self.observe_recovery(now_ms);
        self.refresh_unlocks(now_ms, false);

        let time_exhausted = self.status.elapsed_ms >= self.config.session_ms;
        let meter_depleted =
            self.config.policy.tracks_meters() && self.meters.any_critical_depleted();
        if meter_depleted && !time_exhausted {
            self.push_event(
                now_ms,
                EventType::MeterCritical,
                Some(json!({ "meters": self.meters.snapshot() })),
            );
        }
        if time_exhausted || meter_depleted {
            self.finish(now_ms);
        }
    }

    /// Resolve the current item against a player action. Returns `None`
    /// when there is nothing to resolve (no item on screen, between
    /// items, or already finished).
    pub fn submit(&mut self, action: Action, at_ms: u64) -> Option<Resolution> {
        if self.is_finished() || self.status.mode != RunMode::Running {
            return None;
        }
        let presented = self.current.take()?;
        let response_time_ms = at_ms.saturating_sub(presented.presented_at_ms);
        let resolution = resolver::resolve(
            &presented.item,
            action,
            self.streak,
            response_time_ms,
            &self.config.scoring,
            self.config.policy,
        );
        self.merge_resolution(&presented.item, &resolution);
        self.push_event(
            at_ms,
            EventType::ActionResolved,
            Some(json!({
                "item_id": presented.item.id,
                "action": action.as_str(),
                "correct": resolution.correct,
                "score_delta": resolution.score_delta,
                "response_time_ms": response_time_ms,
                "speed_bonus": resolution.speed_bonus,
                "streak": resolution.next_streak,
            })),
        );
        self.status.mode = RunMode::AwaitingNext;
        Some(resolution)
    }

    /// Host-driven resumption from the between-items pause: the engine
    /// never self-resumes.
    pub fn advance_next(&mut self, now_ms: u64) {
        if self.is_finished() || self.status.mode != RunMode::AwaitingNext {
            return;
        }
        self.status.mode = RunMode::Running;
        self.present_next(now_ms);
    }

    fn resolve_timeout(&mut self, now_ms: u64) {
        let Some(presented) = self.current.take() else {
            return;
        };
        let resolution =
            resolver::resolve_timeout(&presented.item, &self.config.scoring, self.config.policy);
        self.merge_resolution(&presented.item, &resolution);
        self.push_event(
            now_ms,
            EventType::ItemTimedOut,
            Some(json!({
                "item_id": presented.item.id,
                "score_delta": resolution.score_delta,
            })),
        );
        self.status.mode = RunMode::AwaitingNext;
    }

    fn present_next(&mut self, now_ms: u64) {
        let Some(item) = self.picker.pick_next(&mut self.rng) else {
            // Exhausted or empty role pool: idle until the clock ends.
            self.current = None;
            return;
        };
        let elapsed_ms = self
            .started_at_ms
            .map_or(0, |started| now_ms.saturating_sub(started));
        let progress = if self.config.session_ms == 0 {
            1.0
        } else {
            elapsed_ms as f64 / self.config.session_ms as f64
        };
        let window_ms = self.config.decision_window.duration_at(progress);
        self.status.items_delivered += 1;
        self.push_event(
            now_ms,
            EventType::ItemPresented,
            Some(json!({
                "item_id": item.id,
                "window_ms": window_ms,
            })),
        );
        self.current = Some(super::PresentedItem {
            item,
            presented_at_ms: now_ms,
            deadline_at_ms: now_ms.saturating_add(window_ms),
        });
    }

    fn merge_resolution(&mut self, item: &contracts::ContentItem, resolution: &Resolution) {
        self.score = (self.score + resolution.score_delta).max(0);
        self.meters.apply(&resolution.meter_effects);
        self.streak = resolution.next_streak;
        self.max_streak = self.max_streak.max(self.streak);
        self.answered += 1;
        if resolution.correct {
            self.correct_count += 1;
            self.wrong_streak = 0;
        } else {
            self.wrong_count += 1;
            self.wrong_streak += 1;
        }
        for tag in &item.tags {
            *self.tag_counts.entry(tag.clone()).or_insert(0) += 1;
            if resolution.correct {
                *self.correct_by_tag.entry(tag.clone()).or_insert(0) += 1;
            }
        }
    }

    fn track_sustained_safety(&mut self, now_ms: u64) {
        let threshold = self.config.recovery.sustained_safety_threshold;
        if self.meters.get(MeterKind::Safety) >= threshold {
            let since = *self.safety_sustained_since_ms.get_or_insert(now_ms);
            self.longest_safety_sustained_ms = self
                .longest_safety_sustained_ms
                .max(now_ms.saturating_sub(since));
        } else {
            self.safety_sustained_since_ms = None;
        }
    }

    fn observe_recovery(&mut self, now_ms: u64) {
        let (just_tripped, just_recovered) =
            self.recovery
                .observe(self.wrong_streak, self.streak, self.meters.min_value());
        if just_tripped {
            self.push_event(
                now_ms,
                EventType::RecoveryTripped,
                Some(json!({
                    "wrong_streak": self.wrong_streak,
                    "min_meter": self.meters.min_value(),
                })),
            );
        }
        if just_recovered {
            self.push_event(now_ms, EventType::RecoveryCompleted, None);
        }
    }

    /// Re-run the unlock evaluator and merge one-way: an unlocked benefit
    /// stays unlocked, and only rising edges emit events. The `Death`
    /// unlock is never announced — it simply appears in the summary.
    fn refresh_unlocks(&mut self, now_ms: u64, session_ended: bool) {
        let view = UnlockView {
            correct_by_tag: &self.correct_by_tag,
            max_streak: self.max_streak,
            recovered_from_dip: self.recovery.recovered(),
            session_ended,
            longest_safety_sustained_ms: self.longest_safety_sustained_ms,
        };
        let evaluated = unlocks::evaluate(&view, &self.config.recovery);
        for (benefit, unlocked) in evaluated {
            if !unlocked {
                continue;
            }
            let known = self.benefit_flags.entry(benefit).or_insert(false);
            if *known {
                continue;
            }
            *known = true;
            if benefit.unlocks_mid_session() {
                self.push_event(
                    now_ms,
                    EventType::BenefitUnlocked,
                    Some(json!({ "benefit": benefit })),
                );
            }
        }
    }

    /// End the run exactly once. Later ticks (the host keeps firing them
    /// until it tears the timer down) see the summary already built and do
    /// nothing.
    fn finish(&mut self, now_ms: u64) {
        if self.summary.is_some() {
            return;
        }
        self.status.mode = RunMode::Finished;
        self.current = None;
        self.refresh_unlocks(now_ms, true);

        let final_score = self.config.policy.tracks_score().then_some(self.score);
        let final_meters: Option<MeterSnapshot> = self
            .config
            .policy
            .tracks_meters()
            .then(|| self.meters.snapshot());
        let summary = RunSummary {
            schema_version: contracts::SCHEMA_VERSION_V1.to_string(),
            run_id: self.status.run_id.clone(),
            role: self.config.role,
            policy: self.config.policy,
            duration_ms_used: self.status.elapsed_ms.min(self.config.session_ms),
            answered: self.answered,
            correct: self.correct_count,
            wrong: self.wrong_count,
            max_streak: self.max_streak,
            final_score,
            final_meters,
            benefits_unlocked: self.benefit_flags.clone(),
            correct_by_tag: self.correct_by_tag.clone(),
        };
        self.push_event(
            now_ms,
            EventType::RunEnded,
            Some(json!({
                "answered": summary.answered,
                "correct": summary.correct,
                "wrong": summary.wrong,
                "max_streak": summary.max_streak,
                "final_score": summary.final_score,
            })),
        );
        self.summary = Some(summary);
    }
}
