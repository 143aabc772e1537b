//! Pure decision resolution.
//!
//! `resolve` and `resolve_timeout` compute deltas only; the session merges
//! them into run state. One resolver serves the quiz-scoring and
//! meter-based variants — the policy selects which delta channels carry
//! weight, the arithmetic never branches on anything else.

use contracts::{Action, ContentItem, DecisionPolicy, EffectVector, ScoringRules};

/// Outcome of resolving one item against one player action (or the lack
/// of one). Score deltas may be negative; the session floors the running
/// score at zero when merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub correct: bool,
    pub score_delta: i64,
    pub meter_effects: EffectVector,
    pub next_streak: u32,
    pub speed_bonus: bool,
}

pub fn resolve(
    item: &ContentItem,
    action: Action,
    prior_streak: u32,
    response_time_ms: u64,
    rules: &ScoringRules,
    policy: DecisionPolicy,
) -> Resolution {
    let correct = action == item.correct_action;
    if !correct {
        return incorrect_resolution(rules, policy);
    }

    let next_streak = prior_streak + 1;
    let speed_bonus = response_time_ms <= rules.speed_bonus_threshold_ms;

    let score_delta = if policy.tracks_score() {
        let mut delta = rules.score_correct + rules.streak_bonus_multiplier * i64::from(next_streak);
        if speed_bonus {
            delta += rules.speed_bonus;
        }
        delta
    } else {
        0
    };

    let meter_effects = if policy.tracks_meters() {
        item.effects.unwrap_or_default()
    } else {
        EffectVector::default()
    };

    Resolution {
        correct: true,
        score_delta,
        meter_effects,
        next_streak,
        speed_bonus,
    }
}

/// Deadline expiry resolves exactly like a wrong answer, with no speed
/// bonus possible. Guarantees the clock and scheduler never stall waiting
/// for input.
pub fn resolve_timeout(
    _item: &ContentItem,
    rules: &ScoringRules,
    policy: DecisionPolicy,
) -> Resolution {
    incorrect_resolution(rules, policy)
}

fn incorrect_resolution(rules: &ScoringRules, policy: DecisionPolicy) -> Resolution {
    let score_delta = if policy.tracks_score() {
        rules.score_wrong
    } else {
        0
    };
    let meter_effects = if policy.tracks_meters() {
        EffectVector::uniform(-rules.wrong_meter_penalty)
    } else {
        EffectVector::default()
    };
    Resolution {
        correct: false,
        score_delta,
        meter_effects,
        next_streak: 0,
        speed_bonus: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn quiz_item(correct_action: Action) -> ContentItem {
        ContentItem {
            id: "warnstreik-support".to_string(),
            correct_action,
            tags: vec!["strike".to_string()],
            weight_by_role: BTreeMap::new(),
            effects: None,
        }
    }

    fn task_item() -> ContentItem {
        ContentItem {
            id: "gas-leak-alarm".to_string(),
            correct_action: Action::Stop,
            tags: vec!["safety".to_string()],
            weight_by_role: BTreeMap::new(),
            effects: Some(EffectVector {
                safety: 10,
                ..EffectVector::default()
            }),
        }
    }

    #[test]
    fn correct_fast_answer_earns_base_streak_and_speed_bonus() {
        let rules = ScoringRules::default();
        let res = resolve(
            &quiz_item(Action::Fair),
            Action::Fair,
            2,
            800,
            &rules,
            DecisionPolicy::ScoreOnly,
        );
        assert!(res.correct);
        assert!(res.speed_bonus);
        assert_eq!(res.next_streak, 3);
        // 100 base + 15 * 3 streak + 25 speed.
        assert_eq!(res.score_delta, 170);
        assert!(res.meter_effects.is_zero());
    }

    #[test]
    fn slow_correct_answer_gets_no_speed_bonus() {
        let rules = ScoringRules::default();
        let res = resolve(
            &quiz_item(Action::Fair),
            Action::Fair,
            0,
            2_500,
            &rules,
            DecisionPolicy::ScoreOnly,
        );
        assert!(res.correct);
        assert!(!res.speed_bonus);
        assert_eq!(res.score_delta, 115);
    }

    #[test]
    fn wrong_answer_resets_streak_and_costs_points() {
        let rules = ScoringRules::default();
        let res = resolve(
            &quiz_item(Action::Fair),
            Action::Shortcut,
            5,
            300,
            &rules,
            DecisionPolicy::ScoreOnly,
        );
        assert!(!res.correct);
        assert_eq!(res.next_streak, 0);
        assert_eq!(res.score_delta, -50);
        assert!(!res.speed_bonus);
    }

    #[test]
    fn meter_policy_applies_declared_effects_on_correct() {
        let rules = ScoringRules::default();
        let res = resolve(
            &task_item(),
            Action::Stop,
            0,
            1_200,
            &rules,
            DecisionPolicy::MeterOnly,
        );
        assert!(res.correct);
        assert_eq!(res.score_delta, 0);
        assert_eq!(res.meter_effects.safety, 10);
    }

    #[test]
    fn meter_policy_flat_penalty_on_wrong() {
        let rules = ScoringRules::default();
        let res = resolve(
            &task_item(),
            Action::Fair,
            3,
            400,
            &rules,
            DecisionPolicy::MeterOnly,
        );
        assert!(!res.correct);
        assert_eq!(res.meter_effects, EffectVector::uniform(-10));
        assert_eq!(res.next_streak, 0);
    }

    #[test]
    fn hybrid_policy_carries_both_channels() {
        let rules = ScoringRules::default();
        let res = resolve(
            &task_item(),
            Action::Stop,
            0,
            500,
            &rules,
            DecisionPolicy::Hybrid,
        );
        assert_eq!(res.score_delta, 100 + 15 + 25);
        assert_eq!(res.meter_effects.safety, 10);
    }

    #[test]
    fn timeout_is_a_wrong_answer_without_speed_bonus() {
        let rules = ScoringRules::default();
        for policy in [
            DecisionPolicy::ScoreOnly,
            DecisionPolicy::MeterOnly,
            DecisionPolicy::Hybrid,
        ] {
            let res = resolve_timeout(&task_item(), &rules, policy);
            assert!(!res.correct);
            assert!(!res.speed_bonus);
            assert_eq!(res.next_streak, 0);
            assert!(res.score_delta <= 0);
            assert!(res.meter_effects.performance <= 0);
            assert!(res.meter_effects.safety <= 0);
        }
    }

    #[test]
    fn correct_item_without_effects_moves_no_meters() {
        let rules = ScoringRules::default();
        let res = resolve(
            &quiz_item(Action::Fair),
            Action::Fair,
            0,
            500,
            &rules,
            DecisionPolicy::MeterOnly,
        );
        assert!(res.correct);
        assert!(res.meter_effects.is_zero());
    }
}
