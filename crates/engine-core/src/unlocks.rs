//! Benefit unlock evaluator: a pure rule engine over accumulated run
//! state. Recomputed every tick; the session keeps flags one-way so
//! re-unlocking is a no-op at the call site.

use std::collections::BTreeMap;

use contracts::{BenefitId, RecoveryRules};

/// Read-only view of the run state the unlock rules consume.
#[derive(Debug, Clone, Copy)]
pub struct UnlockView<'a> {
    pub correct_by_tag: &'a BTreeMap<String, u64>,
    pub max_streak: u32,
    pub recovered_from_dip: bool,
    pub session_ended: bool,
    /// Longest stretch the safety meter has held at or above the
    /// sustained threshold.
    pub longest_safety_sustained_ms: u64,
}

fn tag_total(counts: &BTreeMap<String, u64>, tags: &[&str]) -> u64 {
    tags.iter()
        .map(|tag| counts.get(*tag).copied().unwrap_or(0))
        .sum()
}

pub fn evaluate(view: &UnlockView<'_>, rules: &RecoveryRules) -> BTreeMap<BenefitId, bool> {
    let mut unlocked = BTreeMap::new();

    // Legal protection: two correct answers across pay/paperwork/discipline.
    unlocked.insert(
        BenefitId::Legal,
        tag_total(view.correct_by_tag, &["pay", "paperwork", "discipline"]) >= 2,
    );

    // Strike assistance: one correct strike answer plus a streak of 3 at
    // any point in the run.
    unlocked.insert(
        BenefitId::Strike,
        tag_total(view.correct_by_tag, &["strike"]) >= 1 && view.max_streak >= 3,
    );

    // Disciplinary/lockout support: two correct discipline or
    // discrimination answers, or the meter-variant path — safety held
    // high for long enough.
    let disciplinary_by_tags =
        tag_total(view.correct_by_tag, &["discipline", "discrimination"]) >= 2;
    let disciplinary_by_meter = view.longest_safety_sustained_ms >= rules.sustained_safety_ms;
    unlocked.insert(
        BenefitId::Disciplinary,
        disciplinary_by_tags || disciplinary_by_meter,
    );

    // Leisure accident insurance: one correct leisure answer.
    unlocked.insert(
        BenefitId::Leisure,
        tag_total(view.correct_by_tag, &["leisure"]) >= 1,
    );

    // Extraordinary emergencies: recovered after a dip.
    unlocked.insert(BenefitId::Emergency, view.recovered_from_dip);

    // Death assistance: end of run only, shown without fanfare.
    unlocked.insert(BenefitId::Death, view.session_ended);

    unlocked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(&str, u64)]) -> BTreeMap<String, u64> {
        entries
            .iter()
            .map(|(tag, n)| (tag.to_string(), *n))
            .collect()
    }

    fn base_view(counts: &BTreeMap<String, u64>) -> UnlockView<'_> {
        UnlockView {
            correct_by_tag: counts,
            max_streak: 0,
            recovered_from_dip: false,
            session_ended: false,
            longest_safety_sustained_ms: 0,
        }
    }

    #[test]
    fn fresh_run_unlocks_nothing() {
        let counts = BTreeMap::new();
        let flags = evaluate(&base_view(&counts), &RecoveryRules::default());
        assert_eq!(flags.len(), BenefitId::ALL.len());
        assert!(flags.values().all(|v| !*v));
    }

    #[test]
    fn legal_needs_two_correct_across_its_tags() {
        let rules = RecoveryRules::default();
        let one = counts(&[("pay", 1)]);
        assert!(!evaluate(&base_view(&one), &rules)[&BenefitId::Legal]);

        let split = counts(&[("pay", 1), ("paperwork", 1)]);
        assert!(evaluate(&base_view(&split), &rules)[&BenefitId::Legal]);
    }

    #[test]
    fn strike_needs_both_tag_and_streak() {
        let rules = RecoveryRules::default();
        let tags = counts(&[("strike", 1)]);

        let mut view = base_view(&tags);
        assert!(!evaluate(&view, &rules)[&BenefitId::Strike]);

        view.max_streak = 3;
        assert!(evaluate(&view, &rules)[&BenefitId::Strike]);

        let empty = BTreeMap::new();
        let mut streak_only = base_view(&empty);
        streak_only.max_streak = 5;
        assert!(!evaluate(&streak_only, &rules)[&BenefitId::Strike]);
    }

    #[test]
    fn disciplinary_unlocks_by_tags_or_sustained_safety() {
        let rules = RecoveryRules::default();
        let tags = counts(&[("discipline", 1), ("discrimination", 1)]);
        assert!(evaluate(&base_view(&tags), &rules)[&BenefitId::Disciplinary]);

        let empty = BTreeMap::new();
        let mut view = base_view(&empty);
        view.longest_safety_sustained_ms = rules.sustained_safety_ms;
        assert!(evaluate(&view, &rules)[&BenefitId::Disciplinary]);

        view.longest_safety_sustained_ms = rules.sustained_safety_ms - 1;
        assert!(!evaluate(&view, &rules)[&BenefitId::Disciplinary]);
    }

    #[test]
    fn emergency_follows_the_recovery_flag() {
        let rules = RecoveryRules::default();
        let empty = BTreeMap::new();
        let mut view = base_view(&empty);
        assert!(!evaluate(&view, &rules)[&BenefitId::Emergency]);
        view.recovered_from_dip = true;
        assert!(evaluate(&view, &rules)[&BenefitId::Emergency]);
    }

    #[test]
    fn death_is_false_until_the_session_ends() {
        let rules = RecoveryRules::default();
        let empty = BTreeMap::new();
        let mut view = base_view(&empty);
        view.max_streak = 99;
        view.recovered_from_dip = true;
        assert!(!evaluate(&view, &rules)[&BenefitId::Death]);
        view.session_ended = true;
        assert!(evaluate(&view, &rules)[&BenefitId::Death]);
    }
}
