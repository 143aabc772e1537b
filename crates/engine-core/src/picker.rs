//! Bag scheduler: weighted, shuffled batches served one item at a time
//! under anti-repeat and answer-balance constraints.
//!
//! The picker is an owned, per-run object. It is constructed by the
//! session, reset at run start, and fed an explicit RNG handle on every
//! call — content order must never depend on hidden state, and no fairness
//! history may leak between runs.

use std::collections::{BTreeSet, VecDeque};

use contracts::{Action, ContentItem, Role, RunConfig};
use serde_json::{json, Value};

use crate::catalogue::Catalogue;
use crate::rng::SessionRng;

#[derive(Debug, Clone)]
pub struct ItemPicker {
    role: Role,
    bag_size: usize,
    refill_margin: usize,
    max_attempts: u32,
    history_len: usize,
    anti_streak_window: usize,
    max_consecutive_hazard: usize,
    /// Role-filtered catalogue with resolved weights. Derived once from
    /// the immutable catalogue; never mutated afterwards.
    pool: Vec<(ContentItem, u32)>,
    /// Indices into `pool`, pre-shuffled.
    bag: Vec<usize>,
    cursor: usize,
    last_item_id: Option<String>,
    recent_actions: VecDeque<Action>,
}

impl ItemPicker {
    pub fn new(config: &RunConfig, catalogue: &Catalogue) -> Self {
        Self {
            role: config.role,
            bag_size: config.bag_size.max(1),
            refill_margin: config.bag_refill_margin,
            max_attempts: config.max_pick_attempts,
            history_len: config.answer_history_len.max(1),
            anti_streak_window: config.anti_streak_window.max(1),
            max_consecutive_hazard: config.max_consecutive_hazard.max(1),
            pool: catalogue.for_role(config.role),
            bag: Vec::new(),
            cursor: 0,
            last_item_id: None,
            recent_actions: VecDeque::new(),
        }
    }

    /// Clear all delivery state. Must be called when a new run starts;
    /// otherwise content order would silently persist across runs.
    pub fn reset(&mut self) {
        self.bag.clear();
        self.cursor = 0;
        self.last_item_id = None;
        self.recent_actions.clear();
    }

    pub fn last_item_id(&self) -> Option<&str> {
        self.last_item_id.as_deref()
    }

    pub fn recent_actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.recent_actions.iter().copied()
    }

    /// Deliver the next item. Returns `None` only when the role pool is
    /// empty — every other degeneracy falls back to best-effort delivery.
    ///
    /// Constraint priority when the rules are jointly unsatisfiable: the
    /// balance rules are soft and give way first; an immediate id repeat
    /// is only delivered once no other id is reachable at all.
    pub fn pick_next(&mut self, rng: &mut SessionRng) -> Option<ContentItem> {
        if self.pool.is_empty() {
            return None;
        }
        if self.bag.is_empty() || self.cursor + self.refill_margin >= self.bag.len() {
            self.refill(rng);
        }
        if self.bag.is_empty() {
            return None;
        }

        if let Some(item) = self.scan(rng, false) {
            return Some(item);
        }
        if let Some(item) = self.scan(rng, true) {
            return Some(item);
        }

        // Exhaustion fallback: availability beats fairness.
        let cursor = self.cursor.min(self.bag.len() - 1);
        let item = self.pool[self.bag[cursor]].0.clone();
        self.record_delivery(&item);
        self.cursor = cursor + 1;
        Some(item)
    }

    /// Bounded retry: swap progressively further candidates into the
    /// cursor slot, refilling at the bag seam for fresh candidates. With
    /// `relaxed` only the no-immediate-repeat rule still rejects.
    fn scan(&mut self, rng: &mut SessionRng, relaxed: bool) -> Option<ContentItem> {
        let mut attempts: u32 = 0;
        while attempts <= self.max_attempts {
            let cursor = self.cursor.min(self.bag.len() - 1);
            let candidate = &self.pool[self.bag[cursor]].0;

            let violates = if relaxed {
                self.last_item_id.as_deref() == Some(candidate.id.as_str())
            } else {
                self.violates_constraints(candidate)
            };
            if !violates {
                let item = candidate.clone();
                self.record_delivery(&item);
                self.cursor = cursor + 1;
                return Some(item);
            }

            let swap_target = cursor + 1 + attempts as usize;
            if swap_target < self.bag.len() {
                self.bag.swap(cursor, swap_target);
            } else {
                self.refill(rng);
            }
            attempts += 1;
        }
        None
    }

    fn violates_constraints(&self, candidate: &ContentItem) -> bool {
        if self.last_item_id.as_deref() == Some(candidate.id.as_str()) {
            return true;
        }

        // Answer balance: reject when the whole recent window already
        // shares the candidate's correct action.
        if self.recent_actions.len() >= self.anti_streak_window
            && self
                .recent_actions
                .iter()
                .rev()
                .take(self.anti_streak_window)
                .all(|a| *a == candidate.correct_action)
        {
            return true;
        }

        // Hard cap on consecutive hazard deliveries.
        if candidate.correct_action == Action::Stop
            && self.recent_actions.len() >= self.max_consecutive_hazard
            && self
                .recent_actions
                .iter()
                .rev()
                .take(self.max_consecutive_hazard)
                .all(|a| *a == Action::Stop)
        {
            return true;
        }

        false
    }

    fn record_delivery(&mut self, item: &ContentItem) {
        self.last_item_id = Some(item.id.clone());
        self.recent_actions.push_back(item.correct_action);
        while self.recent_actions.len() > self.history_len {
            self.recent_actions.pop_front();
        }
    }

    /// Rebuild the bag: weight-expand, shuffle, cut to size, patch any
    /// action kind the cut dropped, shuffle again.
    fn refill(&mut self, rng: &mut SessionRng) {
        let mut expanded = Vec::new();
        for (index, (_, weight)) in self.pool.iter().enumerate() {
            for _ in 0..*weight {
                expanded.push(index);
            }
        }
        rng.shuffle(&mut expanded);
        expanded.truncate(self.bag_size);

        let pool_kinds: BTreeSet<Action> = self
            .pool
            .iter()
            .map(|(item, _)| item.correct_action)
            .collect();
        let bag_kinds: BTreeSet<Action> = expanded
            .iter()
            .map(|index| self.pool[*index].0.correct_action)
            .collect();
        for kind in pool_kinds.difference(&bag_kinds) {
            let candidates: Vec<usize> = self
                .pool
                .iter()
                .enumerate()
                .filter(|(_, (item, _))| item.correct_action == *kind)
                .map(|(index, _)| index)
                .collect();
            if candidates.is_empty() || expanded.is_empty() {
                continue;
            }
            let replacement = candidates[rng.range_usize(candidates.len())];
            let slot = rng.range_usize(expanded.len());
            expanded[slot] = replacement;
        }

        rng.shuffle(&mut expanded);
        self.bag = expanded;
        self.cursor = 0;
    }

    /// Inspection block for session snapshots.
    pub fn state_json(&self) -> Value {
        json!({
            "role": self.role.as_str(),
            "pool_len": self.pool.len(),
            "bag_remaining": self.bag.len().saturating_sub(self.cursor),
            "cursor": self.cursor,
            "last_item_id": self.last_item_id,
            "recent_actions": self
                .recent_actions
                .iter()
                .map(|a| a.as_str())
                .collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::EffectVector;
    use std::collections::BTreeMap;

    fn test_item(id: &str, action: Action) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            correct_action: action,
            tags: vec!["pay".to_string()],
            weight_by_role: BTreeMap::new(),
            effects: None,
        }
    }

    fn picker_with(items: Vec<ContentItem>) -> ItemPicker {
        ItemPicker::new(&RunConfig::default(), &Catalogue::new(items))
    }

    #[test]
    fn no_immediate_repeat_with_two_or_more_items() {
        let mut picker = picker_with(vec![
            test_item("a", Action::Fair),
            test_item("b", Action::Shortcut),
            test_item("c", Action::Fair),
        ]);
        let mut rng = SessionRng::new(7);
        let mut previous: Option<String> = None;
        for _ in 0..100 {
            let item = picker.pick_next(&mut rng).expect("item");
            assert_ne!(previous.as_deref(), Some(item.id.as_str()));
            previous = Some(item.id);
        }
    }

    #[test]
    fn single_item_pool_falls_back_to_repeats() {
        let mut picker = picker_with(vec![test_item("only", Action::Fair)]);
        let mut rng = SessionRng::new(3);
        for _ in 0..10 {
            let item = picker.pick_next(&mut rng).expect("item");
            assert_eq!(item.id, "only");
        }
    }

    #[test]
    fn empty_pool_yields_none() {
        let mut picker = picker_with(Vec::new());
        let mut rng = SessionRng::new(3);
        assert!(picker.pick_next(&mut rng).is_none());
    }

    #[test]
    fn answer_balance_breaks_long_action_runs() {
        let mut items: Vec<ContentItem> = (0..8)
            .map(|i| test_item(&format!("fair-{i}"), Action::Fair))
            .collect();
        for i in 0..8 {
            items.push(test_item(&format!("shortcut-{i}"), Action::Shortcut));
        }
        let mut picker = picker_with(items);
        let mut rng = SessionRng::new(12345);

        let actions: Vec<Action> = (0..40)
            .map(|_| picker.pick_next(&mut rng).expect("item").correct_action)
            .collect();
        for window in actions.windows(4) {
            assert!(
                window.iter().any(|a| *a != window[0]),
                "four consecutive deliveries share action {:?}",
                window[0]
            );
        }
    }

    #[test]
    fn hazard_cap_limits_consecutive_stop_items() {
        let mut items: Vec<ContentItem> = (0..3)
            .map(|i| ContentItem {
                id: format!("stop-{i}"),
                correct_action: Action::Stop,
                tags: vec!["safety".to_string()],
                weight_by_role: BTreeMap::new(),
                effects: Some(EffectVector::uniform(1)),
            })
            .collect();
        for i in 0..5 {
            items.push(test_item(&format!("fair-{i}"), Action::Fair));
        }
        let mut picker = picker_with(items);
        let mut rng = SessionRng::new(99);

        let actions: Vec<Action> = (0..40)
            .map(|_| picker.pick_next(&mut rng).expect("item").correct_action)
            .collect();
        for window in actions.windows(3) {
            assert!(
                window.iter().any(|a| *a != Action::Stop),
                "three consecutive hazard deliveries"
            );
        }
    }

    #[test]
    fn same_seed_reproduces_delivery_order() {
        let deliver = |seed: u32| -> Vec<String> {
            let mut picker = picker_with(
                Catalogue::standard()
                    .items()
                    .to_vec(),
            );
            let mut rng = SessionRng::new(seed);
            (0..25)
                .map(|_| picker.pick_next(&mut rng).expect("item").id)
                .collect()
        };
        assert_eq!(deliver(12345), deliver(12345));
        assert_ne!(deliver(12345), deliver(54321));
    }

    #[test]
    fn reset_restores_first_run_order() {
        let catalogue = Catalogue::standard();
        let mut picker = ItemPicker::new(&RunConfig::default(), &catalogue);

        let mut rng = SessionRng::new(777);
        let first: Vec<String> = (0..15)
            .map(|_| picker.pick_next(&mut rng).expect("item").id)
            .collect();

        picker.reset();
        let mut rng = SessionRng::new(777);
        let second: Vec<String> = (0..15)
            .map(|_| picker.pick_next(&mut rng).expect("item").id)
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn refill_patches_missing_action_kind() {
        // Heavy Fair weighting would starve Shortcut out of a 30-slot bag
        // without the degenerate-pool patch.
        let mut items: Vec<ContentItem> = (0..40)
            .map(|i| {
                let mut item = test_item(&format!("fair-{i}"), Action::Fair);
                item.weight_by_role = Role::ALL.iter().map(|r| (*r, 4)).collect();
                item
            })
            .collect();
        items.push(test_item("lone-shortcut", Action::Shortcut));

        for seed in 0..5 {
            let mut picker = picker_with(items.clone());
            let mut rng = SessionRng::new(seed);
            let kinds: BTreeSet<Action> = (0..150)
                .map(|_| picker.pick_next(&mut rng).expect("item").correct_action)
                .collect();
            assert!(
                kinds.contains(&Action::Shortcut),
                "seed {seed} delivered no shortcut item"
            );
        }
    }
}
