//! Content catalogue: immutable items, per-role weighting, and structural
//! linting.
//!
//! The engine never mutates items. Weighting is the only logic that lives
//! here: each item carries a per-role selection weight (missing role ⇒ 1,
//! explicit 0 ⇒ excluded for that role). Content problems are surfaced as
//! review findings, never special-cased in resolution logic — the
//! resolver's action-equality check stays authoritative.

use std::collections::{BTreeMap, BTreeSet};

use contracts::{Action, ContentItem, EffectVector, Role};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogueFinding {
    EmptyCatalogue,
    DuplicateId(String),
    UntaggedItem(String),
    /// Every role weight is zero — the item can never be scheduled.
    UnweightedItem(String),
    /// Only one correct-action kind exists; answer-balance constraints
    /// degrade to best effort.
    SingleActionKind(Action),
    /// A hazard item with no declared meter effect contributes nothing
    /// under meter policies.
    EffectlessHazard(String),
}

#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    items: Vec<ContentItem>,
}

impl Catalogue {
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items relevant to a role, paired with their resolved weights.
    /// An explicit weight of 0 excludes the item for that role.
    pub fn for_role(&self, role: Role) -> Vec<(ContentItem, u32)> {
        self.items
            .iter()
            .filter_map(|item| {
                let weight = item.weight_for(role);
                if weight == 0 {
                    None
                } else {
                    Some((item.clone(), weight))
                }
            })
            .collect()
    }

    /// Distinct correct-action kinds available to a role.
    pub fn action_kinds_for_role(&self, role: Role) -> BTreeSet<Action> {
        self.for_role(role)
            .into_iter()
            .map(|(item, _)| item.correct_action)
            .collect()
    }

    /// Structural review findings. Linting never fails a run; degenerate
    /// content falls back to best-effort scheduling.
    pub fn lint(&self) -> Vec<CatalogueFinding> {
        let mut findings = Vec::new();
        if self.items.is_empty() {
            findings.push(CatalogueFinding::EmptyCatalogue);
            return findings;
        }

        let mut seen = BTreeSet::new();
        let mut kinds = BTreeSet::new();
        for item in &self.items {
            if !seen.insert(item.id.clone()) {
                findings.push(CatalogueFinding::DuplicateId(item.id.clone()));
            }
            if item.tags.is_empty() {
                findings.push(CatalogueFinding::UntaggedItem(item.id.clone()));
            }
            let all_zero = !item.weight_by_role.is_empty()
                && Role::ALL.iter().all(|role| item.weight_for(*role) == 0);
            if all_zero {
                findings.push(CatalogueFinding::UnweightedItem(item.id.clone()));
            }
            if item.correct_action == Action::Stop && item.effects.is_none() {
                findings.push(CatalogueFinding::EffectlessHazard(item.id.clone()));
            }
            kinds.insert(item.correct_action);
        }
        if kinds.len() == 1 {
            if let Some(kind) = kinds.into_iter().next() {
                findings.push(CatalogueFinding::SingleActionKind(kind));
            }
        }
        findings
    }

    /// Built-in content pack: the labour-rights quiz items plus the
    /// task-runner items with declared meter effects.
    pub fn standard() -> Self {
        Self::new(standard_items())
    }
}

fn weights(entries: &[(Role, u32)]) -> BTreeMap<Role, u32> {
    entries.iter().copied().collect()
}

fn item(
    id: &str,
    correct_action: Action,
    tags: &[&str],
    weight_by_role: &[(Role, u32)],
    effects: Option<EffectVector>,
) -> ContentItem {
    ContentItem {
        id: id.to_string(),
        correct_action,
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        weight_by_role: weights(weight_by_role),
        effects,
    }
}

fn standard_items() -> Vec<ContentItem> {
    use Role::{Engineer, Factory, Logistics, Technician};

    vec![
        // -- tariff / working time / fairness --------------------------------
        item(
            "tariff-rights-know",
            Action::Fair,
            &["tariff", "pay", "paperwork"],
            &[(Factory, 2), (Technician, 2), (Engineer, 2), (Logistics, 2)],
            None,
        ),
        item(
            "azubi-pay-fairness",
            Action::Fair,
            &["pay", "tariff"],
            &[(Factory, 2), (Technician, 2), (Engineer, 1), (Logistics, 2)],
            None,
        ),
        item(
            "time-off-trade",
            Action::Fair,
            &["working-time", "leisure"],
            &[(Factory, 2), (Technician, 2), (Engineer, 2), (Logistics, 2)],
            None,
        ),
        item(
            "four-day-week-pressure",
            Action::Fair,
            &["working-time", "discipline"],
            &[(Factory, 2), (Technician, 2), (Engineer, 2), (Logistics, 2)],
            None,
        ),
        // -- AI / digitalization ---------------------------------------------
        item(
            "ai-performance-rating",
            Action::Fair,
            &["ai", "discipline", "paperwork"],
            &[(Factory, 2), (Technician, 2), (Engineer, 3), (Logistics, 2)],
            None,
        ),
        item(
            "ai-human-final-say",
            Action::Fair,
            &["ai", "safety"],
            &[(Factory, 1), (Technician, 2), (Engineer, 3), (Logistics, 2)],
            None,
        ),
        item(
            "ai-data-transparency",
            Action::Fair,
            &["ai", "paperwork", "discipline"],
            &[(Factory, 1), (Technician, 2), (Engineer, 3), (Logistics, 2)],
            None,
        ),
        item(
            "ai-safety-risk-check",
            Action::Fair,
            &["ai", "safety", "quality"],
            &[(Factory, 2), (Technician, 3), (Engineer, 3), (Logistics, 1)],
            None,
        ),
        // -- legal protection / discipline -----------------------------------
        item(
            "dismissal-deadline",
            Action::Fair,
            &["legal", "paperwork", "discipline"],
            &[(Factory, 2), (Technician, 2), (Engineer, 2), (Logistics, 2)],
            None,
        ),
        item(
            "warning-sign-fast",
            Action::Fair,
            &["legal", "paperwork", "discipline"],
            &[(Factory, 2), (Technician, 2), (Engineer, 2), (Logistics, 2)],
            None,
        ),
        item(
            "report-discrimination",
            Action::Fair,
            &["discrimination", "legal", "discipline"],
            &[(Factory, 2), (Technician, 2), (Engineer, 2), (Logistics, 2)],
            None,
        ),
        // -- strike / collective action --------------------------------------
        item(
            "warnstreik-support",
            Action::Fair,
            &["strike"],
            &[(Factory, 2), (Technician, 2), (Engineer, 2), (Logistics, 2)],
            None,
        ),
        item(
            "strike-pay-info",
            Action::Fair,
            &["strike", "pay"],
            &[(Factory, 2), (Technician, 2), (Engineer, 1), (Logistics, 2)],
            None,
        ),
        item(
            "lockout-threat",
            Action::Fair,
            &["strike", "discipline"],
            &[(Factory, 2), (Technician, 2), (Engineer, 2), (Logistics, 2)],
            None,
        ),
        // -- safety + health --------------------------------------------------
        item(
            "heat-stress-breaks",
            Action::Fair,
            &["safety", "working-time"],
            &[(Factory, 3), (Technician, 2), (Engineer, 1), (Logistics, 2)],
            None,
        ),
        item(
            "near-miss-report",
            Action::Fair,
            &["safety", "discipline"],
            &[(Factory, 3), (Technician, 2), (Engineer, 1), (Logistics, 2)],
            None,
        ),
        // -- qualification / future skills -----------------------------------
        item(
            "training-for-new-tech",
            Action::Fair,
            &["training", "ai"],
            &[(Factory, 2), (Technician, 2), (Engineer, 3), (Logistics, 2)],
            None,
        ),
        item(
            "upskilling-right",
            Action::Fair,
            &["training", "paperwork"],
            &[(Factory, 2), (Technician, 2), (Engineer, 3), (Logistics, 2)],
            None,
        ),
        // -- leisure / boundaries ---------------------------------------------
        item(
            "off-duty-accident",
            Action::Fair,
            &["leisure", "safety"],
            &[(Factory, 2), (Technician, 2), (Engineer, 2), (Logistics, 2)],
            None,
        ),
        item(
            "weekend-calls",
            Action::Fair,
            &["leisure", "discipline"],
            &[(Factory, 1), (Technician, 2), (Engineer, 3), (Logistics, 2)],
            None,
        ),
        // -- emergencies / solidarity -----------------------------------------
        item(
            "flood-emergency-help",
            Action::Fair,
            &["emergency"],
            &[(Factory, 2), (Technician, 2), (Engineer, 2), (Logistics, 2)],
            None,
        ),
        item(
            "bereaved-support",
            Action::Fair,
            &["death", "legal"],
            &[(Factory, 1), (Technician, 1), (Engineer, 1), (Logistics, 1)],
            None,
        ),
        // -- shortcut scenarios (the unfair choice is the one on the card) ----
        item(
            "skip-ppe-for-speed",
            Action::Shortcut,
            &["safety", "discipline"],
            &[(Factory, 3), (Technician, 2), (Engineer, 1), (Logistics, 2)],
            None,
        ),
        item(
            "undocumented-overtime",
            Action::Shortcut,
            &["working-time", "pay"],
            &[(Factory, 2), (Technician, 2), (Engineer, 2), (Logistics, 2)],
            None,
        ),
        item(
            "sign-blank-timesheet",
            Action::Shortcut,
            &["paperwork", "pay"],
            &[(Factory, 2), (Technician, 1), (Engineer, 2), (Logistics, 2)],
            None,
        ),
        item(
            "cover-up-defect",
            Action::Shortcut,
            &["quality", "discipline"],
            &[(Factory, 2), (Technician, 3), (Engineer, 2), (Logistics, 1)],
            None,
        ),
        item(
            "ignore-weekend-rest",
            Action::Shortcut,
            &["leisure", "working-time"],
            &[(Factory, 1), (Technician, 2), (Engineer, 3), (Logistics, 2)],
            None,
        ),
        item(
            "verbal-contract-only",
            Action::Shortcut,
            &["legal", "paperwork"],
            &[(Factory, 2), (Technician, 2), (Engineer, 2), (Logistics, 2)],
            None,
        ),
        // -- task-runner items with declared meter effects ---------------------
        item(
            "sort-parts-steady",
            Action::Fair,
            &["quality"],
            &[(Factory, 2), (Technician, 2), (Engineer, 1), (Logistics, 2)],
            Some(EffectVector {
                performance: 4,
                quality: 6,
                ..EffectVector::default()
            }),
        ),
        item(
            "double-check-label",
            Action::Fair,
            &["quality", "paperwork"],
            &[(Factory, 2), (Technician, 1), (Engineer, 1), (Logistics, 3)],
            Some(EffectVector {
                quality: 8,
                ..EffectVector::default()
            }),
        ),
        item(
            "hydration-break",
            Action::Fair,
            &["working-time", "leisure"],
            &[(Factory, 2), (Technician, 2), (Engineer, 1), (Logistics, 2)],
            Some(EffectVector {
                energy: 8,
                ..EffectVector::default()
            }),
        ),
        item(
            "quick-stack-pallets",
            Action::Shortcut,
            &["working-time"],
            &[(Factory, 1), (Technician, 1), (Engineer, 1), (Logistics, 3)],
            Some(EffectVector {
                performance: 6,
                energy: -2,
                ..EffectVector::default()
            }),
        ),
        // -- hazard items: the only valid response is to stop ------------------
        item(
            "conveyor-jam-halt",
            Action::Stop,
            &["safety", "emergency"],
            &[(Factory, 3), (Technician, 2), (Engineer, 1), (Logistics, 2)],
            Some(EffectVector {
                safety: 8,
                performance: -2,
                ..EffectVector::default()
            }),
        ),
        item(
            "gas-leak-alarm",
            Action::Stop,
            &["safety", "emergency"],
            &[(Factory, 2), (Technician, 3), (Engineer, 2), (Logistics, 2)],
            Some(EffectVector {
                safety: 10,
                ..EffectVector::default()
            }),
        ),
        item(
            "forklift-path-clear",
            Action::Stop,
            &["safety"],
            &[(Factory, 2), (Technician, 1), (Engineer, 1), (Logistics, 3)],
            Some(EffectVector {
                safety: 6,
                performance: 2,
                ..EffectVector::default()
            }),
        ),
        // Corrected form of the source's inverted emergency entry: a real
        // equipment emergency is a stop-and-alert, full stop.
        item(
            "emergency-real-fixed",
            Action::Stop,
            &["safety", "emergency"],
            &[(Factory, 3), (Technician, 3), (Engineer, 2), (Logistics, 2)],
            Some(EffectVector {
                safety: 10,
                quality: 2,
                ..EffectVector::default()
            }),
        ),
    ]
}
