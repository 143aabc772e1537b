//! Bounded meter accumulator. Every update clamps each meter to [0, 100];
//! out-of-range deltas are absorbed, never rejected.

use contracts::{EffectVector, MeterKind, MeterSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterBoard {
    performance: i64,
    quality: i64,
    safety: i64,
    energy: i64,
}

fn clamp(value: i64) -> i64 {
    value.clamp(0, 100)
}

impl MeterBoard {
    pub fn new(initial: i64) -> Self {
        let initial = clamp(initial);
        Self {
            performance: initial,
            quality: initial,
            safety: initial,
            energy: initial,
        }
    }

    pub fn get(&self, kind: MeterKind) -> i64 {
        match kind {
            MeterKind::Performance => self.performance,
            MeterKind::Quality => self.quality,
            MeterKind::Safety => self.safety,
            MeterKind::Energy => self.energy,
        }
    }

    /// Apply a signed effect vector, clamping each meter.
    pub fn apply(&mut self, effect: &EffectVector) {
        self.performance = clamp(self.performance + effect.performance);
        self.quality = clamp(self.quality + effect.quality);
        self.safety = clamp(self.safety + effect.safety);
        self.energy = clamp(self.energy + effect.energy);
    }

    /// Apply the same delta to all four meters.
    pub fn apply_flat(&mut self, delta: i64) {
        self.apply(&EffectVector::uniform(delta));
    }

    pub fn min_value(&self) -> i64 {
        self.performance
            .min(self.quality)
            .min(self.safety)
            .min(self.energy)
    }

    /// A critical meter at zero ends the run under meter policies.
    pub fn any_critical_depleted(&self) -> bool {
        MeterKind::ALL
            .iter()
            .any(|kind| kind.is_critical() && self.get(*kind) == 0)
    }

    pub fn snapshot(&self) -> MeterSnapshot {
        MeterSnapshot {
            performance: self.performance,
            quality: self.quality,
            safety: self.safety,
            energy: self.energy,
        }
    }
}
