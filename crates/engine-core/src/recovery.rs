//! Recovered-from-dip state machine: armed → tripped → recovered.
//!
//! The tracker is fed once per tick by the session; the unlock evaluator
//! only ever sees the resulting boolean. Recovery is one-way sticky for
//! the run.

use contracts::RecoveryRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecoveryPhase {
    Armed,
    Tripped {
        /// Whether a meter fell below the low threshold while tripped.
        /// The meter path out of the dip is only open after an actual
        /// meter dip.
        meter_dipped: bool,
    },
    Recovered,
}

#[derive(Debug, Clone)]
pub struct RecoveryTracker {
    rules: RecoveryRules,
    phase: RecoveryPhase,
}

impl RecoveryTracker {
    pub fn new(rules: RecoveryRules) -> Self {
        Self {
            rules,
            phase: RecoveryPhase::Armed,
        }
    }

    pub fn recovered(&self) -> bool {
        self.phase == RecoveryPhase::Recovered
    }

    pub fn tripped(&self) -> bool {
        matches!(self.phase, RecoveryPhase::Tripped { .. })
    }

    /// Advance the state machine with the current tick's view of the run.
    /// Returns `(just_tripped, just_recovered)` so the caller can emit
    /// events on the edges only.
    pub fn observe(
        &mut self,
        wrong_streak: u32,
        correct_streak: u32,
        min_meter: i64,
    ) -> (bool, bool) {
        match self.phase {
            RecoveryPhase::Armed => {
                let streak_trip = wrong_streak >= self.rules.trip_wrong_streak;
                let meter_trip = min_meter < self.rules.meter_low;
                if streak_trip || meter_trip {
                    self.phase = RecoveryPhase::Tripped {
                        meter_dipped: meter_trip,
                    };
                    (true, false)
                } else {
                    (false, false)
                }
            }
            RecoveryPhase::Tripped { meter_dipped } => {
                let meter_dipped = meter_dipped || min_meter < self.rules.meter_low;
                let streak_recovery = correct_streak >= self.rules.recover_correct_streak;
                let meter_recovery = meter_dipped && min_meter >= self.rules.meter_high;
                if streak_recovery || meter_recovery {
                    self.phase = RecoveryPhase::Recovered;
                    (false, true)
                } else {
                    self.phase = RecoveryPhase::Tripped { meter_dipped };
                    (false, false)
                }
            }
            RecoveryPhase::Recovered => (false, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> RecoveryTracker {
        RecoveryTracker::new(RecoveryRules::default())
    }

    #[test]
    fn stays_armed_while_play_is_clean() {
        let mut t = tracker();
        for _ in 0..10 {
            assert_eq!(t.observe(0, 4, 60), (false, false));
        }
        assert!(!t.recovered());
    }

    #[test]
    fn wrong_streak_trips_then_correct_streak_recovers() {
        let mut t = tracker();
        assert_eq!(t.observe(1, 0, 60), (false, false));
        assert_eq!(t.observe(2, 0, 60), (true, false));
        assert!(t.tripped());
        assert_eq!(t.observe(0, 1, 60), (false, false));
        assert_eq!(t.observe(0, 2, 60), (false, false));
        assert_eq!(t.observe(0, 3, 60), (false, true));
        assert!(t.recovered());
    }

    #[test]
    fn meter_dip_then_rise_recovers() {
        let mut t = tracker();
        assert_eq!(t.observe(0, 0, 25), (true, false));
        // Rising but still below the high threshold: not yet recovered.
        assert_eq!(t.observe(0, 0, 45), (false, false));
        assert_eq!(t.observe(0, 0, 55), (false, true));
        assert!(t.recovered());
    }

    #[test]
    fn streak_trip_without_meter_dip_keeps_meter_path_closed() {
        let mut t = tracker();
        assert_eq!(t.observe(2, 0, 80), (true, false));
        // Meters were never low, so a healthy meter alone must not count
        // as a recovery.
        assert_eq!(t.observe(0, 1, 80), (false, false));
        assert!(!t.recovered());
        // A dip while tripped opens the meter path.
        assert_eq!(t.observe(0, 0, 20), (false, false));
        assert_eq!(t.observe(0, 1, 60), (false, true));
    }

    #[test]
    fn recovery_is_sticky() {
        let mut t = tracker();
        t.observe(2, 0, 60);
        t.observe(0, 3, 60);
        assert!(t.recovered());
        // Later dips never un-recover the run.
        assert_eq!(t.observe(5, 0, 5), (false, false));
        assert!(t.recovered());
    }
}
