//! Readiness gate - debounced starting-posture detection
//!
//! Counts consecutive frames satisfying the exercise's ready predicate.
//! Losing the posture before the window elapses resets the count to zero;
//! there is no partial credit.

use tracing::{debug, info};

/// Outcome of feeding one frame to the gate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateStatus {
    /// Posture not yet held long enough
    Waiting { progress: u32, required: u32 },
    /// Posture was held but broke before the window elapsed
    Lost,
    /// Window elapsed on this frame (fires once)
    Ready,
    /// Gate already opened earlier
    Open,
}

/// Debounced readiness gate
#[derive(Clone, Debug)]
pub struct ReadinessGate {
    debounce_frames: u32,
    consecutive: u32,
    open: bool,
}

impl ReadinessGate {
    pub fn new(debounce_frames: u32) -> Self {
        ReadinessGate {
            debounce_frames: debounce_frames.max(1),
            consecutive: 0,
            open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn progress(&self) -> u32 {
        self.consecutive
    }

    pub fn debounce_frames(&self) -> u32 {
        self.debounce_frames
    }

    /// Close the gate and clear progress
    pub fn reset(&mut self) {
        self.consecutive = 0;
        self.open = false;
    }

    /// Feed whether the ready predicate held on this frame
    pub fn observe(&mut self, satisfied: bool) -> GateStatus {
        if self.open {
            return GateStatus::Open;
        }

        if !satisfied {
            let had_progress = self.consecutive > 0;
            self.consecutive = 0;
            if had_progress {
                debug!("ready posture lost, debounce reset");
                return GateStatus::Lost;
            }
            return GateStatus::Waiting {
                progress: 0,
                required: self.debounce_frames,
            };
        }

        self.consecutive += 1;
        if self.consecutive >= self.debounce_frames {
            self.open = true;
            info!(frames = self.consecutive, "ready posture confirmed");
            return GateStatus::Ready;
        }

        GateStatus::Waiting {
            progress: self.consecutive,
            required: self.debounce_frames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_interrupted_run_never_opens() {
        let mut gate = ReadinessGate::new(12);

        for _ in 0..11 {
            assert!(matches!(gate.observe(true), GateStatus::Waiting { .. }));
        }
        assert_eq!(gate.observe(false), GateStatus::Lost);
        for _ in 0..11 {
            gate.observe(true);
        }
        assert!(!gate.is_open());
        assert_eq!(gate.progress(), 11);
    }

    #[test]
    fn test_full_run_opens_exactly_once() {
        let mut gate = ReadinessGate::new(12);
        let mut ready_events = 0;

        for _ in 0..40 {
            if gate.observe(true) == GateStatus::Ready {
                ready_events += 1;
            }
        }
        assert_eq!(ready_events, 1);
        assert_eq!(gate.observe(false), GateStatus::Open);
    }

    #[test]
    fn test_reset_requires_fresh_window() {
        let mut gate = ReadinessGate::new(3);
        for _ in 0..3 {
            gate.observe(true);
        }
        assert!(gate.is_open());

        gate.reset();
        assert_eq!(gate.observe(true), GateStatus::Waiting { progress: 1, required: 3 });
    }

    proptest! {
        #[test]
        fn prop_opens_only_after_unbroken_window(
            debounce in 1u32..20,
            frames in prop::collection::vec(any::<bool>(), 0..80),
        ) {
            let mut gate = ReadinessGate::new(debounce);
            let mut run = 0u32;
            let mut opened_at = None;

            for (i, satisfied) in frames.iter().enumerate() {
                run = if *satisfied { run + 1 } else { 0 };
                if gate.observe(*satisfied) == GateStatus::Ready {
                    prop_assert!(opened_at.is_none());
                    prop_assert_eq!(run, debounce);
                    opened_at = Some(i);
                }
            }
            prop_assert_eq!(gate.is_open(), opened_at.is_some());
        }
    }
}
