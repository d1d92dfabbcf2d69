//! Repetition state machine - cyclic Up/Down with cooldown
//!
//! Up -> Down on the down predicate (baseline captured on entry).
//! Down -> Up on the up predicate: the only edge that counts a rep and runs
//! form scoring. After it, `cooldown_frames` frames are skipped entirely.
//! An optional pause rule suspends counting while the body rises above the
//! posture locked at arm time, and resumes once the resume posture returns.

use tracing::{debug, info};

use repsense_core::Phase;
use repsense_geometry::is_defined;

use crate::{FormCheck, Metric, PoseSample, Predicate, RepBaseline, RepEvaluation, TopTracker};

/// Predicates and checks active for one orientation
#[derive(Clone, Debug)]
pub struct CyclicVariant {
    pub down: Predicate,
    pub up: Predicate,
    pub checks: Vec<FormCheck>,
    pub pause: Option<PauseRule>,
}

/// Suspend counting when `metric` rises more than `max_rise` above its
/// value in the locked starting posture
#[derive(Clone, Debug)]
pub struct PauseRule {
    pub metric: Metric,
    pub max_rise: f32,
    /// Posture that ends the pause and re-locks the anchor
    pub resume: Predicate,
}

/// What one frame did to the counter
#[derive(Clone, Debug, PartialEq)]
pub enum RepEvent {
    /// No transition
    Steady,
    /// Frame skipped during cooldown
    Cooldown { remaining: u32 },
    /// Up -> Down edge
    EnteredDown,
    /// Down -> Up edge; `rep` is the post-increment count
    Completed { rep: u32, evaluation: RepEvaluation },
    /// Counting suspended on this frame
    Paused,
    /// Counting resumed from the Up phase
    Resumed,
}

/// Cyclic repetition counter
#[derive(Clone, Debug)]
pub struct RepCounter {
    phase: Phase,
    reps: u32,
    cooldown: u32,
    cooldown_frames: u32,
    baseline: Option<RepBaseline>,
    tops: TopTracker,
    /// Pause metric in the locked starting posture
    anchor: Option<f32>,
}

impl RepCounter {
    pub fn new(cooldown_frames: u32) -> Self {
        RepCounter {
            phase: Phase::AwaitingStart,
            reps: 0,
            cooldown: 0,
            cooldown_frames,
            baseline: None,
            tops: TopTracker::default(),
            anchor: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn reps(&self) -> u32 {
        self.reps
    }

    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown
    }

    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    /// Enter the Up phase from the ready posture
    pub fn arm(&mut self, variant: &CyclicVariant, sample: &PoseSample<'_>) {
        self.phase = Phase::Up;
        self.baseline = None;
        self.tops.clear();
        self.tops.observe(&variant.checks, sample);
        self.lock_anchor(variant, sample);
    }

    fn lock_anchor(&mut self, variant: &CyclicVariant, sample: &PoseSample<'_>) {
        self.anchor = variant
            .pause
            .as_ref()
            .map(|rule| sample.measure(rule.metric))
            .filter(|v| is_defined(*v));
    }

    /// Clear counts and return to AwaitingStart
    pub fn reset(&mut self) {
        *self = Self::new(self.cooldown_frames);
    }

    /// Drop an in-flight rep without counting it
    pub fn abandon_rep(&mut self) {
        if self.phase == Phase::Down {
            debug!("rep abandoned");
            self.phase = Phase::Up;
        }
        self.baseline = None;
        self.tops.clear();
    }

    /// Feed one frame evaluated with `variant`
    pub fn observe(&mut self, variant: &CyclicVariant, sample: &PoseSample<'_>) -> RepEvent {
        if let Some(rule) = &variant.pause {
            if let Some(event) = self.check_pause(rule, variant, sample) {
                return event;
            }
        }

        if self.cooldown > 0 {
            self.cooldown -= 1;
            if self.phase == Phase::Up {
                self.tops.observe(&variant.checks, sample);
            }
            return RepEvent::Cooldown {
                remaining: self.cooldown,
            };
        }

        match self.phase {
            Phase::Up => {
                if variant.down.evaluate(sample) {
                    self.baseline = Some(RepBaseline::capture(&variant.checks, sample, &self.tops));
                    self.phase = Phase::Down;
                    debug!(reps = self.reps, "phase up -> down");
                    RepEvent::EnteredDown
                } else {
                    self.tops.observe(&variant.checks, sample);
                    RepEvent::Steady
                }
            }
            Phase::Down => {
                if variant.up.evaluate(sample) {
                    let evaluation = match self.baseline.take() {
                        Some(baseline) => baseline.evaluate(&variant.checks, sample),
                        None => RepEvaluation::default(),
                    };
                    self.reps += 1;
                    self.phase = Phase::Up;
                    self.cooldown = self.cooldown_frames;
                    self.tops.clear();
                    self.tops.observe(&variant.checks, sample);
                    info!(rep = self.reps, clean = evaluation.is_clean(), "rep counted");
                    RepEvent::Completed {
                        rep: self.reps,
                        evaluation,
                    }
                } else {
                    if let Some(baseline) = self.baseline.as_mut() {
                        baseline.track(&variant.checks, sample);
                    }
                    RepEvent::Steady
                }
            }
            // Not armed yet
            _ => RepEvent::Steady,
        }
    }

    /// `Some` when the pause rule consumes the frame
    fn check_pause(
        &mut self,
        rule: &PauseRule,
        variant: &CyclicVariant,
        sample: &PoseSample<'_>,
    ) -> Option<RepEvent> {
        match self.phase {
            Phase::Paused if rule.resume.evaluate(sample) => {
                self.phase = Phase::Up;
                self.cooldown = 0;
                self.tops.clear();
                self.tops.observe(&variant.checks, sample);
                self.lock_anchor(variant, sample);
                info!(reps = self.reps, "counting resumed");
                Some(RepEvent::Resumed)
            }
            Phase::Paused => Some(RepEvent::Steady),
            Phase::Up | Phase::Down => {
                let anchor = self.anchor?;
                let v = sample.measure(rule.metric);
                if !is_defined(v) || v - anchor <= rule.max_rise {
                    return None;
                }
                self.abandon_rep();
                self.phase = Phase::Paused;
                info!(reps = self.reps, rise = v - anchor, "counting paused");
                Some(RepEvent::Paused)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Hysteresis, Metric, Sides};
    use proptest::prelude::*;
    use repsense_core::{KeypointFrame, Landmark, LandmarkMap, Pose, Slot};

    /// Left leg with the knee bent to `knee` degrees
    fn leg(knee: f32) -> KeypointFrame {
        let map = LandmarkMap::default();
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.9); KeypointFrame::BLAZEPOSE_LEN];
        let s = (knee.to_radians() / 2.0).sin();
        let c = (knee.to_radians() / 2.0).cos();
        landmarks[map.index(Slot::LeftHip)] = Landmark::new(0.5, 0.4, 0.95);
        landmarks[map.index(Slot::LeftKnee)] = Landmark::new(0.5 + 0.2 * c, 0.4 + 0.2 * s, 0.95);
        landmarks[map.index(Slot::LeftAnkle)] = Landmark::new(0.5, 0.4 + 0.4 * s, 0.95);
        KeypointFrame::new(landmarks)
    }

    fn variant() -> CyclicVariant {
        let band = Hysteresis::new(100.0, 160.0).unwrap();
        let knee = Metric::KneeAngle(Sides::Left);
        CyclicVariant {
            down: band.down_predicate(knee),
            up: band.up_predicate(knee),
            checks: vec![],
            pause: None,
        }
    }

    fn drive(counter: &mut RepCounter, variant: &CyclicVariant, angles: &[f32]) -> Vec<RepEvent> {
        let map = LandmarkMap::default();
        angles
            .iter()
            .map(|a| {
                let frame = leg(*a);
                counter.observe(variant, &PoseSample::new(Pose::new(&frame, &map)))
            })
            .collect()
    }

    fn armed(cooldown: u32) -> (RepCounter, CyclicVariant) {
        let variant = variant();
        let mut counter = RepCounter::new(cooldown);
        let map = LandmarkMap::default();
        let frame = leg(170.0);
        counter.arm(&variant, &PoseSample::new(Pose::new(&frame, &map)));
        (counter, variant)
    }

    #[test]
    fn test_unarmed_counter_ignores_frames() {
        let variant = variant();
        let mut counter = RepCounter::new(0);
        drive(&mut counter, &variant, &[170.0, 90.0, 170.0]);
        assert_eq!(counter.reps(), 0);
        assert_eq!(counter.phase(), Phase::AwaitingStart);
    }

    #[test]
    fn test_hysteresis_band_prevents_double_count() {
        let (mut counter, variant) = armed(0);

        // Dip below down, recover inside the band, dip again, then rise past up
        drive(&mut counter, &variant, &[150.0, 98.0, 120.0, 140.0, 97.0, 150.0, 165.0]);
        assert_eq!(counter.reps(), 1);
    }

    #[test]
    fn test_first_cycle_counts_one() {
        let (mut counter, variant) = armed(0);
        let events = drive(&mut counter, &variant, &[95.0, 165.0]);
        assert_eq!(events[0], RepEvent::EnteredDown);
        assert!(matches!(events[1], RepEvent::Completed { rep: 1, .. }));
        assert!(!counter.has_baseline());
    }

    #[test]
    fn test_cooldown_suppresses_retrigger() {
        let (mut counter, variant) = armed(3);
        drive(&mut counter, &variant, &[95.0, 165.0]);

        // Jittery frames right after the rep: down then up within cooldown
        let events = drive(&mut counter, &variant, &[95.0, 165.0, 95.0]);
        assert!(events.iter().all(|e| matches!(e, RepEvent::Cooldown { .. })));
        assert_eq!(counter.reps(), 1);
        assert_eq!(counter.phase(), Phase::Up);

        // After cooldown a real cycle counts again
        drive(&mut counter, &variant, &[95.0, 165.0]);
        assert_eq!(counter.reps(), 2);
    }

    #[test]
    fn test_abandon_rep_returns_to_up() {
        let (mut counter, variant) = armed(0);
        drive(&mut counter, &variant, &[95.0]);
        assert_eq!(counter.phase(), Phase::Down);

        counter.abandon_rep();
        assert_eq!(counter.phase(), Phase::Up);
        assert!(!counter.has_baseline());
        drive(&mut counter, &variant, &[165.0]);
        assert_eq!(counter.reps(), 0);
    }

    #[test]
    fn test_pause_suspends_until_resume_posture() {
        let mut variant = variant();
        let knee = Metric::KneeAngle(Sides::Left);
        variant.pause = Some(PauseRule {
            metric: knee,
            max_rise: 20.0,
            resume: Predicate::Within(knee, 140.0, 155.0),
        });
        let mut counter = RepCounter::new(0);
        let map = LandmarkMap::default();
        let frame = leg(150.0);
        counter.arm(&variant, &PoseSample::new(Pose::new(&frame, &map)));

        // Rising 25 degrees above the locked posture pauses counting
        let events = drive(&mut counter, &variant, &[175.0, 95.0, 172.0]);
        assert_eq!(events, vec![RepEvent::Paused, RepEvent::Steady, RepEvent::Steady]);
        assert_eq!(counter.phase(), Phase::Paused);
        assert_eq!(counter.reps(), 0);

        // The resume posture re-locks the anchor and counting carries on
        let events = drive(&mut counter, &variant, &[150.0, 95.0, 165.0]);
        assert_eq!(events[0], RepEvent::Resumed);
        assert!(matches!(events[2], RepEvent::Completed { rep: 1, .. }));
    }

    #[test]
    fn test_pause_abandons_rep_in_flight() {
        let mut variant = variant();
        let knee = Metric::KneeAngle(Sides::Left);
        variant.pause = Some(PauseRule {
            metric: knee,
            max_rise: 5.0,
            resume: Predicate::Within(knee, 140.0, 155.0),
        });
        let mut counter = RepCounter::new(0);
        let map = LandmarkMap::default();
        let frame = leg(150.0);
        counter.arm(&variant, &PoseSample::new(Pose::new(&frame, &map)));

        drive(&mut counter, &variant, &[95.0]);
        assert!(counter.has_baseline());
        assert_eq!(drive(&mut counter, &variant, &[165.0]), vec![RepEvent::Paused]);
        assert!(!counter.has_baseline());
        assert_eq!(counter.reps(), 0);
    }

    proptest! {
        #[test]
        fn prop_reps_never_exceed_up_crossings(
            angles in prop::collection::vec(
                prop_oneof![60.0f32..99.0, 101.0f32..159.0, 161.0f32..179.0],
                1..120,
            )
        ) {
            let (mut counter, variant) = armed(0);
            drive(&mut counter, &variant, &angles);

            // Each rep needs a fresh sub-100 dip followed by a >160 rise
            let mut crossings = 0;
            let mut dipped = false;
            for a in &angles {
                if *a < 100.0 {
                    dipped = true;
                } else if *a > 160.0 && dipped {
                    crossings += 1;
                    dipped = false;
                }
            }
            prop_assert!(counter.reps() <= crossings);
        }
    }
}
