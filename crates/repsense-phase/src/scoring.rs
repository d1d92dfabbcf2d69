//! Form scoring - baseline snapshot at phase entry, checks at completion
//!
//! A rep that fails any check costs one fixed penalty and surfaces the
//! first failing check's message. A clean rep surfaces the success message.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use repsense_geometry::is_defined;

use crate::{Metric, PoseSample};

/// One form check evaluated at the end of a rep
#[derive(Clone, Debug, PartialEq)]
pub enum FormCheck {
    /// The metric must travel at least `min_fraction` of the way from its
    /// top-of-rep value toward `full_depth`
    Depth {
        metric: Metric,
        full_depth: f32,
        min_fraction: f32,
        message: String,
    },
    /// The metric must stay within `tolerance` of its value at rep start
    Deviation {
        metric: Metric,
        tolerance: f32,
        message: String,
    },
    /// The metric must reach at least `min` at the top of the rep, either
    /// in the Up phase before it or on the completion frame
    Extension {
        metric: Metric,
        min: f32,
        message: String,
    },
}

impl FormCheck {
    pub fn metric(&self) -> Metric {
        match self {
            FormCheck::Depth { metric, .. }
            | FormCheck::Deviation { metric, .. }
            | FormCheck::Extension { metric, .. } => *metric,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FormCheck::Depth { message, .. }
            | FormCheck::Deviation { message, .. }
            | FormCheck::Extension { message, .. } => message,
        }
    }
}

/// Running range of one metric
#[derive(Clone, Copy, Debug, PartialEq)]
struct Track {
    /// Value at rep start (Down entry)
    start: Option<f32>,
    /// Top-of-rep value carried in from the preceding Up phase
    top: Option<f32>,
    min: Option<f32>,
    max: Option<f32>,
}

impl Track {
    fn push(&mut self, v: f32) {
        if !is_defined(v) {
            return;
        }
        self.min = Some(self.min.map_or(v, |m| m.min(v)));
        self.max = Some(self.max.map_or(v, |m| m.max(v)));
    }
}

/// Per-check peak tracker for the Up phase
///
/// The top value of a rep is the largest value seen while the body was up.
#[derive(Clone, Debug, Default)]
pub struct TopTracker {
    peaks: Vec<Option<f32>>,
}

impl TopTracker {
    pub fn observe(&mut self, checks: &[FormCheck], sample: &PoseSample<'_>) {
        self.peaks.resize(checks.len(), None);
        for (peak, check) in self.peaks.iter_mut().zip(checks) {
            let v = sample.measure(check.metric());
            if is_defined(v) {
                *peak = Some(peak.map_or(v, |p| p.max(v)));
            }
        }
    }

    pub fn clear(&mut self) {
        self.peaks.clear();
    }

    fn peak(&self, index: usize) -> Option<f32> {
        self.peaks.get(index).copied().flatten()
    }
}

/// Geometry captured at Down entry and extended every frame of the rep
#[derive(Clone, Debug, PartialEq)]
pub struct RepBaseline {
    tracks: Vec<Track>,
}

impl RepBaseline {
    /// Snapshot every check's metric at phase entry
    pub fn capture(checks: &[FormCheck], sample: &PoseSample<'_>, tops: &TopTracker) -> Self {
        let tracks = checks
            .iter()
            .enumerate()
            .map(|(i, check)| {
                let v = sample.measure(check.metric());
                let start = is_defined(v).then_some(v);
                let mut track = Track {
                    start,
                    top: tops.peak(i).or(start),
                    min: None,
                    max: None,
                };
                track.push(v);
                track
            })
            .collect();
        RepBaseline { tracks }
    }

    /// Fold one mid-rep frame into the running ranges
    pub fn track(&mut self, checks: &[FormCheck], sample: &PoseSample<'_>) {
        for (track, check) in self.tracks.iter_mut().zip(checks) {
            track.push(sample.measure(check.metric()));
        }
    }

    /// Run every check against the completion frame
    ///
    /// A check with no usable data passes: the engine does not penalise
    /// what it could not see.
    pub fn evaluate(mut self, checks: &[FormCheck], sample: &PoseSample<'_>) -> RepEvaluation {
        self.track(checks, sample);

        let failed = checks
            .iter()
            .zip(&self.tracks)
            .filter(|(check, track)| !passes(check, track, sample))
            .map(|(check, _)| check.message().to_string())
            .collect();

        RepEvaluation { failed }
    }
}

fn passes(check: &FormCheck, track: &Track, sample: &PoseSample<'_>) -> bool {
    match check {
        FormCheck::Depth {
            full_depth,
            min_fraction,
            ..
        } => {
            let Some(top) = track.top else { return true };
            let range = top - full_depth;
            if range.abs() < f32::EPSILON {
                return true;
            }
            // Deepest value is whichever extreme lies toward full depth
            let deepest = if range > 0.0 { track.min } else { track.max };
            let Some(deepest) = deepest else { return true };
            (top - deepest) / range >= *min_fraction
        }
        FormCheck::Deviation { tolerance, .. } => {
            let Some(start) = track.start else { return true };
            let spread = [track.min, track.max]
                .into_iter()
                .flatten()
                .map(|v| (v - start).abs())
                .fold(0.0f32, f32::max);
            spread <= *tolerance
        }
        FormCheck::Extension { metric, min, .. } => {
            let now = sample.measure(*metric);
            let best = [track.top, is_defined(now).then_some(now)]
                .into_iter()
                .flatten()
                .reduce(f32::max);
            best.map_or(true, |v| v >= *min)
        }
    }
}

/// Whole-session verdict for an isometric hold
///
/// A hold is judged once, when the session stops: it fails when the time
/// spent holding is less than `min_share` of the time from the first
/// opened segment to the end. Brief breaks do not each cost a penalty.
#[derive(Clone, Debug, PartialEq)]
pub struct HoldCheck {
    pub min_share: f32,
    pub message: String,
}

impl HoldCheck {
    pub fn evaluate(&self, held: Duration, broken: Duration) -> RepEvaluation {
        let total = held + broken;
        if total.is_zero() {
            return RepEvaluation::default();
        }
        let share = held.as_secs_f32() / total.as_secs_f32();
        debug!(share, min_share = self.min_share, "hold judged");
        if share < self.min_share {
            RepEvaluation {
                failed: vec![self.message.clone()],
            }
        } else {
            RepEvaluation::default()
        }
    }
}

/// Outcome of one completed rep
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepEvaluation {
    /// Messages of failing checks, in check order
    pub failed: Vec<String>,
}

impl RepEvaluation {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Message surfaced for this rep
    pub fn headline<'a>(&'a self, success: &'a str) -> &'a str {
        self.failed.first().map_or(success, String::as_str)
    }
}

/// Scoring configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Points deducted for a rep with at least one failing check
    pub penalty: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig { penalty: 5.0 }
    }
}

/// Score summary for a session
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormScore {
    /// Session score: 100 minus deductions, floored at 0
    pub accuracy: f32,
    /// Mean of per-rep accuracies, 100 when no reps were scored
    pub average_rep_accuracy: f32,
    pub reps_scored: u32,
    pub reps_failed: u32,
}

/// Form-scoring engine
///
/// INVARIANT: the score starts at 100, never increases, and never drops
/// below zero.
#[derive(Clone, Debug)]
pub struct FormScorer {
    score: f32,
    rep_accuracy_sum: f32,
    reps_scored: u32,
    reps_failed: u32,
    config: ScoringConfig,
}

impl FormScorer {
    pub const PERFECT: f32 = 100.0;

    pub fn new(config: ScoringConfig) -> Self {
        FormScorer {
            score: Self::PERFECT,
            rep_accuracy_sum: 0.0,
            reps_scored: 0,
            reps_failed: 0,
            config,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    pub fn accuracy(&self) -> f32 {
        self.score
    }

    /// Apply one rep; returns that rep's own accuracy
    pub fn record(&mut self, evaluation: &RepEvaluation) -> f32 {
        let penalty = self.config.penalty.clamp(0.0, Self::PERFECT);
        let rep_accuracy = if evaluation.is_clean() {
            Self::PERFECT
        } else {
            self.reps_failed += 1;
            self.score = (self.score - penalty).max(0.0);
            Self::PERFECT - penalty
        };

        self.reps_scored += 1;
        self.rep_accuracy_sum += rep_accuracy;
        debug!(
            rep_accuracy,
            score = self.score,
            failed = evaluation.failed.len(),
            "rep scored"
        );
        rep_accuracy
    }

    pub fn summary(&self) -> FormScore {
        let average_rep_accuracy = if self.reps_scored == 0 {
            Self::PERFECT
        } else {
            self.rep_accuracy_sum / self.reps_scored as f32
        };
        FormScore {
            accuracy: self.score,
            average_rep_accuracy,
            reps_scored: self.reps_scored,
            reps_failed: self.reps_failed,
        }
    }
}

impl Default for FormScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sides;
    use proptest::prelude::*;
    use repsense_core::{KeypointFrame, Landmark, LandmarkMap, Pose, Slot};

    /// Left leg with the knee bent to roughly `knee` degrees, torso upright
    fn leg(knee: f32) -> KeypointFrame {
        let map = LandmarkMap::default();
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.9); KeypointFrame::BLAZEPOSE_LEN];
        let half = (knee.to_radians() / 2.0).sin();
        let bend = (knee.to_radians() / 2.0).cos();
        landmarks[map.index(Slot::LeftHip)] = Landmark::new(0.5, 0.5, 0.9);
        landmarks[map.index(Slot::LeftKnee)] = Landmark::new(0.5 + 0.2 * bend, 0.5 + 0.2 * half, 0.9);
        landmarks[map.index(Slot::LeftAnkle)] = Landmark::new(0.5, 0.5 + 0.4 * half, 0.9);
        KeypointFrame::new(landmarks)
    }

    fn depth_check() -> Vec<FormCheck> {
        vec![FormCheck::Depth {
            metric: Metric::KneeAngle(Sides::Left),
            full_depth: 90.0,
            min_fraction: 0.85,
            message: "Squat deeper".into(),
        }]
    }

    fn run_rep(checks: &[FormCheck], angles: &[f32]) -> RepEvaluation {
        let map = LandmarkMap::default();
        let frames: Vec<_> = angles.iter().map(|a| leg(*a)).collect();
        let sample = |i: usize| PoseSample::new(Pose::new(&frames[i], &map));

        let mut tops = TopTracker::default();
        tops.observe(checks, &sample(0));
        let mut baseline = RepBaseline::capture(checks, &sample(1), &tops);
        for i in 2..frames.len() - 1 {
            baseline.track(checks, &sample(i));
        }
        baseline.evaluate(checks, &sample(frames.len() - 1))
    }

    #[test]
    fn test_full_depth_passes() {
        let checks = depth_check();
        let eval = run_rep(&checks, &[170.0, 98.0, 90.0, 120.0, 165.0]);
        assert!(eval.is_clean());
        assert_eq!(eval.headline("Great squat!"), "Great squat!");
    }

    #[test]
    fn test_shallow_rep_fails_depth() {
        let checks = depth_check();
        // Travel (170-120)/(170-90) = 0.625
        let eval = run_rep(&checks, &[170.0, 130.0, 120.0, 165.0]);
        assert_eq!(eval.failed, vec!["Squat deeper".to_string()]);
    }

    #[test]
    fn test_extension_uses_top_of_rep() {
        let checks = vec![FormCheck::Extension {
            metric: Metric::KneeAngle(Sides::Left),
            min: 165.0,
            message: "Stand up fully".into(),
        }];
        assert!(run_rep(&checks, &[172.0, 95.0, 90.0, 162.0]).is_clean());

        let eval = run_rep(&checks, &[158.0, 95.0, 90.0, 162.0]);
        assert_eq!(eval.headline("Great squat!"), "Stand up fully");
    }

    #[test]
    fn test_deviation_tracks_whole_rep() {
        let checks = vec![FormCheck::Deviation {
            metric: Metric::KneeAngle(Sides::Left),
            tolerance: 15.0,
            message: "Keep your back straight".into(),
        }];
        // Start at 100, wanders to 80 mid-rep, returns
        let eval = run_rep(&checks, &[170.0, 100.0, 80.0, 100.0]);
        assert!(!eval.is_clean());
        assert!(run_rep(&checks, &[170.0, 100.0, 92.0, 108.0]).is_clean());
    }

    #[test]
    fn test_first_failing_message_is_headline() {
        let eval = RepEvaluation {
            failed: vec!["Squat deeper".into(), "Stand up fully".into()],
        };
        assert_eq!(eval.headline("Great squat!"), "Squat deeper");
    }

    #[test]
    fn test_fixed_penalty_regardless_of_failure_count() {
        let mut scorer = FormScorer::default();
        let two = RepEvaluation {
            failed: vec!["a".into(), "b".into()],
        };
        assert_eq!(scorer.record(&two), 95.0);
        assert_eq!(scorer.record(&RepEvaluation::default()), 100.0);

        let summary = scorer.summary();
        assert_eq!(summary.accuracy, 95.0);
        assert_eq!(summary.average_rep_accuracy, 97.5);
        assert_eq!(summary.reps_failed, 1);
    }

    #[test]
    fn test_hold_judged_on_share_of_time() {
        let check = HoldCheck {
            min_share: 0.9,
            message: "Adjust your position!".into(),
        };
        let secs = Duration::from_secs_f32;

        // 30 stable frames per broken frame keeps the hold
        assert!(check.evaluate(secs(24.04), secs(0.8)).is_clean());
        assert_eq!(
            check.evaluate(secs(5.0), secs(1.0)).failed,
            vec!["Adjust your position!".to_string()]
        );
        assert!(check.evaluate(Duration::ZERO, Duration::ZERO).is_clean());
    }

    #[test]
    fn test_no_reps_is_perfect() {
        let summary = FormScorer::default().summary();
        assert_eq!(summary.accuracy, 100.0);
        assert_eq!(summary.average_rep_accuracy, 100.0);
    }

    proptest! {
        #[test]
        fn prop_score_never_below_zero(penalty in 0.0f32..150.0, reps in 0usize..200) {
            let mut scorer = FormScorer::new(ScoringConfig { penalty });
            let bad = RepEvaluation { failed: vec!["x".into()] };
            let mut last = scorer.accuracy();
            for _ in 0..reps {
                scorer.record(&bad);
                prop_assert!(scorer.accuracy() >= 0.0);
                prop_assert!(scorer.accuracy() <= last);
                last = scorer.accuracy();
            }
        }
    }
}
