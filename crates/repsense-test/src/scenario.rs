//! Scenario runner - drives a session with a manual clock
//!
//! Each step processes one frame at the current clock reading and then
//! advances the clock by the frame interval, so after N frames the clock
//! reads `N * interval` past the start.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use repsense_core::{ExerciseKind, KeypointFrame, ManualClock, Phase, RepsenseResult};
use repsense_runtime::{
    profiles, EngineConfig, ExerciseResult, ExerciseSession, ExternalCapture, FrameReport,
    ResultSink, SessionSummary,
};

use crate::synth::PoseBuilder;

/// 30 fps
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_micros(33_333);

/// Runs scripted frames through one running session
pub struct ScenarioRunner {
    session: ExerciseSession<ManualClock>,
    clock: ManualClock,
    interval: Duration,
    rng: StdRng,
    jitter: f32,
    reports: Vec<FrameReport>,
}

impl ScenarioRunner {
    /// Running session with the default configuration
    pub fn new(kind: ExerciseKind) -> RepsenseResult<Self> {
        Self::with_config(kind, &EngineConfig::default())
    }

    pub fn with_config(kind: ExerciseKind, config: &EngineConfig) -> RepsenseResult<Self> {
        let clock = ManualClock::new();
        let profile = profiles::profile_for(kind, config)?;
        let mut session = ExerciseSession::with_clock(profile, config, clock.clone());
        session.start(&mut ExternalCapture)?;

        Ok(ScenarioRunner {
            session,
            clock,
            interval: DEFAULT_FRAME_INTERVAL,
            rng: StdRng::seed_from_u64(0),
            jitter: 0.0,
            reports: Vec::new(),
        })
    }

    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Seeded positional noise applied to every built frame
    pub fn jitter(mut self, seed: u64, amplitude: f32) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self.jitter = amplitude;
        self
    }

    pub fn session(&self) -> &ExerciseSession<ManualClock> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ExerciseSession<ManualClock> {
        &mut self.session
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn reports(&self) -> &[FrameReport] {
        &self.reports
    }

    pub fn last_report(&self) -> Option<&FrameReport> {
        self.reports.last()
    }

    /// Let wall time pass without frames
    pub fn idle(&mut self, duration: Duration) {
        self.clock.advance(duration);
    }

    /// Process one prebuilt frame
    pub fn step_frame(&mut self, frame: &KeypointFrame) -> &FrameReport {
        let report = self.session.process_frame(frame);
        self.clock.advance(self.interval);
        self.reports.push(report);
        &self.reports[self.reports.len() - 1]
    }

    /// Build (with jitter, if configured) and process one frame
    pub fn step(&mut self, pose: &PoseBuilder) -> &FrameReport {
        let frame = pose.build_jittered(&mut self.rng, self.jitter);
        self.step_frame(&frame)
    }

    /// Process `count` copies of `pose`
    pub fn repeat(&mut self, pose: &PoseBuilder, count: usize) {
        for _ in 0..count {
            self.step(pose);
        }
    }

    /// Process one frame per pose
    pub fn run<'a>(&mut self, poses: impl IntoIterator<Item = &'a PoseBuilder>) {
        for pose in poses {
            self.step(pose);
        }
    }

    /// Feed `pose` until the session reaches `phase`; returns the number of
    /// frames used, or `None` after `max_frames`
    pub fn until_phase(&mut self, pose: &PoseBuilder, phase: Phase, max_frames: usize) -> Option<usize> {
        for n in 1..=max_frames {
            if self.step(pose).phase == phase {
                return Some(n);
            }
        }
        None
    }

    /// Every visible feedback text, in order
    pub fn feedback_texts(&self) -> Vec<&str> {
        self.reports
            .iter()
            .filter_map(|r| r.feedback.as_ref())
            .map(|f| f.text.as_str())
            .collect()
    }

    pub fn stop(&mut self) -> RepsenseResult<SessionSummary> {
        self.session.stop()
    }

    pub fn finalize(self, sink: &mut dyn ResultSink) -> RepsenseResult<ExerciseResult> {
        self.session.finalize(sink)
    }
}
