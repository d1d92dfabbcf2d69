//! Exercise session - lifecycle and the per-frame pipeline
//!
//! Idle -> Running -> Stopped. A stopped session is terminal.
//!
//! Each frame runs: landmark count -> stability -> orientation -> readiness
//! -> phase. The first gate that fails short-circuits the frame and sets
//! the corrective message; no counter moves on a gated frame.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use repsense_core::{
    Clock, ExerciseKind, FrameTime, KeypointFrame, Orientation, Phase, Pose, RepsenseError,
    RepsenseResult, SessionId, SystemClock,
};
use repsense_feedback::{FeedbackEvent, FeedbackKind, FeedbackThrottle, NotificationQueue};
use repsense_motion::{
    GateStatus, OrientationClassifier, ReadinessGate, Stability, StabilityClassifier,
};
use repsense_phase::{
    ExerciseMode, ExerciseProfile, FormScore, FormScorer, HoldAccumulator, HoldEvent, PoseSample,
    RepCounter, RepEvaluation, RepEvent,
};

use crate::{EngineConfig, ExerciseResult, ResultSink, SessionConfig};

/// Session lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopped,
}

/// Camera/permission collaborator
pub trait CaptureDevice {
    /// Acquire the camera; an error keeps the session Idle
    fn open(&mut self) -> RepsenseResult<()>;

    fn close(&mut self) {}
}

/// Capture that is always available (frames are pushed by the caller)
#[derive(Clone, Copy, Debug, Default)]
pub struct ExternalCapture;

impl CaptureDevice for ExternalCapture {
    fn open(&mut self) -> RepsenseResult<()> {
        Ok(())
    }
}

/// Gate that short-circuited a frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    /// Session not running
    Inactive,
    /// Frame shorter than the landmark map needs
    InsufficientLandmarks,
    /// Required landmarks below the visibility threshold
    LowVisibility,
    /// Body scale jumping
    Unstable,
    /// Sustained dropout or scale shift; orientation starts over
    Repositioning,
    /// Orientation not yet committed
    Unoriented,
    /// Ready posture not yet held long enough
    NotReady,
}

impl Gate {
    /// Corrective message shown for this gate
    pub fn message(self) -> &'static str {
        match self {
            Gate::Inactive => "",
            Gate::InsufficientLandmarks => "Move back - not enough data",
            Gate::LowVisibility => "Make sure your full body is visible",
            Gate::Unstable | Gate::Unoriented => "Hold still...",
            Gate::Repositioning => "Repositioning...",
            Gate::NotReady => "Get into position",
        }
    }
}

/// Result of one completed rep
#[derive(Clone, Debug, PartialEq)]
pub struct RepOutcome {
    pub rep: u32,
    pub accuracy: f32,
    pub message: String,
}

/// What one frame did
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub phase: Phase,
    pub gate: Option<Gate>,
    pub orientation: Option<Orientation>,
    pub reps: u32,
    pub hold: Duration,
    /// New visible feedback, already throttled and deduplicated
    pub feedback: Option<FeedbackEvent>,
    pub rep: Option<RepOutcome>,
}

/// Frozen session outcome
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSummary {
    pub id: SessionId,
    pub exercise: ExerciseKind,
    pub reps: u32,
    pub hold: Duration,
    pub score: FormScore,
    pub last_rep_accuracy: Option<f32>,
    /// Distinct messages, first-seen order, capped
    pub feedback: Vec<String>,
    pub elapsed: Duration,
}

impl SessionSummary {
    pub fn to_result(&self) -> ExerciseResult {
        let reps_or_duration_seconds = if self.exercise.is_hold() {
            self.hold.as_millis() as f64 / 1000.0
        } else {
            f64::from(self.reps)
        };
        ExerciseResult {
            exercise: self.exercise,
            reps_or_duration_seconds,
            form_accuracy_percent: self.score.accuracy,
            feedback: self.feedback.clone(),
            elapsed_seconds: self.elapsed.as_millis() as f64 / 1000.0,
        }
    }
}

/// Frame timing counters
#[derive(Clone, Debug, Default)]
pub struct SessionStats {
    pub frames: u64,
    pub frames_gated: u64,
    pub last_frame_duration: Duration,
    pub max_frame_duration: Duration,
}

/// One exercise session
pub struct ExerciseSession<C: Clock = SystemClock> {
    id: SessionId,
    profile: ExerciseProfile,
    config: SessionConfig,
    clock: C,
    state: SessionState,
    stability: StabilityClassifier,
    orientation: OrientationClassifier,
    last_orientation: Option<Orientation>,
    readiness: ReadinessGate,
    reps: RepCounter,
    hold: HoldAccumulator,
    scorer: FormScorer,
    last_rep_accuracy: Option<f32>,
    throttle: FeedbackThrottle,
    queue: NotificationQueue,
    log: Vec<String>,
    started_at: Option<FrameTime>,
    summary: Option<SessionSummary>,
    stats: SessionStats,
}

impl ExerciseSession<SystemClock> {
    pub fn new(profile: ExerciseProfile, config: &EngineConfig) -> Self {
        Self::with_clock(profile, config, SystemClock::new())
    }
}

impl<C: Clock> ExerciseSession<C> {
    pub fn with_clock(profile: ExerciseProfile, config: &EngineConfig, clock: C) -> Self {
        let cooldown = match &profile.mode {
            ExerciseMode::Cyclic(spec) => spec.cooldown_frames,
            ExerciseMode::Hold(_) => 0,
        };
        ExerciseSession {
            id: SessionId::next(),
            readiness: ReadinessGate::new(profile.ready_frames),
            reps: RepCounter::new(cooldown),
            scorer: FormScorer::new(profile.scoring.clone()),
            profile,
            config: config.session.clone(),
            clock,
            state: SessionState::Idle,
            stability: StabilityClassifier::with_config(config.stability.clone()),
            orientation: OrientationClassifier::with_config(config.orientation.clone()),
            last_orientation: None,
            hold: HoldAccumulator::new(),
            last_rep_accuracy: None,
            throttle: FeedbackThrottle::new(&config.throttle),
            queue: NotificationQueue::new(config.queue.clone()),
            log: Vec::new(),
            started_at: None,
            summary: None,
            stats: SessionStats::default(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn profile(&self) -> &ExerciseProfile {
        &self.profile
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Queue a speaker drains; clones share state
    pub fn notifications(&self) -> NotificationQueue {
        self.queue.clone()
    }

    /// Rep-result and form messages so far
    pub fn feedback_log(&self) -> &[String] {
        &self.log
    }

    pub fn reps(&self) -> u32 {
        self.reps.reps()
    }

    pub fn form_accuracy(&self) -> f32 {
        self.scorer.accuracy()
    }

    /// Held time including any open segment
    pub fn hold_duration(&self) -> Duration {
        self.hold.elapsed(self.clock.now())
    }

    pub fn phase(&self) -> Phase {
        if !self.readiness.is_open() {
            return Phase::AwaitingStart;
        }
        match self.profile.mode {
            ExerciseMode::Cyclic(_) => self.reps.phase(),
            ExerciseMode::Hold(_) if self.hold.is_holding() => Phase::Holding,
            ExerciseMode::Hold(_) => Phase::Ready,
        }
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    /// Acquire capture and begin accepting frames
    pub fn start(&mut self, capture: &mut dyn CaptureDevice) -> RepsenseResult<()> {
        match self.state {
            SessionState::Running => return Err(RepsenseError::AlreadyRunning),
            SessionState::Stopped => return Err(RepsenseError::SessionStopped),
            SessionState::Idle => {}
        }

        if let Err(e) = capture.open() {
            warn!(session = %self.id, error = %e, "capture failed, session not started");
            return Err(match e {
                RepsenseError::CaptureFailed(reason) => RepsenseError::CaptureFailed(reason),
                other => RepsenseError::CaptureFailed(other.to_string()),
            });
        }

        self.stability.reset();
        self.orientation.reset();
        self.last_orientation = None;
        self.readiness.reset();
        self.reps.reset();
        self.hold.reset();
        self.scorer.reset();
        self.last_rep_accuracy = None;
        self.throttle.reset();
        self.log.clear();
        self.stats = SessionStats::default();

        let now = self.clock.now();
        self.started_at = Some(now);
        self.state = SessionState::Running;
        info!(session = %self.id, exercise = %self.profile.kind, "session started");
        Ok(())
    }

    /// Run one frame through the pipeline
    ///
    /// The frame is only borrowed for the duration of the call.
    pub fn process_frame(&mut self, frame: &KeypointFrame) -> FrameReport {
        if self.state != SessionState::Running {
            return self.report(Some(Gate::Inactive), None, None);
        }

        let started = Instant::now();
        let now = self.clock.now();
        self.stats.frames += 1;

        let (gate, rep, events) = self.run_pipeline(frame, now);

        let mut shown = None;
        for event in events {
            if let Some(visible) = self.emit(event) {
                shown = Some(visible);
            }
        }
        if shown.is_none() {
            shown = self.throttle.poll(now);
        }
        if gate.is_some() {
            self.stats.frames_gated += 1;
        }

        let elapsed = started.elapsed();
        self.stats.last_frame_duration = elapsed;
        self.stats.max_frame_duration = self.stats.max_frame_duration.max(elapsed);

        self.report(gate, shown, rep)
    }

    fn run_pipeline(
        &mut self,
        frame: &KeypointFrame,
        now: FrameTime,
    ) -> (Option<Gate>, Option<RepOutcome>, Vec<FeedbackEvent>) {
        let gated = |gate: Gate| {
            (
                Some(gate),
                None,
                vec![FeedbackEvent::text(FeedbackKind::Gate, gate.message(), now)],
            )
        };

        let pose = Pose::new(frame, &self.profile.landmarks);
        if let Err(e) = pose.require() {
            debug!(error = %e, "frame gated");
            self.hold.close(now);
            return gated(Gate::InsufficientLandmarks);
        }

        // Any gated frame counts as the hold predicate going false
        match self.stability.classify(&pose) {
            Stability::Stable => {}
            Stability::InsufficientData => {
                self.hold.close(now);
                return gated(Gate::LowVisibility);
            }
            Stability::Unstable => {
                debug!("frame gated: unstable");
                self.hold.close(now);
                return gated(Gate::Unstable);
            }
            Stability::Repositioning => {
                warn!(session = %self.id, "repositioning, orientation reset");
                self.hold.close(now);
                self.reps.abandon_rep();
                self.orientation.reset();
                self.last_orientation = None;
                return gated(Gate::Repositioning);
            }
        }

        let Some(orientation) = self.orientation.observe(&pose) else {
            return gated(Gate::Unoriented);
        };
        if self.last_orientation.is_some_and(|prev| prev != orientation) {
            // Baseline was taken with the other view's metrics
            self.reps.abandon_rep();
        }
        self.last_orientation = Some(orientation);

        let sample = PoseSample::new(pose);
        let mut events = Vec::new();

        if !self.readiness.is_open() {
            let satisfied = self.profile.ready.evaluate(&sample);
            let waiting = match self.readiness.observe(satisfied) {
                GateStatus::Ready => None,
                GateStatus::Waiting { progress, .. } if progress > 0 => {
                    Some(self.profile.cues.hold_position.clone())
                }
                _ => Some(self.profile.cues.get_into_position.clone()),
            };
            if let Some(text) = waiting {
                events.push(FeedbackEvent::text(FeedbackKind::Cue, text, now));
                return (Some(Gate::NotReady), None, events);
            }

            if let ExerciseMode::Cyclic(spec) = &self.profile.mode {
                self.reps.arm(spec.variant(orientation), &sample);
            }
            info!(session = %self.id, orientation = orientation.as_str(), "session ready");
            events.push(FeedbackEvent::spoken(
                FeedbackKind::Cue,
                self.profile.cues.ready.clone(),
                now,
            ));
            // A hold is timed from the frame the gate opens
            if !self.profile.is_hold() {
                return (None, None, events);
            }
        }

        let spoken_cue = |text: &Option<String>| {
            text.as_ref()
                .map(|t| FeedbackEvent::spoken(FeedbackKind::Cue, t.clone(), now))
        };

        let (rep, event) = match &self.profile.mode {
            ExerciseMode::Cyclic(spec) => {
                match self.reps.observe(spec.variant(orientation), &sample) {
                    RepEvent::EnteredDown => {
                        let event = self
                            .profile
                            .cues
                            .down
                            .as_ref()
                            .map(|text| FeedbackEvent::text(FeedbackKind::Cue, text.clone(), now));
                        (None, event)
                    }
                    RepEvent::Completed { rep, evaluation } => {
                        let outcome = self.score_rep(rep, &evaluation);
                        let event = FeedbackEvent::spoken(
                            FeedbackKind::RepResult,
                            outcome.message.clone(),
                            now,
                        );
                        (Some(outcome), Some(event))
                    }
                    RepEvent::Paused => (None, spoken_cue(&self.profile.cues.paused)),
                    RepEvent::Resumed => (None, spoken_cue(&self.profile.cues.resumed)),
                    RepEvent::Steady | RepEvent::Cooldown { .. } => (None, None),
                }
            }
            ExerciseMode::Hold(spec) => {
                let stable = spec.stable.evaluate(&sample);
                let cues = &self.profile.cues;
                let event = match self.hold.observe(stable, now) {
                    HoldEvent::Opened => cues
                        .hold_started
                        .as_ref()
                        .map(|t| FeedbackEvent::spoken(FeedbackKind::Hold, t.clone(), now)),
                    HoldEvent::Continuing => cues
                        .holding
                        .as_ref()
                        .map(|t| FeedbackEvent::text(FeedbackKind::Hold, t.clone(), now)),
                    // Breaks are logged here and judged once at stop
                    HoldEvent::Closed(_) => {
                        let lost = cues.hold_lost.clone();
                        if let Some(text) = &lost {
                            self.push_log(text.clone());
                        }
                        lost.map(|t| FeedbackEvent::spoken(FeedbackKind::Hold, t, now))
                    }
                    HoldEvent::Idle => cues
                        .hold_lost
                        .as_ref()
                        .map(|t| FeedbackEvent::text(FeedbackKind::Hold, t.clone(), now)),
                };
                (None, event)
            }
        };
        events.extend(event);
        (None, rep, events)
    }

    /// Score the whole hold once: share of time in position
    fn judge_hold(&mut self) {
        let ExerciseMode::Hold(spec) = &self.profile.mode else {
            return;
        };
        let (held, broken) = (self.hold.accumulated(), self.hold.broken());
        if (held + broken).is_zero() {
            return;
        }
        let evaluation = spec.check.evaluate(held, broken);
        let accuracy = self.scorer.record(&evaluation);
        self.last_rep_accuracy = Some(accuracy);
        let message = evaluation.headline(&self.profile.cues.success).to_string();
        info!(
            session = %self.id,
            held_ms = held.as_millis() as u64,
            broken_ms = broken.as_millis() as u64,
            accuracy,
            "hold judged"
        );
        self.push_log(message);
    }

    fn score_rep(&mut self, rep: u32, evaluation: &RepEvaluation) -> RepOutcome {
        let accuracy = self.scorer.record(evaluation);
        self.last_rep_accuracy = Some(accuracy);
        let message = evaluation.headline(&self.profile.cues.success).to_string();
        self.push_log(message.clone());
        RepOutcome {
            rep,
            accuracy,
            message,
        }
    }

    fn push_log(&mut self, message: String) {
        if self.log.len() < self.config.feedback_log_cap {
            self.log.push(message);
        }
    }

    /// Queue the spoken part and throttle the text part
    fn emit(&mut self, event: FeedbackEvent) -> Option<FeedbackEvent> {
        if let Some(speak) = &event.speak {
            self.queue.push(speak.clone());
        }
        self.throttle.offer(event)
    }

    fn report(
        &self,
        gate: Option<Gate>,
        feedback: Option<FeedbackEvent>,
        rep: Option<RepOutcome>,
    ) -> FrameReport {
        FrameReport {
            phase: self.phase(),
            gate,
            orientation: self.orientation.committed(),
            reps: self.reps.reps(),
            hold: self.hold.elapsed(self.clock.now()),
            feedback,
            rep,
        }
    }

    /// Freeze counters, judge any hold and flush pending speech
    pub fn stop(&mut self) -> RepsenseResult<SessionSummary> {
        match self.state {
            SessionState::Idle => return Err(RepsenseError::NotRunning),
            SessionState::Stopped => return Err(RepsenseError::SessionStopped),
            SessionState::Running => {}
        }

        let now = self.clock.now();
        self.hold.finish(now);
        self.judge_hold();

        let summary = SessionSummary {
            id: self.id,
            exercise: self.profile.kind,
            reps: self.reps.reps(),
            hold: self.hold.accumulated(),
            score: self.scorer.summary(),
            last_rep_accuracy: self.last_rep_accuracy,
            feedback: self.summary_feedback(),
            elapsed: self.started_at.map_or(Duration::ZERO, |t| now - t),
        };

        let flushed = self.queue.flush();
        self.state = SessionState::Stopped;
        info!(
            session = %self.id,
            reps = summary.reps,
            hold_ms = summary.hold.as_millis() as u64,
            accuracy = summary.score.accuracy,
            flushed,
            "session stopped"
        );

        self.summary = Some(summary.clone());
        Ok(summary)
    }

    /// Distinct log messages in first-seen order
    fn summary_feedback(&self) -> Vec<String> {
        let mut distinct: Vec<String> = Vec::new();
        for message in &self.log {
            if distinct.len() >= self.config.summary_feedback_cap {
                break;
            }
            if !distinct.contains(message) {
                distinct.push(message.clone());
            }
        }
        distinct
    }

    /// Stop if still running, hand the result to persistence, and consume
    /// the session
    pub fn finalize(mut self, sink: &mut dyn ResultSink) -> RepsenseResult<ExerciseResult> {
        let summary = match self.state {
            SessionState::Idle => return Err(RepsenseError::NotRunning),
            SessionState::Running => self.stop()?,
            SessionState::Stopped => self.summary.clone().ok_or(RepsenseError::SessionStopped)?,
        };

        let result = summary.to_result();
        sink.persist(&result)?;
        self.queue.close();
        info!(session = %self.id, "session finalized");
        Ok(result)
    }
}
