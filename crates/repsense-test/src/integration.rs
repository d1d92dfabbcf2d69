//! End-to-end scenarios
//!
//! Scripted sessions that exercise the whole pipeline:
//! - Clean reps and the cooldown window
//! - Plank hold accumulation across an interruption
//! - Gates (landmarks, visibility, stability, orientation, readiness)
//! - Feedback, speech and persistence

use std::time::Duration;

use repsense_core::{ExerciseKind, Phase, RepsenseError, RepsenseResult};
use repsense_runtime::SessionSummary;

use crate::scenario::ScenarioRunner;
use crate::synth::{angle_cycle, angle_cycles, PoseBuilder};

/// Frame interval that divides whole seconds exactly
pub const HOLD_FRAME_INTERVAL: Duration = Duration::from_millis(40);

fn not_reached(what: &str) -> RepsenseError {
    RepsenseError::InvalidConfig(format!("scenario never reached {what}"))
}

/// Stand in a T-pose until the session arms
pub fn warm_up_squat(runner: &mut ScenarioRunner) -> RepsenseResult<usize> {
    runner
        .until_phase(&PoseBuilder::front_standing(), Phase::Up, 120)
        .ok_or_else(|| not_reached("the ready posture"))
}

/// Hold the push-up top position until the session arms
pub fn warm_up_push_up(runner: &mut ScenarioRunner) -> RepsenseResult<usize> {
    runner
        .until_phase(&PoseBuilder::side_push_up(170.0), Phase::Up, 120)
        .ok_or_else(|| not_reached("the ready posture"))
}

/// One clean squat over 40 frames: 170 to 90 and back, twice. The second
/// dip falls inside the cooldown window that follows the counted rep.
pub fn clean_squat_scenario() -> RepsenseResult<SessionSummary> {
    let mut runner = ScenarioRunner::new(ExerciseKind::Squat)?;
    warm_up_squat(&mut runner)?;

    let poses: Vec<_> = angle_cycles(170.0, 90.0, 10, 2)
        .into_iter()
        .map(PoseBuilder::front_squat)
        .collect();
    runner.run(&poses);
    runner.stop()
}

/// `reps` clean push-ups, each followed by enough rest frames to clear the
/// cooldown
pub fn push_up_scenario(reps: usize) -> RepsenseResult<ScenarioRunner> {
    let mut runner = ScenarioRunner::new(ExerciseKind::PushUp)?;
    warm_up_push_up(&mut runner)?;

    let top = PoseBuilder::side_push_up(170.0);
    for _ in 0..reps {
        let cycle: Vec<_> = angle_cycle(170.0, 90.0, 10)
            .into_iter()
            .map(PoseBuilder::side_push_up)
            .collect();
        runner.run(&cycle);
        runner.repeat(&top, 20);
    }
    Ok(runner)
}

/// Plank held 3 s, broken 1 s, held 2 s, then stopped
pub fn interrupted_plank_scenario() -> RepsenseResult<SessionSummary> {
    let mut runner =
        ScenarioRunner::new(ExerciseKind::Plank)?.frame_interval(HOLD_FRAME_INTERVAL);
    let hold = PoseBuilder::plank_hold();
    let broken = PoseBuilder::plank_broken();

    // The frame that opens the segment is the first of the 3 s
    runner
        .until_phase(&hold, Phase::Holding, 120)
        .ok_or_else(|| not_reached("a stable hold"))?;
    runner.repeat(&hold, 74);
    runner.repeat(&broken, 25);
    runner.repeat(&hold, 50);
    runner.stop()
}
