//! Built-in exercise profiles
//!
//! Each builder turns an [`ExerciseTuning`] into predicates for the shared
//! phase engine. Nothing here holds state.

use repsense_core::{ExerciseKind, LandmarkMap, RepsenseResult};
use repsense_phase::{
    CyclicSpec, CyclicVariant, ExerciseMode, ExerciseProfile, FormCheck, HoldCheck, HoldSpec,
    Hysteresis, Metric, PauseRule, Predicate, ProfileCues, ScoringConfig, Sides,
};

use crate::{EngineConfig, ExerciseTuning};

/// Elbow straighter than this reads as extended
const ARM_STRAIGHT: f32 = 160.0;
/// Max |shoulder.y - wrist.y| for arms held level
const ARM_LEVEL: f32 = 0.1;
/// Joint angle treated as full depth for travel checks
const FULL_DEPTH: f32 = 90.0;
/// Shoulder rise above the locked push-up posture that pauses counting
const PAUSE_RISE: f32 = 0.02;
/// Max shoulder-to-ankle tilt for a horizontal body, degrees
const BODY_LEVEL: f32 = 30.0;

/// Profile for `kind` using the configured tuning
pub fn profile_for(kind: ExerciseKind, config: &EngineConfig) -> RepsenseResult<ExerciseProfile> {
    build(kind, &config.tuning(kind))
}

/// Profile for `kind` with explicit tuning
pub fn build(kind: ExerciseKind, tuning: &ExerciseTuning) -> RepsenseResult<ExerciseProfile> {
    tuning.validate(kind)?;
    match kind {
        ExerciseKind::Squat => squat(tuning),
        ExerciseKind::PushUp => push_up(tuning),
        ExerciseKind::Lunge => lunge(tuning),
        ExerciseKind::Burpee => burpee(tuning),
        ExerciseKind::Plank => Ok(plank(tuning)),
    }
}

/// Arms extended horizontally at shoulder height
fn t_pose() -> Predicate {
    Predicate::All(vec![
        Predicate::Above(Metric::ElbowAngle(Sides::Min), ARM_STRAIGHT),
        Predicate::Below(Metric::ArmLevelOffset(Sides::Max), ARM_LEVEL),
    ])
}

fn cyclic_profile(
    kind: ExerciseKind,
    tuning: &ExerciseTuning,
    ready: Predicate,
    front: CyclicVariant,
    side: CyclicVariant,
    cues: ProfileCues,
) -> ExerciseProfile {
    ExerciseProfile {
        kind,
        landmarks: LandmarkMap::default(),
        ready,
        ready_frames: tuning.ready_frames,
        mode: ExerciseMode::Cyclic(CyclicSpec {
            front,
            side,
            cooldown_frames: tuning.cooldown_frames,
        }),
        scoring: ScoringConfig {
            penalty: tuning.penalty,
        },
        cues,
    }
}

/// Knee-driven rep read from `sides`
fn leg_variant(band: Hysteresis, tuning: &ExerciseTuning, sides: Sides) -> CyclicVariant {
    let knee = Metric::KneeAngle(sides);
    CyclicVariant {
        down: band.down_predicate(knee),
        up: band.up_predicate(knee),
        checks: vec![
            FormCheck::Depth {
                metric: knee,
                full_depth: FULL_DEPTH,
                min_fraction: tuning.depth_fraction,
                message: "Squat deeper".into(),
            },
            FormCheck::Deviation {
                metric: Metric::TorsoTilt,
                tolerance: tuning.back_tolerance,
                message: "Keep your back straight".into(),
            },
            FormCheck::Extension {
                metric: Metric::HipAngle(sides),
                min: tuning.extension_min,
                message: "Stand up fully".into(),
            },
        ],
        pause: None,
    }
}

pub fn squat(tuning: &ExerciseTuning) -> RepsenseResult<ExerciseProfile> {
    let side = Hysteresis::new(tuning.down, tuning.up)?;
    let front = Hysteresis::new(tuning.front_down, tuning.front_up)?;

    // Front view needs both knees past each threshold
    let mut front_variant = leg_variant(front, tuning, Sides::Mean);
    front_variant.down = front.down_predicate(Metric::KneeAngle(Sides::Max));
    front_variant.up = front.up_predicate(Metric::KneeAngle(Sides::Min));

    Ok(cyclic_profile(
        ExerciseKind::Squat,
        tuning,
        t_pose(),
        front_variant,
        leg_variant(side, tuning, Sides::Dominant),
        ProfileCues {
            ready: "Let's begin!".into(),
            down: Some("Squat!".into()),
            success: "Great squat!".into(),
            ..ProfileCues::default()
        },
    ))
}

pub fn lunge(tuning: &ExerciseTuning) -> RepsenseResult<ExerciseProfile> {
    let band = Hysteresis::new(tuning.down, tuning.up)?;
    let front = Hysteresis::new(tuning.front_down, tuning.front_up)?;

    // Either knee bending counts; both must straighten
    let variant = |band: Hysteresis| {
        let mut v = leg_variant(band, tuning, Sides::Min);
        v.checks[0] = FormCheck::Depth {
            metric: Metric::KneeAngle(Sides::Min),
            full_depth: FULL_DEPTH,
            min_fraction: tuning.depth_fraction,
            message: "Lunge deeper".into(),
        };
        v
    };

    Ok(cyclic_profile(
        ExerciseKind::Lunge,
        tuning,
        t_pose(),
        variant(front),
        variant(band),
        ProfileCues {
            down: Some("Down!".into()),
            success: "Great lunge!".into(),
            ..ProfileCues::default()
        },
    ))
}

pub fn burpee(tuning: &ExerciseTuning) -> RepsenseResult<ExerciseProfile> {
    let band = Hysteresis::new(tuning.down, tuning.up)?;
    let front = Hysteresis::new(tuning.front_down, tuning.front_up)?;

    let variant = |band: Hysteresis| CyclicVariant {
        down: Predicate::All(vec![
            band.down_predicate(Metric::KneeAngle(Sides::Max)),
            band.down_predicate(Metric::HipAngle(Sides::Max)),
        ]),
        up: Predicate::All(vec![
            band.up_predicate(Metric::KneeAngle(Sides::Min)),
            band.up_predicate(Metric::HipAngle(Sides::Min)),
        ]),
        checks: vec![
            FormCheck::Depth {
                metric: Metric::KneeAngle(Sides::Mean),
                full_depth: FULL_DEPTH,
                min_fraction: tuning.depth_fraction,
                message: "Get lower on the way down".into(),
            },
            FormCheck::Extension {
                metric: Metric::HipAngle(Sides::Mean),
                min: tuning.extension_min,
                message: "Stand up fully".into(),
            },
        ],
        pause: None,
    };

    Ok(cyclic_profile(
        ExerciseKind::Burpee,
        tuning,
        t_pose(),
        variant(front),
        variant(band),
        ProfileCues {
            down: Some("Down!".into()),
            success: "Great burpee!".into(),
            ..ProfileCues::default()
        },
    ))
}

pub fn push_up(tuning: &ExerciseTuning) -> RepsenseResult<ExerciseProfile> {
    let side = Hysteresis::new(tuning.down, tuning.up)?;
    let front = Hysteresis::new(tuning.front_down, tuning.front_up)?;

    // Depth is how far the shoulders drop toward the hands, relative to
    // their height over the wrists at the top of the rep
    let checks = |elbow: Metric, sides: Sides| {
        vec![
            FormCheck::Depth {
                metric: Metric::ShoulderHeightOverWrist(sides),
                full_depth: 0.0,
                min_fraction: tuning.depth_fraction,
                message: "Go lower next time".into(),
            },
            FormCheck::Deviation {
                metric: Metric::HipAngle(Sides::Dominant),
                tolerance: tuning.back_tolerance,
                message: "Keep your back straight".into(),
            },
            FormCheck::Extension {
                metric: elbow,
                min: tuning.extension_min,
                message: "Straighten your arms fully".into(),
            },
        ]
    };

    let ready = Predicate::All(vec![
        Predicate::Above(Metric::ShoulderLift(Sides::Dominant), 0.1),
        Predicate::Above(Metric::HipAngle(Sides::Dominant), 150.0),
    ]);

    // Counting pauses while the shoulders rise above the locked top
    // position, and resumes once the straight-arm plank returns
    let pause = |sides: Sides, arms: Predicate, level: Option<Predicate>| {
        let mut lock = vec![ready.clone(), arms];
        lock.extend(level);
        PauseRule {
            metric: Metric::ShoulderHeightOverWrist(sides),
            max_rise: PAUSE_RISE,
            resume: Predicate::All(lock),
        }
    };

    // Side view reads the elbow directly; the shoulder dropping past the
    // wrist line also counts as down
    let side_variant = CyclicVariant {
        down: Predicate::Any(vec![
            side.down_predicate(Metric::ElbowAngle(Sides::Dominant)),
            Predicate::Above(Metric::ShoulderBelowWrist(Sides::Dominant), 0.05),
        ]),
        up: side.up_predicate(Metric::ElbowAngle(Sides::Dominant)),
        checks: checks(Metric::ElbowAngle(Sides::Dominant), Sides::Dominant),
        pause: Some(pause(
            Sides::Dominant,
            side.up_predicate(Metric::ElbowAngle(Sides::Dominant)),
            Some(Predicate::Below(Metric::BodyTilt(Sides::Dominant), BODY_LEVEL)),
        )),
    };

    // Front view falls back to vertical shoulder displacement from the nose;
    // the ankles are not reliable there so the lock skips the body line
    let front_variant = CyclicVariant {
        down: Predicate::Any(vec![
            front.down_predicate(Metric::ElbowAngle(Sides::Max)),
            Predicate::Above(Metric::ShoulderDropFromNose, 0.12),
        ]),
        up: front.up_predicate(Metric::ElbowAngle(Sides::Min)),
        checks: checks(Metric::ElbowAngle(Sides::Mean), Sides::Mean),
        pause: Some(pause(
            Sides::Mean,
            front.up_predicate(Metric::ElbowAngle(Sides::Min)),
            None,
        )),
    };

    Ok(cyclic_profile(
        ExerciseKind::PushUp,
        tuning,
        ready,
        front_variant,
        side_variant,
        ProfileCues {
            ready: "Ready, start push-ups".into(),
            down: Some("Down!".into()),
            success: "Great push-up!".into(),
            paused: Some("Hold steady...".into()),
            resumed: Some("Ready again! Continue push-ups".into()),
            ..ProfileCues::default()
        },
    ))
}

pub fn plank(tuning: &ExerciseTuning) -> ExerciseProfile {
    let elbow = Metric::ElbowAngle(Sides::Dominant);
    let level = Predicate::Below(Metric::BodyTilt(Sides::Dominant), tuning.hold_tilt_tolerance);

    let stable = Predicate::All(vec![
        Predicate::Below(Metric::BodyLineDeviation(Sides::Dominant), tuning.hold_line_tolerance),
        level.clone(),
        // Forearm plank or straight-arm plank
        Predicate::Any(vec![
            Predicate::Within(elbow, 60.0, 120.0),
            Predicate::Above(elbow, 150.0),
        ]),
    ]);

    ExerciseProfile {
        kind: ExerciseKind::Plank,
        landmarks: LandmarkMap::default(),
        ready: level,
        ready_frames: tuning.ready_frames,
        mode: ExerciseMode::Hold(HoldSpec {
            stable,
            check: HoldCheck {
                min_share: tuning.hold_min_share,
                message: "Adjust your position!".into(),
            },
        }),
        scoring: ScoringConfig {
            penalty: tuning.penalty,
        },
        cues: ProfileCues {
            ready: "Ready, hold the plank".into(),
            success: "Great plank!".into(),
            holding: Some("Great plank! Keep holding!".into()),
            hold_started: Some("Plank started, keep holding!".into()),
            hold_lost: Some("Adjust your position!".into()),
            ..ProfileCues::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_builds() {
        let config = EngineConfig::default();
        for kind in ExerciseKind::all() {
            let profile = profile_for(*kind, &config).unwrap();
            assert_eq!(profile.kind, *kind);
            assert_eq!(profile.is_hold(), kind.is_hold());
        }
    }

    #[test]
    fn test_push_up_cooldown_and_debounce() {
        let profile = build(
            ExerciseKind::PushUp,
            &ExerciseTuning::defaults(ExerciseKind::PushUp),
        )
        .unwrap();
        assert_eq!(profile.ready_frames, 15);
        match profile.mode {
            ExerciseMode::Cyclic(spec) => assert_eq!(spec.cooldown_frames, 20),
            ExerciseMode::Hold(_) => panic!("push-up is cyclic"),
        }
    }

    #[test]
    fn test_push_up_pauses_in_both_views() {
        let profile = build(
            ExerciseKind::PushUp,
            &ExerciseTuning::defaults(ExerciseKind::PushUp),
        )
        .unwrap();
        assert_eq!(profile.cues.paused.as_deref(), Some("Hold steady..."));
        let ExerciseMode::Cyclic(spec) = profile.mode else {
            panic!("push-up is cyclic");
        };
        for variant in [&spec.side, &spec.front] {
            let rule = variant.pause.as_ref().unwrap();
            assert_eq!(rule.max_rise, PAUSE_RISE);
            assert!(matches!(
                variant.checks[0],
                FormCheck::Depth { metric: Metric::ShoulderHeightOverWrist(_), .. }
            ));
        }
    }

    #[test]
    fn test_plank_confirms_readiness_and_judges_share() {
        let profile = plank(&ExerciseTuning::defaults(ExerciseKind::Plank));
        assert_eq!(profile.cues.ready, "Ready, hold the plank");
        match profile.mode {
            ExerciseMode::Hold(spec) => assert_eq!(spec.check.min_share, 0.9),
            ExerciseMode::Cyclic(_) => panic!("plank is a hold"),
        }
    }

    #[test]
    fn test_invalid_tuning_is_rejected() {
        let mut tuning = ExerciseTuning::defaults(ExerciseKind::Squat);
        tuning.up = tuning.down;
        assert!(build(ExerciseKind::Squat, &tuning).is_err());
    }
}
