//! Exercise profile - one configuration record per exercise
//!
//! The engine has a single phase model per family. A profile only picks
//! which predicates feed it.

use repsense_core::{ExerciseKind, LandmarkMap, Orientation};

use crate::{CyclicVariant, HoldCheck, Predicate, ScoringConfig};

/// Cyclic exercise parameters
#[derive(Clone, Debug)]
pub struct CyclicSpec {
    /// Predicates used while the committed orientation is front
    pub front: CyclicVariant,
    /// Predicates used while the committed orientation is side
    pub side: CyclicVariant,
    /// Frames skipped after every counted rep
    pub cooldown_frames: u32,
}

impl CyclicSpec {
    /// Orientation swaps the predicates, never the phase model
    pub fn variant(&self, orientation: Orientation) -> &CyclicVariant {
        match orientation {
            Orientation::Front => &self.front,
            Orientation::Side => &self.side,
        }
    }
}

/// Isometric exercise parameters
#[derive(Clone, Debug)]
pub struct HoldSpec {
    pub stable: Predicate,
    /// Judged once when the session stops
    pub check: HoldCheck,
}

/// Tagged exercise family
#[derive(Clone, Debug)]
pub enum ExerciseMode {
    Cyclic(CyclicSpec),
    Hold(HoldSpec),
}

/// User-facing cue strings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileCues {
    /// Spoken once when the readiness gate opens
    pub ready: String,
    /// Text shown on the Up -> Down edge
    pub down: Option<String>,
    /// Rep result when no check fails; hold summary when the hold passes
    pub success: String,
    /// Shown while a hold segment stays open
    pub holding: Option<String>,
    /// Spoken when a hold segment opens
    pub hold_started: Option<String>,
    /// Shown when a hold segment closes
    pub hold_lost: Option<String>,
    /// Spoken when counting pauses
    pub paused: Option<String>,
    /// Spoken when the starting posture returns after a pause
    pub resumed: Option<String>,
    /// Shown while waiting for the ready posture
    pub get_into_position: String,
    /// Shown while the ready posture is being held
    pub hold_position: String,
}

impl Default for ProfileCues {
    fn default() -> Self {
        ProfileCues {
            ready: "Let's begin!".into(),
            down: None,
            success: "Great rep!".into(),
            holding: None,
            hold_started: None,
            hold_lost: None,
            paused: None,
            resumed: None,
            get_into_position: "Get into position".into(),
            hold_position: "Hold position...".into(),
        }
    }
}

/// Everything the engine needs to run one exercise
#[derive(Clone, Debug)]
pub struct ExerciseProfile {
    pub kind: ExerciseKind,
    pub landmarks: LandmarkMap,
    /// Starting posture
    pub ready: Predicate,
    /// Consecutive ready frames before the session starts
    pub ready_frames: u32,
    pub mode: ExerciseMode,
    pub scoring: ScoringConfig,
    pub cues: ProfileCues,
}

impl ExerciseProfile {
    pub fn is_hold(&self) -> bool {
        matches!(self.mode, ExerciseMode::Hold(_))
    }
}
