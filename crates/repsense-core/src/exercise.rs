//! Exercise, phase and orientation vocabulary
//!
//! Two exercise families share one engine:
//! - Cyclic: counted repetitions through Up/Down phases
//! - Hold: accumulated isometric hold time

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported exercises
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    #[default]
    Squat,
    PushUp,
    Lunge,
    Burpee,
    Plank,
}

impl ExerciseKind {
    pub fn all() -> &'static [ExerciseKind] {
        &[
            ExerciseKind::Squat,
            ExerciseKind::PushUp,
            ExerciseKind::Lunge,
            ExerciseKind::Burpee,
            ExerciseKind::Plank,
        ]
    }

    /// Resolve a display name ("Squats", "push-ups", ...).
    /// Unknown names fall back to squats.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "squat" | "squats" => ExerciseKind::Squat,
            "push-up" | "push-ups" | "pushup" | "pushups" => ExerciseKind::PushUp,
            "lunge" | "lunges" => ExerciseKind::Lunge,
            "burpee" | "burpees" => ExerciseKind::Burpee,
            "plank" | "planks" => ExerciseKind::Plank,
            _ => ExerciseKind::Squat,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseKind::Squat => "squat",
            ExerciseKind::PushUp => "push-up",
            ExerciseKind::Lunge => "lunge",
            ExerciseKind::Burpee => "burpee",
            ExerciseKind::Plank => "plank",
        }
    }

    /// Isometric exercises accumulate time instead of counting reps
    pub fn is_hold(self) -> bool {
        matches!(self, ExerciseKind::Plank)
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Committed discrete state of one session's movement cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Waiting for the starting posture
    #[default]
    AwaitingStart,
    /// Starting posture confirmed, hold not yet running
    Ready,
    /// Top of a cyclic movement
    Up,
    /// Bottom of a cyclic movement
    Down,
    /// Isometric hold segment open
    Holding,
    /// Counting suspended until the starting posture returns
    Paused,
}

impl Phase {
    /// Active phases are past the readiness gate
    pub fn is_active(self) -> bool {
        !matches!(self, Phase::AwaitingStart)
    }
}

/// Camera-relative body orientation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Front,
    Side,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Front => "front",
            Orientation::Side => "side",
        }
    }
}
