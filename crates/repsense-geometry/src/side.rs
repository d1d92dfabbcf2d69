//! Visibility-weighted side selection
//!
//! In a profile view the far limb chain is mostly occluded. Exercises read
//! from one side pick the richer chain instead of averaging a confident
//! landmark with a guessed one.

use repsense_core::{BodyPart, Pose, Side, Slot};

/// Summed visibility of each limb chain
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SideScores {
    pub left: f32,
    pub right: f32,
}

impl SideScores {
    pub fn measure(pose: &Pose<'_>) -> Self {
        let score = |side| {
            BodyPart::chain()
                .iter()
                .map(|part| pose.visibility(Slot::of(*part, side)))
                .sum()
        };
        SideScores {
            left: score(Side::Left),
            right: score(Side::Right),
        }
    }

    /// Richer side; ties go left
    pub fn dominant(&self) -> Side {
        if self.right > self.left {
            Side::Right
        } else {
            Side::Left
        }
    }
}

/// Anatomically richer side of the frame
pub fn dominant_side(pose: &Pose<'_>) -> Side {
    SideScores::measure(pose).dominant()
}
