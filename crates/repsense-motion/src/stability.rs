//! Stability classifier - rolling scale and visibility dropout
//!
//! INVARIANT: the rolling scale is only updated from frames that are both
//! visible and within the jump tolerance. A transient occlusion or a single
//! bad detection never moves the baseline.

use serde::Deserialize;
use tracing::{debug, warn};

use repsense_core::{Pose, Slot};
use repsense_geometry::BodyMetrics;

/// Stability classifier configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Relative scale change that counts as a jump
    pub scale_jump_ratio: f32,
    /// Consecutive jumping frames tolerated before flagging instability
    pub unstable_frame_limit: u32,
    /// Minimum visibility of the required landmarks
    pub visibility_threshold: f32,
    /// Consecutive dropout frames before a repositioning is signalled
    pub dropout_frame_limit: u32,
    /// Consecutive jumping frames after which the new scale is adopted
    pub rebaseline_frames: u32,
    /// Weight of the newest frame in the rolling scale
    pub scale_smoothing: f32,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        StabilityConfig {
            scale_jump_ratio: 0.25,
            unstable_frame_limit: 10,
            visibility_threshold: 0.6,
            dropout_frame_limit: 15,
            rebaseline_frames: 30,
            scale_smoothing: 0.2,
        }
    }
}

impl StabilityConfig {
    /// Configuration for shaky handheld cameras
    pub fn tolerant() -> Self {
        StabilityConfig {
            scale_jump_ratio: 0.35,
            unstable_frame_limit: 15,
            visibility_threshold: 0.5,
            dropout_frame_limit: 25,
            rebaseline_frames: 45,
            scale_smoothing: 0.1,
        }
    }
}

/// Landmarks that must be visible for any evaluation
pub const REQUIRED_SLOTS: [Slot; 2] = [Slot::LeftShoulder, Slot::RightShoulder];

/// Per-frame stability verdict
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stability {
    /// Visible and consistent with the rolling scale
    Stable,
    /// Scale has jumped for longer than tolerated
    Unstable,
    /// Required landmarks missing or below the visibility threshold
    InsufficientData,
    /// State was reset; orientation must be re-established from scratch
    Repositioning,
}

impl Stability {
    pub fn is_stable(self) -> bool {
        matches!(self, Stability::Stable)
    }
}

/// Rolling scale and trailing counters
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StabilityState {
    /// Rolling body-size proxy
    pub scale: Option<f32>,
    /// Consecutive frames whose scale jumped
    pub unstable_frames: u32,
    /// Consecutive frames with required landmarks not visible
    pub dropout_frames: u32,
}

/// Stability classifier
pub struct StabilityClassifier {
    state: StabilityState,
    config: StabilityConfig,
}

impl StabilityClassifier {
    pub fn new() -> Self {
        Self::with_config(StabilityConfig::default())
    }

    pub fn with_config(config: StabilityConfig) -> Self {
        StabilityClassifier {
            state: StabilityState::default(),
            config,
        }
    }

    pub fn state(&self) -> &StabilityState {
        &self.state
    }

    pub fn config(&self) -> &StabilityConfig {
        &self.config
    }

    /// Forget the rolling scale and all counters
    pub fn reset(&mut self) {
        self.state = StabilityState::default();
    }

    /// Classify one frame, mutating the rolling state exactly once
    pub fn classify(&mut self, pose: &Pose<'_>) -> Stability {
        if let Err(e) = pose.require_visible(&REQUIRED_SLOTS, self.config.visibility_threshold) {
            self.state.dropout_frames += 1;
            debug!(error = %e, frames = self.state.dropout_frames, "required landmarks not visible");
            if self.state.dropout_frames > self.config.dropout_frame_limit {
                warn!(
                    frames = self.state.dropout_frames,
                    "sustained visibility dropout, repositioning"
                );
                self.reset();
                return Stability::Repositioning;
            }
            return Stability::InsufficientData;
        }
        self.state.dropout_frames = 0;

        let Some(scale) = BodyMetrics::measure(pose).scale() else {
            return Stability::InsufficientData;
        };

        let Some(prev) = self.state.scale else {
            self.state.scale = Some(scale);
            return Stability::Stable;
        };

        let change = (scale - prev).abs() / prev;
        if change > self.config.scale_jump_ratio {
            self.state.unstable_frames += 1;
            debug!(change, frames = self.state.unstable_frames, "scale jump");

            if self.state.unstable_frames >= self.config.rebaseline_frames {
                warn!(prev, scale, "scale shift persisted, adopting new baseline");
                self.state.scale = Some(scale);
                self.state.unstable_frames = 0;
                return Stability::Repositioning;
            }
            if self.state.unstable_frames > self.config.unstable_frame_limit {
                return Stability::Unstable;
            }
            // Tolerated transient: evaluate the frame but keep the baseline
            return Stability::Stable;
        }

        self.state.unstable_frames = 0;
        let w = self.config.scale_smoothing;
        self.state.scale = Some(prev * (1.0 - w) + scale * w);
        Stability::Stable
    }
}

impl Default for StabilityClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repsense_core::{KeypointFrame, Landmark, LandmarkMap};

    /// Front-facing torso with the given shoulder width and visibility
    fn torso(width: f32, visibility: f32) -> KeypointFrame {
        let map = LandmarkMap::default();
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.9); KeypointFrame::BLAZEPOSE_LEN];
        let half = width / 2.0;
        landmarks[map.index(Slot::LeftShoulder)] = Landmark::new(0.5 + half, 0.3, visibility);
        landmarks[map.index(Slot::RightShoulder)] = Landmark::new(0.5 - half, 0.3, visibility);
        landmarks[map.index(Slot::LeftHip)] = Landmark::new(0.55, 0.45, 0.9);
        landmarks[map.index(Slot::RightHip)] = Landmark::new(0.45, 0.45, 0.9);
        KeypointFrame::new(landmarks)
    }

    fn classify(classifier: &mut StabilityClassifier, frame: &KeypointFrame) -> Stability {
        let map = LandmarkMap::default();
        classifier.classify(&Pose::new(frame, &map))
    }

    #[test]
    fn test_steady_body_is_stable() {
        let mut classifier = StabilityClassifier::new();
        for _ in 0..20 {
            assert_eq!(classify(&mut classifier, &torso(0.3, 0.9)), Stability::Stable);
        }
        assert!((classifier.state().scale.unwrap() - 0.3).abs() < 1e-4);
    }

    #[test]
    fn test_transient_jump_does_not_move_baseline() {
        let mut classifier = StabilityClassifier::new();
        classify(&mut classifier, &torso(0.3, 0.9));

        // Short burst of oversized detections stays tolerated
        for _ in 0..10 {
            assert_eq!(classify(&mut classifier, &torso(0.5, 0.9)), Stability::Stable);
        }
        assert!((classifier.state().scale.unwrap() - 0.3).abs() < 1e-4);

        // The eleventh consecutive jump is flagged
        assert_eq!(classify(&mut classifier, &torso(0.5, 0.9)), Stability::Unstable);

        // Returning to normal clears the counter
        assert_eq!(classify(&mut classifier, &torso(0.3, 0.9)), Stability::Stable);
        assert_eq!(classifier.state().unstable_frames, 0);
    }

    #[test]
    fn test_persistent_shift_rebaselines() {
        let mut classifier = StabilityClassifier::new();
        classify(&mut classifier, &torso(0.3, 0.9));

        let mut verdicts = Vec::new();
        for _ in 0..30 {
            verdicts.push(classify(&mut classifier, &torso(0.5, 0.9)));
        }
        assert_eq!(verdicts.last(), Some(&Stability::Repositioning));
        assert!((classifier.state().scale.unwrap() - 0.5).abs() < 1e-4);
        assert_eq!(classify(&mut classifier, &torso(0.5, 0.9)), Stability::Stable);
    }

    #[test]
    fn test_dropout_never_touches_scale() {
        let mut classifier = StabilityClassifier::new();
        classify(&mut classifier, &torso(0.3, 0.9));

        for _ in 0..15 {
            assert_eq!(
                classify(&mut classifier, &torso(0.8, 0.2)),
                Stability::InsufficientData
            );
        }
        assert!((classifier.state().scale.unwrap() - 0.3).abs() < 1e-4);

        // Sixteenth consecutive dropout resets everything
        assert_eq!(classify(&mut classifier, &torso(0.8, 0.2)), Stability::Repositioning);
        assert_eq!(classifier.state(), &StabilityState::default());
    }
}
