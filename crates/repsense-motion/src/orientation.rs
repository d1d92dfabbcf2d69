//! Orientation classifier - front/side with hysteresis
//!
//! INVARIANT: the committed orientation changes only after the candidate
//! has agreed for `commit_frames` consecutive frames. Never on one frame.

use serde::Deserialize;
use tracing::info;

use repsense_core::{Orientation, Pose};
use repsense_geometry::BodyMetrics;

/// Orientation classifier configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    /// Span/torso ratio above which the body faces the camera
    pub front_ratio_cutoff: f32,
    /// Consecutive agreeing frames required to commit
    pub commit_frames: u32,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        OrientationConfig {
            front_ratio_cutoff: 0.62,
            commit_frames: 10,
        }
    }
}

/// Committed orientation plus the pending candidate
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrientationState {
    pub committed: Option<Orientation>,
    pub candidate: Option<Orientation>,
    pub agreement: u32,
}

/// Orientation classifier
pub struct OrientationClassifier {
    state: OrientationState,
    config: OrientationConfig,
}

impl OrientationClassifier {
    pub fn new() -> Self {
        Self::with_config(OrientationConfig::default())
    }

    pub fn with_config(config: OrientationConfig) -> Self {
        OrientationClassifier {
            state: OrientationState::default(),
            config,
        }
    }

    pub fn state(&self) -> &OrientationState {
        &self.state
    }

    pub fn committed(&self) -> Option<Orientation> {
        self.state.committed
    }

    /// Re-evaluate from scratch
    pub fn reset(&mut self) {
        self.state = OrientationState::default();
    }

    /// Single-frame candidate for a span/torso ratio
    pub fn candidate_for(&self, ratio: f32) -> Orientation {
        if ratio > self.config.front_ratio_cutoff {
            Orientation::Front
        } else {
            Orientation::Side
        }
    }

    /// Feed one frame; returns the committed orientation, if any
    pub fn observe(&mut self, pose: &Pose<'_>) -> Option<Orientation> {
        match BodyMetrics::measure(pose).aspect_ratio() {
            Some(ratio) => self.observe_candidate(self.candidate_for(ratio)),
            None => self.state.committed,
        }
    }

    /// Feed one precomputed candidate
    pub fn observe_candidate(&mut self, candidate: Orientation) -> Option<Orientation> {
        if self.state.candidate == Some(candidate) {
            self.state.agreement = self.state.agreement.saturating_add(1);
        } else {
            self.state.candidate = Some(candidate);
            self.state.agreement = 1;
        }

        if self.state.agreement >= self.config.commit_frames
            && self.state.committed != Some(candidate)
        {
            info!(
                from = ?self.state.committed,
                to = candidate.as_str(),
                "orientation committed"
            );
            self.state.committed = Some(candidate);
        }

        self.state.committed
    }
}

impl Default for OrientationClassifier {
    fn default() -> Self {
        Self::new()
    }
}
