//! Engine configuration - defaults, per-exercise tuning, JSON loading
//!
//! Every field is optional in JSON; anything left out keeps its default.
//!
//! ```json
//! {
//!   "stability": { "unstable_frame_limit": 12 },
//!   "throttle": { "interval_ms": 300 },
//!   "exercises": {
//!     "push-up": { "down": 120.0, "up": 150.0, "cooldown_frames": 18 }
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use repsense_core::{ExerciseKind, RepsenseError, RepsenseResult};
use repsense_feedback::{QueueConfig, ThrottleConfig};
use repsense_motion::{OrientationConfig, StabilityConfig};
use repsense_phase::Hysteresis;

/// Session-level limits
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Entries kept in the feedback log (oldest kept)
    pub feedback_log_cap: usize,
    /// Distinct messages reported in the summary
    pub summary_feedback_cap: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            feedback_log_cap: 32,
            summary_feedback_cap: 5,
        }
    }
}

/// Fully resolved thresholds for one exercise
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseTuning {
    /// Down threshold (side view, or both views when they agree)
    pub down: f32,
    /// Up threshold (side view, or both views when they agree)
    pub up: f32,
    pub front_down: f32,
    pub front_up: f32,
    /// Consecutive frames of the ready posture
    pub ready_frames: u32,
    /// Frames skipped after each counted rep
    pub cooldown_frames: u32,
    /// Points deducted per failing rep
    pub penalty: f32,
    /// Minimum fraction of the full range a rep must travel
    pub depth_fraction: f32,
    /// Allowed back/torso drift during a rep, degrees
    pub back_tolerance: f32,
    /// Minimum limb angle at the top of a rep, degrees
    pub extension_min: f32,
    /// Allowed body-line deviation while holding, degrees
    pub hold_line_tolerance: f32,
    /// Allowed body tilt from horizontal while holding, degrees
    pub hold_tilt_tolerance: f32,
    /// Minimum share of the hold spent in position for a clean verdict
    pub hold_min_share: f32,
}

impl ExerciseTuning {
    /// Built-in thresholds
    pub fn defaults(kind: ExerciseKind) -> Self {
        let base = ExerciseTuning {
            down: 100.0,
            up: 160.0,
            front_down: 100.0,
            front_up: 160.0,
            ready_frames: 12,
            cooldown_frames: 15,
            penalty: 5.0,
            depth_fraction: 0.85,
            back_tolerance: 35.0,
            extension_min: 160.0,
            hold_line_tolerance: 20.0,
            hold_tilt_tolerance: 30.0,
            hold_min_share: 0.9,
        };

        match kind {
            ExerciseKind::Squat | ExerciseKind::Lunge | ExerciseKind::Burpee => base,
            ExerciseKind::PushUp => ExerciseTuning {
                down: 125.0,
                up: 145.0,
                front_down: 120.0,
                front_up: 150.0,
                ready_frames: 15,
                cooldown_frames: 20,
                depth_fraction: 0.45,
                back_tolerance: 15.0,
                extension_min: 155.0,
                ..base
            },
            ExerciseKind::Plank => ExerciseTuning {
                ready_frames: 10,
                cooldown_frames: 0,
                ..base
            },
        }
    }

    pub fn validate(&self, kind: ExerciseKind) -> RepsenseResult<()> {
        if self.ready_frames == 0 {
            return Err(RepsenseError::InvalidConfig(format!(
                "{}: ready_frames must be at least 1",
                kind
            )));
        }
        if !(0.0..=100.0).contains(&self.penalty) {
            return Err(RepsenseError::InvalidConfig(format!(
                "{}: penalty {} outside [0, 100]",
                kind, self.penalty
            )));
        }

        if kind.is_hold() {
            if self.hold_line_tolerance <= 0.0 || self.hold_tilt_tolerance <= 0.0 {
                return Err(RepsenseError::InvalidConfig(format!(
                    "{}: hold tolerances must be positive",
                    kind
                )));
            }
            if !(self.hold_min_share > 0.0 && self.hold_min_share <= 1.0) {
                return Err(RepsenseError::InvalidConfig(format!(
                    "{}: hold_min_share {} outside (0, 1]",
                    kind, self.hold_min_share
                )));
            }
            return Ok(());
        }

        Hysteresis::new(self.down, self.up)?;
        Hysteresis::new(self.front_down, self.front_up)?;
        if !(self.depth_fraction > 0.0 && self.depth_fraction <= 1.0) {
            return Err(RepsenseError::InvalidConfig(format!(
                "{}: depth_fraction {} outside (0, 1]",
                kind, self.depth_fraction
            )));
        }
        Ok(())
    }
}

/// Partial override of [`ExerciseTuning`] as read from JSON
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TuningOverride {
    pub down: Option<f32>,
    pub up: Option<f32>,
    pub front_down: Option<f32>,
    pub front_up: Option<f32>,
    pub ready_frames: Option<u32>,
    pub cooldown_frames: Option<u32>,
    pub penalty: Option<f32>,
    pub depth_fraction: Option<f32>,
    pub back_tolerance: Option<f32>,
    pub extension_min: Option<f32>,
    pub hold_line_tolerance: Option<f32>,
    pub hold_tilt_tolerance: Option<f32>,
    pub hold_min_share: Option<f32>,
}

impl TuningOverride {
    pub fn apply(&self, base: ExerciseTuning) -> ExerciseTuning {
        // A lone down/up override applies to both views
        let down = self.down.unwrap_or(base.down);
        let up = self.up.unwrap_or(base.up);
        ExerciseTuning {
            down,
            up,
            front_down: self.front_down.or(self.down).unwrap_or(base.front_down),
            front_up: self.front_up.or(self.up).unwrap_or(base.front_up),
            ready_frames: self.ready_frames.unwrap_or(base.ready_frames),
            cooldown_frames: self.cooldown_frames.unwrap_or(base.cooldown_frames),
            penalty: self.penalty.unwrap_or(base.penalty),
            depth_fraction: self.depth_fraction.unwrap_or(base.depth_fraction),
            back_tolerance: self.back_tolerance.unwrap_or(base.back_tolerance),
            extension_min: self.extension_min.unwrap_or(base.extension_min),
            hold_line_tolerance: self.hold_line_tolerance.unwrap_or(base.hold_line_tolerance),
            hold_tilt_tolerance: self.hold_tilt_tolerance.unwrap_or(base.hold_tilt_tolerance),
            hold_min_share: self.hold_min_share.unwrap_or(base.hold_min_share),
        }
    }
}

/// Complete engine configuration
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub stability: StabilityConfig,
    pub orientation: OrientationConfig,
    pub throttle: ThrottleConfig,
    pub queue: QueueConfig,
    pub session: SessionConfig,
    pub exercises: HashMap<ExerciseKind, TuningOverride>,
}

impl EngineConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> RepsenseResult<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| RepsenseError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> RepsenseResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| RepsenseError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loading engine configuration");
        Self::from_json_str(&json)
    }

    /// Resolved tuning for one exercise
    pub fn tuning(&self, kind: ExerciseKind) -> ExerciseTuning {
        let base = ExerciseTuning::defaults(kind);
        match self.exercises.get(&kind) {
            Some(over) => over.apply(base),
            None => base,
        }
    }

    pub fn validate(&self) -> RepsenseResult<()> {
        if self.stability.scale_jump_ratio <= 0.0 {
            return Err(RepsenseError::InvalidConfig(
                "stability.scale_jump_ratio must be positive".into(),
            ));
        }
        if self.stability.rebaseline_frames <= self.stability.unstable_frame_limit {
            return Err(RepsenseError::InvalidConfig(
                "stability.rebaseline_frames must exceed unstable_frame_limit".into(),
            ));
        }
        if self.orientation.commit_frames == 0 {
            return Err(RepsenseError::InvalidConfig(
                "orientation.commit_frames must be at least 1".into(),
            ));
        }
        for kind in ExerciseKind::all() {
            self.tuning(*kind).validate(*kind)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config.session.feedback_log_cap, 32);
        assert_eq!(config.throttle.interval_ms, 400);
        assert_eq!(config.tuning(ExerciseKind::Squat), ExerciseTuning::defaults(ExerciseKind::Squat));
    }

    #[test]
    fn test_push_up_defaults() {
        let tuning = ExerciseTuning::defaults(ExerciseKind::PushUp);
        assert_eq!((tuning.down, tuning.up), (125.0, 145.0));
        assert_eq!((tuning.front_down, tuning.front_up), (120.0, 150.0));
        assert_eq!(tuning.cooldown_frames, 20);
        assert_eq!(tuning.ready_frames, 15);
    }

    #[test]
    fn test_override_merges_over_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "exercises": { "push-up": { "down": 120.0, "cooldown_frames": 18 } } }"#,
        )
        .unwrap();
        let tuning = config.tuning(ExerciseKind::PushUp);
        assert_eq!(tuning.down, 120.0);
        assert_eq!(tuning.front_down, 120.0);
        assert_eq!(tuning.up, 145.0);
        assert_eq!(tuning.cooldown_frames, 18);
    }

    #[test]
    fn test_inverted_band_is_rejected() {
        let err = EngineConfig::from_json_str(
            r#"{ "exercises": { "squat": { "down": 160.0, "up": 150.0 } } }"#,
        )
        .unwrap_err();
        assert_eq!(err, RepsenseError::InvalidHysteresis { down: 160.0, up: 150.0 });
    }

    #[test]
    fn test_penalty_range_is_checked() {
        let err = EngineConfig::from_json_str(r#"{ "exercises": { "plank": { "penalty": 120.0 } } }"#)
            .unwrap_err();
        assert!(matches!(err, RepsenseError::InvalidConfig(_)));
    }

    #[test]
    fn test_hold_share_range_is_checked() {
        let err =
            EngineConfig::from_json_str(r#"{ "exercises": { "plank": { "hold_min_share": 0.0 } } }"#)
                .unwrap_err();
        assert!(matches!(err, RepsenseError::InvalidConfig(_)));

        let config =
            EngineConfig::from_json_str(r#"{ "exercises": { "plank": { "hold_min_share": 0.75 } } }"#)
                .unwrap();
        assert_eq!(config.tuning(ExerciseKind::Plank).hold_min_share, 0.75);
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, RepsenseError::Config(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load("/nonexistent/repsense.json").unwrap_err();
        assert!(matches!(err, RepsenseError::Config(_)));
    }
}
