//! Error types for the repsense engine
//!
//! Frame-level gate failures are not errors: they are reported on the
//! frame outcome. Only lifecycle misuse and collaborator failures land here.

use thiserror::Error;

use crate::Slot;

/// Core repsense errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepsenseError {
    // Frame errors
    #[error("Insufficient landmarks: expected {expected}, got {actual}")]
    InsufficientLandmarks { expected: usize, actual: usize },

    #[error("Landmark below visibility threshold: {0:?}")]
    LowVisibility(Slot),

    // Configuration errors
    #[error("Invalid hysteresis band: up threshold {up} must exceed down threshold {down}")]
    InvalidHysteresis { down: f32, up: f32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Lifecycle errors
    #[error("Session is not running")]
    NotRunning,

    #[error("Session is already running")]
    AlreadyRunning,

    #[error("Session is stopped and cannot be restarted")]
    SessionStopped,

    // Collaborator errors
    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),
}

/// Result type for repsense operations
pub type RepsenseResult<T> = Result<T, RepsenseError>;
