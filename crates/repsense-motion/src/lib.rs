//! repsense Motion - classifying raw frames before phase evaluation
//!
//! This crate implements the gates every frame passes through:
//! - Stability: rolling body scale and visibility dropout
//! - Orientation: front/side with consecutive-agreement hysteresis
//! - Readiness: debounced starting-posture detection

pub mod orientation;
pub mod readiness;
pub mod stability;

pub use orientation::*;
pub use readiness::*;
pub use stability::*;
