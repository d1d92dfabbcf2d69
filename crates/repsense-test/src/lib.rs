//! repsense Test Harness - synthetic frames and pipeline validation
//!
//! This crate provides:
//! - Angle-driven synthetic skeletons (front T-pose squat, side push-up, plank)
//! - Visibility, scale and seeded jitter overrides
//! - A scenario runner on a manual clock
//! - Scripted end-to-end sessions
//! - Session-level property tests

pub mod integration;
pub mod properties;
pub mod scenario;
pub mod synth;

pub use integration::*;
pub use properties::*;
pub use scenario::*;
pub use synth::*;
