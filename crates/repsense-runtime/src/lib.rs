//! repsense Runtime - session orchestration and the frame pipeline
//!
//! Every frame runs through the same stages:
//! 1. Check landmark count
//! 2. Classify stability (scale jumps, visibility dropout)
//! 3. Commit orientation (front / side)
//! 4. Debounce the ready posture
//! 5. Advance the rep counter or hold accumulator
//! 6. Score completed reps
//! 7. Throttle visible feedback, queue spoken cues
//!
//! The session freezes on stop and hands an [`ExerciseResult`] to a
//! [`ResultSink`] on finalize.

pub mod config;
pub mod profiles;
pub mod result;
pub mod session;
pub mod telemetry;
pub mod workout;

pub use config::*;
pub use result::*;
pub use session::*;
pub use telemetry::*;
pub use workout::*;
