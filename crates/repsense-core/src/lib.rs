//! repsense Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout the engine:
//! - Landmarks, keypoint frames and the anatomical slot map
//! - Time primitives (FrameTime) and the clock abstraction
//! - Exercise, phase and orientation vocabulary
//! - Session identifiers and the error type

pub mod error;
pub mod exercise;
pub mod id;
pub mod landmark;
pub mod time;

pub use error::*;
pub use exercise::*;
pub use id::*;
pub use landmark::*;
pub use time::*;
