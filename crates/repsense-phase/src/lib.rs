//! repsense Phase Engine - predicate-driven exercise state
//!
//! This crate implements the per-exercise core:
//! - Pose metrics and declarative predicates
//! - Hysteresis bands (up threshold strictly above down)
//! - Cyclic repetition counter with cooldown
//! - Hold accumulator for isometric exercises
//! - Form scoring against a baseline captured at phase entry
//! - Exercise profiles (`Cyclic` / `Hold`)

pub mod hold;
pub mod metric;
pub mod predicate;
pub mod profile;
pub mod rep;
pub mod scoring;

pub use hold::*;
pub use metric::*;
pub use predicate::*;
pub use profile::*;
pub use rep::*;
pub use scoring::*;
