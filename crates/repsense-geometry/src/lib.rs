//! repsense Geometry Engine
//!
//! Pure math over keypoints. No state, no allocation.
//!
//! Every measurement that needs a missing landmark returns the
//! [`UNDEFINED`] sentinel instead of NaN, so callers can compare it against
//! a threshold and simply see "condition not met".

pub mod angle;
pub mod body;
pub mod side;

pub use angle::*;
pub use body::*;
pub use side::*;
