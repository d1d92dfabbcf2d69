//! Declarative frame predicates and hysteresis bands

use std::fmt;
use std::sync::Arc;

use repsense_core::{RepsenseError, RepsenseResult};
use repsense_geometry::is_defined;

use crate::{Metric, PoseSample};

/// Caller-supplied predicate body
pub type PredicateFn = dyn Fn(&PoseSample<'_>) -> bool + Send + Sync;

/// Boolean condition over one frame
///
/// Comparisons against an undefined metric are always false, for both
/// `Below` and `Above`.
#[derive(Clone)]
pub enum Predicate {
    /// Metric strictly below the threshold
    Below(Metric, f32),
    /// Metric strictly above the threshold
    Above(Metric, f32),
    /// Metric within the closed band [lo, hi]
    Within(Metric, f32, f32),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Custom(Arc<PredicateFn>),
}

impl Predicate {
    pub fn custom(f: impl Fn(&PoseSample<'_>) -> bool + Send + Sync + 'static) -> Self {
        Predicate::Custom(Arc::new(f))
    }

    pub fn evaluate(&self, sample: &PoseSample<'_>) -> bool {
        match self {
            Predicate::Below(metric, threshold) => {
                let v = sample.measure(*metric);
                is_defined(v) && v < *threshold
            }
            Predicate::Above(metric, threshold) => {
                let v = sample.measure(*metric);
                is_defined(v) && v > *threshold
            }
            Predicate::Within(metric, lo, hi) => {
                let v = sample.measure(*metric);
                is_defined(v) && v >= *lo && v <= *hi
            }
            Predicate::All(parts) => parts.iter().all(|p| p.evaluate(sample)),
            Predicate::Any(parts) => parts.iter().any(|p| p.evaluate(sample)),
            Predicate::Custom(f) => f(sample),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Below(m, t) => write!(f, "{:?} < {}", m, t),
            Predicate::Above(m, t) => write!(f, "{:?} > {}", m, t),
            Predicate::Within(m, lo, hi) => write!(f, "{:?} in [{}, {}]", m, lo, hi),
            Predicate::All(parts) => f.debug_tuple("All").field(parts).finish(),
            Predicate::Any(parts) => f.debug_tuple("Any").field(parts).finish(),
            Predicate::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Two-threshold band over a decreasing metric (e.g. a joint angle)
///
/// INVARIANT: `up > down`. The gap is what keeps one noisy frame from
/// toggling the phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hysteresis {
    down: f32,
    up: f32,
}

impl Hysteresis {
    pub fn new(down: f32, up: f32) -> RepsenseResult<Self> {
        if !(down.is_finite() && up.is_finite() && up > down) {
            return Err(RepsenseError::InvalidHysteresis { down, up });
        }
        Ok(Hysteresis { down, up })
    }

    pub fn down(&self) -> f32 {
        self.down
    }

    pub fn up(&self) -> f32 {
        self.up
    }

    pub fn width(&self) -> f32 {
        self.up - self.down
    }

    /// `metric < down`
    pub fn down_predicate(&self, metric: Metric) -> Predicate {
        Predicate::Below(metric, self.down)
    }

    /// `metric > up`
    pub fn up_predicate(&self, metric: Metric) -> Predicate {
        Predicate::Above(metric, self.up)
    }
}
