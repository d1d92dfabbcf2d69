//! Body-size measurements used for scale and orientation

use repsense_core::{BodyPart, Point, Pose, Side};

use crate::midpoint;

/// Planar body measurements for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BodyMetrics {
    /// Left to right shoulder distance
    pub shoulder_width: Option<f32>,
    /// Left to right hip distance
    pub hip_width: Option<f32>,
    /// Shoulder midpoint to hip midpoint distance
    pub torso_length: Option<f32>,
}

impl BodyMetrics {
    pub fn measure(pose: &Pose<'_>) -> Self {
        let ls = pose.sided(BodyPart::Shoulder, Side::Left);
        let rs = pose.sided(BodyPart::Shoulder, Side::Right);
        let lh = pose.sided(BodyPart::Hip, Side::Left);
        let rh = pose.sided(BodyPart::Hip, Side::Right);

        let width = |a: Option<Point>, b: Option<Point>| Some(a?.distance(&b?));

        let torso_length = match (midpoint(ls, rs), midpoint(lh, rh)) {
            (Some(s), Some(h)) => Some(s.distance(&h)),
            _ => None,
        };

        BodyMetrics {
            shoulder_width: width(ls, rs),
            hip_width: width(lh, rh),
            torso_length,
        }
    }

    /// Body-size proxy: the largest available span.
    ///
    /// Torso length participates so a profile view, where both widths
    /// collapse toward zero, still yields a usable scale.
    pub fn scale(&self) -> Option<f32> {
        [self.shoulder_width, self.hip_width, self.torso_length]
            .into_iter()
            .flatten()
            .filter(|v| *v > 0.0)
            .reduce(f32::max)
    }

    /// Width of the shoulder/hip span relative to torso length.
    /// Large for a camera-facing body, small in profile.
    pub fn aspect_ratio(&self) -> Option<f32> {
        let span = match (self.shoulder_width, self.hip_width) {
            (Some(s), Some(h)) => s.max(h),
            (Some(s), None) => s,
            (None, Some(h)) => h,
            (None, None) => return None,
        };
        let torso = self.torso_length?;
        if torso <= f32::EPSILON {
            return None;
        }
        Some(span / torso)
    }
}
