//! Pose metrics - named measurements taken from one frame
//!
//! Every metric evaluates to a plain `f32`. A metric whose landmarks are
//! missing evaluates to [`UNDEFINED`], which no predicate accepts.

use repsense_core::{BodyPart, Pose, Side, Slot};
use repsense_geometry::{
    angle_degrees, dominant_side, is_defined, midpoint, slope_degrees, tilt_from_horizontal,
    tilt_from_vertical, UNDEFINED,
};

/// Which limb chain(s) a bilateral metric reads
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sides {
    /// Visibility-richer side only (profile views)
    Dominant,
    Left,
    Right,
    /// Smaller of both sides; undefined unless both are defined
    Min,
    /// Larger of both sides; undefined unless both are defined
    Max,
    /// Average of both sides; undefined unless both are defined
    Mean,
}

/// A single named measurement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Hip-knee-ankle angle
    KneeAngle(Sides),
    /// Shoulder-elbow-wrist angle
    ElbowAngle(Sides),
    /// Shoulder-hip-knee angle (back angle)
    HipAngle(Sides),
    /// 180 minus the shoulder-hip-ankle angle
    BodyLineDeviation(Sides),
    /// Shoulder-to-ankle segment deviation from horizontal, degrees
    BodyTilt(Sides),
    /// Hip-midpoint to shoulder-midpoint deviation from vertical, degrees
    TorsoTilt,
    /// Shoulder-midpoint y minus nose y
    ShoulderDropFromNose,
    /// Shoulder y minus wrist y
    ShoulderBelowWrist(Sides),
    /// Wrist y minus shoulder y; shrinks as the shoulders drop toward the hands
    ShoulderHeightOverWrist(Sides),
    /// |shoulder y - wrist y|, zero when the arm is level
    ArmLevelOffset(Sides),
    /// Hip/knee midline y minus shoulder y; positive when shoulders are higher
    ShoulderLift(Sides),
}

/// One frame prepared for metric evaluation
#[derive(Clone, Copy)]
pub struct PoseSample<'a> {
    pose: Pose<'a>,
    dominant: Side,
}

impl<'a> PoseSample<'a> {
    pub fn new(pose: Pose<'a>) -> Self {
        PoseSample {
            dominant: dominant_side(&pose),
            pose,
        }
    }

    pub fn pose(&self) -> &Pose<'a> {
        &self.pose
    }

    pub fn dominant(&self) -> Side {
        self.dominant
    }

    /// Evaluate a metric, [`UNDEFINED`] when it cannot be taken
    pub fn measure(&self, metric: Metric) -> f32 {
        use BodyPart::*;

        match metric {
            Metric::KneeAngle(sides) => self.bilateral(sides, |s| self.joint(s, Hip, Knee, Ankle)),
            Metric::ElbowAngle(sides) => {
                self.bilateral(sides, |s| self.joint(s, Shoulder, Elbow, Wrist))
            }
            Metric::HipAngle(sides) => self.bilateral(sides, |s| self.joint(s, Shoulder, Hip, Knee)),
            Metric::BodyLineDeviation(sides) => self.bilateral(sides, |s| {
                let line = self.joint(s, Shoulder, Hip, Ankle);
                if is_defined(line) {
                    180.0 - line
                } else {
                    UNDEFINED
                }
            }),
            Metric::BodyTilt(sides) => self.bilateral(sides, |s| {
                tilt_from_horizontal(slope_degrees(
                    self.pose.sided(Shoulder, s),
                    self.pose.sided(Ankle, s),
                ))
            }),
            Metric::TorsoTilt => {
                let hips = midpoint(self.pose.point(Slot::LeftHip), self.pose.point(Slot::RightHip));
                let shoulders = midpoint(
                    self.pose.point(Slot::LeftShoulder),
                    self.pose.point(Slot::RightShoulder),
                );
                tilt_from_vertical(slope_degrees(hips, shoulders))
            }
            Metric::ShoulderDropFromNose => {
                let shoulders = midpoint(
                    self.pose.point(Slot::LeftShoulder),
                    self.pose.point(Slot::RightShoulder),
                );
                match (shoulders, self.pose.point(Slot::Nose)) {
                    (Some(s), Some(n)) => s.y - n.y,
                    _ => UNDEFINED,
                }
            }
            Metric::ShoulderBelowWrist(sides) => {
                self.bilateral(sides, |s| self.vertical_gap(s, Shoulder, Wrist))
            }
            Metric::ShoulderHeightOverWrist(sides) => {
                self.bilateral(sides, |s| self.vertical_gap(s, Wrist, Shoulder))
            }
            Metric::ArmLevelOffset(sides) => self.bilateral(sides, |s| {
                let gap = self.vertical_gap(s, Shoulder, Wrist);
                if is_defined(gap) {
                    gap.abs()
                } else {
                    UNDEFINED
                }
            }),
            Metric::ShoulderLift(sides) => self.bilateral(sides, |s| {
                let midline = midpoint(self.pose.sided(Hip, s), self.pose.sided(Knee, s));
                match (midline, self.pose.sided(Shoulder, s)) {
                    (Some(m), Some(sh)) => m.y - sh.y,
                    _ => UNDEFINED,
                }
            }),
        }
    }

    fn joint(&self, side: Side, a: BodyPart, b: BodyPart, c: BodyPart) -> f32 {
        angle_degrees(
            self.pose.sided(a, side),
            self.pose.sided(b, side),
            self.pose.sided(c, side),
        )
    }

    /// y(upper) - y(lower) on one side
    fn vertical_gap(&self, side: Side, upper: BodyPart, lower: BodyPart) -> f32 {
        match (self.pose.sided(upper, side), self.pose.sided(lower, side)) {
            (Some(u), Some(l)) => u.y - l.y,
            _ => UNDEFINED,
        }
    }

    fn bilateral(&self, sides: Sides, f: impl Fn(Side) -> f32) -> f32 {
        let combine = |op: fn(f32, f32) -> f32| {
            let (l, r) = (f(Side::Left), f(Side::Right));
            if is_defined(l) && is_defined(r) {
                op(l, r)
            } else {
                UNDEFINED
            }
        };

        match sides {
            Sides::Dominant => f(self.dominant),
            Sides::Left => f(Side::Left),
            Sides::Right => f(Side::Right),
            Sides::Min => combine(f32::min),
            Sides::Max => combine(f32::max),
            Sides::Mean => combine(|l, r| (l + r) / 2.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repsense_core::{KeypointFrame, Landmark, LandmarkMap};

    fn frame(points: &[(Slot, f32, f32)]) -> KeypointFrame {
        let map = LandmarkMap::default();
        let mut landmarks = vec![Landmark::new(f32::NAN, f32::NAN, 0.0); KeypointFrame::BLAZEPOSE_LEN];
        for (slot, x, y) in points {
            landmarks[map.index(*slot)] = Landmark::new(*x, *y, 0.9);
        }
        KeypointFrame::new(landmarks)
    }

    #[test]
    fn test_knee_angle_sides() {
        let f = frame(&[
            (Slot::LeftHip, 0.6, 0.5),
            (Slot::LeftKnee, 0.6, 0.7),
            (Slot::LeftAnkle, 0.6, 0.9),
            (Slot::RightHip, 0.4, 0.5),
            (Slot::RightKnee, 0.5, 0.7),
            (Slot::RightAnkle, 0.4, 0.9),
        ]);
        let map = LandmarkMap::default();
        let sample = PoseSample::new(Pose::new(&f, &map));

        let left = sample.measure(Metric::KneeAngle(Sides::Left));
        let right = sample.measure(Metric::KneeAngle(Sides::Right));
        assert!((left - 180.0).abs() < 0.01);
        assert!(right < 180.0);
        assert_eq!(sample.measure(Metric::KneeAngle(Sides::Max)), left);
        assert_eq!(sample.measure(Metric::KneeAngle(Sides::Min)), right);
    }

    #[test]
    fn test_one_sided_data_leaves_bilateral_undefined() {
        let f = frame(&[
            (Slot::LeftShoulder, 0.6, 0.3),
            (Slot::LeftElbow, 0.8, 0.3),
            (Slot::LeftWrist, 0.95, 0.3),
        ]);
        let map = LandmarkMap::default();
        let sample = PoseSample::new(Pose::new(&f, &map));

        assert!(is_defined(sample.measure(Metric::ElbowAngle(Sides::Left))));
        assert_eq!(sample.measure(Metric::ElbowAngle(Sides::Min)), UNDEFINED);
        assert_eq!(sample.measure(Metric::ElbowAngle(Sides::Mean)), UNDEFINED);
        // Only the left chain is visible
        assert_eq!(sample.dominant(), Side::Left);
        assert!(is_defined(sample.measure(Metric::ElbowAngle(Sides::Dominant))));
    }

    #[test]
    fn test_vertical_offsets() {
        let f = frame(&[
            (Slot::Nose, 0.5, 0.2),
            (Slot::LeftShoulder, 0.6, 0.35),
            (Slot::RightShoulder, 0.4, 0.35),
            (Slot::LeftWrist, 0.9, 0.3),
            (Slot::RightWrist, 0.1, 0.4),
        ]);
        let map = LandmarkMap::default();
        let sample = PoseSample::new(Pose::new(&f, &map));

        assert!((sample.measure(Metric::ShoulderDropFromNose) - 0.15).abs() < 1e-5);
        assert!((sample.measure(Metric::ShoulderBelowWrist(Sides::Left)) - 0.05).abs() < 1e-5);
        assert!((sample.measure(Metric::ArmLevelOffset(Sides::Max)) - 0.05).abs() < 1e-5);
        assert!((sample.measure(Metric::ShoulderHeightOverWrist(Sides::Left)) + 0.05).abs() < 1e-5);
        assert!((sample.measure(Metric::ShoulderHeightOverWrist(Sides::Mean)) - 0.0).abs() < 1e-5);
    }

    #[test]
    fn test_torso_tilt_upright() {
        let f = frame(&[
            (Slot::LeftShoulder, 0.6, 0.3),
            (Slot::RightShoulder, 0.4, 0.3),
            (Slot::LeftHip, 0.58, 0.55),
            (Slot::RightHip, 0.42, 0.55),
        ]);
        let map = LandmarkMap::default();
        let sample = PoseSample::new(Pose::new(&f, &map));
        assert!(sample.measure(Metric::TorsoTilt) < 0.01);
    }
}
