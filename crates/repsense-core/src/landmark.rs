//! Keypoint frames and anatomical slots
//!
//! A frame is what the pose-estimation collaborator hands us once per camera
//! frame. The engine borrows it for one processing call and never keeps it.

use serde::{Deserialize, Serialize};

use crate::{RepsenseError, RepsenseResult};

/// Body side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Paired body part, resolved to a [`Slot`] once a side is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyPart {
    Shoulder,
    Elbow,
    Wrist,
    Hip,
    Knee,
    Ankle,
}

impl BodyPart {
    /// Limb chain used when scoring a side, top to bottom
    pub fn chain() -> &'static [BodyPart] {
        &[
            BodyPart::Shoulder,
            BodyPart::Elbow,
            BodyPart::Wrist,
            BodyPart::Hip,
            BodyPart::Knee,
            BodyPart::Ankle,
        ]
    }
}

/// Exercise-agnostic anatomical slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Nose,

    LeftShoulder,
    RightShoulder,

    LeftElbow,
    RightElbow,

    LeftWrist,
    RightWrist,

    LeftHip,
    RightHip,

    LeftKnee,
    RightKnee,

    LeftAnkle,
    RightAnkle,
}

impl Slot {
    pub const COUNT: usize = 13;

    /// All slots in order
    pub fn all() -> &'static [Slot] {
        &[
            Slot::Nose,
            Slot::LeftShoulder,
            Slot::RightShoulder,
            Slot::LeftElbow,
            Slot::RightElbow,
            Slot::LeftWrist,
            Slot::RightWrist,
            Slot::LeftHip,
            Slot::RightHip,
            Slot::LeftKnee,
            Slot::RightKnee,
            Slot::LeftAnkle,
            Slot::RightAnkle,
        ]
    }

    /// Resolve a paired body part on one side
    pub fn of(part: BodyPart, side: Side) -> Slot {
        match (part, side) {
            (BodyPart::Shoulder, Side::Left) => Slot::LeftShoulder,
            (BodyPart::Shoulder, Side::Right) => Slot::RightShoulder,
            (BodyPart::Elbow, Side::Left) => Slot::LeftElbow,
            (BodyPart::Elbow, Side::Right) => Slot::RightElbow,
            (BodyPart::Wrist, Side::Left) => Slot::LeftWrist,
            (BodyPart::Wrist, Side::Right) => Slot::RightWrist,
            (BodyPart::Hip, Side::Left) => Slot::LeftHip,
            (BodyPart::Hip, Side::Right) => Slot::RightHip,
            (BodyPart::Knee, Side::Left) => Slot::LeftKnee,
            (BodyPart::Knee, Side::Right) => Slot::RightKnee,
            (BodyPart::Ankle, Side::Left) => Slot::LeftAnkle,
            (BodyPart::Ankle, Side::Right) => Slot::RightAnkle,
        }
    }

    pub fn side(self) -> Option<Side> {
        match self {
            Slot::Nose => None,
            Slot::LeftShoulder
            | Slot::LeftElbow
            | Slot::LeftWrist
            | Slot::LeftHip
            | Slot::LeftKnee
            | Slot::LeftAnkle => Some(Side::Left),
            _ => Some(Side::Right),
        }
    }
}

/// 2D/3D position in normalized image space
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: Option<f32>,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: None }
    }

    pub fn with_z(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Linear interpolation
    pub fn lerp(&self, other: &Point, t: f32) -> Point {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: match (self.z, other.z) {
                (Some(a), Some(b)) => Some(a + (b - a) * t),
                _ => None,
            },
        }
    }

    /// Planar distance to another point
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One tracked anatomical point with position and confidence
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    #[serde(default)]
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility,
        }
    }

    pub fn point(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }

    /// Coordinates are finite; NaN from the estimator counts as missing
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.map_or(true, f32::is_finite)
    }
}

/// Ordered, fixed-size landmark sequence for one camera frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeypointFrame {
    pub landmarks: Vec<Landmark>,
}

impl KeypointFrame {
    /// Landmark count of the BlazePose topology
    pub const BLAZEPOSE_LEN: usize = 33;

    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }
}

/// Maps anatomical slots to frame indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandmarkMap {
    indices: [usize; Slot::COUNT],
}

impl Default for LandmarkMap {
    fn default() -> Self {
        Self::blazepose()
    }
}

impl LandmarkMap {
    /// 33-point BlazePose topology
    pub fn blazepose() -> Self {
        let mut indices = [0; Slot::COUNT];
        for (i, slot) in Slot::all().iter().enumerate() {
            indices[i] = match slot {
                Slot::Nose => 0,
                Slot::LeftShoulder => 11,
                Slot::RightShoulder => 12,
                Slot::LeftElbow => 13,
                Slot::RightElbow => 14,
                Slot::LeftWrist => 15,
                Slot::RightWrist => 16,
                Slot::LeftHip => 23,
                Slot::RightHip => 24,
                Slot::LeftKnee => 25,
                Slot::RightKnee => 26,
                Slot::LeftAnkle => 27,
                Slot::RightAnkle => 28,
            };
        }
        Self { indices }
    }

    /// Remap one slot
    pub fn with(mut self, slot: Slot, index: usize) -> Self {
        self.indices[slot as usize] = index;
        self
    }

    #[inline]
    pub fn index(&self, slot: Slot) -> usize {
        self.indices[slot as usize]
    }

    /// Minimum frame length that covers every mapped slot
    pub fn required_len(&self) -> usize {
        self.indices.iter().copied().max().map_or(0, |max| max + 1)
    }
}

/// A frame viewed through a landmark map
#[derive(Clone, Copy)]
pub struct Pose<'a> {
    frame: &'a KeypointFrame,
    map: &'a LandmarkMap,
}

impl<'a> Pose<'a> {
    pub fn new(frame: &'a KeypointFrame, map: &'a LandmarkMap) -> Self {
        Self { frame, map }
    }

    pub fn frame(&self) -> &'a KeypointFrame {
        self.frame
    }

    /// Landmark for a slot, `None` when absent or non-finite
    pub fn landmark(&self, slot: Slot) -> Option<&'a Landmark> {
        self.frame
            .get(self.map.index(slot))
            .filter(|lm| lm.is_finite())
    }

    pub fn point(&self, slot: Slot) -> Option<Point> {
        self.landmark(slot).map(Landmark::point)
    }

    pub fn sided(&self, part: BodyPart, side: Side) -> Option<Point> {
        self.point(Slot::of(part, side))
    }

    /// Visibility of a slot, zero when absent
    pub fn visibility(&self, slot: Slot) -> f32 {
        self.landmark(slot).map_or(0.0, |lm| lm.visibility)
    }

    /// Frame covers every mapped slot
    pub fn is_complete(&self) -> bool {
        self.require().is_ok()
    }

    /// Fail with [`RepsenseError::InsufficientLandmarks`] when the frame is
    /// shorter than the map requires
    pub fn require(&self) -> RepsenseResult<()> {
        let expected = self.map.required_len();
        if self.frame.len() < expected {
            return Err(RepsenseError::InsufficientLandmarks {
                expected,
                actual: self.frame.len(),
            });
        }
        Ok(())
    }

    /// Fail with the first slot whose visibility is below `threshold`
    pub fn require_visible(&self, slots: &[Slot], threshold: f32) -> RepsenseResult<()> {
        match slots.iter().find(|s| self.visibility(**s) < threshold) {
            Some(slot) => Err(RepsenseError::LowVisibility(*slot)),
            None => Ok(()),
        }
    }
}
