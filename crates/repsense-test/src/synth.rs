//! Synthetic keypoint frames
//!
//! Skeletons are built from joint angles so a test can ask for "knee at 98
//! degrees" and get a frame whose measured knee angle is exactly that.
//!
//! Conventions:
//! - Front view: the subject's left side is at larger x
//! - Side view: the subject faces -x, the left side is nearest the camera
//! - y grows downward, as in image space

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;

use repsense_core::{KeypointFrame, Landmark, LandmarkMap, Side, Slot};

/// Default visibility of placed landmarks
pub const VISIBLE: f32 = 0.95;
/// Visibility of the far side in profile views
pub const FAR_SIDE: f32 = 0.7;

// Front-view body
const ANKLE_Y: f32 = 0.92;
const LEG: f32 = 0.2;
const HALF_WIDTH: f32 = 0.1;
const TORSO: f32 = 0.25;
const ARM: f32 = 0.125;
const HEAD: f32 = 0.08;

// Side-view push-up body
const PUSH_WRIST: (f32, f32) = (0.3, 0.8);
const PUSH_ANKLE: (f32, f32) = (0.85, 0.78);
const PUSH_ARM: f32 = 0.15;
const PROFILE_OFFSET: f32 = 0.02;

/// Builder for one synthetic frame
#[derive(Clone, Debug)]
pub struct PoseBuilder {
    map: LandmarkMap,
    points: [Option<(f32, f32)>; Slot::COUNT],
    visibility: [f32; Slot::COUNT],
    scale: f32,
    offset: (f32, f32),
    len: usize,
}

impl Default for PoseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseBuilder {
    /// Empty skeleton on the BlazePose topology
    pub fn new() -> Self {
        PoseBuilder {
            map: LandmarkMap::default(),
            points: [None; Slot::COUNT],
            visibility: [VISIBLE; Slot::COUNT],
            scale: 1.0,
            offset: (0.0, 0.0),
            len: KeypointFrame::BLAZEPOSE_LEN,
        }
    }

    /// Place one landmark
    pub fn at(mut self, slot: Slot, x: f32, y: f32) -> Self {
        self.points[slot as usize] = Some((x, y));
        self
    }

    /// Position of a placed landmark before scale and offset
    pub fn position(&self, slot: Slot) -> Option<(f32, f32)> {
        self.points[slot as usize]
    }

    /// Camera-facing body with arms held out level (T-pose)
    ///
    /// Both knees bend to `knee_angle` with the shins vertical and the
    /// knees splaying outward, so hip and shoulder widths never change.
    /// Shoulders sit straight above the hips, which makes the hip angle
    /// `90 + knee_angle / 2`.
    pub fn front_squat(knee_angle: f32) -> Self {
        let half = knee_angle.to_radians() / 2.0;
        let hip_y = ANKLE_Y - 2.0 * LEG * half.sin();
        let knee_y = ANKLE_Y - LEG * half.sin();
        let splay = LEG * half.cos();
        let shoulder_y = hip_y - TORSO;

        let mut builder = Self::new().at(Slot::Nose, 0.5, shoulder_y - HEAD);
        for (side, dir) in [(Side::Left, 1.0), (Side::Right, -1.0)] {
            let x = 0.5 + dir * HALF_WIDTH;
            builder = builder
                .at(slot(side, Part::Shoulder), x, shoulder_y)
                .at(slot(side, Part::Elbow), x + dir * ARM, shoulder_y)
                .at(slot(side, Part::Wrist), x + dir * 2.0 * ARM, shoulder_y)
                .at(slot(side, Part::Hip), x, hip_y)
                .at(slot(side, Part::Knee), x + dir * splay, knee_y)
                .at(slot(side, Part::Ankle), x, ANKLE_Y);
        }
        builder
    }

    /// Standing T-pose
    pub fn front_standing() -> Self {
        Self::front_squat(170.0)
    }

    /// Front view with the arms hanging down, which fails the T-pose check
    pub fn front_arms_down() -> Self {
        let mut builder = Self::front_standing();
        for (side, dir) in [(Side::Left, 1.0), (Side::Right, -1.0)] {
            let (x, y) = builder.position(slot(side, Part::Shoulder)).unwrap_or_default();
            let x = x + dir * 0.02;
            builder = builder
                .at(slot(side, Part::Elbow), x, y + ARM)
                .at(slot(side, Part::Wrist), x, y + 2.0 * ARM);
        }
        builder
    }

    /// Profile push-up with the elbow at `elbow_angle`
    ///
    /// The wrist stays planted with the forearm vertical, and the body stays
    /// a straight line from the shoulder to the ankle. The shoulders sit
    /// `PUSH_ARM * (1 - cos(elbow_angle))` above the wrists.
    pub fn side_push_up(elbow_angle: f32) -> Self {
        Self::side_push_up_lifted(elbow_angle, 0.0)
    }

    /// [`side_push_up`](Self::side_push_up) with the shoulders and elbows
    /// raised by `lift`, as when the hips drop and the chest comes up
    pub fn side_push_up_lifted(elbow_angle: f32, lift: f32) -> Self {
        let theta = elbow_angle.to_radians();
        let (wx, wy) = PUSH_WRIST;
        let elbow = (wx, wy - PUSH_ARM - lift);
        let shoulder = (
            wx - PUSH_ARM * theta.sin(),
            wy - PUSH_ARM + PUSH_ARM * theta.cos() - lift,
        );
        let hip = lerp(shoulder, PUSH_ANKLE, 0.45);
        let knee = lerp(shoulder, PUSH_ANKLE, 0.72);

        Self::profile(shoulder, elbow, PUSH_WRIST, hip, knee, PUSH_ANKLE)
            .at(Slot::Nose, shoulder.0 - 0.06, shoulder.1 + 0.02)
    }

    /// Profile plank on the forearms (90) or straight arms (180)
    pub fn plank(elbow_angle: f32) -> Self {
        let shoulder = (0.3, 0.6);
        let elbow = (0.3, 0.75);
        let theta = elbow_angle.to_radians();
        let wrist = (elbow.0 + 0.12 * theta.sin(), elbow.1 - 0.12 * theta.cos());

        Self::profile(shoulder, elbow, wrist, (0.55, 0.61), (0.7, 0.615), (0.85, 0.62))
            .at(Slot::Nose, 0.24, 0.6)
    }

    /// Forearm plank
    pub fn plank_hold() -> Self {
        Self::plank(90.0)
    }

    /// Plank with the elbow in neither accepted band
    pub fn plank_broken() -> Self {
        Self::plank(135.0)
    }

    /// Near side as given, far side offset and less visible
    fn profile(
        shoulder: (f32, f32),
        elbow: (f32, f32),
        wrist: (f32, f32),
        hip: (f32, f32),
        knee: (f32, f32),
        ankle: (f32, f32),
    ) -> Self {
        let parts = [
            (Part::Shoulder, shoulder),
            (Part::Elbow, elbow),
            (Part::Wrist, wrist),
            (Part::Hip, hip),
            (Part::Knee, knee),
            (Part::Ankle, ankle),
        ];

        let mut builder = Self::new();
        for (part, (x, y)) in parts {
            builder = builder
                .at(slot(Side::Left, part), x, y)
                .at(slot(Side::Right, part), x + PROFILE_OFFSET, y);
        }
        builder.side_visibility(Side::Right, FAR_SIDE)
    }

    pub fn visibility(mut self, slot: Slot, visibility: f32) -> Self {
        self.visibility[slot as usize] = visibility;
        self
    }

    /// Set every landmark on one side
    pub fn side_visibility(mut self, side: Side, visibility: f32) -> Self {
        for s in Slot::all() {
            if s.side() == Some(side) {
                self.visibility[*s as usize] = visibility;
            }
        }
        self
    }

    pub fn all_visibility(mut self, visibility: f32) -> Self {
        self.visibility = [visibility; Slot::COUNT];
        self
    }

    /// Drop a landmark (reported as NaN)
    pub fn missing(mut self, slot: Slot) -> Self {
        self.points[slot as usize] = None;
        self
    }

    /// Scale about the image centre; > 1 moves the body toward the camera
    pub fn scaled(mut self, factor: f32) -> Self {
        self.scale = factor;
        self
    }

    pub fn shifted(mut self, dx: f32, dy: f32) -> Self {
        self.offset = (dx, dy);
        self
    }

    /// Emit only the first `len` landmarks
    pub fn truncated(mut self, len: usize) -> Self {
        self.len = len;
        self
    }

    pub fn build(&self) -> KeypointFrame {
        self.emit(|x, y| (x, y))
    }

    /// Build with uniform positional noise in `[-amplitude, amplitude]`
    pub fn build_jittered(&self, rng: &mut StdRng, amplitude: f32) -> KeypointFrame {
        if amplitude <= 0.0 {
            return self.build();
        }
        let noise = Uniform::new_inclusive(-amplitude, amplitude);
        self.emit(|x, y| (x + noise.sample(rng), y + noise.sample(rng)))
    }

    fn emit(&self, mut place: impl FnMut(f32, f32) -> (f32, f32)) -> KeypointFrame {
        let mut landmarks = vec![Landmark::new(0.0, 0.0, 0.0); KeypointFrame::BLAZEPOSE_LEN];

        for s in Slot::all() {
            let index = self.map.index(*s);
            let landmark = match self.points[*s as usize] {
                Some((x, y)) => {
                    let x = 0.5 + (x - 0.5) * self.scale + self.offset.0;
                    let y = 0.5 + (y - 0.5) * self.scale + self.offset.1;
                    let (x, y) = place(x, y);
                    Landmark::new(x, y, self.visibility[*s as usize])
                }
                None => Landmark::new(f32::NAN, f32::NAN, 0.0),
            };
            landmarks[index] = landmark;
        }

        landmarks.truncate(self.len);
        KeypointFrame::new(landmarks)
    }
}

#[derive(Clone, Copy)]
enum Part {
    Shoulder,
    Elbow,
    Wrist,
    Hip,
    Knee,
    Ankle,
}

fn slot(side: Side, part: Part) -> Slot {
    use repsense_core::BodyPart;
    let part = match part {
        Part::Shoulder => BodyPart::Shoulder,
        Part::Elbow => BodyPart::Elbow,
        Part::Wrist => BodyPart::Wrist,
        Part::Hip => BodyPart::Hip,
        Part::Knee => BodyPart::Knee,
        Part::Ankle => BodyPart::Ankle,
    };
    Slot::of(part, side)
}

fn lerp(a: (f32, f32), b: (f32, f32), t: f32) -> (f32, f32) {
    (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
}

/// One down-and-up cycle: `top` to `bottom` in `steps` equal steps, then
/// back up, stopping one step short of `top`.
///
/// With (170, 90, 10) this is 20 values: 170, 162, ... 90, 98, ... 162.
pub fn angle_cycle(top: f32, bottom: f32, steps: u32) -> Vec<f32> {
    let steps = steps.max(1);
    let delta = (top - bottom) / steps as f32;
    let down = (0..=steps).map(|i| top - delta * i as f32);
    let up = (1..steps).map(|i| bottom + delta * i as f32);
    down.chain(up).collect()
}

/// `cycles` repetitions of [`angle_cycle`]
pub fn angle_cycles(top: f32, bottom: f32, steps: u32, cycles: usize) -> Vec<f32> {
    let cycle = angle_cycle(top, bottom, steps);
    std::iter::repeat(cycle).take(cycles).flatten().collect()
}
