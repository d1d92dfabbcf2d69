//! Joint angles and segment slopes
//!
//! Angles use the dot product formula: cos(θ) = (v1 · v2) / (|v1| × |v2|),
//! clamped to [-1, 1] before `acos` so rounding never produces NaN.

use repsense_core::Point;

/// Sentinel returned when a measurement cannot be taken
pub const UNDEFINED: f32 = 999.0;

/// Degenerate vector length below which no direction exists
const MIN_MAGNITUDE: f32 = 1e-6;

/// True when a measurement is a real value, not the sentinel
#[inline]
pub fn is_defined(value: f32) -> bool {
    value.is_finite() && value < UNDEFINED
}

/// Angle at vertex `b` between rays to `a` and `c`, in degrees (0-180)
///
/// - 180° = straight joint (e.g. arm fully extended)
/// - 90° = right-angle bend
///
/// Uses z only when all three points carry it.
pub fn angle_degrees(a: Option<Point>, b: Option<Point>, c: Option<Point>) -> f32 {
    let (Some(a), Some(b), Some(c)) = (a, b, c) else {
        return UNDEFINED;
    };

    // Vector from vertex to each end
    let (v1x, v1y) = (a.x - b.x, a.y - b.y);
    let (v2x, v2y) = (c.x - b.x, c.y - b.y);
    let (v1z, v2z) = match (a.z, b.z, c.z) {
        (Some(az), Some(bz), Some(cz)) => (az - bz, cz - bz),
        _ => (0.0, 0.0),
    };

    let dot = v1x * v2x + v1y * v2y + v1z * v2z;
    let mag1 = (v1x * v1x + v1y * v1y + v1z * v1z).sqrt();
    let mag2 = (v2x * v2x + v2y * v2y + v2z * v2z).sqrt();

    if mag1 < MIN_MAGNITUDE || mag2 < MIN_MAGNITUDE {
        return UNDEFINED;
    }

    let cos_angle = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

/// Angle of the line p→q against the horizontal axis, in (-180, 180]
///
/// Image y grows downward, so a segment pointing "up" on screen has a
/// negative slope.
pub fn slope_degrees(p: Option<Point>, q: Option<Point>) -> f32 {
    let (Some(p), Some(q)) = (p, q) else {
        return UNDEFINED;
    };

    let dx = q.x - p.x;
    let dy = q.y - p.y;
    if dx.abs() < MIN_MAGNITUDE && dy.abs() < MIN_MAGNITUDE {
        return UNDEFINED;
    }

    dy.atan2(dx).to_degrees()
}

/// Deviation of a slope from horizontal: min(|s|, |180 - |s||)
pub fn tilt_from_horizontal(slope: f32) -> f32 {
    if !is_defined(slope) {
        return UNDEFINED;
    }
    let s = slope.abs();
    s.min((180.0 - s).abs())
}

/// Deviation of a slope from vertical
pub fn tilt_from_vertical(slope: f32) -> f32 {
    if !is_defined(slope) {
        return UNDEFINED;
    }
    (slope.abs() - 90.0).abs()
}

/// Segment lies horizontal within `tolerance` degrees
pub fn is_horizontal(slope: f32, tolerance: f32) -> bool {
    tilt_from_horizontal(slope) <= tolerance
}

/// Segment lies vertical within `tolerance` degrees
pub fn is_vertical(slope: f32, tolerance: f32) -> bool {
    tilt_from_vertical(slope) <= tolerance
}

/// Componentwise average; missing if either end is missing
pub fn midpoint(p: Option<Point>, q: Option<Point>) -> Option<Point> {
    Some(p?.lerp(&q?, 0.5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(x: f32, y: f32) -> Option<Point> {
        Some(Point::new(x, y))
    }

    #[test]
    fn test_straight_joint() {
        let angle = angle_degrees(p(0.0, 0.0), p(0.5, 0.0), p(1.0, 0.0));
        assert!((angle - 180.0).abs() < 0.01);
    }

    #[test]
    fn test_right_angle_joint() {
        let angle = angle_degrees(p(0.0, 0.0), p(0.5, 0.0), p(0.5, 0.5));
        assert!((angle - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_missing_point_is_undefined() {
        assert_eq!(angle_degrees(None, p(0.5, 0.0), p(0.5, 0.5)), UNDEFINED);
        assert_eq!(slope_degrees(p(0.1, 0.1), None), UNDEFINED);
        assert!(!is_horizontal(UNDEFINED, 45.0));
        assert!(!is_vertical(UNDEFINED, 45.0));
    }

    #[test]
    fn test_coincident_points_are_undefined() {
        assert_eq!(angle_degrees(p(0.5, 0.5), p(0.5, 0.5), p(0.9, 0.5)), UNDEFINED);
        assert_eq!(slope_degrees(p(0.3, 0.3), p(0.3, 0.3)), UNDEFINED);
    }

    #[test]
    fn test_z_used_only_when_complete() {
        let a = Some(Point::with_z(0.0, 0.0, 0.0));
        let b = Some(Point::with_z(1.0, 0.0, 0.0));
        let c = Some(Point::with_z(1.0, 0.0, 1.0));
        // Rays to (0,0,0) and (1,0,1) are perpendicular in 3D
        assert!((angle_degrees(a, b, c) - 90.0).abs() < 0.01);

        // Dropping z on one point falls back to the image plane
        let planar = angle_degrees(a, b, p(1.0, 0.5));
        assert!((planar - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_slope_tolerance_bands() {
        // Pointing right and left are both horizontal
        assert!(is_horizontal(slope_degrees(p(0.2, 0.5), p(0.8, 0.52)), 5.0));
        assert!(is_horizontal(slope_degrees(p(0.8, 0.5), p(0.2, 0.52)), 5.0));
        // Upward on screen is vertical
        assert!(is_vertical(slope_degrees(p(0.5, 0.8), p(0.5, 0.2)), 1.0));
        assert!(!is_horizontal(slope_degrees(p(0.5, 0.8), p(0.5, 0.2)), 45.0));
    }

    #[test]
    fn test_midpoint() {
        let mid = midpoint(p(0.0, 0.2), p(1.0, 0.4)).unwrap();
        assert!((mid.x - 0.5).abs() < 1e-6);
        assert!((mid.y - 0.3).abs() < 1e-6);
        assert!(midpoint(None, p(1.0, 1.0)).is_none());
    }

    proptest! {
        #[test]
        fn prop_angle_in_range_or_undefined(
            ax in 0.0f32..1.0, ay in 0.0f32..1.0,
            bx in 0.0f32..1.0, by in 0.0f32..1.0,
            cx in 0.0f32..1.0, cy in 0.0f32..1.0,
        ) {
            let angle = angle_degrees(p(ax, ay), p(bx, by), p(cx, cy));
            prop_assert!(!angle.is_nan());
            prop_assert!(angle == UNDEFINED || (0.0..=180.0).contains(&angle));
        }
    }
}
