//! Session-level properties over generated frame sequences

/// Reps a cyclic session could count at most for a knee-angle sequence:
/// the number of completed below-`down` then above-`up` alternations,
/// ignoring cooldown.
pub fn reference_rep_count(angles: &[f32], down: f32, up: f32) -> u32 {
    let mut is_down = false;
    let mut reps = 0;
    for &angle in angles {
        if !is_down && angle < down {
            is_down = true;
        } else if is_down && angle > up {
            is_down = false;
            reps += 1;
        }
    }
    reps
}
