//! Small numerical helpers shared by the skeleton, mesh and dynamics code.

use super::Vec3;

/// Angles below this are treated as "no rotation".
pub const ANGLE_EPSILON: f64 = 1e-12;

/// Axis-angle rotation taking one direction onto another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    /// Unit axis, or zero when the inputs were parallel
    pub axis: Vec3,
    /// Radians in `[0, pi]`
    pub angle: f64,
}

impl Rotation {
    pub const IDENTITY: Rotation = Rotation { axis: Vec3::ZERO, angle: 0.0 };

    /// True when applying this rotation would be a no-op (or the axis is undefined).
    pub fn is_identity(&self) -> bool {
        self.angle.abs() < ANGLE_EPSILON || self.axis.length_squared() == 0.0
    }
}

/// Axis and angle of the rotation from `a` to `b`.
///
/// The cosine is clamped to `[-1, 1]` before `acos`. Parallel inputs give a zero
/// axis and angle 0; anti-parallel inputs get a deterministic axis perpendicular
/// to `a` so the half turn can still be applied. A zero-length input yields
/// [`Rotation::IDENTITY`].
pub fn find_rotation(a: Vec3, b: Vec3) -> Rotation {
    let lengths = a.length() * b.length();
    if lengths == 0.0 || !lengths.is_finite() {
        return Rotation::IDENTITY;
    }

    let cos = (a.dot(&b) / lengths).clamp(-1.0, 1.0);
    let angle = cos.acos();

    let mut axis = a.cross(&b).normalize();
    if axis.length_squared() == 0.0 && cos < 0.0 {
        axis = a.perpendicular();
    }

    Rotation { axis, angle }
}

/// Orthogonal projection of `a` onto `b`.
pub fn project(a: Vec3, b: Vec3) -> Vec3 {
    let len_sq = b.length_squared();
    if len_sq == 0.0 {
        return Vec3::ZERO;
    }
    b.scale(a.dot(&b) / len_sq)
}

/// Arithmetic centroid. `None` for an empty slice.
pub fn mean_point(points: &[Vec3]) -> Option<Vec3> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vec3::ZERO, |acc, p| acc + *p);
    Some(sum / points.len() as f64)
}
