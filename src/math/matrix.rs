use super::geometry::Rotation;
use super::Vec3;

/// 4x4 homogeneous matrix (column-major, same layout WebGL expects)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub data: [f64; 16],
}

impl Mat4 {
    pub fn identity() -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, 0.0,
                0.0, 1.0, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        let mut m = Self::identity();
        m.data[12] = x;
        m.data[13] = y;
        m.data[14] = z;
        m
    }

    /// Rotation of `angle` radians about `axis` (Rodrigues).
    ///
    /// The axis is normalized here; a zero axis yields the identity.
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Self {
        let k = axis.normalize();
        if k.length_squared() == 0.0 {
            return Self::identity();
        }

        let c = angle.cos();
        let s = angle.sin();
        let t = 1.0 - c;

        Self {
            data: [
                t * k.x * k.x + c,       t * k.x * k.y + s * k.z, t * k.x * k.z - s * k.y, 0.0,
                t * k.x * k.y - s * k.z, t * k.y * k.y + c,       t * k.y * k.z + s * k.x, 0.0,
                t * k.x * k.z + s * k.y, t * k.y * k.z - s * k.x, t * k.z * k.z + c,       0.0,
                0.0,                     0.0,                     0.0,                     1.0,
            ],
        }
    }

    /// Matrix for a rotation found by [`find_rotation`](super::find_rotation).
    /// Near-zero angles map to the identity so a degenerate axis is never applied.
    pub fn from_rotation(rotation: &Rotation) -> Self {
        if rotation.is_identity() {
            Self::identity()
        } else {
            Self::from_axis_angle(rotation.axis, rotation.angle)
        }
    }

    /// Matrix multiplication
    pub fn mul(&self, other: &Mat4) -> Self {
        let mut result = [0.0f64; 16];

        for row in 0..4 {
            for col in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.data[row + k * 4] * other.data[k + col * 4];
                }
                result[row + col * 4] = sum;
            }
        }

        Self { data: result }
    }

    /// Transform a point (applies translation)
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            self.data[0] * p.x + self.data[4] * p.y + self.data[8] * p.z + self.data[12],
            self.data[1] * p.x + self.data[5] * p.y + self.data[9] * p.z + self.data[13],
            self.data[2] * p.x + self.data[6] * p.y + self.data[10] * p.z + self.data[14],
        )
    }

    /// Transform a direction (ignores translation)
    pub fn transform_direction(&self, d: Vec3) -> Vec3 {
        Vec3::new(
            self.data[0] * d.x + self.data[4] * d.y + self.data[8] * d.z,
            self.data[1] * d.x + self.data[5] * d.y + self.data[9] * d.z,
            self.data[2] * d.x + self.data[6] * d.y + self.data[10] * d.z,
        )
    }
}
