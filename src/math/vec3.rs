use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Neg, Sub};

/// 3D vector for skeleton positions, directions and ring points
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    /// Canonical growth direction of the root
    pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const RIGHT: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn from_array([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn length_squared(&self) -> f64 {
        self.dot(self)
    }

    /// Unit vector in the same direction. The zero vector is returned unchanged.
    pub fn normalize(&self) -> Self {
        match self.length() {
            len if len > 0.0 => self.scale(len.recip()),
            _ => *self,
        }
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        *self + (*other - *self).scale(t)
    }

    pub fn scale(&self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    /// Single precision triple for GPU buffers
    pub fn to_f32_array(&self) -> [f32; 3] {
        [self.x as f32, self.y as f32, self.z as f32]
    }

    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).length()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Some unit vector orthogonal to `self`; crosses with whichever world
    /// axis is further from parallel.
    pub fn perpendicular(&self) -> Self {
        let n = self.normalize();
        let helper = if n.y.abs() < 0.9 { Vec3::UP } else { Vec3::RIGHT };
        n.cross(&helper).normalize()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        self + -other
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, scalar: f64) -> Self {
        self.scale(scalar.recip())
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_and_normalize() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        assert!((v.length() - 5.0).abs() < 1e-12);

        let n = v.normalize();
        assert!((n.length() - 1.0).abs() < 1e-12);
        assert!((n.x - 0.6).abs() < 1e-12);
        assert!((n.y - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_zero_is_noop() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
    }

    #[test]
    fn test_cross_follows_right_hand_rule() {
        assert_eq!(Vec3::RIGHT.cross(&Vec3::UP), Vec3::FORWARD);
        assert_eq!(Vec3::UP.cross(&Vec3::RIGHT), -Vec3::FORWARD);
    }

    #[test]
    fn test_perpendicular_is_orthogonal_unit() {
        for v in [Vec3::UP, Vec3::RIGHT, Vec3::new(1.0, 2.0, -3.0), Vec3::new(0.0, -5.0, 0.0)] {
            let p = v.perpendicular();
            assert!(p.dot(&v).abs() < 1e-12);
            assert!((p.length() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_arithmetic() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 6.0, 8.0);

        assert_eq!(a + b, Vec3::new(5.0, 8.0, 11.0));
        assert_eq!(b - a, Vec3::new(3.0, 4.0, 5.0));
        assert_eq!(b / 2.0, Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(a.lerp(&b, 0.5), Vec3::new(2.5, 4.0, 5.5));

        let mut c = a;
        c += b;
        assert_eq!(c, a + b);
    }
}
