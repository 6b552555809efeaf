use super::Vec3;

/// A point on a Hermite curve together with the curve derivative there
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HermiteSample {
    pub position: Vec3,
    pub tangent: Vec3,
}

/// Cubic Hermite segment between two points with tangent constraints
#[derive(Debug, Clone, Copy)]
pub struct HermiteCurve {
    pub p0: Vec3,
    pub p1: Vec3,
    pub v0: Vec3,
    pub v1: Vec3,
}

impl HermiteCurve {
    pub fn new(p0: Vec3, p1: Vec3, v0: Vec3, v1: Vec3) -> Self {
        Self { p0, p1, v0, v1 }
    }

    pub fn evaluate(&self, t: f64) -> HermiteSample {
        hermite(self.p0, self.p1, self.v0, self.v1, t)
    }

    /// `n` samples at evenly spaced `t` in `[0, 1]`, both ends included
    pub fn sample(&self, n: usize) -> Vec<HermiteSample> {
        (0..n)
            .map(|i| {
                let t = i as f64 / (n - 1).max(1) as f64;
                self.evaluate(t)
            })
            .collect()
    }
}

/// Hermite position and derivative at `t`.
///
/// At `t = 0` the basis reduces to `p0`/`v0` and at `t = 1` to `p1`/`v1`
/// exactly, so the endpoints are reproduced without rounding drift.
pub fn hermite(p0: Vec3, p1: Vec3, v0: Vec3, v1: Vec3, t: f64) -> HermiteSample {
    let t2 = t * t;
    let t3 = t2 * t;

    let h1 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h2 = -2.0 * t3 + 3.0 * t2;
    let h3 = t3 - 2.0 * t2 + t;
    let h4 = t3 - t2;

    let dh1 = 6.0 * t2 - 6.0 * t;
    let dh2 = -6.0 * t2 + 6.0 * t;
    let dh3 = 3.0 * t2 - 4.0 * t + 1.0;
    let dh4 = 3.0 * t2 - 2.0 * t;

    HermiteSample {
        position: p0.scale(h1) + p1.scale(h2) + v0.scale(h3) + v1.scale(h4),
        tangent: p0.scale(dh1) + p1.scale(dh2) + v0.scale(dh3) + v1.scale(dh4),
    }
}
