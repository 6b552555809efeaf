pub mod vec3;
pub mod matrix;
pub mod spline;
pub mod geometry;

pub use vec3::Vec3;
pub use matrix::Mat4;
pub use spline::{hermite, HermiteCurve, HermiteSample};
pub use geometry::{find_rotation, mean_point, project, Rotation};
