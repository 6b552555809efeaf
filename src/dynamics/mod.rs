pub mod relaxation;

pub use relaxation::{
    apply_forces, init_dynamics, wind_at, BranchDynamics, PhysicsParams, APPLE_MASS,
};
