use crate::error::{Result, SkeletonError};
use crate::math::{find_rotation, project, Mat4, Vec3};
use crate::skeleton::{NodeId, SkeletonTree};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Phase offset between the two horizontal wind components
const WIND_PHASE: f64 = 56485.0;

/// Extra load of a branch that carries an apple
pub const APPLE_MASS: f64 = 0.075;

/// Tuning for the wind/gravity pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    /// Multiplier on the gust signal
    pub wind_strength: f64,
    /// Downward acceleration per unit mass
    pub gravity: f64,
    /// Spring gain toward the rest pose, scaled by branch strength
    pub restitution: f64,
    /// Velocity kept per step (0.0 to 1.0)
    pub damping: f64,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            wind_strength: 1.0,
            gravity: 1.0,
            restitution: 1000.0,
            damping: 0.7,
        }
    }
}

/// Per-branch physical state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchDynamics {
    /// Velocity of the branch tip `p1`
    pub velocity: Vec3,
    /// Own end radius, any apple, plus the mass of everything it carries
    pub mass: f64,
    /// Stiffness factor, the base radius
    pub strength: f64,
    /// Unit direction the spring pulls back to
    pub rest_direction: Vec3,
}

/// Horizontal gust at `time`: three superposed sines per axis
pub fn wind_at(time: f64) -> Vec3 {
    let u = time.sin() * 4.0 + (2.5 * time).sin() * 2.0 + (5.0 * time).sin() * 0.4;
    let v = (time + WIND_PHASE).cos() * 4.0
        + (2.5 * time + WIND_PHASE).cos() * 2.0
        + (5.0 * time + WIND_PHASE).cos() * 0.4;
    Vec3::new(u, 0.0, v)
}

/// Compute masses bottom-up and capture the current pose as rest pose.
/// Branches listed in `fruit` carry an apple. Returns the total mass of the
/// tree.
#[instrument(level = "debug", skip(tree, fruit), fields(apples = fruit.len()))]
pub fn init_dynamics(tree: &mut SkeletonTree, fruit: &[NodeId]) -> Result<f64> {
    let root = tree.root().ok_or(SkeletonError::EmptyTree)?;

    // reversed pre-order visits every child before its parent
    for id in tree.preorder_ids().into_iter().rev() {
        let node = tree.get(id)?;
        let carried: f64 = node
            .children
            .iter()
            .filter_map(|&child| tree.node(child))
            .filter_map(|child| child.dynamics.map(|d| d.mass))
            .sum();

        let apple = if fruit.contains(&id) { APPLE_MASS } else { 0.0 };

        let dynamics = BranchDynamics {
            velocity: Vec3::ZERO,
            mass: node.radius1 + apple + carried,
            strength: node.radius0,
            rest_direction: node.direction().normalize(),
        };
        tree.get_mut(id)?.dynamics = Some(dynamics);
    }

    let total = tree.get(root)?.dynamics.map(|d| d.mass).unwrap_or(0.0);
    debug!(total, "dynamics initialised");
    Ok(total)
}

/// Advance the tree by `dt` seconds at simulation time `time`.
///
/// Branch lengths are preserved: only the direction of each branch changes.
/// A parent's rotation is carried over to its children before they are
/// stepped, so joints stay attached. Cross-sections are invalidated.
#[instrument(level = "trace", skip(tree, params))]
pub fn apply_forces(
    tree: &mut SkeletonTree,
    params: &PhysicsParams,
    dt: f64,
    time: f64,
) -> Result<()> {
    if !(dt.is_finite() && dt > 0.0) {
        return Err(SkeletonError::InvalidTimeStep(dt));
    }
    if tree.root().is_none() {
        return Err(SkeletonError::EmptyTree);
    }

    let wind = wind_at(time).scale(params.wind_strength);
    for id in tree.preorder_ids() {
        step_branch(tree, id, params, wind, dt)?;
    }

    tree.clear_sections();
    Ok(())
}

fn step_branch(
    tree: &mut SkeletonTree,
    id: NodeId,
    params: &PhysicsParams,
    wind: Vec3,
    dt: f64,
) -> Result<()> {
    let node = tree.get(id)?;
    let mut dynamics = node.dynamics.ok_or(SkeletonError::DynamicsNotInitialized(id))?;
    let (p0, p1) = (node.p0, node.p1);
    let length = node.length();
    let direction = node.direction().normalize();

    let mut velocity = dynamics.velocity;
    velocity += wind.scale(dt / dynamics.mass.sqrt());
    velocity += Vec3::new(0.0, -dynamics.mass * params.gravity, 0.0).scale(dt);

    let rest_offset = (dynamics.rest_direction - direction).scale(length);
    velocity += rest_offset.scale(dynamics.strength * params.restitution * dt);

    // the tip swings on a sphere around p0
    velocity = velocity - project(velocity, direction);
    velocity = velocity.scale(params.damping);

    let swung = (p1 + velocity.scale(dt) - p0).normalize();
    let new_p1 = if swung.length_squared() > 0.0 {
        p0 + swung.scale(length)
    } else {
        p1
    };
    dynamics.velocity = (new_p1 - p1) / dt;
    let rotation = Mat4::from_rotation(&find_rotation(direction, new_p1 - p0));

    let node = tree.get_mut(id)?;
    node.p1 = new_p1;
    node.dynamics = Some(dynamics);
    let children = node.children.clone();

    for child in children {
        let child = tree.get_mut(child)?;
        let child_length = child.length();
        let child_direction = rotation.transform_direction(child.direction().normalize());

        child.p0 = new_p1;
        child.p1 = new_p1 + child_direction.normalize().scale(child_length);
        if let Some(d) = child.dynamics.as_mut() {
            d.rest_direction = rotation.transform_direction(d.rest_direction).normalize();
        }
    }

    Ok(())
}
