use super::node::{NodeId, Ring};
use super::tree::SkeletonTree;
use crate::error::{Result, SkeletonError};
use crate::math::{find_rotation, HermiteCurve, Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::{debug, instrument, trace};

/// Resolution of the generalized-cylinder sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepParams {
    /// Rings per branch, both ends included (min 2)
    pub length_divisions: usize,
    /// Points per ring (min 3)
    pub radial_divisions: usize,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            length_divisions: 4,
            radial_divisions: 8,
        }
    }
}

impl SweepParams {
    pub fn new(length_divisions: usize, radial_divisions: usize) -> Self {
        Self {
            length_divisions,
            radial_divisions,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.length_divisions < 2 || self.radial_divisions < 3 {
            return Err(SkeletonError::InvalidDivisions {
                length: self.length_divisions,
                radial: self.radial_divisions,
            });
        }
        Ok(())
    }
}

/// Fill `sections` on every node with `length_divisions` rings of
/// `radial_divisions` points.
///
/// Nodes are processed parent first: a child's first ring is a copy of its
/// parent's last ring, so joints are seamless. Only the root ring is built
/// from scratch. On error the failing node and its descendants are left
/// without sections.
#[instrument(level = "debug", skip(tree))]
pub fn generate_sections(tree: &mut SkeletonTree, params: &SweepParams) -> Result<()> {
    params.validate()?;
    if tree.root().is_none() {
        return Err(SkeletonError::EmptyTree);
    }

    tree.clear_sections();
    let order = tree.preorder_ids();
    for &id in &order {
        let rings = sweep_node(tree, id, params)?;
        trace!(?id, rings = rings.len(), "branch swept");
        tree.get_mut(id)?.sections = Some(rings);
    }

    debug!(nodes = order.len(), "cross-sections generated");
    Ok(())
}

fn sweep_node(tree: &SkeletonTree, id: NodeId, params: &SweepParams) -> Result<Vec<Ring>> {
    let node = tree.get(id)?;
    let length = params.length_divisions;

    let (v0, first_ring) = match node.parent {
        None => (
            Vec3::UP,
            root_ring(node.p0, Vec3::UP, node.radius0, params.radial_divisions),
        ),
        Some(parent_id) => {
            let parent = tree.get(parent_id)?;
            let ring = parent
                .last_ring()
                .cloned()
                .ok_or(SkeletonError::MissingSections(parent_id))?;
            (parent.direction(), ring)
        }
    };

    let curve = HermiteCurve::new(node.p0, node.p1, v0, node.direction());
    let samples = curve.sample(length);
    let decay = node.radius1 / node.radius0;

    let mut rings = Vec::with_capacity(length);
    rings.push(first_ring);

    for i in 1..length {
        let previous = samples[i - 1];
        let current = samples[i];

        let rotation = Mat4::from_rotation(&find_rotation(previous.tangent, current.tangent));
        let radius = node.radius0 * (1.0 + (i as f64 / (length - 1) as f64) * (decay - 1.0));
        let displacement = current.position - previous.position;

        let ring: Ring = rings[i - 1]
            .iter()
            .map(|&point| {
                let spoke = (point + displacement - current.position).normalize();
                let spoke = rotation.transform_direction(spoke).normalize();
                current.position + spoke.scale(radius)
            })
            .collect();

        if ring.iter().any(|p| !p.is_finite()) {
            return Err(SkeletonError::degenerate(
                id,
                format!("non-finite ring {} of {}", i, length),
            ));
        }
        rings.push(ring);
    }

    Ok(rings)
}

/// First ring of the tree: `radial` points at `radius` around `center`,
/// in the plane with normal `normal`, at angles `-j * 2pi / radial`.
fn root_ring(center: Vec3, normal: Vec3, radius: f64, radial: usize) -> Ring {
    let (v1, v2) = plane_frame(normal);

    (0..radial)
        .map(|j| {
            let theta = -(j as f64) * TAU / radial as f64;
            center + v1.scale(radius * theta.cos()) + v2.scale(radius * theta.sin())
        })
        .collect()
}

/// Two orthonormal vectors spanning the plane `normal . x = 0`.
///
/// The first is found by fixing two coordinates to 2 and 1 and solving the
/// plane equation for the third; the solved coordinate is the first of z, y, x
/// whose normal component is non-zero.
fn plane_frame(normal: Vec3) -> (Vec3, Vec3) {
    let solve = |a: f64, b: f64, c: f64| -(a * 2.0 + b) / c;

    let v1 = if normal.z != 0.0 {
        Vec3::new(2.0, 1.0, solve(normal.x, normal.y, normal.z))
    } else if normal.y != 0.0 {
        Vec3::new(2.0, solve(normal.x, normal.z, normal.y), 1.0)
    } else {
        Vec3::new(solve(normal.y, normal.z, normal.x), 2.0, 1.0)
    }
    .normalize();

    let v2 = normal.cross(&v1).normalize();
    (v1, v2)
}
