use super::branch::{cap_ring, connect_rings, ring_vertices, Mesh};
use crate::error::{Result, SkeletonError};
use crate::math::{find_rotation, Mat4, Vec3};
use crate::skeleton::{NodeId, SkeletonNode, SkeletonTree};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::{debug, instrument};

/// Surface built for each branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchShape {
    /// Triangle strips between the generated cross-sections
    #[default]
    Swept,
    /// Straight frustum from `radius0` to `radius1`, ignores cross-sections
    Cylinder,
}

/// Parameters for mesh generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshParams {
    pub shape: BranchShape,
    /// Radial segments of `Cylinder` branches
    pub radial_segments: usize,
    /// Close `Cylinder` branches at both ends
    pub caps: bool,
}

impl Default for MeshParams {
    fn default() -> Self {
        Self {
            shape: BranchShape::Swept,
            radial_segments: 8,
            caps: true,
        }
    }
}

/// Builds renderable triangle meshes from a skeleton
pub struct MeshGenerator {
    params: MeshParams,
}

impl MeshGenerator {
    pub fn new(params: MeshParams) -> Self {
        Self { params }
    }

    /// Generate one mesh for the whole tree, branches appended in pre-order
    #[instrument(level = "debug", skip(self, tree), fields(shape = ?self.params.shape))]
    pub fn generate_tree(&self, tree: &SkeletonTree) -> Result<Mesh> {
        let mut mesh = Mesh::new();
        for (id, node) in tree.iter() {
            mesh.append(self.generate_branch(id, node)?);
        }

        mesh.calculate_bounds();
        debug!(
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "tree mesh generated"
        );
        Ok(mesh)
    }

    /// Mesh of a single branch with indices starting at 0
    pub fn generate_branch(&self, id: NodeId, node: &SkeletonNode) -> Result<Mesh> {
        let mut mesh = Mesh::new();
        match self.params.shape {
            BranchShape::Swept => {
                let rings = node
                    .sections
                    .as_ref()
                    .ok_or(SkeletonError::MissingSections(id))?;
                self.generate_swept(rings, &mut mesh);
            }
            BranchShape::Cylinder => self.generate_cylinder(node, &mut mesh),
        }
        Ok(mesh)
    }

    fn generate_swept(&self, rings: &[Vec<Vec3>], mesh: &mut Mesh) {
        let Some(segments) = rings.first().map(Vec::len) else {
            return;
        };
        let last = (rings.len() - 1).max(1) as f32;

        let starts: Vec<u32> = rings
            .iter()
            .enumerate()
            .map(|(i, ring)| mesh.add_vertices(ring_vertices(ring, i as f32 / last)))
            .collect();

        for pair in starts.windows(2) {
            connect_rings(mesh, pair[0], pair[1], segments);
        }
    }

    /// Frustum built around +Y, rotated onto the branch and moved to its midpoint
    fn generate_cylinder(&self, node: &SkeletonNode, mesh: &mut Mesh) {
        let segments = self.params.radial_segments.max(3);
        let direction = node.direction();
        let half = node.length() / 2.0;
        let mid = node.p0.lerp(&node.p1, 0.5);

        let transform = Mat4::translation(mid.x, mid.y, mid.z)
            .mul(&Mat4::from_rotation(&find_rotation(Vec3::UP, direction)));

        let ring = |y: f64, radius: f64| -> Vec<Vec3> {
            (0..segments)
                .map(|j| {
                    let angle = j as f64 * TAU / segments as f64;
                    transform.transform_point(Vec3::new(
                        radius * angle.cos(),
                        y,
                        radius * angle.sin(),
                    ))
                })
                .collect()
        };

        let bottom = mesh.add_vertices(ring_vertices(&ring(-half, node.radius0), 0.0));
        let top = mesh.add_vertices(ring_vertices(&ring(half, node.radius1), 1.0));
        connect_rings(mesh, bottom, top, segments);

        if self.params.caps {
            let axis = direction.normalize();
            cap_ring(mesh, bottom, segments, node.p0, -axis);
            cap_ring(mesh, top, segments, node.p1, axis);
        }
    }
}
