use super::branch::BranchSpec;
use crate::dynamics::PhysicsParams;
use crate::foliage::FoliageParams;
use crate::error::{Result, SkeletonError};
use crate::math::Vec3;
use crate::mesh::MeshParams;
use crate::skeleton::{NodeId, Segment, SkeletonTree, SweepParams, DEFAULT_ANGLE_THRESHOLD};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyParams {
    /// Radians; single-child joints bending less than this are merged
    pub angle_threshold: f64,
}

impl Default for SimplifyParams {
    fn default() -> Self {
        Self {
            angle_threshold: DEFAULT_ANGLE_THRESHOLD,
        }
    }
}

/// YAML input format for a tree: processing parameters plus the branch hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub simplify: SimplifyParams,
    #[serde(default)]
    pub sweep: SweepParams,
    #[serde(default)]
    pub mesh: MeshParams,
    #[serde(default)]
    pub physics: PhysicsParams,
    #[serde(default)]
    pub foliage: FoliageParams,
    pub root: BranchSpec,
}

impl TreeDocument {
    /// Parse from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let document: TreeDocument = serde_yaml::from_str(yaml)?;
        if document.root.radius0.is_none() {
            return Err(SkeletonError::malformed("root branch needs radius0"));
        }
        document.sweep.validate()?;
        document.foliage.validate()?;
        Ok(document)
    }

    /// Build the arena tree, validating every branch on the way.
    pub fn build_tree(&self) -> Result<SkeletonTree> {
        let mut tree = SkeletonTree::new();

        let spec = &self.root;
        let radius0 = spec
            .radius0
            .ok_or_else(|| SkeletonError::malformed("root branch needs radius0"))?;
        let p0 = spec.p0.map(Vec3::from_array).unwrap_or(Vec3::ZERO);
        let segment = Segment::new(p0, Vec3::from_array(spec.p1)).with_radii(radius0, spec.radius1);
        let root = tree.insert_root(segment)?;

        let mut pending: Vec<(NodeId, Segment, &BranchSpec)> = spec
            .children
            .iter()
            .rev()
            .map(|child| (root, segment, child))
            .collect();

        while let Some((parent, parent_segment, spec)) = pending.pop() {
            if spec.p0.is_some() || spec.radius0.is_some() {
                return Err(SkeletonError::malformed(format!(
                    "branch ending at {:?} sets p0 or radius0; only the root may",
                    spec.p1
                )));
            }
            let segment = Segment::new(parent_segment.p1, Vec3::from_array(spec.p1))
                .with_radii(parent_segment.radius1, spec.radius1);

            let id = tree.insert_child(parent, segment)?;
            pending.extend(spec.children.iter().rev().map(|child| (id, segment, child)));
        }

        debug!(name = %self.name, nodes = tree.len(), "tree built from document");
        Ok(tree)
    }
}
