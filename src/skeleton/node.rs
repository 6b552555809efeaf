use crate::dynamics::BranchDynamics;
use crate::error::{Result, SkeletonError};
use crate::math::Vec3;
use generational_arena::Index;

/// Handle of a node inside a [`SkeletonTree`](super::SkeletonTree)
pub type NodeId = Index;

/// One circular cross-section, `radial_divisions` points in angular order
pub type Ring = Vec<Vec3>;

/// Centerline and radii of a branch, used to construct nodes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub p0: Vec3,
    pub p1: Vec3,
    pub radius0: f64,
    pub radius1: f64,
}

impl Segment {
    pub fn new(p0: Vec3, p1: Vec3) -> Self {
        Self {
            p0,
            p1,
            radius0: 1.0,
            radius1: 1.0,
        }
    }

    pub fn with_radii(mut self, radius0: f64, radius1: f64) -> Self {
        self.radius0 = radius0;
        self.radius1 = radius1;
        self
    }

    /// Reject zero-length branches, non-positive radii and non-finite input.
    pub fn validate(&self) -> Result<()> {
        if !self.p0.is_finite() || !self.p1.is_finite() {
            return Err(SkeletonError::malformed(format!(
                "non-finite endpoint {:?} -> {:?}",
                self.p0, self.p1
            )));
        }
        if self.p0 == self.p1 {
            return Err(SkeletonError::malformed(format!(
                "zero-length branch at {:?}",
                self.p0
            )));
        }
        for radius in [self.radius0, self.radius1] {
            if !(radius.is_finite() && radius > 0.0) {
                return Err(SkeletonError::malformed(format!(
                    "radius must be positive, got {} -> {}",
                    self.radius0, self.radius1
                )));
            }
        }
        Ok(())
    }
}

/// A node in the skeleton: one branch segment
#[derive(Debug, Clone)]
pub struct SkeletonNode {
    /// Owning node, `None` for the root
    pub parent: Option<NodeId>,
    /// Child branches in branching order
    pub children: Vec<NodeId>,
    /// Start of the centerline
    pub p0: Vec3,
    /// End of the centerline
    pub p1: Vec3,
    /// Radius at `p0`
    pub radius0: f64,
    /// Radius at `p1`
    pub radius1: f64,
    /// Rings along the branch, filled by `generate_sections`
    pub sections: Option<Vec<Ring>>,
    /// Physical state, filled by `init_dynamics`
    pub dynamics: Option<BranchDynamics>,
}

impl SkeletonNode {
    pub(crate) fn from_segment(segment: Segment, parent: Option<NodeId>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            p0: segment.p0,
            p1: segment.p1,
            radius0: segment.radius0,
            radius1: segment.radius1,
            sections: None,
            dynamics: None,
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Unnormalized branch direction `p1 - p0`
    pub fn direction(&self) -> Vec3 {
        self.p1 - self.p0
    }

    pub fn length(&self) -> f64 {
        self.p0.distance(&self.p1)
    }

    pub fn segment(&self) -> Segment {
        Segment {
            p0: self.p0,
            p1: self.p1,
            radius0: self.radius0,
            radius1: self.radius1,
        }
    }

    /// Last ring, if sections were generated
    pub fn last_ring(&self) -> Option<&Ring> {
        self.sections.as_ref().and_then(|rings| rings.last())
    }
}
