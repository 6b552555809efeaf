use super::node::{NodeId, Segment, SkeletonNode};
use crate::error::{Result, SkeletonError};
use generational_arena::Arena;
use tracing::instrument;

/// Largest gap allowed between a parent's end and its child's start
pub const JOINT_TOLERANCE: f64 = 1e-9;

/// Arena-backed branch skeleton.
///
/// Parents own children through `children` ids; children point back through
/// `parent`. Ids stay valid until the node is merged away by simplification.
#[derive(Debug, Clone, Default)]
pub struct SkeletonTree {
    arena: Arena<SkeletonNode>,
    root: Option<NodeId>,
}

impl SkeletonTree {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_root(&mut self, segment: Segment) -> Result<NodeId> {
        if self.root.is_some() {
            return Err(SkeletonError::RootAlreadySet);
        }
        segment.validate()?;

        let id = self.arena.insert(SkeletonNode::from_segment(segment, None));
        self.root = Some(id);
        Ok(id)
    }

    /// Attach a branch under `parent`.
    ///
    /// The child must start on the parent's end point with the parent's end
    /// radius, since its first cross-section is the parent's last one.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_child(&mut self, parent: NodeId, segment: Segment) -> Result<NodeId> {
        let joint = self.get(parent)?.segment();
        segment.validate()?;
        if segment.p0.distance(&joint.p1) > JOINT_TOLERANCE {
            return Err(SkeletonError::malformed(format!(
                "child starts at {:?} but its parent ends at {:?}",
                segment.p0, joint.p1
            )));
        }
        if (segment.radius0 - joint.radius1).abs() > JOINT_TOLERANCE {
            return Err(SkeletonError::malformed(format!(
                "child radius {} does not continue its parent's end radius {}",
                segment.radius0, joint.radius1
            )));
        }

        let id = self.arena.insert(SkeletonNode::from_segment(segment, Some(parent)));
        if let Some(node) = self.arena.get_mut(parent) {
            node.children.push(id);
        }
        Ok(id)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&SkeletonNode> {
        self.arena.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SkeletonNode> {
        self.arena.get_mut(id)
    }

    pub(crate) fn get(&self, id: NodeId) -> Result<&SkeletonNode> {
        self.arena.get(id).ok_or(SkeletonError::UnknownNode(id))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut SkeletonNode> {
        self.arena.get_mut(id).ok_or(SkeletonError::UnknownNode(id))
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> Option<SkeletonNode> {
        self.arena.remove(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal: every parent is yielded before its children,
    /// siblings in branching order.
    pub fn iter(&self) -> PreorderIter<'_> {
        PreorderIter::new(self)
    }

    /// Node ids in pre-order, for passes that mutate while walking.
    pub fn preorder_ids(&self) -> Vec<NodeId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn leaves(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| !node.has_children())
            .map(|(id, _)| id)
            .collect()
    }

    /// Number of nodes on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.into_iter().map(|id| (id, 1)).collect();

        while let Some((id, level)) = stack.pop() {
            if let Some(node) = self.node(id) {
                deepest = deepest.max(level);
                stack.extend(node.children.iter().map(|&child| (child, level + 1)));
            }
        }
        deepest
    }

    /// Line-segment buffer for drawing the bare skeleton: `p0` then `p1` of
    /// every node in pre-order, 6 floats per node.
    pub fn line_data(&self) -> Vec<f32> {
        self.iter()
            .flat_map(|(_, node)| {
                let a = node.p0.to_f32_array();
                let b = node.p1.to_f32_array();
                [a[0], a[1], a[2], b[0], b[1], b[2]]
            })
            .collect()
    }

    /// Drop generated rings everywhere (geometry changed).
    pub fn clear_sections(&mut self) {
        for (_, node) in self.arena.iter_mut() {
            node.sections = None;
        }
    }
}

pub struct PreorderIter<'a> {
    tree: &'a SkeletonTree,
    stack: Vec<NodeId>,
}

impl<'a> PreorderIter<'a> {
    fn new(tree: &'a SkeletonTree) -> Self {
        Self {
            tree,
            stack: tree.root.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for PreorderIter<'a> {
    type Item = (NodeId, &'a SkeletonNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if let Some(node) = self.tree.node(id) {
                // reversed so the first child is visited first
                self.stack.extend(node.children.iter().rev());
                return Some((id, node));
            }
        }
        None
    }
}
