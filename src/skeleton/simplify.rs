use super::node::NodeId;
use super::tree::SkeletonTree;
use crate::math::find_rotation;
use tracing::{debug, instrument, trace};

/// Default joint angle (radians) below which a single-child chain is merged
pub const DEFAULT_ANGLE_THRESHOLD: f64 = 0.0001;

/// Collapse single-child chains whose direction changes by less than
/// `angle_threshold` radians. Returns the number of merged nodes.
///
/// A surviving node keeps its id; merged children are removed from the arena.
/// Forks are never merged into their parent, only descended into. The walk
/// keeps its own stack, so chain depth is bounded by memory only.
#[instrument(level = "debug", skip(tree))]
pub fn simplify_skeleton(tree: &mut SkeletonTree, angle_threshold: f64) -> usize {
    let mut merges = 0;
    let mut pending: Vec<NodeId> = tree.root().into_iter().collect();

    while let Some(id) = pending.pop() {
        merges += absorb_collinear(tree, id, angle_threshold);
        if let Some(node) = tree.node(id) {
            pending.extend(node.children.iter().rev());
        }
    }

    debug!(merges, remaining = tree.len(), "skeleton simplified");
    merges
}

/// Merge `id` with its only child for as long as the joint stays straighter
/// than `angle_threshold`. Returns the number of merges.
fn absorb_collinear(tree: &mut SkeletonTree, id: NodeId, angle_threshold: f64) -> usize {
    let mut merges = 0;

    loop {
        let Some(node) = tree.node(id) else {
            return merges;
        };
        let &[child] = node.children.as_slice() else {
            return merges;
        };
        let Some(child_node) = tree.node(child) else {
            return merges;
        };

        let angle = find_rotation(node.direction(), child_node.direction()).angle;
        if angle >= angle_threshold {
            return merges;
        }

        trace!(?id, ?child, angle, "merging collinear child");
        merge_child(tree, id, child);
        merges += 1;
    }
}

/// Absorb `child` into `id`: extend the centerline, adopt grandchildren.
fn merge_child(tree: &mut SkeletonTree, id: NodeId, child: NodeId) {
    let Some(absorbed) = tree.remove(child) else {
        return;
    };

    let (p1, radius1) = match tree.node_mut(id) {
        Some(node) => {
            node.p1 = absorbed.p1;
            node.radius1 = absorbed.radius1;
            node.children = absorbed.children.clone();
            node.sections = None;
            (node.p1, node.radius1)
        }
        None => return,
    };

    for grandchild in absorbed.children {
        if let Some(g) = tree.node_mut(grandchild) {
            g.parent = Some(id);
            g.p0 = p1;
            g.radius0 = radius1;
            g.sections = None;
        }
    }
}

impl SkeletonTree {
    /// Simplified copy; `self` is left untouched.
    pub fn simplified(&self, angle_threshold: f64) -> SkeletonTree {
        let mut tree = self.clone();
        simplify_skeleton(&mut tree, angle_threshold);
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::skeleton::Segment;

    /// Straight vertical chain of `n` unit segments with linearly shrinking radii
    fn straight_chain(n: usize) -> (SkeletonTree, Vec<NodeId>) {
        let mut tree = SkeletonTree::new();
        let mut ids = Vec::new();
        let radius = |i: usize| (1.0 - 0.1 * i as f64).max(0.05);

        let root = tree
            .insert_root(
                Segment::new(Vec3::ZERO, Vec3::UP).with_radii(radius(0), radius(1)),
            )
            .unwrap();
        ids.push(root);

        for i in 1..n {
            let segment = Segment::new(
                Vec3::new(0.0, i as f64, 0.0),
                Vec3::new(0.0, (i + 1) as f64, 0.0),
            )
            .with_radii(radius(i), radius(i + 1));
            let id = tree.insert_child(ids[i - 1], segment).unwrap();
            ids.push(id);
        }
        (tree, ids)
    }

    fn snapshot(tree: &SkeletonTree) -> Vec<(Option<NodeId>, Vec<NodeId>, Vec3, Vec3, f64, f64)> {
        tree.iter()
            .map(|(_, n)| (n.parent, n.children.clone(), n.p0, n.p1, n.radius0, n.radius1))
            .collect()
    }

    #[test]
    fn test_straight_chain_collapses_to_one_node() {
        let (mut tree, ids) = straight_chain(4);
        let merges = simplify_skeleton(&mut tree, DEFAULT_ANGLE_THRESHOLD);

        assert_eq!(merges, 3);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root(), Some(ids[0]));

        let root = tree.node(ids[0]).unwrap();
        assert_eq!(root.p0, Vec3::ZERO);
        assert_eq!(root.p1, Vec3::new(0.0, 4.0, 0.0));
        assert!((root.radius0 - 1.0).abs() < 1e-12);
        assert!((root.radius1 - 0.6).abs() < 1e-12);
        assert!(!root.has_children());
        assert!(tree.node(ids[1]).is_none());
    }

    #[test]
    fn test_bent_joint_is_kept() {
        let mut tree = SkeletonTree::new();
        let root = tree.insert_root(Segment::new(Vec3::ZERO, Vec3::UP)).unwrap();
        let bent = tree
            .insert_child(root, Segment::new(Vec3::UP, Vec3::new(1.0, 2.0, 0.0)))
            .unwrap();
        let tip = tree
            .insert_child(bent, Segment::new(Vec3::new(1.0, 2.0, 0.0), Vec3::new(2.0, 3.0, 0.0)))
            .unwrap();

        let merges = simplify_skeleton(&mut tree, DEFAULT_ANGLE_THRESHOLD);

        // root->bent is a 45 degree turn, bent->tip is straight
        assert_eq!(merges, 1);
        assert_eq!(tree.len(), 2);
        assert!(tree.node(tip).is_none());
        let bent = tree.node(bent).unwrap();
        assert_eq!(bent.p1, Vec3::new(2.0, 3.0, 0.0));
        assert_eq!(bent.parent, Some(root));
    }

    #[test]
    fn test_fork_is_never_merged_but_branches_are() {
        let mut tree = SkeletonTree::new();
        let root = tree.insert_root(Segment::new(Vec3::ZERO, Vec3::UP)).unwrap();
        let a = tree
            .insert_child(root, Segment::new(Vec3::UP, Vec3::new(0.0, 2.0, 0.0)))
            .unwrap();
        let b = tree
            .insert_child(root, Segment::new(Vec3::UP, Vec3::new(1.0, 1.0, 0.0)))
            .unwrap();
        let a_tip = tree
            .insert_child(a, Segment::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 3.0, 0.0)))
            .unwrap();

        let merges = simplify_skeleton(&mut tree, DEFAULT_ANGLE_THRESHOLD);

        assert_eq!(merges, 1);
        assert_eq!(tree.node(root).unwrap().children, vec![a, b]);
        assert_eq!(tree.node(root).unwrap().p1, Vec3::UP);
        assert_eq!(tree.node(a).unwrap().p1, Vec3::new(0.0, 3.0, 0.0));
        assert!(tree.node(a_tip).is_none());
    }

    #[test]
    fn test_grandchildren_are_reparented() {
        let mut tree = SkeletonTree::new();
        let root = tree
            .insert_root(Segment::new(Vec3::ZERO, Vec3::UP).with_radii(1.0, 0.9))
            .unwrap();
        let top = Vec3::new(0.0, 2.0, 0.0);
        let mid = tree
            .insert_child(root, Segment::new(Vec3::UP, top).with_radii(0.9, 0.8))
            .unwrap();
        let left = tree
            .insert_child(mid, Segment::new(top, Vec3::new(-1.0, 3.0, 0.0)).with_radii(0.8, 0.5))
            .unwrap();
        let right = tree
            .insert_child(mid, Segment::new(top, Vec3::new(1.0, 3.0, 0.0)).with_radii(0.8, 0.5))
            .unwrap();

        simplify_skeleton(&mut tree, DEFAULT_ANGLE_THRESHOLD);

        let root_node = tree.node(root).unwrap();
        assert_eq!(root_node.children, vec![left, right]);
        assert_eq!(root_node.p1, top);
        for id in [left, right] {
            let child = tree.node(id).unwrap();
            assert_eq!(child.parent, Some(root));
            assert_eq!(child.p0, top);
            assert!((child.radius0 - 0.8).abs() < 1e-12);
        }
    }

    #[test]
    fn test_idempotent() {
        let mut tree = SkeletonTree::new();
        let root = tree.insert_root(Segment::new(Vec3::ZERO, Vec3::UP)).unwrap();
        let a = tree
            .insert_child(root, Segment::new(Vec3::UP, Vec3::new(0.0, 2.0, 0.0)))
            .unwrap();
        let b = tree
            .insert_child(a, Segment::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(1.0, 3.0, 0.0)))
            .unwrap();
        tree.insert_child(b, Segment::new(Vec3::new(1.0, 3.0, 0.0), Vec3::new(1.0, 4.0, 0.0)))
            .unwrap();
        tree.insert_child(b, Segment::new(Vec3::new(1.0, 3.0, 0.0), Vec3::new(2.0, 4.0, 0.0)))
            .unwrap();

        let once = tree.simplified(DEFAULT_ANGLE_THRESHOLD);
        let mut twice = once.clone();
        let merges = simplify_skeleton(&mut twice, DEFAULT_ANGLE_THRESHOLD);

        assert_eq!(merges, 0);
        assert_eq!(snapshot(&once), snapshot(&twice));
    }

    #[test]
    fn test_preserves_root_start_and_leaf_ends() {
        let (tree, _) = straight_chain(3);
        let mut forked = tree.clone();
        let leaf = forked.leaves()[0];
        let leaf_end = forked.node(leaf).unwrap().p1;
        forked
            .insert_child(
                leaf,
                Segment::new(leaf_end, leaf_end + Vec3::new(1.0, 0.5, 0.0)).with_radii(0.7, 0.5),
            )
            .unwrap();
        forked
            .insert_child(
                leaf,
                Segment::new(leaf_end, leaf_end + Vec3::new(-1.0, 0.5, 0.0)).with_radii(0.7, 0.5),
            )
            .unwrap();

        let leaf_ends = |t: &SkeletonTree| {
            t.leaves()
                .into_iter()
                .map(|id| t.node(id).unwrap().p1)
                .collect::<Vec<_>>()
        };
        let before = leaf_ends(&forked);
        let simplified = forked.simplified(DEFAULT_ANGLE_THRESHOLD);

        let root = simplified.root().unwrap();
        assert_eq!(simplified.node(root).unwrap().p0, Vec3::ZERO);
        assert_eq!(leaf_ends(&simplified), before);
        assert_eq!(simplified.len(), 3);
    }

    #[test]
    fn test_threshold_is_strict() {
        let build = || {
            let mut tree = SkeletonTree::new();
            let root = tree.insert_root(Segment::new(Vec3::ZERO, Vec3::UP)).unwrap();
            let tilt = 0.01f64;
            let end = Vec3::UP + Vec3::new(tilt.sin(), tilt.cos(), 0.0);
            tree.insert_child(root, Segment::new(Vec3::UP, end)).unwrap();
            tree
        };

        let tree = build();
        let root = tree.root().unwrap();
        let child = tree.node(root).unwrap().children[0];
        let angle = find_rotation(
            tree.node(root).unwrap().direction(),
            tree.node(child).unwrap().direction(),
        )
        .angle;

        let mut at_threshold = build();
        assert_eq!(simplify_skeleton(&mut at_threshold, angle), 0);
        assert_eq!(at_threshold.len(), 2);

        let mut above_threshold = build();
        assert_eq!(simplify_skeleton(&mut above_threshold, angle + 1e-9), 1);
        assert_eq!(above_threshold.len(), 1);
    }

    #[test]
    fn test_simplified_leaves_input_untouched() {
        let (tree, _) = straight_chain(3);
        let simplified = tree.simplified(DEFAULT_ANGLE_THRESHOLD);
        assert_eq!(tree.len(), 3);
        assert_eq!(simplified.len(), 1);
    }

    #[test]
    fn test_deep_bent_chain_does_not_recurse() {
        // zigzag chain: every joint turns by at least 11 degrees, so nothing merges
        let mut tree = SkeletonTree::new();
        let mut tip = tree.insert_root(Segment::new(Vec3::ZERO, Vec3::UP)).unwrap();
        let mut end = Vec3::UP;
        for i in 1..20_001 {
            let sway = if i % 2 == 0 { 0.2 } else { -0.2 };
            let next = end + Vec3::new(sway, 1.0, 0.0);
            tip = tree.insert_child(tip, Segment::new(end, next)).unwrap();
            end = next;
        }

        assert_eq!(simplify_skeleton(&mut tree, DEFAULT_ANGLE_THRESHOLD), 0);
        assert_eq!(tree.len(), 20_001);
        assert_eq!(tree.node(tip).unwrap().p1, end);
    }

    #[test]
    fn test_deep_straight_chain_collapses() {
        let (mut tree, ids) = straight_chain(20_000);
        let merges = simplify_skeleton(&mut tree, DEFAULT_ANGLE_THRESHOLD);
        assert_eq!(merges, 19_999);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.node(ids[0]).unwrap().p1, Vec3::new(0.0, 20_000.0, 0.0));
    }

    #[test]
    fn test_empty_tree() {
        let mut tree = SkeletonTree::new();
        assert_eq!(simplify_skeleton(&mut tree, DEFAULT_ANGLE_THRESHOLD), 0);
    }
}
