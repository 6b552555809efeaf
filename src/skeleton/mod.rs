pub mod node;
pub mod tree;
pub mod simplify;
pub mod sections;

pub use node::{NodeId, Ring, Segment, SkeletonNode};
pub use tree::{PreorderIter, SkeletonTree, JOINT_TOLERANCE};
pub use simplify::{simplify_skeleton, DEFAULT_ANGLE_THRESHOLD};
pub use sections::{generate_sections, SweepParams};
