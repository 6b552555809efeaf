use serde::{Deserialize, Serialize};

/// One branch of a tree document.
///
/// `p0` and `radius0` belong to the root only. Every child starts at its
/// parent's `p1` with the parent's `radius1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchSpec {
    #[serde(default)]
    pub p0: Option<[f64; 3]>,
    pub p1: [f64; 3],
    #[serde(default)]
    pub radius0: Option<f64>,
    pub radius1: f64,
    #[serde(default)]
    pub children: Vec<BranchSpec>,
}

impl BranchSpec {
    pub fn new(p1: [f64; 3], radius1: f64) -> Self {
        Self {
            p0: None,
            p1,
            radius0: None,
            radius1,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<BranchSpec>) -> Self {
        self.children = children;
        self
    }

    /// Total number of branches in this subtree
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(|c| c.count()).sum::<usize>()
    }
}
