//! # Skeleton Errors
//!
//! Error types for tree construction, simplification, sweeping, meshing
//! and foliage placement.

use crate::skeleton::NodeId;
use thiserror::Error;

/// Errors that can occur while building or processing a skeleton.
#[derive(Debug, Error)]
pub enum SkeletonError {
    /// Input document could not be parsed
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A branch segment violates the construction invariants
    #[error("Malformed branch: {message}")]
    MalformedBranch { message: String },

    /// A second root was inserted
    #[error("Tree already has a root")]
    RootAlreadySet,

    /// Operation needs a root but the tree is empty
    #[error("Tree is empty")]
    EmptyTree,

    /// Referenced node is not (or no longer) part of the tree
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    /// Sweep resolution out of range
    #[error("Invalid divisions: length {length} (min 2), radial {radial} (min 3)")]
    InvalidDivisions { length: usize, radial: usize },

    /// Foliage parameters out of range
    #[error("Invalid foliage parameters: {0}")]
    InvalidFoliage(String),

    /// Mesh requested before cross-sections were generated
    #[error("Node {0:?} has no cross-sections")]
    MissingSections(NodeId),

    /// Numerical breakdown while generating geometry
    #[error("Degenerate geometry at {node:?}: {message}")]
    DegenerateGeometry { node: NodeId, message: String },

    /// Dynamics stepped before `init_dynamics`
    #[error("Dynamics not initialised for node {0:?}")]
    DynamicsNotInitialized(NodeId),

    /// Non-positive or non-finite time step
    #[error("Invalid time step: {0}")]
    InvalidTimeStep(f64),
}

impl SkeletonError {
    /// Creates a malformed branch error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedBranch {
            message: message.into(),
        }
    }

    /// Creates a degenerate geometry error.
    pub fn degenerate(node: NodeId, message: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            node,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SkeletonError>;
