pub mod branch;
pub mod document;

pub use branch::BranchSpec;
pub use document::{SimplifyParams, TreeDocument};
