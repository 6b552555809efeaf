use crate::error::{Result, SkeletonError};
use crate::math::Vec3;
use crate::skeleton::{NodeId, SkeletonNode, SkeletonTree};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::{debug, instrument};

/// Where and how densely leaves and apples grow
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoliageParams {
    /// Leaf size, also the spread of leaves and apples around a branch tip
    pub alpha: f64,
    /// Branches with `radius0 < alpha * leaves_cutoff` carry foliage
    pub leaves_cutoff: f64,
    /// Leaves per foliage branch
    pub leaves_density: usize,
    /// Chance that a foliage branch carries one apple
    pub apples_probability: f64,
    pub seed: u32,
}

impl Default for FoliageParams {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            leaves_cutoff: 0.1,
            leaves_density: 10,
            apples_probability: 0.05,
            seed: 42,
        }
    }
}

impl FoliageParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(SkeletonError::InvalidFoliage(format!(
                "alpha must be positive, got {}",
                self.alpha
            )));
        }
        if !(0.0..=1.0).contains(&self.apples_probability) {
            return Err(SkeletonError::InvalidFoliage(format!(
                "apples_probability must be within [0, 1], got {}",
                self.apples_probability
            )));
        }
        Ok(())
    }

    /// Radius below which a branch counts as a twig
    pub fn twig_radius(&self) -> f64 {
        self.alpha * self.leaves_cutoff
    }
}

/// A leaf or apple position tied to the branch it grows on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub node: NodeId,
    pub position: Vec3,
}

/// Leaf and apple anchors of a whole tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Foliage {
    pub leaves: Vec<Anchor>,
    pub apples: Vec<Anchor>,
}

impl Foliage {
    /// Leaf positions as `x, y, z` triples
    pub fn leaf_data(&self) -> Vec<f32> {
        positions(&self.leaves)
    }

    /// Apple positions as `x, y, z` triples
    pub fn apple_data(&self) -> Vec<f32> {
        positions(&self.apples)
    }

    /// Branches that carry an apple
    pub fn fruit_nodes(&self) -> Vec<NodeId> {
        self.apples.iter().map(|a| a.node).collect()
    }
}

fn positions(anchors: &[Anchor]) -> Vec<f32> {
    anchors
        .iter()
        .flat_map(|a| a.position.to_f32_array())
        .collect()
}

/// Linear congruential generator (Numerical Recipes constants)
struct Lcg(u32);

impl Lcg {
    /// Uniform in `[0, 1)`
    fn next_unit(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(1664525).wrapping_add(1013904223);
        // high bits only, the low ones cycle quickly
        (self.0 >> 8) as f64 / (1u32 << 24) as f64
    }

    fn centered(&mut self) -> f64 {
        self.next_unit() - 0.5
    }
}

/// Scatter leaves and apples over the twigs of `tree`.
///
/// Twigs are visited in pre-order with one generator seeded from
/// `params.seed`, so the same skeleton always gets the same foliage and the
/// anchors follow their branch when it moves.
#[instrument(level = "debug", skip(tree))]
pub fn place_foliage(tree: &SkeletonTree, params: &FoliageParams) -> Result<Foliage> {
    params.validate()?;

    let mut rng = Lcg(params.seed);
    let mut foliage = Foliage::default();

    for (id, node) in tree.iter() {
        if node.radius0 >= params.twig_radius() {
            continue;
        }

        if rng.next_unit() < params.apples_probability {
            let offset = Vec3::new(rng.centered(), rng.centered(), rng.centered());
            foliage.apples.push(Anchor {
                node: id,
                position: node.p1 + offset.scale(params.alpha),
            });
        }

        for _ in 0..params.leaves_density {
            foliage.leaves.push(Anchor {
                node: id,
                position: leaf_position(node, params.alpha, &mut rng),
            });
        }
    }

    debug!(
        leaves = foliage.leaves.len(),
        apples = foliage.apples.len(),
        "foliage placed"
    );
    Ok(foliage)
}

/// Random point in a cylinder of radius `alpha / 2` around the branch axis,
/// centred on `p1`. Tips get an extra `alpha` of length so leaves overhang.
fn leaf_position(node: &SkeletonNode, alpha: f64, rng: &mut Lcg) -> Vec3 {
    let axis = node.direction().normalize();
    let u = axis.perpendicular();
    let v = axis.cross(&u);

    let mut reach = node.length();
    if !node.has_children() {
        reach += alpha;
    }

    let along = rng.centered() * reach;
    let theta = rng.next_unit() * TAU;
    let r = rng.next_unit() * alpha / 2.0;

    node.p1 + axis.scale(along) + u.scale(r * theta.cos()) + v.scale(r * theta.sin())
}
