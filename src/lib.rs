use wasm_bindgen::prelude::*;

pub mod data;
pub mod dynamics;
pub mod error;
pub mod foliage;
pub mod math;
pub mod mesh;
pub mod skeleton;

pub use error::{Result, SkeletonError};

use data::TreeDocument;
use dynamics::{apply_forces, init_dynamics, PhysicsParams};
use foliage::{place_foliage, Foliage, FoliageParams};
use mesh::{BranchShape, Mesh, MeshGenerator, MeshParams};
use skeleton::{generate_sections, simplify_skeleton, SkeletonTree, SweepParams};

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// A loaded tree exposed to JavaScript: skeleton, sweep settings, the last
/// built mesh and its foliage.
#[wasm_bindgen]
pub struct ArborTree {
    tree: SkeletonTree,
    sweep: SweepParams,
    mesh_params: MeshParams,
    physics: PhysicsParams,
    foliage_params: FoliageParams,
    angle_threshold: f64,
    mesh: Mesh,
    foliage: Foliage,
    time: f64,
}

#[wasm_bindgen]
impl ArborTree {
    /// Load a tree document (YAML) and build its mesh
    #[wasm_bindgen(constructor)]
    pub fn new(yaml: &str) -> std::result::Result<ArborTree, JsValue> {
        let document = TreeDocument::from_yaml(yaml).map_err(js_error)?;
        let tree = document.build_tree().map_err(js_error)?;

        let mut arbor = Self {
            tree,
            sweep: document.sweep,
            mesh_params: document.mesh,
            physics: document.physics,
            foliage_params: document.foliage,
            angle_threshold: document.simplify.angle_threshold,
            mesh: Mesh::new(),
            foliage: Foliage::default(),
            time: 0.0,
        };
        arbor.rebuild().map_err(js_error)?;
        Ok(arbor)
    }

    /// Merge collinear joints, rebuild, and return the number of merges
    #[wasm_bindgen]
    pub fn simplify(&mut self) -> std::result::Result<usize, JsValue> {
        let merges = simplify_skeleton(&mut self.tree, self.angle_threshold);
        self.rebuild().map_err(js_error)?;
        Ok(merges)
    }

    /// Change sweep resolution and rebuild
    #[wasm_bindgen]
    pub fn set_divisions(
        &mut self,
        length_divisions: usize,
        radial_divisions: usize,
    ) -> std::result::Result<(), JsValue> {
        let sweep = SweepParams::new(length_divisions, radial_divisions);
        sweep.validate().map_err(js_error)?;
        self.sweep = sweep;
        self.rebuild().map_err(js_error)
    }

    /// Toggle between swept and rough cylinder branches
    #[wasm_bindgen]
    pub fn set_rough(&mut self, rough: bool) -> std::result::Result<(), JsValue> {
        self.mesh_params.shape = if rough {
            BranchShape::Cylinder
        } else {
            BranchShape::Swept
        };
        self.rebuild().map_err(js_error)
    }

    /// Start the wind/gravity simulation from the current pose; apples
    /// weigh down the branches they hang on
    #[wasm_bindgen]
    pub fn enable_dynamics(&mut self) -> std::result::Result<f64, JsValue> {
        self.time = 0.0;
        init_dynamics(&mut self.tree, &self.foliage.fruit_nodes()).map_err(js_error)
    }

    /// Advance the simulation and rebuild the mesh
    #[wasm_bindgen]
    pub fn step(&mut self, dt: f64) -> std::result::Result<(), JsValue> {
        self.time += dt;
        apply_forces(&mut self.tree, &self.physics, dt, self.time).map_err(js_error)?;
        self.rebuild().map_err(js_error)
    }

    /// Interleaved position(3) + normal(3) + uv(2) floats
    #[wasm_bindgen]
    pub fn vertex_data(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(self.mesh.vertex_data().as_slice())
    }

    #[wasm_bindgen]
    pub fn index_data(&self) -> js_sys::Uint32Array {
        js_sys::Uint32Array::from(self.mesh.index_data())
    }

    /// Line segments `p0, p1` per branch, for `LINES` drawing
    #[wasm_bindgen]
    pub fn skeleton_data(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(self.tree.line_data().as_slice())
    }

    /// Leaf anchor positions, 3 floats each
    #[wasm_bindgen]
    pub fn leaf_data(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(self.foliage.leaf_data().as_slice())
    }

    /// Apple anchor positions, 3 floats each
    #[wasm_bindgen]
    pub fn apple_data(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(self.foliage.apple_data().as_slice())
    }

    #[wasm_bindgen]
    pub fn leaf_count(&self) -> usize {
        self.foliage.leaves.len()
    }

    #[wasm_bindgen]
    pub fn apple_count(&self) -> usize {
        self.foliage.apples.len()
    }

    #[wasm_bindgen]
    pub fn node_count(&self) -> usize {
        self.tree.len()
    }

    #[wasm_bindgen]
    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    /// Bounding sphere as `[x, y, z, radius]`
    #[wasm_bindgen]
    pub fn bounds(&self) -> Vec<f64> {
        let c = self.mesh.bounds_center;
        vec![c.x, c.y, c.z, self.mesh.bounds_radius]
    }
}

impl ArborTree {
    /// Regenerate everything derived from the skeleton. Swept branches take
    /// their ring size from the sweep, cylinders from `mesh.radial_segments`.
    fn rebuild(&mut self) -> Result<()> {
        if self.mesh_params.shape == BranchShape::Swept {
            generate_sections(&mut self.tree, &self.sweep)?;
        }
        self.mesh = MeshGenerator::new(self.mesh_params).generate_tree(&self.tree)?;
        self.foliage = place_foliage(&self.tree, &self.foliage_params)?;
        Ok(())
    }
}

/// Report to the browser console and convert for the JS boundary
fn js_error(err: SkeletonError) -> JsValue {
    let message = err.to_string();
    web_sys::console::error_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}
