use crate::math::{mean_point, Vec3};

/// A vertex with position, normal and UV
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position,
            normal,
            uv: [0.0, 0.0],
        }
    }

    pub fn with_uv(mut self, u: f32, v: f32) -> Self {
        self.uv = [u, v];
        self
    }

    /// Convert to flat array for WebGL buffer
    /// Layout: position(3) + normal(3) + uv(2) = 8 floats
    pub fn to_array(&self) -> [f32; 8] {
        let p = self.position.to_f32_array();
        let n = self.normal.to_f32_array();
        [p[0], p[1], p[2], n[0], n[1], n[2], self.uv[0], self.uv[1]]
    }
}

/// A mesh composed of vertices and triangle indices
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Bounding sphere
    pub bounds_center: Vec3,
    pub bounds_radius: f64,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add vertices and return the starting index
    pub fn add_vertices(&mut self, verts: impl IntoIterator<Item = Vertex>) -> u32 {
        let start = self.vertices.len() as u32;
        self.vertices.extend(verts);
        start
    }

    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Add a quad as two triangles (a, b, c) and (a, c, d)
    pub fn add_quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.add_triangle(a, b, c);
        self.add_triangle(a, c, d);
    }

    /// Append a branch mesh, rebasing its indices past the current vertices.
    /// Bounds are left for `calculate_bounds`.
    pub fn append(&mut self, branch: Mesh) {
        let offset = self.add_vertices(branch.vertices);
        self.indices.extend(branch.indices.into_iter().map(|idx| idx + offset));
    }

    /// Calculate bounding sphere around the vertex centroid
    pub fn calculate_bounds(&mut self) {
        let positions: Vec<Vec3> = self.vertices.iter().map(|v| v.position).collect();
        let Some(center) = mean_point(&positions) else {
            self.bounds_center = Vec3::ZERO;
            self.bounds_radius = 0.0;
            return;
        };

        self.bounds_center = center;
        self.bounds_radius = positions
            .iter()
            .map(|p| p.distance(&center))
            .fold(0.0, f64::max);
    }

    /// Get vertex buffer data as flat f32 array
    pub fn vertex_data(&self) -> Vec<f32> {
        self.vertices
            .iter()
            .flat_map(|v| v.to_array())
            .collect()
    }

    pub fn index_data(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Vertices for one ring of a cross-section; normals point away from the
/// ring centroid.
pub fn ring_vertices(ring: &[Vec3], v_coord: f32) -> Vec<Vertex> {
    let center = mean_point(ring).unwrap_or(Vec3::ZERO);
    let segments = ring.len();

    ring.iter()
        .enumerate()
        .map(|(j, &position)| {
            let u = j as f32 / segments as f32;
            Vertex::new(position, (position - center).normalize()).with_uv(u, v_coord)
        })
        .collect()
}

/// Connect two rings of `segments` vertices with quads, wrapping radially
pub fn connect_rings(mesh: &mut Mesh, ring1_start: u32, ring2_start: u32, segments: usize) {
    for i in 0..segments {
        let i_next = (i + 1) % segments;

        let a = ring1_start + i as u32;
        let b = ring1_start + i_next as u32;
        let c = ring2_start + i_next as u32;
        let d = ring2_start + i as u32;

        mesh.add_quad(a, d, c, b);
    }
}

/// Close a ring with a triangle fan around `apex`
pub fn cap_ring(mesh: &mut Mesh, ring_start: u32, segments: usize, apex: Vec3, normal: Vec3) {
    let apex_idx = mesh.add_vertices(std::iter::once(
        Vertex::new(apex, normal).with_uv(0.5, 0.5),
    ));

    for i in 0..segments {
        let next = (i + 1) % segments;
        mesh.add_triangle(ring_start + i as u32, ring_start + next as u32, apex_idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_ring(y: f64) -> Vec<Vec3> {
        vec![
            Vec3::new(1.0, y, 0.0),
            Vec3::new(0.0, y, 1.0),
            Vec3::new(-1.0, y, 0.0),
            Vec3::new(0.0, y, -1.0),
        ]
    }

    #[test]
    fn test_vertex_to_array() {
        let v = Vertex::new(Vec3::new(1.0, 2.0, 3.0), Vec3::UP).with_uv(0.5, 0.25);

        let arr = v.to_array();
        assert_eq!(arr.len(), 8);
        assert_eq!(arr[0], 1.0);
        assert_eq!(arr[4], 1.0); // normal.y
        assert_eq!(arr[7], 0.25);
    }

    #[test]
    fn test_append_rebases_indices() {
        let band = |y: f64| {
            let mut mesh = Mesh::new();
            let bottom = mesh.add_vertices(ring_vertices(&square_ring(y), 0.0));
            let top = mesh.add_vertices(ring_vertices(&square_ring(y + 1.0), 1.0));
            connect_rings(&mut mesh, bottom, top, 4);
            mesh
        };

        let mut tree_mesh = band(0.0);
        let upper = band(1.0);
        let upper_indices = upper.indices.clone();
        tree_mesh.append(upper);

        assert_eq!(tree_mesh.vertex_count(), 16);
        assert_eq!(tree_mesh.triangle_count(), 16);
        let rebased: Vec<u32> = upper_indices.iter().map(|i| i + 8).collect();
        assert_eq!(&tree_mesh.indices[24..], &rebased[..]);
        assert_eq!(tree_mesh.vertices[8].position, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_ring_vertices_normals_point_outward() {
        let verts = ring_vertices(&square_ring(2.0), 0.5);
        assert_eq!(verts.len(), 4);
        for v in &verts {
            let radial = Vec3::new(v.position.x, 0.0, v.position.z);
            assert!(v.normal.distance(&radial) < 1e-12);
            assert_eq!(v.uv[1], 0.5);
        }
        assert_eq!(verts[2].uv[0], 0.5);
    }

    #[test]
    fn test_connect_rings() {
        let mut mesh = Mesh::new();
        let start1 = mesh.add_vertices(ring_vertices(&square_ring(0.0), 0.0));
        let start2 = mesh.add_vertices(ring_vertices(&square_ring(1.0), 1.0));
        connect_rings(&mut mesh, start1, start2, 4);

        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 8);
        // last quad wraps back to index 0
        assert!(mesh.indices[18..].contains(&0));
    }

    #[test]
    fn test_cap_ring() {
        let mut mesh = Mesh::new();
        let start = mesh.add_vertices(ring_vertices(&square_ring(0.0), 0.0));
        cap_ring(&mut mesh, start, 4, Vec3::ZERO, -Vec3::UP);

        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(mesh.triangle_count(), 4);
        assert!(mesh.indices.iter().all(|&i| i < 5));
    }

    #[test]
    fn test_calculate_bounds() {
        let mut mesh = Mesh::new();
        mesh.calculate_bounds();
        assert_eq!(mesh.bounds_radius, 0.0);

        mesh.add_vertices(ring_vertices(&square_ring(0.0), 0.0));
        mesh.calculate_bounds();
        assert!(mesh.bounds_center.distance(&Vec3::ZERO) < 1e-12);
        assert!((mesh.bounds_radius - 1.0).abs() < 1e-12);
    }
}
