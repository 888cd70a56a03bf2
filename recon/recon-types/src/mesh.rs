//! Indexed triangle mesh.

use crate::{Aabb, Triangle, Vertex};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh.
///
/// Vertices and faces are stored separately, with faces referencing
/// vertices by index. Meshes produced by the isosurface extractor are
/// owned by the reconstruction session; externally supplied meshes are
/// borrowed read-only by the volume calculator.
///
/// # Winding Order
///
/// Faces use counter-clockwise winding when viewed from outside, so
/// normals point outward by the right-hand rule.
///
/// # Example
///
/// ```
/// use recon_types::{TriangleMesh, Vertex};
///
/// let mut mesh = TriangleMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TriangleMesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array.
    /// Each face is `[v0, v1, v2]` with counter-clockwise winding.
    pub faces: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Creates a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Creates a mesh with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Creates a mesh from vertices and faces.
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Vertex>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Returns the number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of faces.
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns true if the mesh has no renderable geometry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Returns true if every vertex carries a normal.
    ///
    /// An empty mesh has no normals.
    #[must_use]
    pub fn has_normals(&self) -> bool {
        !self.vertices.is_empty() && self.vertices.iter().all(Vertex::has_normal)
    }

    /// Gets a triangle by face index with resolved vertex positions.
    ///
    /// Returns `None` if the face index is out of bounds or the face
    /// references a missing vertex.
    #[must_use]
    pub fn triangle(&self, face_index: usize) -> Option<Triangle> {
        let [i0, i1, i2] = *self.faces.get(face_index)?;
        Some(Triangle {
            v0: self.vertices.get(i0 as usize)?.position,
            v1: self.vertices.get(i1 as usize)?.position,
            v2: self.vertices.get(i2 as usize)?.position,
        })
    }

    /// Iterates over faces whose indices are all in range, as resolved
    /// triangles.
    ///
    /// Faces referencing out-of-range vertices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().filter_map(|&[i0, i1, i2]| {
            Some(Triangle {
                v0: self.vertices.get(i0 as usize)?.position,
                v1: self.vertices.get(i1 as usize)?.position,
                v2: self.vertices.get(i2 as usize)?.position,
            })
        })
    }

    /// Computes the signed volume of the mesh about the origin.
    ///
    /// Sums signed tetrahedra volumes formed by each face and the origin
    /// (divergence theorem). Positive for a closed mesh with outward
    /// winding; not meaningful for open meshes.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        let mut volume = 0.0;
        for tri in self.triangles() {
            let a = tri.v0.coords;
            let b = tri.v1.coords;
            let c = tri.v2.coords;
            volume += a.dot(&b.cross(&c)) / 6.0;
        }
        volume
    }

    /// Computes the total surface area of the mesh.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|tri| tri.area()).sum()
    }

    /// Computes the axis-aligned bounding box of the mesh vertices.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| &v.position))
    }

    /// Translates the mesh by the given vector.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for vertex in &mut self.vertices {
            vertex.position += offset;
        }
    }

    /// Scales the mesh uniformly around the origin.
    ///
    /// Normals are unchanged (a uniform scale preserves directions).
    pub fn scale(&mut self, factor: f64) {
        for vertex in &mut self.vertices {
            vertex.position.coords *= factor;
        }
    }

    /// Flips all face windings and vertex normals.
    pub fn flip_normals(&mut self) {
        for face in &mut self.faces {
            face.swap(1, 2);
        }
        for vertex in &mut self.vertices {
            if let Some(ref mut normal) = vertex.normal {
                *normal = -*normal;
            }
        }
    }

    /// Merges another mesh into this one, adjusting face indices.
    #[allow(clippy::cast_possible_truncation)]
    // Mesh indices are u32; vertex counts beyond 4B are unsupported by design
    pub fn merge(&mut self, other: &Self) {
        let vertex_offset = self.vertices.len() as u32;
        self.vertices.extend(other.vertices.iter().copied());
        for face in &other.faces {
            self.faces.push([
                face[0] + vertex_offset,
                face[1] + vertex_offset,
                face[2] + vertex_offset,
            ]);
        }
    }
}

/// Builds an axis-aligned cube mesh from `min` with the given side length.
///
/// 8 vertices, 12 triangles, counter-clockwise winding viewed from
/// outside. Useful for tests and calibration fixtures.
///
/// # Example
///
/// ```
/// use recon_types::{cube_mesh, Point3};
///
/// let cube = cube_mesh(Point3::new(0.0, 0.0, 0.0), 1.0);
/// assert_eq!(cube.face_count(), 12);
/// assert!((cube.signed_volume() - 1.0).abs() < 1e-10);
/// ```
#[must_use]
pub fn cube_mesh(min: nalgebra::Point3<f64>, side: f64) -> TriangleMesh {
    let mut mesh = TriangleMesh::with_capacity(8, 12);
    let s = side;

    for &(dx, dy, dz) in &[
        (0.0, 0.0, 0.0),
        (s, 0.0, 0.0),
        (s, s, 0.0),
        (0.0, s, 0.0),
        (0.0, 0.0, s),
        (s, 0.0, s),
        (s, s, s),
        (0.0, s, s),
    ] {
        mesh.vertices
            .push(Vertex::from_coords(min.x + dx, min.y + dy, min.z + dz));
    }

    // Two triangles per face, CCW when viewed from outside
    mesh.faces.push([0, 2, 1]); // bottom
    mesh.faces.push([0, 3, 2]);
    mesh.faces.push([4, 5, 6]); // top
    mesh.faces.push([4, 6, 7]);
    mesh.faces.push([0, 1, 5]); // front
    mesh.faces.push([0, 5, 4]);
    mesh.faces.push([3, 7, 6]); // back
    mesh.faces.push([3, 6, 2]);
    mesh.faces.push([0, 4, 7]); // left
    mesh.faces.push([0, 7, 3]);
    mesh.faces.push([1, 2, 6]); // right
    mesh.faces.push([1, 6, 5]);

    mesh
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_empty_mesh() {
        let mesh = TriangleMesh::new();
        assert!(mesh.is_empty());
        assert!(!mesh.has_normals());
        assert_relative_eq!(mesh.signed_volume(), 0.0);
    }

    #[test]
    fn test_cube_volume() {
        let cube = cube_mesh(Point3::origin(), 2.0);
        assert_relative_eq!(cube.signed_volume(), 8.0, epsilon = 1e-10);
    }

    #[test]
    fn test_cube_surface_area() {
        let cube = cube_mesh(Point3::origin(), 1.0);
        assert_relative_eq!(cube.surface_area(), 6.0, epsilon = 1e-10);
    }

    #[test]
    fn test_flipped_cube_volume_negative() {
        let mut cube = cube_mesh(Point3::origin(), 1.0);
        cube.flip_normals();
        assert!(cube.signed_volume() < 0.0);
    }

    #[test]
    fn test_scale_cubes_volume() {
        let mut cube = cube_mesh(Point3::origin(), 1.0);
        cube.scale(3.0);
        assert_relative_eq!(cube.signed_volume(), 27.0, epsilon = 1e-9);
    }

    #[test]
    fn test_translate_preserves_volume() {
        let mut cube = cube_mesh(Point3::origin(), 1.0);
        cube.translate(Vector3::new(10.0, -5.0, 2.0));
        assert_relative_eq!(cube.signed_volume(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_out_of_range_face_skipped() {
        let mut mesh = TriangleMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.faces.push([0, 1, 99]);
        assert_eq!(mesh.triangles().count(), 0);
        assert!(mesh.triangle(0).is_none());
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut a = cube_mesh(Point3::origin(), 1.0);
        let b = cube_mesh(Point3::new(5.0, 0.0, 0.0), 1.0);
        a.merge(&b);
        assert_eq!(a.vertex_count(), 16);
        assert_eq!(a.face_count(), 24);
        assert_relative_eq!(a.signed_volume(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bounds() {
        let cube = cube_mesh(Point3::new(-1.0, -1.0, -1.0), 2.0);
        let bounds = cube.bounds();
        assert_eq!(bounds.min, Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(bounds.max, Point3::new(1.0, 1.0, 1.0));
    }
}
