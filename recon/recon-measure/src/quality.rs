//! Mesh quality analysis.
//!
//! Produces the quality descriptor that drives volume-algorithm
//! selection. The descriptor is recomputed fresh for every measurement;
//! it is never cached across mesh mutations.

use hashbrown::HashMap;
use recon_types::TriangleMesh;
use tracing::debug;

/// Triangles below this area are treated as degenerate and excluded
/// from the analysis.
pub(crate) const DEGENERATE_AREA_THRESHOLD: f64 = 1e-12;

/// Minimum triangle count for the heuristic watertightness proxy.
const HEURISTIC_MIN_TRIANGLES: usize = 100;

/// Minimum triangle density (triangles per square meter) for the
/// heuristic watertightness proxy, also used as the density target when
/// normalizing the quality score.
const DENSITY_TARGET: f64 = 1000.0;

/// Triangle count at which the count-sufficiency factor saturates.
const COUNT_TARGET: usize = 100;

// Quality score factor weights; sum to 1.
const WEIGHT_COUNT: f64 = 0.3;
const WEIGHT_DENSITY: f64 = 0.3;
const WEIGHT_WATERTIGHT: f64 = 0.2;
const WEIGHT_NORMALS: f64 = 0.2;

/// How watertightness is decided during quality analysis.
///
/// The heuristic proxy is cheap enough for per-frame method selection;
/// the exact check walks an edge map and guarantees the manifold
/// property the signed-tetrahedra method relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatertightStrictness {
    /// Count/density proxy: watertight if the mesh has more than 100
    /// usable triangles and a triangle density above the target.
    #[default]
    Heuristic,

    /// Exact check: watertight only if every edge is shared by exactly
    /// two triangles.
    Exact,
}

/// Derived, read-only quality summary of a triangle mesh.
///
/// # Example
///
/// ```
/// use recon_measure::{analyze_mesh, WatertightStrictness};
/// use recon_types::{cube_mesh, Point3};
///
/// let cube = cube_mesh(Point3::origin(), 1.0);
/// let quality = analyze_mesh(&cube, WatertightStrictness::Exact);
///
/// assert!(quality.is_watertight);
/// assert_eq!(quality.triangle_count, 12);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MeshQuality {
    /// Whether the mesh encloses a volume, per the chosen strictness.
    pub is_watertight: bool,

    /// Whether every vertex carries a normal.
    pub has_normals: bool,

    /// Number of usable (non-degenerate, in-range) triangles.
    pub triangle_count: usize,

    /// Usable triangles per square meter of surface.
    pub triangle_density: f64,

    /// Total area of usable triangles in square meters.
    pub surface_area: f64,

    /// Composite quality in `[0, 1]`: 30% count sufficiency, 30%
    /// density, 20% watertightness, 20% normal availability.
    pub quality_score: f64,
}

impl MeshQuality {
    /// Quality of an empty mesh: nothing usable, score zero.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            is_watertight: false,
            has_normals: false,
            triangle_count: 0,
            triangle_density: 0.0,
            surface_area: 0.0,
            quality_score: 0.0,
        }
    }
}

/// Analyzes a mesh and produces its quality descriptor.
///
/// Degenerate (near-zero-area) triangles and faces referencing
/// out-of-range vertices are excluded from every statistic rather than
/// propagated.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn analyze_mesh(mesh: &TriangleMesh, strictness: WatertightStrictness) -> MeshQuality {
    let mut triangle_count = 0usize;
    let mut surface_area = 0.0f64;
    for tri in mesh.triangles() {
        let area = tri.area();
        if area.is_finite() && area >= DEGENERATE_AREA_THRESHOLD {
            triangle_count += 1;
            surface_area += area;
        }
    }

    if triangle_count == 0 {
        return MeshQuality::empty();
    }

    let triangle_density = if surface_area > 0.0 {
        triangle_count as f64 / surface_area
    } else {
        0.0
    };

    let is_watertight = match strictness {
        WatertightStrictness::Heuristic => {
            triangle_count > HEURISTIC_MIN_TRIANGLES && triangle_density > DENSITY_TARGET
        }
        WatertightStrictness::Exact => is_edge_closed(mesh),
    };
    let has_normals = mesh.has_normals();

    let count_factor = (triangle_count as f64 / COUNT_TARGET as f64).min(1.0);
    let density_factor = (triangle_density / DENSITY_TARGET).min(1.0);
    let watertight_factor = if is_watertight { 1.0 } else { 0.0 };
    let normals_factor = if has_normals { 1.0 } else { 0.0 };
    let quality_score = WEIGHT_COUNT * count_factor
        + WEIGHT_DENSITY * density_factor
        + WEIGHT_WATERTIGHT * watertight_factor
        + WEIGHT_NORMALS * normals_factor;

    debug!(
        triangle_count,
        triangle_density, is_watertight, quality_score, "analyzed mesh quality"
    );

    MeshQuality {
        is_watertight,
        has_normals,
        triangle_count,
        triangle_density,
        surface_area,
        quality_score: quality_score.clamp(0.0, 1.0),
    }
}

/// Exact watertightness: every edge is shared by exactly two faces.
///
/// Faces referencing out-of-range vertices are ignored, matching the
/// triangle filtering above.
#[allow(clippy::cast_possible_truncation)]
// Mesh indices are u32; vertex counts beyond 4B are unsupported by design
fn is_edge_closed(mesh: &TriangleMesh) -> bool {
    let vertex_count = mesh.vertex_count() as u32;
    let mut edge_counts: HashMap<(u32, u32), u32> = HashMap::new();

    let mut usable_faces = 0usize;
    for face in &mesh.faces {
        if face.iter().any(|&i| i >= vertex_count) {
            continue;
        }
        usable_faces += 1;
        for k in 0..3 {
            let a = face[k];
            let b = face[(k + 1) % 3];
            let key = (a.min(b), a.max(b));
            *edge_counts.entry(key).or_insert(0) += 1;
        }
    }

    usable_faces > 0 && edge_counts.values().all(|&count| count == 2)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use recon_types::{cube_mesh, Point3, TriangleMesh, Vertex};

    #[test]
    fn test_empty_mesh_scores_zero() {
        let quality = analyze_mesh(&TriangleMesh::new(), WatertightStrictness::Heuristic);
        assert!(!quality.is_watertight);
        assert_eq!(quality.triangle_count, 0);
        assert!(quality.quality_score.abs() < f64::EPSILON);
    }

    #[test]
    fn test_closed_cube_is_watertight_exact() {
        let cube = cube_mesh(Point3::origin(), 1.0);
        let quality = analyze_mesh(&cube, WatertightStrictness::Exact);
        assert!(quality.is_watertight);
    }

    #[test]
    fn test_punctured_cube_is_not_watertight_exact() {
        let mut cube = cube_mesh(Point3::origin(), 1.0);
        cube.faces.pop();
        let quality = analyze_mesh(&cube, WatertightStrictness::Exact);
        assert!(!quality.is_watertight);
    }

    #[test]
    fn test_small_cube_fails_heuristic() {
        // 12 triangles is below the count proxy even though the cube is
        // geometrically closed
        let cube = cube_mesh(Point3::origin(), 1.0);
        let quality = analyze_mesh(&cube, WatertightStrictness::Heuristic);
        assert!(!quality.is_watertight);
    }

    #[test]
    fn test_degenerate_triangles_excluded() {
        let mut mesh = cube_mesh(Point3::origin(), 1.0);
        // A zero-area sliver reusing one vertex three times
        mesh.faces.push([0, 0, 0]);
        let quality = analyze_mesh(&mesh, WatertightStrictness::Heuristic);
        assert_eq!(quality.triangle_count, 12);
    }

    #[test]
    fn test_out_of_range_faces_excluded() {
        let mut mesh = TriangleMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.faces.push([0, 1, 2]);
        mesh.faces.push([0, 1, 7]);
        let quality = analyze_mesh(&mesh, WatertightStrictness::Exact);
        assert_eq!(quality.triangle_count, 1);
        assert!(!quality.is_watertight);
    }

    #[test]
    fn test_normals_raise_score() {
        let plain = cube_mesh(Point3::origin(), 1.0);
        let mut with_normals = plain.clone();
        for vertex in &mut with_normals.vertices {
            vertex.normal = Some(nalgebra::Vector3::z());
        }

        let a = analyze_mesh(&plain, WatertightStrictness::Heuristic);
        let b = analyze_mesh(&with_normals, WatertightStrictness::Heuristic);
        assert!(b.quality_score > a.quality_score);
        assert!(b.has_normals);
    }

    #[test]
    fn test_score_clamped_to_unit_range() {
        let cube = cube_mesh(Point3::origin(), 0.01);
        let quality = analyze_mesh(&cube, WatertightStrictness::Exact);
        assert!(quality.quality_score >= 0.0);
        assert!(quality.quality_score <= 1.0);
    }
}
