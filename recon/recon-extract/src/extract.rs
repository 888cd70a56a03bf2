//! Grid-to-mesh surface extraction.

use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use recon_fusion::FusionVolume;
use recon_types::{TriangleMesh, Vertex};
use tracing::debug;

use crate::tables::{EDGE_TABLE, TRI_TABLE};

/// Corner offsets of a cell in table order.
const CORNER_OFFSETS: [(usize, usize, usize); 8] = [
    (0, 0, 0),
    (1, 0, 0),
    (1, 1, 0),
    (0, 1, 0),
    (0, 0, 1),
    (1, 0, 1),
    (1, 1, 1),
    (0, 1, 1),
];

/// Cube edges as pairs of corner indices, in table order.
const EDGE_CORNERS: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Extracts the zero-crossing surface of the fused grid as a triangle
/// mesh.
///
/// Scalar samples live at voxel centers; each cell spans 8 adjacent
/// centers. Normalized cell distances are converted back to metric units
/// (`distance * truncation`) before interpolation so the mesh is in world
/// coordinates. Cells with any unobserved corner are skipped.
///
/// Vertices on shared cell edges are welded through an exact
/// lattice-edge cache, so adjacent cells reference identical vertices and
/// closed surfaces come out with every edge shared by two triangles.
/// Per-vertex normals are central-difference gradients of the field;
/// triangle winding is aligned with those normals so that the surface is
/// consistently oriented with positive (outside) distance.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn extract_surface(volume: &FusionVolume) -> TriangleMesh {
    let (nx, ny, nz) = volume.dimensions();
    if nx < 2 || ny < 2 || nz < 2 {
        return TriangleMesh::new();
    }

    let mut mesh = TriangleMesh::new();
    // Lattice edge -> welded vertex index
    let mut edge_vertices: HashMap<(u32, u32, u32, u8), u32> = HashMap::new();

    for iz in 0..nz - 1 {
        for iy in 0..ny - 1 {
            for ix in 0..nx - 1 {
                process_cell(volume, ix, iy, iz, &mut mesh, &mut edge_vertices);
            }
        }
    }

    debug!(
        vertices = mesh.vertex_count(),
        triangles = mesh.face_count(),
        "extracted isosurface"
    );

    mesh
}

#[allow(clippy::cast_possible_truncation)]
fn process_cell(
    volume: &FusionVolume,
    ix: usize,
    iy: usize,
    iz: usize,
    mesh: &mut TriangleMesh,
    edge_vertices: &mut HashMap<(u32, u32, u32, u8), u32>,
) {
    let truncation = volume.truncation();

    // Gather the 8 corner samples; any unobserved corner skips the cell
    let mut values = [0.0_f64; 8];
    for (i, &(dx, dy, dz)) in CORNER_OFFSETS.iter().enumerate() {
        let Some(cell) = volume.cell(ix + dx, iy + dy, iz + dz) else {
            return;
        };
        if !cell.is_observed() {
            return;
        }
        values[i] = cell.distance * truncation;
    }

    let mut cube_index = 0_usize;
    for (i, &v) in values.iter().enumerate() {
        if v < 0.0 {
            cube_index |= 1 << i;
        }
    }

    let edges = EDGE_TABLE[cube_index];
    if edges == 0 {
        return;
    }

    // Resolve every crossed edge to a welded vertex index
    let mut edge_index = [u32::MAX; 12];
    for (e, &(a, b)) in EDGE_CORNERS.iter().enumerate() {
        if edges & (1_u16 << e) == 0 {
            continue;
        }
        let key = lattice_edge_key(ix, iy, iz, a, b);
        let index = *edge_vertices.entry(key).or_insert_with(|| {
            let vertex = interpolate_vertex(volume, ix, iy, iz, a, b, values[a], values[b]);
            mesh.vertices.push(vertex);
            (mesh.vertices.len() - 1) as u32
        });
        edge_index[e] = index;
    }

    // Emit triangles, winding each to agree with its gradient normals
    let triangle_edges = &TRI_TABLE[cube_index];
    let mut t = 0;
    while triangle_edges[t] >= 0 {
        #[allow(clippy::cast_sign_loss)]
        let (e0, e1, e2) = (
            triangle_edges[t] as usize,
            triangle_edges[t + 1] as usize,
            triangle_edges[t + 2] as usize,
        );
        t += 3;

        let (i0, i1, i2) = (edge_index[e0], edge_index[e1], edge_index[e2]);
        if i0 == u32::MAX || i1 == u32::MAX || i2 == u32::MAX {
            continue;
        }
        if i0 == i1 || i1 == i2 || i0 == i2 {
            continue;
        }

        let p0 = mesh.vertices[i0 as usize].position;
        let p1 = mesh.vertices[i1 as usize].position;
        let p2 = mesh.vertices[i2 as usize].position;
        let outward = mesh.vertices[i0 as usize].normal.unwrap_or_else(Vector3::z)
            + mesh.vertices[i1 as usize].normal.unwrap_or_else(Vector3::z)
            + mesh.vertices[i2 as usize].normal.unwrap_or_else(Vector3::z);

        let geometric = (p1 - p0).cross(&(p2 - p0));
        if geometric.dot(&outward) >= 0.0 {
            mesh.faces.push([i0, i1, i2]);
        } else {
            mesh.faces.push([i0, i2, i1]);
        }
    }
}

/// Canonical key for the lattice edge between two cell corners: the
/// lesser lattice point plus the axis along which the edge runs.
#[allow(clippy::cast_possible_truncation)]
fn lattice_edge_key(
    ix: usize,
    iy: usize,
    iz: usize,
    corner_a: usize,
    corner_b: usize,
) -> (u32, u32, u32, u8) {
    let (ax, ay, az) = CORNER_OFFSETS[corner_a];
    let (bx, by, bz) = CORNER_OFFSETS[corner_b];
    let base = (
        (ix + ax.min(bx)) as u32,
        (iy + ay.min(by)) as u32,
        (iz + az.min(bz)) as u32,
    );
    let axis = if ax != bx {
        0
    } else if ay != by {
        1
    } else {
        2
    };
    (base.0, base.1, base.2, axis)
}

/// Places a vertex at the linearly interpolated zero crossing along a
/// cell edge, with a gradient normal blended between the endpoints.
fn interpolate_vertex(
    volume: &FusionVolume,
    ix: usize,
    iy: usize,
    iz: usize,
    corner_a: usize,
    corner_b: usize,
    value_a: f64,
    value_b: f64,
) -> Vertex {
    let (ax, ay, az) = CORNER_OFFSETS[corner_a];
    let (bx, by, bz) = CORNER_OFFSETS[corner_b];
    let (pa, pb) = (
        volume.voxel_center(ix + ax, iy + ay, iz + az),
        volume.voxel_center(ix + bx, iy + by, iz + bz),
    );

    let denom = value_b - value_a;
    let t = if denom.abs() < 1e-12 {
        0.5
    } else {
        (-value_a / denom).clamp(0.0, 1.0)
    };

    let position = Point3::from(pa.coords + (pb.coords - pa.coords) * t);

    let ga = gradient(volume, ix + ax, iy + ay, iz + az);
    let gb = gradient(volume, ix + bx, iy + by, iz + bz);
    let blended = ga + (gb - ga) * t;
    let norm = blended.norm();
    let normal = if norm > 1e-12 {
        blended / norm
    } else {
        Vector3::z()
    };

    Vertex::with_normal(position, normal)
}

/// Central-difference gradient of the metric field at a lattice point.
///
/// Neighbors outside the grid or never observed fall back to the center
/// value, degrading gracefully to a one-sided or flat difference. The
/// gradient points from inside (negative) to outside (positive).
fn gradient(volume: &FusionVolume, ix: usize, iy: usize, iz: usize) -> Vector3<f64> {
    let truncation = volume.truncation();
    let h = volume.voxel_size();
    let center = metric_value(volume, ix, iy, iz, truncation);

    let sample = |x: Option<usize>, y: Option<usize>, z: Option<usize>| -> f64 {
        match (x, y, z) {
            (Some(x), Some(y), Some(z)) => match volume.cell(x, y, z) {
                Some(cell) if cell.is_observed() => cell.distance * truncation,
                _ => center,
            },
            _ => center,
        }
    };

    let dx = sample(ix.checked_add(1), Some(iy), Some(iz))
        - sample(ix.checked_sub(1), Some(iy), Some(iz));
    let dy = sample(Some(ix), iy.checked_add(1), Some(iz))
        - sample(Some(ix), iy.checked_sub(1), Some(iz));
    let dz = sample(Some(ix), Some(iy), iz.checked_add(1))
        - sample(Some(ix), Some(iy), iz.checked_sub(1));

    Vector3::new(dx, dy, dz) / (2.0 * h)
}

fn metric_value(volume: &FusionVolume, ix: usize, iy: usize, iz: usize, truncation: f64) -> f64 {
    volume
        .cell(ix, iy, iz)
        .map_or(truncation, |cell| cell.distance * truncation)
}
