//! Wavefront OBJ mesh export and import.
//!
//! Only the subset needed for debugging and external tooling is
//! supported: `v`, `vn`, and `f` records with 1-based indices. Polygon
//! faces are fan-triangulated on load. Comments and unrecognized record
//! types are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::{Point3, Vector3};
use recon_types::{TriangleMesh, Vertex};

use crate::error::{IoError, IoResult};

/// Saves a mesh to an OBJ file.
///
/// Vertex normals are written only when every vertex carries one, so the
/// `f` records are uniform across the file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
///
/// # Example
///
/// ```no_run
/// use recon_io::save_obj;
/// use recon_types::{cube_mesh, Point3};
///
/// let cube = cube_mesh(Point3::origin(), 1.0);
/// save_obj(&cube, "cube.obj").unwrap();
/// ```
pub fn save_obj<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> IoResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_obj(mesh, &mut writer)
}

/// Writes a mesh in OBJ format to any writer.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_obj<W: Write>(mesh: &TriangleMesh, writer: &mut W) -> IoResult<()> {
    let with_normals = mesh.has_normals();

    for vertex in &mesh.vertices {
        let p = vertex.position;
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    if with_normals {
        for vertex in &mesh.vertices {
            if let Some(n) = vertex.normal {
                writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
            }
        }
    }
    for face in &mesh.faces {
        if with_normals {
            writeln!(
                writer,
                "f {0}//{0} {1}//{1} {2}//{2}",
                face[0] + 1,
                face[1] + 1,
                face[2] + 1
            )?;
        } else {
            writeln!(writer, "f {} {} {}", face[0] + 1, face[1] + 1, face[2] + 1)?;
        }
    }
    Ok(())
}

/// Loads a mesh from an OBJ file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a `v`, `vn`, or `f`
/// record is malformed.
pub fn load_obj<P: AsRef<Path>>(path: P) -> IoResult<TriangleMesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IoError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IoError::Io(e)
        }
    })?;
    read_obj(BufReader::new(file))
}

/// Reads a mesh in OBJ format from any buffered reader.
///
/// # Errors
///
/// Returns an error if the reader fails or a record is malformed.
#[allow(clippy::cast_possible_truncation)]
// Mesh indices are u32; vertex counts beyond 4B are unsupported by design
pub fn read_obj<R: BufRead>(reader: R) -> IoResult<TriangleMesh> {
    let mut mesh = TriangleMesh::new();
    let mut normals: Vec<Vector3<f64>> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        match parts.next() {
            Some("v") => {
                let [x, y, z] = parse_floats(&mut parts, line_number)?;
                mesh.vertices.push(Vertex::new(Point3::new(x, y, z)));
            }
            Some("vn") => {
                let [x, y, z] = parse_floats(&mut parts, line_number)?;
                normals.push(Vector3::new(x, y, z));
            }
            Some("f") => {
                let mut corners = Vec::with_capacity(4);
                for token in parts {
                    corners.push(parse_face_corner(token, line_number)?);
                }
                if corners.len() < 3 {
                    return Err(IoError::invalid_content(
                        line_number,
                        "face needs at least 3 vertices",
                    ));
                }
                for i in 1..corners.len() - 1 {
                    let tri = [corners[0], corners[i], corners[i + 1]];
                    for (vertex_index, normal_index) in tri {
                        resolve_normal(&mut mesh, &normals, vertex_index, normal_index, line_number)?;
                    }
                    mesh.faces.push([tri[0].0, tri[1].0, tri[2].0]);
                }
            }
            _ => {}
        }
    }

    Ok(mesh)
}

/// Parses exactly three whitespace-separated floats.
fn parse_floats<'a, I>(parts: &mut I, line: usize) -> IoResult<[f64; 3]>
where
    I: Iterator<Item = &'a str>,
{
    let mut values = [0.0; 3];
    for value in &mut values {
        let token = parts
            .next()
            .ok_or_else(|| IoError::invalid_content(line, "expected 3 coordinates"))?;
        *value = token
            .parse()
            .map_err(|_| IoError::invalid_content(line, format!("bad float '{token}'")))?;
    }
    Ok(values)
}

/// Parses one `f` corner token (`v`, `v/vt`, `v//vn`, or `v/vt/vn`)
/// into 0-based vertex and optional normal indices.
fn parse_face_corner(token: &str, line: usize) -> IoResult<(u32, Option<usize>)> {
    let mut fields = token.split('/');
    let vertex_field = fields
        .next()
        .ok_or_else(|| IoError::invalid_content(line, "empty face corner"))?;
    let vertex: u32 = vertex_field
        .parse()
        .map_err(|_| IoError::invalid_content(line, format!("bad vertex index '{vertex_field}'")))?;
    if vertex == 0 {
        return Err(IoError::invalid_content(line, "OBJ indices are 1-based"));
    }

    let _texture = fields.next();
    let normal = match fields.next() {
        None | Some("") => None,
        Some(field) => {
            let n: usize = field.parse().map_err(|_| {
                IoError::invalid_content(line, format!("bad normal index '{field}'"))
            })?;
            if n == 0 {
                return Err(IoError::invalid_content(line, "OBJ indices are 1-based"));
            }
            Some(n - 1)
        }
    };

    Ok((vertex - 1, normal))
}

/// Attaches a referenced normal to its vertex, validating both indices.
fn resolve_normal(
    mesh: &mut TriangleMesh,
    normals: &[Vector3<f64>],
    vertex_index: u32,
    normal_index: Option<usize>,
    line: usize,
) -> IoResult<()> {
    let vertex = mesh
        .vertices
        .get_mut(vertex_index as usize)
        .ok_or_else(|| {
            IoError::invalid_content(line, format!("vertex index {} out of range", vertex_index + 1))
        })?;
    if let Some(n) = normal_index {
        let normal = normals.get(n).ok_or_else(|| {
            IoError::invalid_content(line, format!("normal index {} out of range", n + 1))
        })?;
        vertex.normal = Some(*normal);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use recon_types::cube_mesh;

    fn round_trip(mesh: &TriangleMesh) -> TriangleMesh {
        let mut buffer = Vec::new();
        write_obj(mesh, &mut buffer).unwrap();
        read_obj(buffer.as_slice()).unwrap()
    }

    #[test]
    fn test_cube_round_trip() {
        let cube = cube_mesh(Point3::origin(), 1.0);
        let loaded = round_trip(&cube);

        assert_eq!(loaded.vertex_count(), cube.vertex_count());
        assert_eq!(loaded.face_count(), cube.face_count());
        assert_relative_eq!(loaded.signed_volume(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_normals_round_trip() {
        let mut mesh = TriangleMesh::new();
        mesh.vertices
            .push(Vertex::with_normal(Point3::new(0.0, 0.0, 0.0), Vector3::z()));
        mesh.vertices
            .push(Vertex::with_normal(Point3::new(1.0, 0.0, 0.0), Vector3::z()));
        mesh.vertices
            .push(Vertex::with_normal(Point3::new(0.0, 1.0, 0.0), Vector3::z()));
        mesh.faces.push([0, 1, 2]);

        let loaded = round_trip(&mesh);
        assert!(loaded.has_normals());
        assert_relative_eq!(loaded.vertices[0].normal.unwrap().z, 1.0);
    }

    #[test]
    fn test_quad_faces_are_fan_triangulated() {
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let mesh = read_obj(text.as_bytes()).unwrap();
        assert_eq!(mesh.face_count(), 2);
    }

    #[test]
    fn test_comments_and_unknown_records_ignored() {
        let text = "# a comment\no object\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let mesh = read_obj(text.as_bytes()).unwrap();
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn test_malformed_vertex_rejected() {
        let text = "v 0 zero 0\n";
        assert!(read_obj(text.as_bytes()).is_err());
    }

    #[test]
    fn test_out_of_range_face_rejected() {
        let text = "v 0 0 0\nv 1 0 0\nf 1 2 9\n";
        assert!(read_obj(text.as_bytes()).is_err());
    }

    #[test]
    fn test_zero_index_rejected() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n";
        assert!(read_obj(text.as_bytes()).is_err());
    }
}
