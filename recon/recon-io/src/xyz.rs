//! Plain-text XYZ point-cloud export and import.
//!
//! One point per line: `x y z [nx ny nz [confidence]]`. Lines starting
//! with `#` are comments.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::{Point3, Vector3};
use recon_types::{SampleCloud, SamplePoint};

use crate::error::{IoError, IoResult};

/// Saves a point cloud to an XYZ file.
///
/// Every line carries position, normal, and confidence so a cloud
/// survives a save/load cycle unchanged.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_xyz<P: AsRef<Path>>(cloud: &SampleCloud, path: P) -> IoResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_xyz(cloud, &mut writer)
}

/// Writes a point cloud in XYZ format to any writer.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_xyz<W: Write>(cloud: &SampleCloud, writer: &mut W) -> IoResult<()> {
    for point in &cloud.points {
        let p = point.position;
        let n = point.normal;
        writeln!(
            writer,
            "{} {} {} {} {} {} {}",
            p.x, p.y, p.z, n.x, n.y, n.z, point.confidence
        )?;
    }
    Ok(())
}

/// Loads a point cloud from an XYZ file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a line is malformed.
pub fn load_xyz<P: AsRef<Path>>(path: P) -> IoResult<SampleCloud> {
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
    read_xyz(BufReader::new(file))
}

/// Reads a point cloud in XYZ format from any buffered reader.
///
/// Accepts 3 fields (position only), 6 (position + normal), or 7
/// (position + normal + confidence) per line. Missing normals default to
/// +Z and missing confidence to 1.0.
///
/// # Errors
///
/// Returns an error if the reader fails or a line is malformed.
pub fn read_xyz<R: BufRead>(reader: R) -> IoResult<SampleCloud> {
    let mut cloud = SampleCloud::new();

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<f64> = trimmed
            .split_whitespace()
            .map(|token| {
                token
                    .parse()
                    .map_err(|_| IoError::invalid_content(line_number, format!("bad float '{token}'")))
            })
            .collect::<IoResult<_>>()?;

        let point = match fields.as_slice() {
            [x, y, z] => SamplePoint::new(Point3::new(*x, *y, *z), Vector3::z(), 1.0),
            [x, y, z, nx, ny, nz] => SamplePoint::new(
                Point3::new(*x, *y, *z),
                Vector3::new(*nx, *ny, *nz),
                1.0,
            ),
            [x, y, z, nx, ny, nz, confidence] => SamplePoint::new(
                Point3::new(*x, *y, *z),
                Vector3::new(*nx, *ny, *nz),
                confidence.clamp(0.0, 1.0),
            ),
            _ => {
                return Err(IoError::invalid_content(
                    line_number,
                    format!("expected 3, 6, or 7 fields, got {}", fields.len()),
                ))
            }
        };
        cloud.push(point);
    }

    Ok(cloud)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_round_trip() {
        let mut cloud = SampleCloud::new();
        cloud.push(SamplePoint::new(
            Point3::new(0.1, 0.2, 0.3),
            Vector3::new(0.0, 1.0, 0.0),
            0.5,
        ));
        cloud.push(SamplePoint::new(Point3::new(-1.0, 0.0, 2.5), Vector3::z(), 1.0));

        let mut buffer = Vec::new();
        write_xyz(&cloud, &mut buffer).unwrap();
        let loaded = read_xyz(buffer.as_slice()).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_relative_eq!(loaded.points[0].position.y, 0.2);
        assert_relative_eq!(loaded.points[0].normal.y, 1.0);
        assert_relative_eq!(loaded.points[0].confidence, 0.5);
    }

    #[test]
    fn test_position_only_lines_get_defaults() {
        let text = "0 0 0\n1 2 3\n";
        let cloud = read_xyz(text.as_bytes()).unwrap();
        assert_eq!(cloud.len(), 2);
        assert_relative_eq!(cloud.points[1].normal.z, 1.0);
        assert_relative_eq!(cloud.points[1].confidence, 1.0);
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let text = "# header\n\n0 0 0\n";
        let cloud = read_xyz(text.as_bytes()).unwrap();
        assert_eq!(cloud.len(), 1);
    }

    #[test]
    fn test_wrong_field_count_rejected() {
        assert!(read_xyz("1 2\n".as_bytes()).is_err());
        assert!(read_xyz("1 2 3 4\n".as_bytes()).is_err());
    }

    #[test]
    fn test_bad_float_rejected() {
        assert!(read_xyz("1 2 three\n".as_bytes()).is_err());
    }

    #[test]
    fn test_out_of_range_confidence_clamped() {
        let text = "0 0 0 0 0 1 3.5\n";
        let cloud = read_xyz(text.as_bytes()).unwrap();
        assert_relative_eq!(cloud.points[0].confidence, 1.0);
    }
}
