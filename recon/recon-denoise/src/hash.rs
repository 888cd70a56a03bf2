//! Spatial hash for neighborhood queries.

use hashbrown::HashMap;
use nalgebra::Point3;

/// Buckets point indices by integer voxel key for O(1) neighborhood
/// lookup.
///
/// Points are hashed into cells of `voxel_size`; a radius query scans the
/// 27 cells (3x3x3) around the query point's cell, which covers every
/// candidate as long as the query radius does not exceed the voxel size.
///
/// # Example
///
/// ```
/// use recon_denoise::SpatialHash;
/// use nalgebra::Point3;
///
/// let points = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(0.005, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 1.0),
/// ];
/// let hash = SpatialHash::build(&points, 0.01);
///
/// let mut neighbors = Vec::new();
/// hash.for_each_within(&points, points[0], 0.01, |i| neighbors.push(i));
/// assert_eq!(neighbors.len(), 2); // itself and the nearby point
/// ```
#[derive(Debug)]
pub struct SpatialHash {
    cells: HashMap<(i64, i64, i64), Vec<u32>>,
    voxel_size: f64,
}

impl SpatialHash {
    /// Buckets the given points into cells of `voxel_size`.
    ///
    /// Non-finite positions are not bucketed and never appear in query
    /// results.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn build(points: &[Point3<f64>], voxel_size: f64) -> Self {
        let mut cells: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
        for (i, p) in points.iter().enumerate() {
            if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
                continue;
            }
            cells
                .entry(Self::key(*p, voxel_size))
                .or_default()
                .push(i as u32);
        }
        Self { cells, voxel_size }
    }

    /// Returns the number of occupied cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Invokes `visit` with the index of every point within `radius` of
    /// `query`, scanning the 27 cells around the query's cell.
    pub fn for_each_within<F>(
        &self,
        points: &[Point3<f64>],
        query: Point3<f64>,
        radius: f64,
        mut visit: F,
    ) where
        F: FnMut(u32),
    {
        let (cx, cy, cz) = Self::key(query, self.voxel_size);
        let radius_sq = radius * radius;

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &i in bucket {
                        let p = points[i as usize];
                        if (p - query).norm_squared() <= radius_sq {
                            visit(i);
                        }
                    }
                }
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn key(p: Point3<f64>, voxel_size: f64) -> (i64, i64, i64) {
        (
            (p.x / voxel_size).floor() as i64,
            (p.y / voxel_size).floor() as i64,
            (p.z / voxel_size).floor() as i64,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_across_cell_boundary() {
        // Two points on either side of a cell boundary
        let points = vec![Point3::new(0.009, 0.0, 0.0), Point3::new(0.011, 0.0, 0.0)];
        let hash = SpatialHash::build(&points, 0.01);

        let mut found = Vec::new();
        hash.for_each_within(&points, points[0], 0.005, |i| found.push(i));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_distant_points_excluded() {
        let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(5.0, 0.0, 0.0)];
        let hash = SpatialHash::build(&points, 0.01);

        let mut found = Vec::new();
        hash.for_each_within(&points, points[0], 0.01, |i| found.push(i));
        assert_eq!(found, vec![0]);
    }

    #[test]
    fn test_non_finite_points_not_bucketed() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(f64::NAN, 0.0, 0.0),
        ];
        let hash = SpatialHash::build(&points, 0.01);

        let mut found = Vec::new();
        hash.for_each_within(&points, points[0], 0.01, |i| found.push(i));
        assert_eq!(found, vec![0]);
    }

    #[test]
    fn test_cell_count() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.001, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let hash = SpatialHash::build(&points, 0.01);
        assert_eq!(hash.cell_count(), 2);
    }
}
