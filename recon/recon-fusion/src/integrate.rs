//! Frame integration strategies.

use nalgebra::{Isometry3, Point3};
use rayon::prelude::*;
use recon_types::{CameraIntrinsics, DepthImage, SampleCloud};
use tracing::{debug, warn};

use crate::volume::{FusionVolume, VoxelCell};

/// Fixed attenuation applied to propagated point-fusion contributions,
/// keeping the approximate path from dominating depth observations.
const POINT_ATTENUATION: f64 = 0.5;

/// Extra voxels of propagation beyond the truncation band.
const POINT_PROPAGATION_MARGIN: i64 = 2;

impl FusionVolume {
    /// Fuses a depth frame into the grid (primary, most accurate path).
    ///
    /// Every voxel center is projected into the camera image; voxels
    /// behind the camera or outside the image bounds are skipped. For the
    /// rest, `sdf = measured_depth - voxel_camera_z` is truncated,
    /// normalized, and fused into the cell by running weighted average.
    /// Voxels more than one truncation distance behind an observed
    /// surface contribute nothing.
    ///
    /// The sweep visits the whole grid by construction, parallelized over
    /// z-slabs. Degraded input (invalid intrinsics, non-positive frame
    /// weight, unreadable pixels) is skipped rather than reported.
    pub fn integrate_depth(
        &mut self,
        depth: &DepthImage<'_>,
        intrinsics: &CameraIntrinsics,
        camera_to_world: &Isometry3<f64>,
        frame_weight: f64,
    ) {
        if !(frame_weight.is_finite() && frame_weight > 0.0) {
            warn!(frame_weight, "non-positive frame weight, skipping frame");
            return;
        }
        if !intrinsics.is_valid() {
            warn!("degenerate camera intrinsics, skipping frame");
            return;
        }

        let world_to_camera = camera_to_world.inverse();
        let (nx, ny, _nz) = self.dimensions();
        let origin = self.config().origin;
        let h = self.voxel_size();
        let truncation = self.truncation();
        let intrinsics = *intrinsics;
        let depth = *depth;

        self.cells_mut()
            .par_chunks_mut(nx * ny)
            .enumerate()
            .for_each(|(iz, slab)| {
                #[allow(clippy::cast_precision_loss)]
                let cz = origin.z + (iz as f64 + 0.5) * h;
                for iy in 0..ny {
                    #[allow(clippy::cast_precision_loss)]
                    let cy = origin.y + (iy as f64 + 0.5) * h;
                    for ix in 0..nx {
                        #[allow(clippy::cast_precision_loss)]
                        let cx = origin.x + (ix as f64 + 0.5) * h;

                        let cam = world_to_camera * Point3::new(cx, cy, cz);
                        let Some((u, v)) = intrinsics.project(cam) else {
                            continue;
                        };
                        if u < 0.0 || v < 0.0 {
                            continue;
                        }
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        let (px, py) = (u.round() as usize, v.round() as usize);
                        let Some(measured) = depth.get(px, py) else {
                            continue;
                        };
                        let measured = f64::from(measured);
                        if !measured.is_finite() || measured <= 0.0 {
                            continue;
                        }

                        let sdf = measured - cam.z;
                        if sdf <= -truncation {
                            continue;
                        }
                        let normalized = (sdf / truncation).clamp(-1.0, 1.0);

                        let cell = &mut slab[iy * nx + ix];
                        fuse(cell, normalized, frame_weight);
                    }
                }
            });

        self.bump_frame_count();
        debug!(frame = self.frame_count(), "integrated depth frame");
    }

    /// Fuses a bare point cloud into the grid (approximate fallback).
    ///
    /// Each sample marks its containing voxel as on-surface and
    /// propagates signed-distance estimates into the surrounding
    /// neighborhood of radius `ceil(truncation / voxel_size) + 2` voxels.
    /// The sign of a propagated estimate compares the target voxel's
    /// distance from the cloud centroid against the sample's own:
    /// voxels nearer the centroid are treated as inside (negative).
    ///
    /// This heuristic is sound for convex-ish single objects and is
    /// accepted to misclassify concave regions in exchange for running
    /// without per-pixel depth access.
    ///
    /// Contributions decay exponentially with distance from the sample
    /// and are scaled by the sample confidence and a fixed attenuation.
    /// Candidate cells whose fused weight would be non-positive or
    /// non-finite are skipped.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
    pub fn integrate_points(&mut self, cloud: &SampleCloud, frame_weight: f64) {
        if !(frame_weight.is_finite() && frame_weight > 0.0) {
            warn!(frame_weight, "non-positive frame weight, skipping batch");
            return;
        }
        let Some(centroid) = cloud.centroid() else {
            debug!("empty point batch, nothing to fuse");
            return;
        };

        let (nx, ny, nz) = self.dimensions();
        let origin = self.config().origin;
        let h = self.voxel_size();
        let truncation = self.truncation();
        let radius = (truncation / h).ceil() as i64 + POINT_PROPAGATION_MARGIN;
        let reach = radius as f64 * h;

        for sample in &cloud.points {
            let p = sample.position;
            if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
                continue;
            }
            let confidence = sample.confidence.clamp(0.0, 1.0);
            if confidence <= 0.0 {
                continue;
            }

            let gx = ((p.x - origin.x) / h).floor() as i64;
            let gy = ((p.y - origin.y) / h).floor() as i64;
            let gz = ((p.z - origin.z) / h).floor() as i64;
            let sample_to_centroid = (p - centroid).norm();

            for dz in -radius..=radius {
                let iz = gz + dz;
                if iz < 0 || iz >= nz as i64 {
                    continue;
                }
                for dy in -radius..=radius {
                    let iy = gy + dy;
                    if iy < 0 || iy >= ny as i64 {
                        continue;
                    }
                    for dx in -radius..=radius {
                        let ix = gx + dx;
                        if ix < 0 || ix >= nx as i64 {
                            continue;
                        }

                        let center =
                            self.voxel_center(ix as usize, iy as usize, iz as usize);
                        let dist = (center - p).norm();
                        if dist > reach {
                            continue;
                        }

                        let magnitude = (dist / truncation).min(1.0);
                        let sign = if (center - centroid).norm() < sample_to_centroid {
                            -1.0
                        } else {
                            1.0
                        };
                        let estimate = sign * magnitude;

                        let contribution = frame_weight
                            * confidence
                            * POINT_ATTENUATION
                            * (-dist / truncation).exp();

                        let index = ix as usize + iy as usize * nx + iz as usize * nx * ny;
                        if let Some(cell) = self.cells_mut().get_mut(index) {
                            fuse(cell, estimate, contribution);
                        }
                    }
                }
            }
        }

        self.bump_frame_count();
        debug!(
            frame = self.frame_count(),
            points = cloud.len(),
            "integrated point batch"
        );
    }
}

/// Running weighted-average fusion of one observation into a cell.
///
/// Skips the update when the fused weight would be non-positive or
/// non-finite, or the observed value is non-finite.
fn fuse(cell: &mut VoxelCell, value: f64, weight: f64) {
    if !value.is_finite() || !weight.is_finite() || weight <= 0.0 {
        return;
    }
    let new_weight = cell.weight + weight;
    if !new_weight.is_finite() || new_weight <= 0.0 {
        return;
    }
    cell.distance = (cell.distance * cell.weight + value * weight) / new_weight;
    cell.weight = new_weight;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::volume::VolumeConfig;
    use approx::assert_relative_eq;
    use nalgebra::{Translation3, UnitQuaternion, Vector3};
    use recon_types::SamplePoint;

    fn centered_volume(extent: f64, dims: usize) -> FusionVolume {
        let half = extent / 2.0;
        FusionVolume::new(VolumeConfig::new(
            (dims, dims, dims),
            Point3::new(-half, -half, -half),
            extent / dims as f64,
        ))
        .unwrap()
    }

    #[test]
    fn test_fuse_weighted_average() {
        let mut cell = VoxelCell::default();
        fuse(&mut cell, 0.0, 1.0);
        // Initial distance 1.0 with weight 0 fused with 0.0 at weight 1
        assert_relative_eq!(cell.distance, 0.0);
        assert_relative_eq!(cell.weight, 1.0);

        fuse(&mut cell, 1.0, 1.0);
        assert_relative_eq!(cell.distance, 0.5);
        assert_relative_eq!(cell.weight, 2.0);
    }

    #[test]
    fn test_fuse_guards_bad_values() {
        let mut cell = VoxelCell::default();
        fuse(&mut cell, f64::NAN, 1.0);
        fuse(&mut cell, 0.0, f64::INFINITY);
        fuse(&mut cell, 0.0, -1.0);
        fuse(&mut cell, 0.0, 0.0);
        assert_relative_eq!(cell.weight, 0.0);
        assert_relative_eq!(cell.distance, 1.0);
    }

    #[test]
    fn test_integrate_depth_flat_plane() {
        // Camera at origin looking +Z at a plane of depth 0.5; the grid
        // spans z in [0.2, 0.8] so it brackets the surface.
        let mut volume = FusionVolume::new(VolumeConfig::new(
            (24, 24, 24),
            Point3::new(-0.3, -0.3, 0.2),
            0.025,
        ))
        .unwrap();
        let depth = vec![0.5f32; 64 * 64];
        let image = DepthImage::new(&depth, 64, 64).unwrap();
        let intrinsics = CameraIntrinsics::new(32.0, 32.0, 32.0, 32.0);

        volume.integrate_depth(&image, &intrinsics, &Isometry3::identity(), 1.0);

        assert_eq!(volume.frame_count(), 1);
        assert!(volume.observed_cell_count() > 0);

        // A voxel just in front of the plane reads positive, one just
        // behind reads negative.
        let (front, front_weight) = sample_along_z(&volume, 0.40);
        let (behind, behind_weight) = sample_along_z(&volume, 0.55);
        assert!(front_weight > 0.0);
        assert!(behind_weight > 0.0);
        assert!(front > 0.0);
        assert!(behind < 0.0);
    }

    /// Reads the cell containing (0, 0, z), returning (distance, weight).
    fn sample_along_z(volume: &FusionVolume, z: f64) -> (f64, f64) {
        let (ix, iy, iz) = volume.world_to_grid(Point3::new(0.0, 0.0, z)).unwrap();
        let cell = volume.cell(ix, iy, iz).unwrap();
        (cell.distance, cell.weight)
    }

    #[test]
    fn test_integrate_depth_skips_far_behind_surface() {
        let mut volume = centered_volume(2.0, 20);
        let depth = vec![0.3f32; 64 * 64];
        let image = DepthImage::new(&depth, 64, 64).unwrap();
        let intrinsics = CameraIntrinsics::new(16.0, 16.0, 32.0, 32.0);

        volume.integrate_depth(&image, &intrinsics, &Isometry3::identity(), 1.0);

        // Far behind the surface (z >> 0.3 + truncation): unobserved
        let (_, weight) = sample_along_z(&volume, 0.9);
        assert_relative_eq!(weight, 0.0);
    }

    #[test]
    fn test_integrate_depth_invalid_weight_ignored() {
        let mut volume = centered_volume(0.6, 8);
        let depth = vec![0.5f32; 16 * 16];
        let image = DepthImage::new(&depth, 16, 16).unwrap();
        let intrinsics = CameraIntrinsics::new(8.0, 8.0, 8.0, 8.0);

        volume.integrate_depth(&image, &intrinsics, &Isometry3::identity(), 0.0);
        volume.integrate_depth(&image, &intrinsics, &Isometry3::identity(), f64::NAN);

        assert_eq!(volume.frame_count(), 0);
        assert_eq!(volume.observed_cell_count(), 0);
    }

    #[test]
    fn test_integrate_depth_weight_monotonic() {
        let mut volume = centered_volume(0.6, 12);
        let depth = vec![0.5f32; 32 * 32];
        let image = DepthImage::new(&depth, 32, 32).unwrap();
        let intrinsics = CameraIntrinsics::new(16.0, 16.0, 16.0, 16.0);

        volume.integrate_depth(&image, &intrinsics, &Isometry3::identity(), 1.0);
        let before: Vec<f64> = all_weights(&volume);

        volume.integrate_depth(&image, &intrinsics, &Isometry3::identity(), 1.0);
        let after: Vec<f64> = all_weights(&volume);

        for (b, a) in before.iter().zip(after.iter()) {
            assert!(a >= b);
        }
    }

    fn all_weights(volume: &FusionVolume) -> Vec<f64> {
        let (nx, ny, nz) = volume.dimensions();
        let mut weights = Vec::with_capacity(nx * ny * nz);
        for iz in 0..nz {
            for iy in 0..ny {
                for ix in 0..nx {
                    weights.push(volume.cell(ix, iy, iz).unwrap().weight);
                }
            }
        }
        weights
    }

    #[test]
    fn test_integrate_points_marks_surface() {
        let mut volume = centered_volume(0.4, 20);
        let p = Point3::new(0.0, 0.0, 0.1);
        let cloud = SampleCloud {
            points: vec![
                SamplePoint::new(p, Vector3::z(), 1.0),
                SamplePoint::new(Point3::new(0.0, 0.0, -0.1), Vector3::z(), 1.0),
            ],
        };

        volume.integrate_points(&cloud, 1.0);

        let (ix, iy, iz) = volume.world_to_grid(p).unwrap();
        let cell = volume.cell(ix, iy, iz).unwrap();
        assert!(cell.is_observed());
        // The containing voxel reads near zero (on-surface)
        assert!(cell.distance.abs() < 0.3);
    }

    #[test]
    fn test_integrate_points_sign_heuristic() {
        // Two samples straddling the centroid along z; voxels between
        // them (nearer the centroid) read negative.
        let mut volume = centered_volume(0.4, 20);
        let cloud = SampleCloud {
            points: vec![
                SamplePoint::new(Point3::new(0.0, 0.0, 0.1), Vector3::z(), 1.0),
                SamplePoint::new(Point3::new(0.0, 0.0, -0.1), Vector3::z(), 1.0),
            ],
        };

        volume.integrate_points(&cloud, 1.0);

        let (inner, inner_weight) = sample_cell(&volume, Point3::new(0.0, 0.0, 0.05));
        assert!(inner_weight > 0.0);
        assert!(inner < 0.0, "inner cell should read inside, got {inner}");
    }

    fn sample_cell(volume: &FusionVolume, p: Point3<f64>) -> (f64, f64) {
        let (ix, iy, iz) = volume.world_to_grid(p).unwrap();
        let cell = volume.cell(ix, iy, iz).unwrap();
        (cell.distance, cell.weight)
    }

    #[test]
    fn test_integrate_points_empty_cloud() {
        let mut volume = centered_volume(0.4, 10);
        volume.integrate_points(&SampleCloud::new(), 1.0);
        assert_eq!(volume.frame_count(), 0);
        assert_eq!(volume.observed_cell_count(), 0);
    }

    #[test]
    fn test_integrate_points_skips_non_finite() {
        let mut volume = centered_volume(0.4, 10);
        let cloud = SampleCloud {
            points: vec![SamplePoint::new(
                Point3::new(f64::NAN, 0.0, 0.0),
                Vector3::z(),
                1.0,
            )],
        };
        volume.integrate_points(&cloud, 1.0);
        assert_eq!(volume.observed_cell_count(), 0);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut volume = centered_volume(0.4, 10);
        let cloud = SampleCloud::from_positions(&[Point3::new(0.0, 0.0, 0.0)]);
        volume.integrate_points(&cloud, 1.0);
        assert!(volume.observed_cell_count() > 0);

        volume.reset();
        assert_eq!(volume.observed_cell_count(), 0);
        assert_eq!(volume.frame_count(), 0);
    }

    #[test]
    fn test_camera_pose_respected() {
        // Camera displaced along -Z still sees the plane at world z = 0.2
        let mut volume = centered_volume(0.6, 24);
        let depth = vec![1.2f32; 64 * 64];
        let image = DepthImage::new(&depth, 64, 64).unwrap();
        let intrinsics = CameraIntrinsics::new(32.0, 32.0, 32.0, 32.0);
        let pose = Isometry3::from_parts(
            Translation3::new(0.0, 0.0, -1.0),
            UnitQuaternion::identity(),
        );

        volume.integrate_depth(&image, &intrinsics, &pose, 1.0);

        let (front, _) = sample_along_z(&volume, 0.1);
        let (behind, _) = sample_along_z(&volume, 0.28);
        assert!(front > 0.0);
        assert!(behind < 0.0);
    }
}
