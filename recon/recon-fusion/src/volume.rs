//! The voxel grid and its configuration.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{FusionError, FusionResult};

/// Default truncation distance as a multiple of the voxel size.
///
/// Larger truncation smooths over noise but blurs thin features; smaller
/// truncation is sharper but more sensitive to per-frame noise and gaps.
const DEFAULT_TRUNCATION_FACTOR: f64 = 5.0;

/// One cell of the fusion grid.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoxelCell {
    /// Normalized signed distance to the nearest surface in `[-1, 1]`.
    ///
    /// 1 means far outside or never observed, values near 0 mean on the
    /// surface, negative means inside.
    pub distance: f64,

    /// Accumulated observation confidence. Zero means never observed;
    /// monotonically non-decreasing within a session except on reset.
    pub weight: f64,
}

impl Default for VoxelCell {
    fn default() -> Self {
        Self {
            distance: 1.0,
            weight: 0.0,
        }
    }
}

impl VoxelCell {
    /// Returns true if this cell has received at least one observation.
    #[must_use]
    pub fn is_observed(&self) -> bool {
        self.weight > 0.0
    }
}

/// Configuration of a fusion volume.
///
/// # Example
///
/// ```
/// use recon_fusion::VolumeConfig;
/// use nalgebra::Point3;
///
/// let config = VolumeConfig::new((64, 64, 64), Point3::origin(), 0.005);
/// assert!((config.truncation - 0.025).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VolumeConfig {
    /// Grid dimensions `(nx, ny, nz)` in voxels.
    pub dimensions: (usize, usize, usize),

    /// World-space position of the grid's minimum corner.
    pub origin: Point3<f64>,

    /// Edge length of one voxel in meters.
    pub voxel_size: f64,

    /// Truncation distance in meters. Signed distances are clamped to
    /// `[-truncation, truncation]` before normalization.
    pub truncation: f64,
}

impl VolumeConfig {
    /// Creates a configuration with the default truncation
    /// (5 x voxel size).
    #[must_use]
    pub fn new(dimensions: (usize, usize, usize), origin: Point3<f64>, voxel_size: f64) -> Self {
        Self {
            dimensions,
            origin,
            voxel_size,
            truncation: voxel_size * DEFAULT_TRUNCATION_FACTOR,
        }
    }

    /// Overrides the truncation distance.
    #[must_use]
    pub const fn with_truncation(mut self, truncation: f64) -> Self {
        self.truncation = truncation;
        self
    }

    /// Checks the configuration preconditions.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidConfig`] for zero dimensions,
    /// non-positive or non-finite sizes, or a cell count that overflows.
    pub fn validate(&self) -> FusionResult<()> {
        let (nx, ny, nz) = self.dimensions;
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(FusionError::InvalidConfig {
                reason: format!("grid dimensions ({nx}, {ny}, {nz}) must all be non-zero"),
            });
        }
        if nx
            .checked_mul(ny)
            .and_then(|v| v.checked_mul(nz))
            .is_none()
        {
            return Err(FusionError::InvalidConfig {
                reason: "grid cell count overflows".to_string(),
            });
        }
        if !(self.voxel_size.is_finite() && self.voxel_size > 0.0) {
            return Err(FusionError::InvalidConfig {
                reason: format!("voxel size {} must be positive and finite", self.voxel_size),
            });
        }
        if !(self.truncation.is_finite() && self.truncation > 0.0) {
            return Err(FusionError::InvalidConfig {
                reason: format!(
                    "truncation {} must be positive and finite",
                    self.truncation
                ),
            });
        }
        if !(self.origin.x.is_finite() && self.origin.y.is_finite() && self.origin.z.is_finite()) {
            return Err(FusionError::InvalidConfig {
                reason: "origin must be finite".to_string(),
            });
        }
        Ok(())
    }
}

/// A dense truncated signed-distance grid.
///
/// Cells are stored in row-major order (x varies fastest, then y, then z).
/// The grid is created at scan start, mutated once per processed frame by
/// exactly one writer, read any number of times between writes (or from a
/// cloned snapshot), and reset or discarded when the session ends.
#[derive(Debug, Clone)]
pub struct FusionVolume {
    config: VolumeConfig,
    cells: Vec<VoxelCell>,
    frame_count: u64,
}

impl FusionVolume {
    /// Creates a volume with every cell in the far/unobserved state.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidConfig`] if the configuration is
    /// invalid; these are programmer errors and fail loudly here rather
    /// than being tolerated at integration time.
    pub fn new(config: VolumeConfig) -> FusionResult<Self> {
        config.validate()?;
        let (nx, ny, nz) = config.dimensions;
        Ok(Self {
            config,
            cells: vec![VoxelCell::default(); nx * ny * nz],
            frame_count: 0,
        })
    }

    /// Returns the volume configuration.
    #[must_use]
    pub const fn config(&self) -> &VolumeConfig {
        &self.config
    }

    /// Returns the grid dimensions `(nx, ny, nz)`.
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize, usize) {
        self.config.dimensions
    }

    /// Returns the voxel edge length in meters.
    #[must_use]
    pub const fn voxel_size(&self) -> f64 {
        self.config.voxel_size
    }

    /// Returns the truncation distance in meters.
    #[must_use]
    pub const fn truncation(&self) -> f64 {
        self.config.truncation
    }

    /// Returns the number of frames integrated since creation or reset.
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Reads the cell at the given grid coordinates.
    ///
    /// Returns `None` outside the grid.
    #[must_use]
    pub fn cell(&self, ix: usize, iy: usize, iz: usize) -> Option<&VoxelCell> {
        let (nx, ny, nz) = self.config.dimensions;
        if ix < nx && iy < ny && iz < nz {
            self.cells.get(ix + iy * nx + iz * nx * ny)
        } else {
            None
        }
    }

    /// Returns the world-space center of the given voxel.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn voxel_center(&self, ix: usize, iy: usize, iz: usize) -> Point3<f64> {
        let h = self.config.voxel_size;
        Point3::new(
            self.config.origin.x + (ix as f64 + 0.5) * h,
            self.config.origin.y + (iy as f64 + 0.5) * h,
            self.config.origin.z + (iz as f64 + 0.5) * h,
        )
    }

    /// Returns the grid coordinates of the voxel containing the given
    /// world-space point, or `None` if it lies outside the grid.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn world_to_grid(&self, p: Point3<f64>) -> Option<(usize, usize, usize)> {
        let h = self.config.voxel_size;
        let offset = p - self.config.origin;
        let ix = (offset.x / h).floor();
        let iy = (offset.y / h).floor();
        let iz = (offset.z / h).floor();

        let (nx, ny, nz) = self.config.dimensions;
        if ix >= 0.0
            && iy >= 0.0
            && iz >= 0.0
            && (ix as usize) < nx
            && (iy as usize) < ny
            && (iz as usize) < nz
        {
            Some((ix as usize, iy as usize, iz as usize))
        } else {
            None
        }
    }

    /// Counts cells that have received at least one observation.
    #[must_use]
    pub fn observed_cell_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_observed()).count()
    }

    /// Returns every cell to the far/unobserved state and zeroes the
    /// frame counter.
    ///
    /// This is the only way to discard prior fusion state.
    pub fn reset(&mut self) {
        self.cells.fill(VoxelCell::default());
        self.frame_count = 0;
    }

    /// Overwrites a single cell with a synthetic observation.
    ///
    /// `distance` is clamped to the normalized `[-1, 1]` range and
    /// `weight` to be non-negative. Out-of-bounds coordinates are
    /// ignored. Intended for diagnostics and synthetic test fields; scan
    /// sessions populate the grid through the integrate methods instead.
    pub fn set_cell(&mut self, ix: usize, iy: usize, iz: usize, distance: f64, weight: f64) {
        let (nx, ny, nz) = self.config.dimensions;
        if ix < nx && iy < ny && iz < nz {
            if let Some(cell) = self.cells.get_mut(ix + iy * nx + iz * nx * ny) {
                cell.distance = if distance.is_finite() {
                    distance.clamp(-1.0, 1.0)
                } else {
                    1.0
                };
                cell.weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
            }
        }
    }

    pub(crate) fn cells_mut(&mut self) -> &mut Vec<VoxelCell> {
        &mut self.cells
    }

    pub(crate) fn bump_frame_count(&mut self) {
        self.frame_count += 1;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_volume_is_unobserved() {
        let volume = FusionVolume::new(VolumeConfig::new((4, 5, 6), Point3::origin(), 0.1))
            .unwrap();
        assert_eq!(volume.dimensions(), (4, 5, 6));
        assert_eq!(volume.observed_cell_count(), 0);
        assert_eq!(volume.frame_count(), 0);
        let cell = volume.cell(3, 4, 5).unwrap();
        assert_relative_eq!(cell.distance, 1.0);
        assert_relative_eq!(cell.weight, 0.0);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        assert!(FusionVolume::new(VolumeConfig::new((0, 5, 6), Point3::origin(), 0.1)).is_err());
        assert!(FusionVolume::new(VolumeConfig::new((4, 5, 6), Point3::origin(), 0.0)).is_err());
        assert!(FusionVolume::new(VolumeConfig::new((4, 5, 6), Point3::origin(), -1.0)).is_err());
        assert!(FusionVolume::new(
            VolumeConfig::new((4, 5, 6), Point3::origin(), 0.1).with_truncation(0.0)
        )
        .is_err());
        assert!(FusionVolume::new(VolumeConfig::new(
            (4, 5, 6),
            Point3::new(f64::NAN, 0.0, 0.0),
            0.1
        ))
        .is_err());
    }

    #[test]
    fn test_default_truncation_is_five_voxels() {
        let config = VolumeConfig::new((4, 4, 4), Point3::origin(), 0.01);
        assert_relative_eq!(config.truncation, 0.05);
    }

    #[test]
    fn test_cell_out_of_bounds() {
        let volume =
            FusionVolume::new(VolumeConfig::new((4, 4, 4), Point3::origin(), 0.1)).unwrap();
        assert!(volume.cell(4, 0, 0).is_none());
        assert!(volume.cell(0, 4, 0).is_none());
        assert!(volume.cell(0, 0, 4).is_none());
    }

    #[test]
    fn test_voxel_center_round_trip() {
        let volume = FusionVolume::new(VolumeConfig::new(
            (10, 10, 10),
            Point3::new(-0.5, -0.5, -0.5),
            0.1,
        ))
        .unwrap();

        let center = volume.voxel_center(3, 4, 5);
        let coords = volume.world_to_grid(center).unwrap();
        assert_eq!(coords, (3, 4, 5));
    }

    #[test]
    fn test_world_to_grid_outside() {
        let volume =
            FusionVolume::new(VolumeConfig::new((10, 10, 10), Point3::origin(), 0.1)).unwrap();
        assert!(volume.world_to_grid(Point3::new(-0.01, 0.5, 0.5)).is_none());
        assert!(volume.world_to_grid(Point3::new(1.01, 0.5, 0.5)).is_none());
        assert!(volume.world_to_grid(Point3::new(0.5, 0.5, 0.5)).is_some());
    }
}
