//! Neighborhood-centroid smoothing.

use nalgebra::{Point3, Vector3};
use recon_types::SampleCloud;
use tracing::debug;

use crate::error::DenoiseError;
use crate::hash::SpatialHash;

/// Parameters for the denoising pass.
///
/// `blend_alpha` controls how much of the original position survives each
/// iteration: values near 1 preserve detail, values near 0 smooth
/// aggressively.
///
/// # Example
///
/// ```
/// use recon_denoise::DenoiseParams;
///
/// let params = DenoiseParams::for_scans();
/// assert!(params.blend_alpha > 0.0 && params.blend_alpha < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct DenoiseParams {
    /// Cell size of the spatial hash.
    ///
    /// Should be at least `neighbor_radius` so the 27-cell scan covers
    /// the full query sphere.
    pub voxel_size: f64,

    /// Neighborhood radius for the centroid average.
    pub neighbor_radius: f64,

    /// Weight of the original position in the blend, in `[0, 1]`.
    pub blend_alpha: f64,

    /// Number of smoothing iterations.
    pub iterations: u32,
}

impl Default for DenoiseParams {
    fn default() -> Self {
        Self::for_scans()
    }
}

impl DenoiseParams {
    /// Parameters tuned for handheld depth-camera scans.
    #[must_use]
    pub const fn for_scans() -> Self {
        Self {
            voxel_size: 0.01,
            neighbor_radius: 0.01,
            blend_alpha: 0.6,
            iterations: 1,
        }
    }

    /// Aggressive smoothing for very noisy input.
    #[must_use]
    pub const fn aggressive() -> Self {
        Self {
            voxel_size: 0.02,
            neighbor_radius: 0.02,
            blend_alpha: 0.3,
            iterations: 3,
        }
    }

    /// Minimal smoothing that preserves fine detail.
    #[must_use]
    pub const fn minimal() -> Self {
        Self {
            voxel_size: 0.005,
            neighbor_radius: 0.005,
            blend_alpha: 0.85,
            iterations: 1,
        }
    }

    /// Checks the parameters for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`DenoiseError::InvalidParams`] if sizes are not positive
    /// and finite or `blend_alpha` is outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), DenoiseError> {
        if !(self.voxel_size.is_finite() && self.voxel_size > 0.0) {
            return Err(DenoiseError::InvalidParams {
                reason: "voxel_size must be positive and finite".to_string(),
            });
        }
        if !(self.neighbor_radius.is_finite() && self.neighbor_radius > 0.0) {
            return Err(DenoiseError::InvalidParams {
                reason: "neighbor_radius must be positive and finite".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.blend_alpha) {
            return Err(DenoiseError::InvalidParams {
                reason: format!("blend_alpha {} must be in [0, 1]", self.blend_alpha),
            });
        }
        Ok(())
    }
}

/// Result of a denoising pass.
#[derive(Debug, Clone)]
pub struct DenoiseResult {
    /// The smoothed cloud. Same length as the input; normals and
    /// confidences are carried through unchanged.
    pub cloud: SampleCloud,

    /// Number of iterations performed.
    pub iterations_performed: u32,

    /// Maximum single point displacement across all iterations.
    pub max_displacement: f64,

    /// Mean point displacement in the final iteration.
    pub average_displacement: f64,
}

/// Smooths a point cloud toward local neighborhood centroids.
///
/// For each point, all points within `neighbor_radius` (found via the
/// spatial hash) are averaged, and the point is moved to
/// `blend_alpha * original + (1 - blend_alpha) * average`. Points with no
/// neighbors in range are left unchanged; the point count never changes.
///
/// The operation is deterministic, and on a locally uniform cloud it is a
/// fixed point: repeated application changes positions negligibly.
///
/// # Errors
///
/// Returns [`DenoiseError::InvalidParams`] for inconsistent parameters.
#[allow(clippy::cast_precision_loss)]
pub fn denoise_cloud(
    cloud: &SampleCloud,
    params: &DenoiseParams,
) -> Result<DenoiseResult, DenoiseError> {
    params.validate()?;

    let mut result = cloud.clone();
    let mut max_displacement = 0.0_f64;
    let mut average_displacement = 0.0;

    for _ in 0..params.iterations {
        let positions: Vec<Point3<f64>> = result.points.iter().map(|p| p.position).collect();
        let hash = SpatialHash::build(&positions, params.voxel_size);

        let mut iteration_total = 0.0;
        for (i, point) in result.points.iter_mut().enumerate() {
            let original = positions[i];
            let mut sum = Vector3::zeros();
            let mut count = 0u32;
            hash.for_each_within(&positions, original, params.neighbor_radius, |j| {
                // The query point itself participates in its own average
                sum += positions[j as usize].coords;
                count += 1;
            });

            if count == 0 {
                continue;
            }

            let average = sum / f64::from(count);
            let blended = original.coords * params.blend_alpha
                + average * (1.0 - params.blend_alpha);

            let displacement = (blended - original.coords).norm();
            max_displacement = max_displacement.max(displacement);
            iteration_total += displacement;

            point.position = Point3::from(blended);
        }

        average_displacement = if result.points.is_empty() {
            0.0
        } else {
            iteration_total / result.points.len() as f64
        };
    }

    debug!(
        points = result.len(),
        iterations = params.iterations,
        max_displacement,
        "denoised cloud"
    );

    Ok(DenoiseResult {
        cloud: result,
        iterations_performed: params.iterations,
        max_displacement,
        average_displacement,
    })
}
