//! The single-writer scan session.

use recon_denoise::denoise_cloud;
use recon_extract::extract_surface;
use recon_fusion::FusionVolume;
use recon_measure::{compute_volume, VolumeResult};
use recon_sample::sample_depth_image;
use recon_types::{SampleCloud, TriangleMesh};
use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::error::PipelineResult;
use crate::frame::DepthFrame;

/// One reconstruction session owning one fusion grid.
///
/// The session is the pipeline's single-writer rule made structural:
/// every mutating operation takes `&mut self`, so two frames can never
/// fuse into the same grid concurrently. Readers that must run alongside
/// fusion work from a [`ScanSession::snapshot`] instead.
///
/// Three integration paths are offered, mirroring how frames arrive:
///
/// - [`integrate_depth_frame`](Self::integrate_depth_frame) - the
///   primary, most accurate path; the depth map drives a full-grid
///   signed-distance sweep.
/// - [`integrate_sampled_frame`](Self::integrate_sampled_frame) - the
///   point route for the same frame data: sample, denoise, then fuse
///   approximately. Useful when points must be filtered before fusion.
/// - [`integrate_point_batch`](Self::integrate_point_batch) - externally
///   supplied point batches (for example from an ML segmentation
///   filter), denoised and fused approximately.
///
/// # Example
///
/// ```
/// use recon_pipeline::{ScanConfig, ScanSession};
/// use recon_fusion::VolumeConfig;
/// use recon_types::SampleCloud;
/// use nalgebra::Point3;
///
/// let config = ScanConfig::new(VolumeConfig::new(
///     (32, 32, 32),
///     Point3::new(-0.16, -0.16, -0.16),
///     0.01,
/// ));
/// let mut session = ScanSession::new(config).unwrap();
///
/// // Nothing scanned yet: no mesh, no volume
/// assert!(session.extract_mesh().is_empty());
/// assert!(session.measure().unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct ScanSession {
    config: ScanConfig,
    volume: FusionVolume,
    smoothed: bool,
}

impl ScanSession {
    /// Creates a session with a fresh, all-unobserved grid.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any stage's parameters violate
    /// their preconditions; these fail loudly here rather than being
    /// tolerated mid-scan.
    pub fn new(config: ScanConfig) -> PipelineResult<Self> {
        config.validate()?;
        let volume = FusionVolume::new(config.volume)?;
        info!(dimensions = ?config.volume.dimensions, "scan session started");
        Ok(Self {
            config,
            volume,
            smoothed: false,
        })
    }

    /// Returns the session configuration.
    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Returns the fusion grid for read-only inspection.
    #[must_use]
    pub const fn volume(&self) -> &FusionVolume {
        &self.volume
    }

    /// Returns the number of frames fused since start or reset.
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.volume.frame_count()
    }

    /// Clones the grid so a reader can extract while fusion continues.
    #[must_use]
    pub fn snapshot(&self) -> FusionVolume {
        self.volume.clone()
    }

    /// Fuses a depth frame through the primary depth-based path.
    pub fn integrate_depth_frame(&mut self, frame: &DepthFrame) {
        let Some(image) = frame.depth_image() else {
            debug!("frame has no usable depth view, skipping");
            return;
        };
        self.volume.integrate_depth(
            &image,
            frame.intrinsics(),
            frame.camera_to_world(),
            self.config.frame_weight,
        );
    }

    /// Samples a depth frame into points, denoises them, and fuses the
    /// result through the approximate point path.
    ///
    /// Returns the number of points fused. Frames that yield no valid
    /// samples fuse nothing and return zero.
    ///
    /// # Errors
    ///
    /// Returns a configuration error from the denoiser; degraded frame
    /// data is not an error.
    pub fn integrate_sampled_frame(&mut self, frame: &DepthFrame) -> PipelineResult<usize> {
        let Some(image) = frame.depth_image() else {
            debug!("frame has no usable depth view, skipping");
            return Ok(0);
        };
        let cloud = sample_depth_image(
            &image,
            frame.confidence_image().as_ref(),
            frame.intrinsics(),
            frame.camera_to_world(),
            frame.tracking(),
            &self.config.policy,
        );
        self.integrate_point_batch(&cloud)
    }

    /// Denoises and fuses an externally supplied point batch.
    ///
    /// The batch must satisfy the same contract as the built-in
    /// sampler's output: world-space positions, unit normals, and
    /// confidences in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error from the denoiser; an empty batch
    /// is not an error and fuses nothing.
    pub fn integrate_point_batch(&mut self, cloud: &SampleCloud) -> PipelineResult<usize> {
        if cloud.is_empty() {
            return Ok(0);
        }
        let denoised = denoise_cloud(cloud, &self.config.denoise)?;
        if denoised.iterations_performed > 0 {
            self.smoothed = true;
        }
        self.volume
            .integrate_points(&denoised.cloud, self.config.frame_weight);
        Ok(denoised.cloud.len())
    }

    /// Extracts the current isosurface as a triangle mesh.
    ///
    /// The mesh is a value object owned by the caller; extracting does
    /// not mutate the grid.
    #[must_use]
    pub fn extract_mesh(&self) -> TriangleMesh {
        extract_surface(&self.volume)
    }

    /// Extracts the current surface and measures its volume.
    ///
    /// The smoothed-input confidence bonus is applied automatically when
    /// any fused batch passed through the denoiser. Returns `Ok(None)`
    /// when the grid holds no surface at all.
    ///
    /// # Errors
    ///
    /// Returns a configuration error from the measurement parameters.
    pub fn measure(&self) -> PipelineResult<Option<VolumeResult>> {
        let mesh = self.extract_mesh();
        let params = self
            .config
            .measure
            .with_smoothed_input(self.config.measure.smoothed_input || self.smoothed);
        Ok(compute_volume(&mesh, &params)?)
    }

    /// Discards all fusion state, returning the grid to its initial
    /// all-far state.
    pub fn reset(&mut self) {
        self.volume.reset();
        self.smoothed = false;
        info!("scan session reset");
    }
}
