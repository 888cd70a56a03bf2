//! Owned per-frame sensor data.
//!
//! Raw sensor buffers are often backed by OS-managed resources with a
//! one-frame lifetime, so they must never cross the producer/consumer
//! boundary. A [`DepthFrame`] copies everything it needs at construction
//! and is the only frame representation the worker queue carries.

use nalgebra::Isometry3;
use recon_types::{CameraIntrinsics, ConfidenceImage, DepthImage, TrackingQuality};

/// An owned copy of one depth frame and its camera state.
///
/// # Example
///
/// ```
/// use recon_pipeline::DepthFrame;
/// use recon_types::{CameraIntrinsics, TrackingQuality};
/// use nalgebra::Isometry3;
///
/// let depth = vec![1.0f32; 64 * 48];
/// let frame = DepthFrame::new(
///     &depth,
///     64,
///     48,
///     CameraIntrinsics::new(50.0, 50.0, 32.0, 24.0),
///     Isometry3::identity(),
///     TrackingQuality::Normal,
/// )
/// .unwrap();
/// assert_eq!(frame.dimensions(), (64, 48));
/// ```
#[derive(Debug, Clone)]
pub struct DepthFrame {
    depth: Vec<f32>,
    confidence: Option<Vec<u8>>,
    width: usize,
    height: usize,
    intrinsics: CameraIntrinsics,
    camera_to_world: Isometry3<f64>,
    tracking: TrackingQuality,
}

impl DepthFrame {
    /// Copies a depth buffer and camera state into an owned frame.
    ///
    /// Returns `None` when the buffer does not match the stated
    /// dimensions or the dimensions are zero — absence of usable data is
    /// a degraded-input case, not an error.
    #[must_use]
    pub fn new(
        depth: &[f32],
        width: usize,
        height: usize,
        intrinsics: CameraIntrinsics,
        camera_to_world: Isometry3<f64>,
        tracking: TrackingQuality,
    ) -> Option<Self> {
        // Validate through the same view the consumer will use
        DepthImage::new(depth, width, height)?;
        Some(Self {
            depth: depth.to_vec(),
            confidence: None,
            width,
            height,
            intrinsics,
            camera_to_world,
            tracking,
        })
    }

    /// Attaches a copy of a per-pixel confidence buffer.
    ///
    /// Returns `None` when the buffer does not match the frame's
    /// dimensions.
    #[must_use]
    pub fn with_confidence(mut self, confidence: &[u8]) -> Option<Self> {
        ConfidenceImage::new(confidence, self.width, self.height)?;
        self.confidence = Some(confidence.to_vec());
        Some(self)
    }

    /// Returns the frame dimensions `(width, height)` in pixels.
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns the camera intrinsics.
    #[must_use]
    pub const fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    /// Returns the camera-to-world transform.
    #[must_use]
    pub const fn camera_to_world(&self) -> &Isometry3<f64> {
        &self.camera_to_world
    }

    /// Returns the tracking quality reported for this frame.
    #[must_use]
    pub const fn tracking(&self) -> TrackingQuality {
        self.tracking
    }

    /// Borrows the depth buffer as a bounds-checked view.
    ///
    /// The dimensions were validated at construction, so this only
    /// returns `None` if the frame was built through unchecked means.
    #[must_use]
    pub fn depth_image(&self) -> Option<DepthImage<'_>> {
        DepthImage::new(&self.depth, self.width, self.height)
    }

    /// Borrows the confidence buffer as a bounds-checked view, if one
    /// was attached.
    #[must_use]
    pub fn confidence_image(&self) -> Option<ConfidenceImage<'_>> {
        self.confidence
            .as_deref()
            .and_then(|data| ConfidenceImage::new(data, self.width, self.height))
    }
}
