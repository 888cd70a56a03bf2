//! Distance- and tracking-adaptive sampling policy.

use recon_types::TrackingQuality;

use crate::error::{SampleError, SampleResult};

/// Controls the pixel stride used when extracting points from a depth
/// image.
///
/// The stride is computed per batch from the average scene depth and the
/// tracking quality: closer scenes use the smallest stride (finest
/// sampling), farther scenes the largest, `Limited` tracking adds a fixed
/// penalty, and `Unavailable` tracking forces the coarsest stride.
///
/// # Example
///
/// ```
/// use recon_sample::SamplingPolicy;
/// use recon_types::TrackingQuality;
///
/// let policy = SamplingPolicy::default();
/// let fine = policy.stride_for(0.2, TrackingQuality::Normal);
/// let coarse = policy.stride_for(3.0, TrackingQuality::Normal);
/// assert!(fine < coarse);
/// ```
#[derive(Debug, Clone)]
pub struct SamplingPolicy {
    /// Smallest stride, used for near scenes with good tracking.
    pub min_stride: usize,

    /// Largest stride, used for far scenes or lost tracking.
    pub max_stride: usize,

    /// Scenes closer than this (meters) use `min_stride`.
    pub near_depth: f64,

    /// Scenes farther than this (meters) use `max_stride`.
    pub far_depth: f64,

    /// Depth values below this (meters) are discarded as sensor noise.
    pub min_depth: f64,

    /// Depth values above this (meters) are discarded as out of range.
    pub max_depth: f64,

    /// Extra stride added when tracking is `Limited`.
    pub limited_penalty: usize,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            min_stride: 2,
            max_stride: 8,
            near_depth: 0.3,
            far_depth: 2.0,
            min_depth: 0.1,
            max_depth: 5.0,
            limited_penalty: 2,
        }
    }
}

impl SamplingPolicy {
    /// Creates a policy with explicit stride bounds, validating the
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::InvalidPolicy`] if `min_stride` is zero,
    /// the stride bounds are inverted, or the depth bands are not
    /// positive and increasing.
    pub fn new(min_stride: usize, max_stride: usize) -> SampleResult<Self> {
        let policy = Self {
            min_stride,
            max_stride,
            ..Self::default()
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Checks the policy for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::InvalidPolicy`] describing the first
    /// inconsistency found.
    pub fn validate(&self) -> SampleResult<()> {
        if self.min_stride == 0 {
            return Err(SampleError::InvalidPolicy {
                reason: "min_stride must be at least 1".to_string(),
            });
        }
        if self.max_stride < self.min_stride {
            return Err(SampleError::InvalidPolicy {
                reason: format!(
                    "max_stride ({}) must be >= min_stride ({})",
                    self.max_stride, self.min_stride
                ),
            });
        }
        if !(self.near_depth > 0.0 && self.far_depth > self.near_depth) {
            return Err(SampleError::InvalidPolicy {
                reason: "depth bands must satisfy 0 < near_depth < far_depth".to_string(),
            });
        }
        if !(self.min_depth > 0.0 && self.max_depth > self.min_depth) {
            return Err(SampleError::InvalidPolicy {
                reason: "depth range must satisfy 0 < min_depth < max_depth".to_string(),
            });
        }
        Ok(())
    }

    /// Computes the pixel stride for a batch.
    ///
    /// `average_depth` is the mean valid scene depth in meters.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    #[allow(clippy::cast_sign_loss)]
    pub fn stride_for(&self, average_depth: f64, tracking: TrackingQuality) -> usize {
        if tracking == TrackingQuality::Unavailable {
            return self.max_stride;
        }

        let base = if average_depth < self.near_depth {
            self.min_stride
        } else if average_depth > self.far_depth {
            self.max_stride
        } else {
            // Linear ramp between the stride bounds across the depth band
            let t = (average_depth - self.near_depth) / (self.far_depth - self.near_depth);
            let span = (self.max_stride - self.min_stride) as f64;
            self.min_stride + (t * span).round() as usize
        };

        let stride = if tracking == TrackingQuality::Limited {
            base + self.limited_penalty
        } else {
            base
        };

        stride.clamp(self.min_stride, self.max_stride)
    }
}
