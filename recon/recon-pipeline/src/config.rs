//! Scan session configuration.

use recon_denoise::DenoiseParams;
use recon_fusion::VolumeConfig;
use recon_measure::MeasureParams;
use recon_sample::SamplingPolicy;

use crate::error::{PipelineError, PipelineResult};

/// Configuration of a complete scan session.
///
/// Bundles the per-stage parameters so a session can be constructed,
/// validated, and handed to a background worker in one piece. There is
/// no global state; everything the pipeline tunes lives here.
///
/// # Example
///
/// ```
/// use recon_pipeline::ScanConfig;
/// use recon_fusion::VolumeConfig;
/// use nalgebra::Point3;
///
/// let config = ScanConfig::new(VolumeConfig::new(
///     (64, 64, 64),
///     Point3::new(-0.32, -0.32, 0.0),
///     0.01,
/// ));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Fusion grid configuration.
    pub volume: VolumeConfig,

    /// Adaptive sampling policy for depth frames.
    pub policy: SamplingPolicy,

    /// Denoiser parameters applied to point batches before fusion.
    pub denoise: DenoiseParams,

    /// Volume measurement parameters.
    pub measure: MeasureParams,

    /// Weight of one frame's observations in the running average.
    pub frame_weight: f64,
}

impl ScanConfig {
    /// Creates a configuration with default stage parameters around the
    /// given fusion grid.
    #[must_use]
    pub fn new(volume: VolumeConfig) -> Self {
        Self {
            volume,
            policy: SamplingPolicy::default(),
            denoise: DenoiseParams::default(),
            measure: MeasureParams::default(),
            frame_weight: 1.0,
        }
    }

    /// Overrides the sampling policy.
    #[must_use]
    pub fn with_policy(mut self, policy: SamplingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Overrides the denoiser parameters.
    #[must_use]
    pub fn with_denoise(mut self, denoise: DenoiseParams) -> Self {
        self.denoise = denoise;
        self
    }

    /// Overrides the measurement parameters.
    #[must_use]
    pub const fn with_measure(mut self, measure: MeasureParams) -> Self {
        self.measure = measure;
        self
    }

    /// Overrides the per-frame fusion weight.
    #[must_use]
    pub const fn with_frame_weight(mut self, frame_weight: f64) -> Self {
        self.frame_weight = frame_weight;
        self
    }

    /// Checks every stage's parameters for precondition violations.
    ///
    /// # Errors
    ///
    /// Returns the first stage error encountered, or
    /// [`PipelineError::InvalidConfig`] for a bad frame weight.
    pub fn validate(&self) -> PipelineResult<()> {
        self.volume.validate()?;
        self.policy.validate()?;
        self.denoise.validate()?;
        self.measure.validate()?;
        if !(self.frame_weight.is_finite() && self.frame_weight > 0.0) {
            return Err(PipelineError::InvalidConfig {
                reason: format!(
                    "frame weight {} must be positive and finite",
                    self.frame_weight
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn small_config() -> ScanConfig {
        ScanConfig::new(VolumeConfig::new((8, 8, 8), Point3::origin(), 0.01))
    }

    #[test]
    fn test_default_stages_validate() {
        assert!(small_config().validate().is_ok());
    }

    #[test]
    fn test_bad_frame_weight_rejected() {
        assert!(small_config().with_frame_weight(0.0).validate().is_err());
        assert!(small_config()
            .with_frame_weight(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_stage_errors_propagate() {
        let bad_volume = ScanConfig::new(VolumeConfig::new((0, 8, 8), Point3::origin(), 0.01));
        assert!(bad_volume.validate().is_err());

        let bad_denoise = small_config().with_denoise(DenoiseParams {
            blend_alpha: 2.0,
            ..DenoiseParams::default()
        });
        assert!(bad_denoise.validate().is_err());
    }
}
