//! Error types for the pipeline facade.

use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that can occur when configuring or driving a scan session.
///
/// Configuration problems surface here at session construction;
/// degraded frame data never does — malformed frames fuse as nothing
/// and an empty grid measures as `None`.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Fusion volume configuration is invalid.
    #[error(transparent)]
    Fusion(#[from] recon_fusion::FusionError),

    /// Sampling policy is invalid.
    #[error(transparent)]
    Sample(#[from] recon_sample::SampleError),

    /// Denoise parameters are invalid.
    #[error(transparent)]
    Denoise(#[from] recon_denoise::DenoiseError),

    /// Measure parameters are invalid.
    #[error(transparent)]
    Measure(#[from] recon_measure::MeasureError),

    /// Scan configuration violates a precondition.
    #[error("invalid scan configuration: {reason}")]
    InvalidConfig {
        /// Description of the violated precondition.
        reason: String,
    },

    /// The background fusion worker is no longer running.
    #[error("fusion worker has stopped")]
    WorkerStopped,
}
