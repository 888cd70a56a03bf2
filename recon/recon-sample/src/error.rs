//! Error types for sampling operations.

use thiserror::Error;

/// Result type for sampling operations.
pub type SampleResult<T> = Result<T, SampleError>;

/// Errors that can occur when configuring the sampler.
///
/// Malformed frame data never produces an error; it produces an empty
/// cloud, since absent data is a normal degraded-input case.
#[derive(Debug, Error)]
pub enum SampleError {
    /// Sampling policy parameters are inconsistent.
    #[error("invalid sampling policy: {reason}")]
    InvalidPolicy {
        /// Description of the inconsistency.
        reason: String,
    },
}
