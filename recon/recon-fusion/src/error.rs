//! Error types for fusion operations.

use thiserror::Error;

/// Result type for fusion operations.
pub type FusionResult<T> = Result<T, FusionError>;

/// Errors that can occur when constructing a fusion volume.
///
/// Degraded frame data (non-finite depths, empty clouds, out-of-image
/// projections) never produces an error; offending elements are skipped
/// during integration instead.
#[derive(Debug, Error)]
pub enum FusionError {
    /// Volume configuration violates a precondition.
    #[error("invalid volume configuration: {reason}")]
    InvalidConfig {
        /// Description of the violated precondition.
        reason: String,
    },
}
