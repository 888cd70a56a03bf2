//! Error types for denoising operations.

use thiserror::Error;

/// Errors that can occur when configuring the denoiser.
#[derive(Debug, Error)]
pub enum DenoiseError {
    /// Denoising parameters are inconsistent.
    #[error("invalid denoise parameters: {reason}")]
    InvalidParams {
        /// Description of the inconsistency.
        reason: String,
    },
}
