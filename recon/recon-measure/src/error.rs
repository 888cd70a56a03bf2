//! Error types for measurement operations.

use thiserror::Error;

/// Result type for measurement operations.
pub type MeasureResult<T> = Result<T, MeasureError>;

/// Errors that can occur when configuring a measurement.
///
/// Degraded mesh data (degenerate triangles, out-of-range indices, an
/// entirely empty mesh) never produces an error; bad triangles are
/// skipped and an empty mesh yields `Ok(None)` from
/// [`compute_volume`](crate::compute_volume).
#[derive(Debug, Error)]
pub enum MeasureError {
    /// Measurement parameters violate a precondition.
    #[error("invalid measure parameters: {reason}")]
    InvalidParams {
        /// Description of the violated precondition.
        reason: String,
    },
}
