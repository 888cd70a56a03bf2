//! Spatial-hash point cloud denoising.
//!
//! This crate smooths high-frequency noise out of sampled point clouds
//! before fusion, preserving large-scale shape. Each point is blended
//! toward the centroid of its neighborhood, found through a spatial hash
//! rather than a quadratic all-pairs scan.
//!
//! This is a local smoothing pass, not an outlier-rejection pass: the
//! output always has exactly as many points as the input, and points with
//! no neighbors are left unchanged.
//!
//! # Example
//!
//! ```
//! use recon_denoise::{denoise_cloud, DenoiseParams};
//! use recon_types::SampleCloud;
//! use nalgebra::Point3;
//!
//! let cloud = SampleCloud::from_positions(&[
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(0.01, 0.0, 0.0),
//!     Point3::new(0.0, 0.01, 0.0),
//! ]);
//!
//! let result = denoise_cloud(&cloud, &DenoiseParams::for_scans()).unwrap();
//! assert_eq!(result.cloud.len(), cloud.len());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod hash;
mod smooth;

pub use error::DenoiseError;
pub use hash::SpatialHash;
pub use smooth::{denoise_cloud, DenoiseParams, DenoiseResult};
