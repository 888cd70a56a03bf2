//! Adaptive depth-to-point extraction.
//!
//! This crate converts a depth image (plus optional confidence image,
//! camera intrinsics, and camera-to-world transform) into a
//! [`SampleCloud`](recon_types::SampleCloud) of world-space points,
//! normals, and confidences.
//!
//! Sampling density adapts per batch: close scenes are sampled finely,
//! far scenes coarsely, and degraded tracking coarsens sampling further so
//! untrustworthy frames pollute fusion less. See [`SamplingPolicy`].
//!
//! # Example
//!
//! ```
//! use recon_sample::{sample_depth_image, SamplingPolicy};
//! use recon_types::{CameraIntrinsics, DepthImage, TrackingQuality};
//! use nalgebra::Isometry3;
//!
//! let depth = vec![1.0f32; 64 * 48];
//! let image = DepthImage::new(&depth, 64, 48).unwrap();
//! let intrinsics = CameraIntrinsics::new(50.0, 50.0, 32.0, 24.0);
//!
//! let cloud = sample_depth_image(
//!     &image,
//!     None,
//!     &intrinsics,
//!     &Isometry3::identity(),
//!     TrackingQuality::Normal,
//!     &SamplingPolicy::default(),
//! );
//! assert!(!cloud.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod policy;
mod sampler;

pub use error::{SampleError, SampleResult};
pub use policy::SamplingPolicy;
pub use sampler::sample_depth_image;
