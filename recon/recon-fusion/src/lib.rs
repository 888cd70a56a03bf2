//! Truncated signed-distance volumetric fusion.
//!
//! This crate maintains the voxel grid at the heart of the reconstruction
//! pipeline: a dense 3D array of normalized signed distances and
//! accumulated weights. Noisy per-frame observations are fused into the
//! grid by running weighted average, producing a stable estimate of the
//! scanned surface.
//!
//! Two integration strategies are provided:
//!
//! - [`FusionVolume::integrate_depth`] - the primary, most accurate path:
//!   every voxel is projected into the camera and compared against the
//!   measured depth at that pixel.
//! - [`FusionVolume::integrate_points`] - an approximate fallback for
//!   batches that arrive as bare point clouds (for example from an
//!   external segmentation filter) with no per-pixel depth access.
//!
//! The grid has exactly one writer at a time; readers extract from a
//! [`Clone`]d snapshot if they need to run concurrently with fusion.
//!
//! # Example
//!
//! ```
//! use recon_fusion::{FusionVolume, VolumeConfig};
//! use recon_types::SampleCloud;
//! use nalgebra::Point3;
//!
//! let config = VolumeConfig::new((32, 32, 32), Point3::new(0.0, 0.0, 0.0), 0.01);
//! let mut volume = FusionVolume::new(config).unwrap();
//!
//! let cloud = SampleCloud::from_positions(&[Point3::new(0.16, 0.16, 0.16)]);
//! volume.integrate_points(&cloud, 1.0);
//! assert!(volume.observed_cell_count() > 0);
//!
//! volume.reset();
//! assert_eq!(volume.observed_cell_count(), 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod integrate;
mod volume;

pub use error::{FusionError, FusionResult};
pub use volume::{FusionVolume, VolumeConfig, VoxelCell};
