//! End-to-end facade for the recon scan-to-volume pipeline.
//!
//! This umbrella crate re-exports the stage crates and wires them into
//! two ready-made drivers:
//!
//! - [`ScanSession`] - synchronous, single-writer owner of one fusion
//!   grid: feed it frames, extract meshes, measure volumes.
//! - [`FusionWorker`] - the same session on a background thread behind
//!   an ordered frame queue, for producer/consumer scan loops.
//!
//! # Pipeline
//!
//! Data flows strictly downward: depth frames (or external point
//! batches) are sampled into points, denoised, fused into the
//! signed-distance grid, extracted as a triangle mesh, and measured.
//!
//! ```
//! use recon_pipeline::{DepthFrame, ScanConfig, ScanSession};
//! use recon_fusion::VolumeConfig;
//! use recon_types::{CameraIntrinsics, TrackingQuality};
//! use nalgebra::{Isometry3, Point3};
//!
//! let config = ScanConfig::new(VolumeConfig::new(
//!     (32, 32, 32),
//!     Point3::new(-0.16, -0.16, 0.2),
//!     0.01,
//! ));
//! let mut session = ScanSession::new(config).unwrap();
//!
//! let depth = vec![0.35f32; 64 * 64];
//! let frame = DepthFrame::new(
//!     &depth,
//!     64,
//!     64,
//!     CameraIntrinsics::new(64.0, 64.0, 32.0, 32.0),
//!     Isometry3::identity(),
//!     TrackingQuality::Normal,
//! )
//! .unwrap();
//!
//! session.integrate_depth_frame(&frame);
//! let mesh = session.extract_mesh();
//! assert!(!mesh.is_empty());
//! ```
//!
//! # Module Organization
//!
//! - [`types`] - Core value types: `TriangleMesh`, `SampleCloud`, views
//! - [`sample`] - Adaptive depth-to-point extraction
//! - [`denoise`] - Spatial-hash point-cloud smoothing
//! - [`fusion`] - The truncated signed-distance grid
//! - [`extract`] - Marching-cubes isosurface extraction
//! - [`measure`] - Quality-driven volume computation
//! - [`io`] - Plain-text OBJ/XYZ interchange

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod config;
mod error;
mod frame;
mod session;
mod worker;

pub use config::ScanConfig;
pub use error::{PipelineError, PipelineResult};
pub use frame::DepthFrame;
pub use session::ScanSession;
pub use worker::FusionWorker;

/// Core value types: `TriangleMesh`, `SampleCloud`, bounds-checked views.
pub use recon_types as types;

/// Adaptive depth-to-point extraction.
pub use recon_sample as sample;

/// Spatial-hash point-cloud smoothing.
pub use recon_denoise as denoise;

/// The truncated signed-distance grid.
pub use recon_fusion as fusion;

/// Marching-cubes isosurface extraction.
pub use recon_extract as extract;

/// Quality-driven volume computation.
pub use recon_measure as measure;

/// Plain-text OBJ/XYZ interchange.
pub use recon_io as io;
