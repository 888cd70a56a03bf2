//! Marching-cubes isosurface extraction.
//!
//! Walks a fused signed-distance grid cell by cell and emits a triangle
//! mesh wherever the field crosses zero, using the complete 256-case
//! lookup tables. Vertices are placed by linear interpolation along cell
//! edges, welded exactly across adjacent cells, and given normals from
//! the local gradient of the field.
//!
//! Cells touching any never-observed voxel are skipped, so extracting
//! from an empty grid yields an empty mesh rather than spurious geometry.
//!
//! # Example
//!
//! ```
//! use recon_extract::extract_surface;
//! use recon_fusion::{FusionVolume, VolumeConfig};
//! use nalgebra::Point3;
//!
//! let volume = FusionVolume::new(VolumeConfig::new(
//!     (8, 8, 8),
//!     Point3::origin(),
//!     0.01,
//! ))
//! .unwrap();
//!
//! // Nothing observed yet: the surface is empty
//! let mesh = extract_surface(&volume);
//! assert!(mesh.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod extract;
mod tables;

pub use extract::extract_surface;
