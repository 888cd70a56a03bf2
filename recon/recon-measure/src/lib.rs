//! Quality-driven mesh volume computation.
//!
//! Given any triangle mesh — extracted from the fusion grid or supplied
//! externally — this crate measures the mesh's topological quality and
//! computes a volume estimate with the most trustworthy applicable
//! algorithm, never by caller instruction alone:
//!
//! 1. Watertight meshes use exact **signed tetrahedra** summation.
//! 2. Open but decent single-sheet meshes use **surface integration**
//!    (projected area x average height).
//! 3. Everything else falls back to a **bounding-box approximation**.
//!
//! The result carries the quality descriptor, the method used, and a
//! derived confidence in `[0, 1]`.
//!
//! # Example
//!
//! ```
//! use recon_measure::{compute_volume, MeasureParams, VolumeMethod};
//! use recon_types::{cube_mesh, Point3};
//!
//! let cube = cube_mesh(Point3::origin(), 0.1);
//! let result = compute_volume(&cube, &MeasureParams::default())
//!     .unwrap()
//!     .unwrap();
//!
//! // 12 triangles is too few for the watertight heuristic, so the cube
//! // lands in the bounding-box fallback
//! assert_eq!(result.method, VolumeMethod::ConvexHullApprox);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod quality;
mod volume;

pub use error::{MeasureError, MeasureResult};
pub use quality::{analyze_mesh, MeshQuality, WatertightStrictness};
pub use volume::{compute_volume, MeasureParams, VolumeMethod, VolumeResult};
