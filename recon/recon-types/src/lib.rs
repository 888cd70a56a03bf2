//! Core value types for the recon scan-to-volume pipeline.
//!
//! This crate provides the foundational types shared by every stage of the
//! reconstruction pipeline:
//!
//! - [`Vertex`] - A point in 3D space with an optional normal
//! - [`TriangleMesh`] - A triangle mesh with indexed vertices
//! - [`Triangle`] - A concrete triangle with resolved vertex positions
//! - [`Aabb`] - Axis-aligned bounding box
//! - [`SamplePoint`] / [`SampleCloud`] - Per-frame depth samples
//! - [`DepthImage`] / [`ConfidenceImage`] - Bounds-checked views over raw
//!   sensor buffers
//! - [`CameraIntrinsics`] / [`TrackingQuality`] - Camera session inputs
//!
//! # Units
//!
//! All coordinates are `f64` meters. Depth buffers arrive as `f32` (sensor
//! native) and are widened on extraction.
//!
//! # Coordinate System
//!
//! World space is right-handed. Camera space follows the pinhole convention:
//! X right, Y down, Z forward (depth is the camera-space Z coordinate).
//! Face winding is counter-clockwise when viewed from outside, so normals
//! point outward by the right-hand rule.
//!
//! # Example
//!
//! ```
//! use recon_types::{TriangleMesh, Vertex, Point3};
//!
//! let mut mesh = TriangleMesh::new();
//! mesh.vertices.push(Vertex::new(Point3::new(0.0, 0.0, 0.0)));
//! mesh.vertices.push(Vertex::new(Point3::new(1.0, 0.0, 0.0)));
//! mesh.vertices.push(Vertex::new(Point3::new(0.5, 1.0, 0.0)));
//! mesh.faces.push([0, 1, 2]);
//!
//! assert_eq!(mesh.face_count(), 1);
//! assert!(!mesh.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bounds;
mod camera;
mod cloud;
mod depth;
mod mesh;
mod triangle;
mod vertex;

pub use bounds::Aabb;
pub use camera::{CameraIntrinsics, TrackingQuality};
pub use cloud::{SampleCloud, SamplePoint};
pub use depth::{ConfidenceImage, ConfidenceLevel, DepthImage};
pub use mesh::{cube_mesh, TriangleMesh};
pub use triangle::Triangle;
pub use vertex::Vertex;

// Re-export nalgebra types for convenience
pub use nalgebra::{Isometry3, Point3, Vector3};
