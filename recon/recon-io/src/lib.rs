//! Plain-text interchange formats for meshes and point clouds.
//!
//! The reconstruction core has no persisted state of its own; this crate
//! provides the serializable representations its outputs cross the
//! process boundary in — for debugging, external tooling, and mesh
//! export:
//!
//! - [`save_obj`] / [`load_obj`] - Wavefront OBJ triangle meshes
//! - [`save_xyz`] / [`load_xyz`] - one-point-per-line XYZ clouds
//!
//! Both formats are line-oriented text; malformed lines are reported as
//! [`IoError::InvalidContent`] with the offending line number.
//!
//! # Example
//!
//! ```
//! use recon_io::{read_obj, write_obj};
//! use recon_types::{cube_mesh, Point3};
//!
//! let cube = cube_mesh(Point3::origin(), 1.0);
//! let mut buffer = Vec::new();
//! write_obj(&cube, &mut buffer).unwrap();
//!
//! let loaded = read_obj(buffer.as_slice()).unwrap();
//! assert_eq!(loaded.face_count(), 12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod obj;
mod xyz;

pub use error::{IoError, IoResult};
pub use obj::{load_obj, read_obj, save_obj, write_obj};
pub use xyz::{load_xyz, read_xyz, save_xyz, write_xyz};
