//! Mesh vertex type.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A mesh vertex: a 3D position with an optional unit normal.
///
/// # Example
///
/// ```
/// use recon_types::Vertex;
/// use nalgebra::{Point3, Vector3};
///
/// let plain = Vertex::from_coords(1.0, 2.0, 3.0);
/// assert!(plain.normal.is_none());
///
/// let lit = Vertex::with_normal(Point3::new(0.0, 0.0, 0.0), Vector3::z());
/// assert!(lit.has_normal());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// The 3D position of the vertex.
    pub position: Point3<f64>,

    /// Optional unit normal vector at this vertex.
    pub normal: Option<Vector3<f64>>,
}

impl Vertex {
    /// Creates a vertex with just a position.
    #[inline]
    #[must_use]
    pub const fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            normal: None,
        }
    }

    /// Creates a vertex from x, y, z coordinates.
    ///
    /// # Example
    ///
    /// ```
    /// use recon_types::Vertex;
    ///
    /// let v = Vertex::from_coords(1.0, 2.0, 3.0);
    /// assert_eq!(v.position.y, 2.0);
    /// ```
    #[inline]
    #[must_use]
    pub const fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Creates a vertex with a position and normal.
    #[inline]
    #[must_use]
    pub const fn with_normal(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            position,
            normal: Some(normal),
        }
    }

    /// Returns true if this vertex carries a normal.
    #[inline]
    #[must_use]
    pub const fn has_normal(&self) -> bool {
        self.normal.is_some()
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new(Point3::origin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_no_normal() {
        let v = Vertex::new(Point3::new(1.0, 2.0, 3.0));
        assert!(!v.has_normal());
        assert_eq!(v.position, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_with_normal() {
        let v = Vertex::with_normal(Point3::origin(), Vector3::z());
        assert!(v.has_normal());
        assert_eq!(v.normal, Some(Vector3::z()));
    }

    #[test]
    fn test_default_is_origin() {
        let v = Vertex::default();
        assert_eq!(v.position, Point3::origin());
        assert!(v.normal.is_none());
    }
}
