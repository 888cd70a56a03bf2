//! A concrete triangle with resolved vertex positions.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A triangle defined by three vertex positions.
///
/// Vertices are ordered counter-clockwise when viewed from outside, so
/// [`Triangle::normal`] points outward by the right-hand rule.
///
/// # Example
///
/// ```
/// use recon_types::Triangle;
/// use nalgebra::Point3;
///
/// let tri = Triangle::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// );
/// assert!((tri.area() - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Triangle {
    /// First vertex.
    pub v0: Point3<f64>,
    /// Second vertex.
    pub v1: Point3<f64>,
    /// Third vertex.
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Creates a triangle from three vertex positions.
    #[inline]
    #[must_use]
    pub const fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Computes the area of the triangle.
    #[must_use]
    pub fn area(&self) -> f64 {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        e1.cross(&e2).norm() / 2.0
    }

    /// Computes the unit normal of the triangle.
    ///
    /// Returns `None` for degenerate (zero-area) triangles.
    #[must_use]
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        let cross = e1.cross(&e2);
        let norm = cross.norm();
        if norm > f64::EPSILON {
            Some(cross / norm)
        } else {
            None
        }
    }

    /// Computes the centroid of the triangle.
    #[must_use]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    /// Returns true if the triangle has near-zero area.
    #[must_use]
    pub fn is_degenerate(&self, area_threshold: f64) -> bool {
        self.area() < area_threshold
    }
}
