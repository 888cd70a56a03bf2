//! Axis-aligned bounding box.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in 3D space.
///
/// An empty box has `min > max` componentwise and grows to fit the first
/// point included in it.
///
/// # Example
///
/// ```
/// use recon_types::Aabb;
/// use nalgebra::Point3;
///
/// let aabb = Aabb::from_points([
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(2.0, 1.0, 3.0),
/// ].iter());
/// assert_eq!(aabb.extents(), nalgebra::Vector3::new(2.0, 1.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Aabb {
    /// Creates an empty bounding box.
    ///
    /// # Example
    ///
    /// ```
    /// use recon_types::Aabb;
    ///
    /// assert!(Aabb::empty().is_empty());
    /// ```
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Creates a bounding box from explicit corners.
    #[must_use]
    pub const fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Computes the bounding box of a set of points.
    ///
    /// Returns an empty box for an empty iterator.
    #[must_use]
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let mut aabb = Self::empty();
        for p in points {
            aabb.include(*p);
        }
        aabb
    }

    /// Grows the box to contain the given point.
    pub fn include(&mut self, p: Point3<f64>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Returns true if the box contains no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Returns the center of the box.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        Point3::from((self.min.coords + self.max.coords) / 2.0)
    }

    /// Returns the size of the box along each axis.
    ///
    /// Returns a zero vector for an empty box.
    #[must_use]
    pub fn extents(&self) -> Vector3<f64> {
        if self.is_empty() {
            Vector3::zeros()
        } else {
            self.max - self.min
        }
    }

    /// Returns the volume of the box.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let e = self.extents();
        e.x * e.y * e.z
    }

    /// Returns true if the box contains the given point (inclusive).
    #[must_use]
    pub fn contains(&self, p: Point3<f64>) -> bool {
        p.x >= self.min.x
            && p.y >= self.min.y
            && p.z >= self.min.z
            && p.x <= self.max.x
            && p.y <= self.max.y
            && p.z <= self.max.z
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty() {
        let aabb = Aabb::empty();
        assert!(aabb.is_empty());
        assert_relative_eq!(aabb.volume(), 0.0);
    }

    #[test]
    fn test_from_points() {
        let points = [
            Point3::new(-1.0, 0.0, 2.0),
            Point3::new(3.0, -2.0, 1.0),
            Point3::new(0.0, 5.0, 0.0),
        ];
        let aabb = Aabb::from_points(points.iter());
        assert_eq!(aabb.min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Point3::new(3.0, 5.0, 2.0));
    }

    #[test]
    fn test_center_and_extents() {
        let aabb = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, 6.0));
        assert_eq!(aabb.center(), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.extents(), Vector3::new(2.0, 4.0, 6.0));
        assert_relative_eq!(aabb.volume(), 48.0);
    }

    #[test]
    fn test_contains() {
        let aabb = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        assert!(aabb.contains(Point3::new(0.5, 0.5, 0.5)));
        assert!(aabb.contains(Point3::new(0.0, 1.0, 0.0)));
        assert!(!aabb.contains(Point3::new(1.5, 0.5, 0.5)));
    }
}
