//! Point sample types produced by depth-frame extraction.

use crate::Aabb;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single depth sample: world-space position, unit normal, and a
/// confidence scalar in `[0, 1]`.
///
/// # Example
///
/// ```
/// use recon_types::SamplePoint;
/// use nalgebra::{Point3, Vector3};
///
/// let p = SamplePoint::new(Point3::new(0.0, 0.0, 1.0), Vector3::z(), 0.9);
/// assert!((p.confidence - 0.9).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SamplePoint {
    /// World-space position.
    pub position: Point3<f64>,

    /// Unit normal. Defaults to the camera-facing direction when no richer
    /// normal is available.
    pub normal: Vector3<f64>,

    /// Measurement confidence in `[0, 1]`.
    pub confidence: f64,
}

impl SamplePoint {
    /// Creates a new sample point.
    #[inline]
    #[must_use]
    pub const fn new(position: Point3<f64>, normal: Vector3<f64>, confidence: f64) -> Self {
        Self {
            position,
            normal,
            confidence,
        }
    }
}

/// A transient per-frame collection of depth samples.
///
/// Clouds are produced per frame, optionally denoised, fused into the
/// volumetric grid, and then discarded; they are never retained past
/// fusion.
///
/// # Example
///
/// ```
/// use recon_types::SampleCloud;
/// use nalgebra::{Point3, Vector3};
///
/// let mut cloud = SampleCloud::new();
/// cloud.push_position(Point3::new(0.0, 0.0, 0.0));
/// cloud.push_position(Point3::new(1.0, 0.0, 0.0));
/// assert_eq!(cloud.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SampleCloud {
    /// The samples in this cloud.
    pub points: Vec<SamplePoint>,
}

impl SampleCloud {
    /// Creates an empty cloud.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Creates a cloud with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Creates a cloud from bare positions.
    ///
    /// Normals default to +Z and confidence to 1.0.
    #[must_use]
    pub fn from_positions(positions: &[Point3<f64>]) -> Self {
        let points = positions
            .iter()
            .map(|&p| SamplePoint::new(p, Vector3::z(), 1.0))
            .collect();
        Self { points }
    }

    /// Returns the number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the cloud has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Adds a sample.
    pub fn push(&mut self, point: SamplePoint) {
        self.points.push(point);
    }

    /// Adds a sample at the given position with a default normal and full
    /// confidence.
    pub fn push_position(&mut self, position: Point3<f64>) {
        self.points
            .push(SamplePoint::new(position, Vector3::z(), 1.0));
    }

    /// Computes the centroid of all sample positions.
    ///
    /// Returns `None` for an empty cloud.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.points.is_empty() {
            return None;
        }
        let sum: Vector3<f64> = self.points.iter().map(|p| p.position.coords).sum();
        Some(Point3::from(sum / self.points.len() as f64))
    }

    /// Computes the axis-aligned bounding box of all sample positions.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.points.iter().map(|p| &p.position))
    }

    /// Computes the mean confidence of all samples.
    ///
    /// Returns 0.0 for an empty cloud.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_confidence(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.points.iter().map(|p| p.confidence).sum::<f64>() / self.points.len() as f64
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_cloud() {
        let cloud = SampleCloud::new();
        assert!(cloud.is_empty());
        assert!(cloud.centroid().is_none());
        assert_relative_eq!(cloud.average_confidence(), 0.0);
        assert!(cloud.bounds().is_empty());
    }

    #[test]
    fn test_centroid() {
        let cloud = SampleCloud::from_positions(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(1.0, 3.0, 0.0),
        ]);
        let c = cloud.centroid().unwrap();
        assert_relative_eq!(c.x, 1.0);
        assert_relative_eq!(c.y, 1.0);
    }

    #[test]
    fn test_average_confidence() {
        let mut cloud = SampleCloud::new();
        cloud.push(SamplePoint::new(Point3::origin(), Vector3::z(), 0.5));
        cloud.push(SamplePoint::new(Point3::origin(), Vector3::z(), 1.0));
        assert_relative_eq!(cloud.average_confidence(), 0.75);
    }
}
