//! Camera session input types.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pinhole camera intrinsics.
///
/// Maps between camera-space points (X right, Y down, Z forward) and
/// pixel coordinates. Depth is the camera-space Z coordinate.
///
/// # Example
///
/// ```
/// use recon_types::CameraIntrinsics;
/// use nalgebra::Point3;
///
/// let intr = CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0);
/// let p = intr.back_project(320.0, 240.0, 2.0);
/// assert_eq!(p, Point3::new(0.0, 0.0, 2.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CameraIntrinsics {
    /// Focal length in pixels, X axis.
    pub fx: f64,
    /// Focal length in pixels, Y axis.
    pub fy: f64,
    /// Principal point X in pixels.
    pub cx: f64,
    /// Principal point Y in pixels.
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Creates new intrinsics.
    #[inline]
    #[must_use]
    pub const fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Returns true if the focal lengths are finite and non-zero.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.fx.is_finite()
            && self.fy.is_finite()
            && self.cx.is_finite()
            && self.cy.is_finite()
            && self.fx.abs() > f64::EPSILON
            && self.fy.abs() > f64::EPSILON
    }

    /// Projects a camera-space point to pixel coordinates.
    ///
    /// Returns `None` for points at or behind the camera plane.
    #[must_use]
    pub fn project(&self, p: Point3<f64>) -> Option<(f64, f64)> {
        if p.z <= 0.0 {
            return None;
        }
        let u = p.x * self.fx / p.z + self.cx;
        let v = p.y * self.fy / p.z + self.cy;
        Some((u, v))
    }

    /// Back-projects a pixel at the given depth to a camera-space point.
    #[must_use]
    pub fn back_project(&self, u: f64, v: f64, depth: f64) -> Point3<f64> {
        Point3::new(
            (u - self.cx) * depth / self.fx,
            (v - self.cy) * depth / self.fy,
            depth,
        )
    }
}

/// Coarse tracking quality reported by the camera session.
///
/// Drives the adaptive sampling stride: degraded tracking coarsens
/// sampling so untrustworthy frames contribute less data to fusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrackingQuality {
    /// Tracking is nominal.
    #[default]
    Normal,
    /// Tracking is degraded (fast motion, low light, low feature count).
    Limited,
    /// Tracking is lost; pose data is untrustworthy.
    Unavailable,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_project_round_trip() {
        let intr = CameraIntrinsics::new(500.0, 400.0, 320.0, 240.0);
        let p = Point3::new(0.3, -0.2, 1.5);
        let (u, v) = intr.project(p).unwrap();
        let back = intr.back_project(u, v, p.z);
        assert_relative_eq!(back.x, p.x, epsilon = 1e-12);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-12);
        assert_relative_eq!(back.z, p.z, epsilon = 1e-12);
    }

    #[test]
    fn test_project_behind_camera() {
        let intr = CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0);
        assert!(intr.project(Point3::new(0.0, 0.0, -1.0)).is_none());
        assert!(intr.project(Point3::new(0.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_is_valid() {
        assert!(CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0).is_valid());
        assert!(!CameraIntrinsics::new(0.0, 500.0, 320.0, 240.0).is_valid());
        assert!(!CameraIntrinsics::new(f64::NAN, 500.0, 320.0, 240.0).is_valid());
    }

    #[test]
    fn test_tracking_quality_default() {
        assert_eq!(TrackingQuality::default(), TrackingQuality::Normal);
    }
}
