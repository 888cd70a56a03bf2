//! Bounds-checked views over raw sensor buffers.
//!
//! Depth and confidence data arrive from the camera session as flat
//! buffers with platform-supplied dimensions and row strides. These views
//! validate the descriptor against the buffer length at construction and
//! bounds-check every element access, so no offset arithmetic ever
//! dereferences past the buffer.

/// A read-only view over a dense depth buffer (meters, `f32`).
///
/// The row stride is expressed in elements and may exceed `width` for
/// padded buffers. Construction fails (`None`) when the descriptor does
/// not cover the buffer, which callers treat as an absent frame rather
/// than an error.
///
/// # Example
///
/// ```
/// use recon_types::DepthImage;
///
/// let data = vec![1.0f32; 6];
/// let image = DepthImage::new(&data, 3, 2).unwrap();
/// assert_eq!(image.get(2, 1), Some(1.0));
/// assert_eq!(image.get(3, 0), None);
///
/// // Descriptor mismatch yields no view
/// assert!(DepthImage::new(&data, 4, 2).is_none());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DepthImage<'a> {
    data: &'a [f32],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> DepthImage<'a> {
    /// Creates a view over a tightly packed buffer (stride == width).
    ///
    /// Returns `None` if the dimensions are zero or the buffer is too
    /// short.
    #[must_use]
    pub fn new(data: &'a [f32], width: usize, height: usize) -> Option<Self> {
        Self::with_stride(data, width, height, width)
    }

    /// Creates a view with an explicit row stride in elements.
    ///
    /// Returns `None` if the dimensions are zero, the stride is smaller
    /// than the width, or the buffer is too short for the descriptor.
    #[must_use]
    pub fn with_stride(
        data: &'a [f32],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Option<Self> {
        if width == 0 || height == 0 || stride < width {
            return None;
        }
        // The final row only needs `width` elements, not a full stride.
        let required = (height - 1).checked_mul(stride)?.checked_add(width)?;
        if data.len() < required {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Reads the depth at the given pixel.
    ///
    /// Returns `None` outside the image bounds.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            self.data.get(y * self.stride + x).copied()
        } else {
            None
        }
    }

    /// Computes the mean of finite, positive depth values, sampling every
    /// `sample_stride`-th pixel in both axes.
    ///
    /// Returns `None` when no valid depth was seen. Used to drive the
    /// adaptive sampling policy without a full-image pass.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_depth(&self, sample_stride: usize) -> Option<f64> {
        let step = sample_stride.max(1);
        let mut sum = 0.0;
        let mut count = 0u32;
        for y in (0..self.height).step_by(step) {
            for x in (0..self.width).step_by(step) {
                if let Some(d) = self.get(x, y) {
                    if d.is_finite() && d > 0.0 {
                        sum += f64::from(d);
                        count += 1;
                    }
                }
            }
        }
        if count == 0 {
            None
        } else {
            Some(sum / f64::from(count))
        }
    }
}

/// Coarse per-pixel confidence category reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfidenceLevel {
    /// Sensor reports low signal quality.
    Low,
    /// Sensor reports medium signal quality.
    Medium,
    /// Sensor reports high signal quality.
    High,
}

impl ConfidenceLevel {
    /// Maps the raw sensor byte (0, 1, 2) to a level.
    ///
    /// Out-of-range values clamp to `High`, matching the sensor contract
    /// where larger means more confident.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Low,
            1 => Self::Medium,
            _ => Self::High,
        }
    }

    /// Returns the scalar confidence value for this level.
    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Self::Low => 0.33,
            Self::Medium => 0.66,
            Self::High => 1.0,
        }
    }
}

/// A read-only view over a per-pixel confidence buffer.
///
/// Same shape contract as [`DepthImage`]; each element is a raw sensor
/// category byte.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceImage<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> ConfidenceImage<'a> {
    /// Creates a view over a tightly packed buffer (stride == width).
    ///
    /// Returns `None` if the dimensions are zero or the buffer is too
    /// short.
    #[must_use]
    pub fn new(data: &'a [u8], width: usize, height: usize) -> Option<Self> {
        Self::with_stride(data, width, height, width)
    }

    /// Creates a view with an explicit row stride in elements.
    #[must_use]
    pub fn with_stride(data: &'a [u8], width: usize, height: usize, stride: usize) -> Option<Self> {
        if width == 0 || height == 0 || stride < width {
            return None;
        }
        let required = (height - 1).checked_mul(stride)?.checked_add(width)?;
        if data.len() < required {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Reads the confidence level at the given pixel.
    ///
    /// Returns `None` outside the image bounds.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<ConfidenceLevel> {
        if x < self.width && y < self.height {
            self.data
                .get(y * self.stride + x)
                .map(|&raw| ConfidenceLevel::from_raw(raw))
        } else {
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_depth_image_rejects_bad_descriptor() {
        let data = vec![1.0f32; 10];
        assert!(DepthImage::new(&data, 0, 5).is_none());
        assert!(DepthImage::new(&data, 5, 0).is_none());
        assert!(DepthImage::new(&data, 11, 1).is_none());
        assert!(DepthImage::with_stride(&data, 5, 2, 4).is_none());
    }

    #[test]
    fn test_depth_image_strided_access() {
        // 2x2 image inside a stride-3 buffer
        let data = vec![1.0f32, 2.0, 9.0, 3.0, 4.0, 9.0];
        let image = DepthImage::with_stride(&data, 2, 2, 3).unwrap();
        assert_eq!(image.get(0, 0), Some(1.0));
        assert_eq!(image.get(1, 0), Some(2.0));
        assert_eq!(image.get(0, 1), Some(3.0));
        assert_eq!(image.get(1, 1), Some(4.0));
        // Padding is not addressable
        assert_eq!(image.get(2, 0), None);
    }

    #[test]
    fn test_depth_image_final_row_needs_no_padding() {
        // Height 2, stride 3, width 2: last row needs only 2 elements
        let data = vec![1.0f32, 2.0, 9.0, 3.0, 4.0];
        assert!(DepthImage::with_stride(&data, 2, 2, 3).is_some());
    }

    #[test]
    fn test_average_depth_skips_invalid() {
        let data = vec![1.0f32, f32::NAN, 3.0, -1.0];
        let image = DepthImage::new(&data, 2, 2).unwrap();
        assert_relative_eq!(image.average_depth(1).unwrap(), 2.0);
    }

    #[test]
    fn test_average_depth_all_invalid() {
        let data = vec![f32::NAN; 4];
        let image = DepthImage::new(&data, 2, 2).unwrap();
        assert!(image.average_depth(1).is_none());
    }

    #[test]
    fn test_confidence_levels() {
        assert_eq!(ConfidenceLevel::from_raw(0), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_raw(1), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_raw(2), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_raw(200), ConfidenceLevel::High);
        assert!(ConfidenceLevel::Low.value() < ConfidenceLevel::High.value());
    }

    #[test]
    fn test_confidence_image_access() {
        let data = vec![0u8, 1, 2, 2];
        let image = ConfidenceImage::new(&data, 2, 2).unwrap();
        assert_eq!(image.get(0, 0), Some(ConfidenceLevel::Low));
        assert_eq!(image.get(1, 1), Some(ConfidenceLevel::High));
        assert_eq!(image.get(2, 2), None);
    }
}
