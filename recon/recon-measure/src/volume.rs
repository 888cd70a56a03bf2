//! Volume computation and algorithm selection.

use recon_types::{Aabb, TriangleMesh};
use tracing::debug;

use crate::error::{MeasureError, MeasureResult};
use crate::quality::{analyze_mesh, MeshQuality, WatertightStrictness, DEGENERATE_AREA_THRESHOLD};

/// Quality score above which an open mesh is trusted as a single-sheet
/// height field.
const SURFACE_INTEGRATION_MIN_QUALITY: f64 = 0.5;

/// Empirical ratio of an irregular object's volume to its bounding box.
const BOUNDING_BOX_FILL_FACTOR: f64 = 0.7;

/// Confidence bonus for input that was smoothed upstream.
const SMOOTHED_INPUT_BONUS: f64 = 1.1;

/// The volume algorithm actually used for a measurement.
///
/// Selection is a strict, ordered decision driven by measured mesh
/// quality, never by caller instruction alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeMethod {
    /// Exact signed-tetrahedra decomposition about the mesh centroid.
    /// Used whenever the mesh is watertight; exact for any closed,
    /// consistently wound mesh regardless of convexity.
    SignedTetrahedra,

    /// Projected-area times average-height integration. Accurate for
    /// single-sheet height-field surfaces such as an open-topped scan;
    /// not meaningful for self-occluding geometry.
    SurfaceIntegration,

    /// Axis-aligned bounding box volume scaled by an empirical fill
    /// factor. Least accurate; used only when nothing better applies.
    ConvexHullApprox,
}

impl VolumeMethod {
    /// Confidence multiplier reflecting the method's trustworthiness.
    #[must_use]
    pub const fn confidence_multiplier(self) -> f64 {
        match self {
            Self::SignedTetrahedra => 1.0,
            Self::SurfaceIntegration => 0.9,
            Self::ConvexHullApprox => 0.7,
        }
    }
}

/// Parameters for a volume measurement.
///
/// # Example
///
/// ```
/// use recon_measure::{MeasureParams, WatertightStrictness};
///
/// let params = MeasureParams::default()
///     .with_strictness(WatertightStrictness::Exact)
///     .with_calibration_scale(1.02);
/// assert!(!params.smoothed_input);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MeasureParams {
    /// How watertightness is decided during quality analysis.
    pub strictness: WatertightStrictness,

    /// Optional linear scale correction from an external calibration
    /// source. Volume is corrected by the cube of this factor and
    /// surface area by its square, since those quantities scale with
    /// the cube and square of a linear dimension.
    pub calibration_scale: Option<f64>,

    /// Whether the mesh came from input that was smoothed upstream;
    /// grants a small confidence bonus.
    pub smoothed_input: bool,
}

impl MeasureParams {
    /// Overrides the watertightness strictness.
    #[must_use]
    pub const fn with_strictness(mut self, strictness: WatertightStrictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Sets the linear calibration scale factor.
    #[must_use]
    pub const fn with_calibration_scale(mut self, scale: f64) -> Self {
        self.calibration_scale = Some(scale);
        self
    }

    /// Marks the input as smoothed upstream.
    #[must_use]
    pub const fn with_smoothed_input(mut self, smoothed: bool) -> Self {
        self.smoothed_input = smoothed;
        self
    }

    /// Checks the parameters for precondition violations.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::InvalidParams`] if the calibration scale
    /// is present but not finite and positive.
    pub fn validate(&self) -> MeasureResult<()> {
        if let Some(scale) = self.calibration_scale {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(MeasureError::InvalidParams {
                    reason: format!("calibration scale {scale} must be positive and finite"),
                });
            }
        }
        Ok(())
    }
}

/// An immutable volume measurement.
///
/// Constructed by [`compute_volume`]; ownership transfers to the caller
/// and the value is safe to share read-only across threads.
#[derive(Debug, Clone, Copy)]
pub struct VolumeResult {
    /// Signed volume in cubic meters, before taking the absolute value.
    /// Negative for inward-wound closed meshes.
    pub signed_volume: f64,

    /// Absolute, calibration-corrected volume in cubic meters.
    pub volume: f64,

    /// Calibration-corrected surface area in square meters.
    pub surface_area: f64,

    /// The algorithm that produced the estimate.
    pub method: VolumeMethod,

    /// Quality descriptor of the measured mesh.
    pub quality: MeshQuality,

    /// Trust in the estimate, in `[0, 1]`.
    pub confidence: f64,
}

impl VolumeResult {
    /// Volume in cubic meters.
    #[must_use]
    pub const fn cubic_meters(&self) -> f64 {
        self.volume
    }

    /// Volume in cubic centimeters.
    #[must_use]
    pub fn cubic_centimeters(&self) -> f64 {
        self.volume * 1.0e6
    }

    /// Volume in liters.
    #[must_use]
    pub fn liters(&self) -> f64 {
        self.volume * 1.0e3
    }
}

/// Measures the volume of a mesh with the most trustworthy applicable
/// algorithm.
///
/// Quality is analyzed fresh, then the algorithm is selected strictly in
/// order: watertight meshes use signed tetrahedra; open meshes with a
/// quality score above 0.5 use surface integration; everything else
/// falls back to the bounding-box approximation.
///
/// Returns `Ok(None)` when the mesh has no usable triangles at all —
/// absence of data is a normal degraded-input case, not an error.
///
/// # Errors
///
/// Returns [`MeasureError::InvalidParams`] for invalid parameters.
pub fn compute_volume(
    mesh: &TriangleMesh,
    params: &MeasureParams,
) -> MeasureResult<Option<VolumeResult>> {
    params.validate()?;

    let quality = analyze_mesh(mesh, params.strictness);
    if quality.triangle_count == 0 {
        debug!("no usable triangles; volume unavailable");
        return Ok(None);
    }

    let (method, signed_volume) = if quality.is_watertight {
        (VolumeMethod::SignedTetrahedra, signed_tetrahedra(mesh))
    } else if quality.quality_score > SURFACE_INTEGRATION_MIN_QUALITY {
        (VolumeMethod::SurfaceIntegration, surface_integration(mesh))
    } else {
        (VolumeMethod::ConvexHullApprox, convex_hull_approx(mesh))
    };

    let scale = params.calibration_scale.unwrap_or(1.0);
    let signed_volume = signed_volume * scale.powi(3);
    let volume = signed_volume.abs();
    let surface_area = quality.surface_area * scale.powi(2);

    let mut confidence = quality.quality_score;
    if params.smoothed_input {
        confidence *= SMOOTHED_INPUT_BONUS;
    }
    confidence = (confidence * method.confidence_multiplier()).clamp(0.0, 1.0);

    debug!(?method, volume, confidence, "computed mesh volume");

    Ok(Some(VolumeResult {
        signed_volume,
        volume,
        surface_area,
        method,
        quality,
        confidence,
    }))
}

/// Signed-tetrahedra decomposition about the mesh centroid.
///
/// The centroid apex keeps the tetrahedra small for meshes far from the
/// origin, which the coordinate-origin apex would not.
#[allow(clippy::cast_precision_loss)]
fn signed_tetrahedra(mesh: &TriangleMesh) -> f64 {
    let apex = if mesh.vertices.is_empty() {
        nalgebra::Point3::origin()
    } else {
        let sum: nalgebra::Vector3<f64> = mesh.vertices.iter().map(|v| v.position.coords).sum();
        nalgebra::Point3::from(sum / mesh.vertices.len() as f64)
    };

    let mut volume = 0.0;
    for tri in mesh.triangles() {
        if tri.is_degenerate(DEGENERATE_AREA_THRESHOLD) {
            continue;
        }
        let a = tri.v0 - apex;
        let b = tri.v1 - apex;
        let c = tri.v2 - apex;
        volume += a.dot(&b.cross(&c)) / 6.0;
    }
    volume
}

/// Projected-area times average-height integration.
///
/// Heights are measured from the `z = 0` plane, which the host session
/// aligns with the supporting surface. Projected areas are signed, so
/// for a closed mesh the baseline cancels and the result matches the
/// exact volume; for an open single-sheet scan it estimates the volume
/// between the sheet and the plane.
fn surface_integration(mesh: &TriangleMesh) -> f64 {
    let mut volume = 0.0;
    for tri in mesh.triangles() {
        if tri.is_degenerate(DEGENERATE_AREA_THRESHOLD) {
            continue;
        }
        let e1 = tri.v1 - tri.v0;
        let e2 = tri.v2 - tri.v0;
        let projected_area = (e1.x * e2.y - e1.y * e2.x) / 2.0;
        let average_height = (tri.v0.z + tri.v1.z + tri.v2.z) / 3.0;
        volume += projected_area * average_height;
    }
    volume
}

/// Bounding-box volume scaled by the empirical fill factor.
fn convex_hull_approx(mesh: &TriangleMesh) -> f64 {
    let bounds: Aabb = mesh.bounds();
    if bounds.is_empty() {
        return 0.0;
    }
    bounds.volume() * BOUNDING_BOX_FILL_FACTOR
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};
    use recon_types::{cube_mesh, TriangleMesh, Vertex};

    /// Dense open height-field sheet: an n x n vertex grid over a
    /// `size` x `size` square at the given height, with normals.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn height_sheet(n: usize, size: f64, height: impl Fn(f64, f64) -> f64) -> TriangleMesh {
        let mut mesh = TriangleMesh::new();
        let step = size / (n - 1) as f64;
        for j in 0..n {
            for i in 0..n {
                let x = i as f64 * step;
                let y = j as f64 * step;
                mesh.vertices
                    .push(Vertex::with_normal(Point3::new(x, y, height(x, y)), Vector3::z()));
            }
        }
        for j in 0..n - 1 {
            for i in 0..n - 1 {
                let v00 = (j * n + i) as u32;
                let v10 = v00 + 1;
                let v01 = v00 + n as u32;
                let v11 = v01 + 1;
                mesh.faces.push([v00, v10, v11]);
                mesh.faces.push([v00, v11, v01]);
            }
        }
        mesh
    }

    #[test]
    fn test_watertight_cube_uses_signed_tetrahedra() {
        let cube = cube_mesh(Point3::new(2.0, 3.0, 4.0), 0.5);
        let params = MeasureParams::default().with_strictness(WatertightStrictness::Exact);
        let result = compute_volume(&cube, &params).unwrap().unwrap();

        assert_eq!(result.method, VolumeMethod::SignedTetrahedra);
        assert_relative_eq!(result.volume, 0.125, epsilon = 1e-10);
    }

    #[test]
    fn test_open_sheet_uses_surface_integration() {
        let sheet = height_sheet(24, 0.1, |_, _| 0.05);
        let params = MeasureParams::default().with_strictness(WatertightStrictness::Exact);
        let result = compute_volume(&sheet, &params).unwrap().unwrap();

        assert_eq!(result.method, VolumeMethod::SurfaceIntegration);
        // 0.1 x 0.1 footprint x 0.05 tall slab
        assert_relative_eq!(result.volume, 5.0e-4, epsilon = 1e-12);
    }

    #[test]
    fn test_sparse_mesh_falls_back_to_bounding_box() {
        let cube = cube_mesh(Point3::origin(), 0.1);
        let result = compute_volume(&cube, &MeasureParams::default())
            .unwrap()
            .unwrap();

        assert_eq!(result.method, VolumeMethod::ConvexHullApprox);
        assert_relative_eq!(result.volume, 0.001 * 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_surface_integration_matches_exact_on_closed_mesh() {
        // Signed projected areas cancel the baseline on a closed mesh
        let cube = cube_mesh(Point3::new(0.0, 0.0, 1.0), 0.2);
        assert_relative_eq!(surface_integration(&cube), 0.008, epsilon = 1e-12);
    }

    #[test]
    fn test_inward_winding_yields_negative_signed_volume() {
        let mut cube = cube_mesh(Point3::origin(), 1.0);
        cube.flip_normals();
        let params = MeasureParams::default().with_strictness(WatertightStrictness::Exact);
        let result = compute_volume(&cube, &params).unwrap().unwrap();

        assert!(result.signed_volume < 0.0);
        assert_relative_eq!(result.volume, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_calibration_obeys_cube_law() {
        let cube = cube_mesh(Point3::origin(), 1.0);
        let params = MeasureParams::default().with_strictness(WatertightStrictness::Exact);
        let raw = compute_volume(&cube, &params).unwrap().unwrap();

        let calibrated = compute_volume(&cube, &params.with_calibration_scale(2.0))
            .unwrap()
            .unwrap();

        assert_relative_eq!(calibrated.volume, raw.volume * 8.0, epsilon = 1e-9);
        assert_relative_eq!(
            calibrated.surface_area,
            raw.surface_area * 4.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_scale_invariance_with_calibration() {
        // Scaling geometry by k and calibrating by 1/k reproduces the
        // original volume
        let k = 3.0;
        let cube = cube_mesh(Point3::origin(), 1.0);
        let mut scaled = cube.clone();
        scaled.scale(k);

        let params = MeasureParams::default().with_strictness(WatertightStrictness::Exact);
        let original = compute_volume(&cube, &params).unwrap().unwrap();
        let corrected = compute_volume(&scaled, &params.with_calibration_scale(1.0 / k))
            .unwrap()
            .unwrap();

        assert_relative_eq!(corrected.volume, original.volume, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_mesh_yields_none() {
        let result = compute_volume(&TriangleMesh::new(), &MeasureParams::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_degenerate_only_mesh_yields_none() {
        let mut mesh = TriangleMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.faces.push([0, 0, 0]);
        let result = compute_volume(&mesh, &MeasureParams::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_invalid_calibration_rejected() {
        let cube = cube_mesh(Point3::origin(), 1.0);
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let params = MeasureParams::default().with_calibration_scale(bad);
            assert!(compute_volume(&cube, &params).is_err());
        }
    }

    #[test]
    fn test_confidence_ordering_across_methods() {
        let params = MeasureParams::default().with_strictness(WatertightStrictness::Exact);

        let cube = cube_mesh(Point3::origin(), 1.0);
        let tetra = compute_volume(&cube, &params).unwrap().unwrap();

        let sparse = cube_mesh(Point3::origin(), 1.0);
        let hull = compute_volume(&sparse, &MeasureParams::default())
            .unwrap()
            .unwrap();

        assert!(tetra.confidence > hull.confidence);
        assert!(tetra.confidence <= 1.0);
        assert!(hull.confidence >= 0.0);
    }

    #[test]
    fn test_smoothed_input_bonus_raises_confidence() {
        let sheet = height_sheet(24, 0.1, |x, _| 0.02 + x);
        let params = MeasureParams::default().with_strictness(WatertightStrictness::Exact);

        let plain = compute_volume(&sheet, &params).unwrap().unwrap();
        let smoothed = compute_volume(&sheet, &params.with_smoothed_input(true))
            .unwrap()
            .unwrap();

        assert!(smoothed.confidence > plain.confidence);
        assert!(smoothed.confidence <= 1.0);
    }

    #[test]
    fn test_unit_conversions() {
        let cube = cube_mesh(Point3::origin(), 0.1);
        let result = compute_volume(&cube, &MeasureParams::default())
            .unwrap()
            .unwrap();

        assert_relative_eq!(result.cubic_centimeters(), result.volume * 1.0e6);
        assert_relative_eq!(result.liters(), result.volume * 1.0e3);
        assert_relative_eq!(result.cubic_meters(), result.volume);
    }
}
