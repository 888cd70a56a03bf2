//! Depth-image to point-cloud extraction.

use nalgebra::Isometry3;
use recon_types::{
    CameraIntrinsics, ConfidenceImage, ConfidenceLevel, DepthImage, SampleCloud, SamplePoint,
    TrackingQuality,
};
use tracing::{debug, warn};

use crate::policy::SamplingPolicy;

/// Pixel step used for the cheap average-depth pre-pass.
const AVERAGE_DEPTH_STRIDE: usize = 8;

/// Minimum confidence level a pixel must report to be sampled.
const MIN_CONFIDENCE: ConfidenceLevel = ConfidenceLevel::Medium;

/// Extracts world-space sample points from a depth image.
///
/// Pixels are visited on a fixed stride chosen by `policy` from the
/// average scene depth and `tracking`. Each visited pixel must pass the
/// validity gate — finite depth inside the policy's depth range, and (when
/// a confidence image is present) at least medium sensor confidence —
/// or it is skipped entirely; no partial point is ever emitted.
///
/// Normals default to the camera-facing direction (from the point toward
/// the camera position), a cheap monotonic approximation sufficient for
/// weighting fusion contributions.
///
/// Malformed input (confidence image shaped differently from the depth
/// image, degenerate intrinsics, no valid depth anywhere) yields an empty
/// cloud rather than an error. The source buffers are only borrowed for
/// the duration of the call.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sample_depth_image(
    depth: &DepthImage<'_>,
    confidence: Option<&ConfidenceImage<'_>>,
    intrinsics: &CameraIntrinsics,
    camera_to_world: &Isometry3<f64>,
    tracking: TrackingQuality,
    policy: &SamplingPolicy,
) -> SampleCloud {
    if !intrinsics.is_valid() {
        warn!("degenerate camera intrinsics, skipping frame");
        return SampleCloud::new();
    }

    if let Some(conf) = confidence {
        if conf.width() != depth.width() || conf.height() != depth.height() {
            warn!(
                depth_w = depth.width(),
                depth_h = depth.height(),
                conf_w = conf.width(),
                conf_h = conf.height(),
                "confidence image shape does not match depth image, skipping frame"
            );
            return SampleCloud::new();
        }
    }

    let Some(average_depth) = depth.average_depth(AVERAGE_DEPTH_STRIDE) else {
        debug!("no valid depth in frame");
        return SampleCloud::new();
    };

    let stride = policy.stride_for(average_depth, tracking);
    let camera_position = camera_to_world * nalgebra::Point3::origin();

    let mut cloud =
        SampleCloud::with_capacity((depth.width() / stride + 1) * (depth.height() / stride + 1));

    for y in (0..depth.height()).step_by(stride) {
        for x in (0..depth.width()).step_by(stride) {
            let Some(d) = depth.get(x, y) else { continue };
            let d = f64::from(d);
            if !d.is_finite() || d < policy.min_depth || d > policy.max_depth {
                continue;
            }

            let point_confidence = match confidence.and_then(|c| c.get(x, y)) {
                Some(level) => {
                    if level < MIN_CONFIDENCE {
                        continue;
                    }
                    level.value()
                }
                None if confidence.is_some() => continue,
                None => 1.0,
            };

            let cam_point = intrinsics.back_project(x as f64, y as f64, d);
            let world_point = camera_to_world * cam_point;

            let to_camera = camera_position - world_point;
            let norm = to_camera.norm();
            if norm <= f64::EPSILON {
                continue;
            }

            cloud.push(SamplePoint::new(
                world_point,
                to_camera / norm,
                point_confidence,
            ));
        }
    }

    debug!(
        points = cloud.len(),
        stride,
        average_depth,
        ?tracking,
        "sampled depth frame"
    );

    cloud
}
